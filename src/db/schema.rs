use rusqlite::Connection;

/// Initialize the database schema.
///
/// Two tables: single-use login tokens and per-email subscription state.
/// WAL mode keeps concurrent webhook deliveries and logins from blocking
/// each other on the single database file.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;

        -- Short-lived magic-link tokens. The token value is the key;
        -- a row disappearing IS the single-use guarantee.
        CREATE TABLE IF NOT EXISTS login_tokens (
            token TEXT PRIMARY KEY,
            email TEXT NOT NULL,
            expires_at INTEGER NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_login_tokens_expires ON login_tokens(expires_at);

        -- Subscription state, one row per email. Rows are never deleted;
        -- cancellation is a status transition.
        CREATE TABLE IF NOT EXISTS subscribers (
            email TEXT PRIMARY KEY,
            status TEXT NOT NULL CHECK (status IN ('active', 'past_due', 'canceled')),
            stripe_customer_id TEXT,
            stripe_subscription_id TEXT,
            current_period_end INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        -- Invoice events carry only the customer id, cancellations only the
        -- subscription id - both paths need an index.
        CREATE INDEX IF NOT EXISTS idx_subscribers_customer ON subscribers(stripe_customer_id);
        CREATE INDEX IF NOT EXISTS idx_subscribers_subscription ON subscribers(stripe_subscription_id);
        "#,
    )?;
    Ok(())
}
