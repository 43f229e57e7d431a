use axum::Router;
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::time::Duration;

use subgate::config::Config;
use subgate::db::{create_pool, init_db, queries, AppState};
use subgate::handlers;
use subgate::models::SubscriptionStatus;

#[derive(Parser, Debug)]
#[command(name = "subgate")]
#[command(about = "Subscription-gated magic-link login backend")]
struct Cli {
    /// Seed the database with an active dev subscriber
    #[arg(long)]
    seed: bool,

    /// Delete the database on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

/// Seed an active subscriber so the login flow can be exercised without a
/// real checkout. Only runs in dev mode.
fn seed_dev_subscriber(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    let email = "dev@subgate.local";
    queries::upsert_subscriber_from_checkout(
        &conn,
        email,
        Some("cus_dev"),
        Some("sub_dev"),
        SubscriptionStatus::Active,
        None,
    )
    .expect("Failed to seed dev subscriber");

    tracing::info!("============================================");
    tracing::info!("DEV SUBSCRIBER SEEDED");
    tracing::info!("Email: {}", email);
    tracing::info!("POST /request-login with this email to log in");
    tracing::info!("============================================");
}

/// Spawns a background task that periodically prunes expired login tokens.
/// Redemption re-checks expiry itself; this keeps the table from growing.
fn spawn_token_cleanup_task(state: AppState) {
    tokio::spawn(async move {
        let interval = Duration::from_secs(5 * 60); // 5 minutes

        loop {
            tokio::time::sleep(interval).await;

            match state.db.get() {
                Ok(conn) => match queries::cleanup_expired_login_tokens(&conn) {
                    Ok(count) => {
                        if count > 0 {
                            tracing::debug!("Cleaned up {} expired login tokens", count);
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to cleanup login tokens: {}", e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to get db connection for cleanup: {}", e);
                }
            }
        }
    });

    tracing::info!("Background token cleanup task started (runs every 5 minutes)");
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "subgate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    // Create the database pool and initialize the schema
    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let state = AppState {
        db: db_pool,
        base_url: config.base_url.clone(),
        stripe: config.stripe.clone(),
        success_url: config.success_url.clone(),
        cancel_url: config.cancel_url.clone(),
    };

    // Seed dev data if --seed flag is passed (only in dev mode)
    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set SUBGATE_ENV=dev)");
        } else {
            seed_dev_subscriber(&state);
        }
    }

    // Start background cleanup of expired login tokens
    spawn_token_cleanup_task(state.clone());

    // Build the application router
    let app = Router::new()
        // Public endpoints (no auth - tokens and emails are the identity)
        .merge(handlers::public::router())
        // Webhook endpoint (signature auth)
        .merge(handlers::webhooks::router())
        .layer(TraceLayer::new_for_http())
        // The checkout and login pages are served from a separate origin
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start the server
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    let db_path = config.database_path.clone();

    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: database will be deleted on exit");
    }

    tracing::info!("Subgate server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    // Cleanup on exit if ephemeral mode
    if cleanup_on_exit {
        tracing::info!("Cleaning up ephemeral database...");
        if let Err(e) = std::fs::remove_file(&db_path) {
            tracing::warn!("Failed to remove {}: {}", db_path, e);
        } else {
            tracing::info!("Removed {}", db_path);
        }
        // Also remove WAL and SHM files if they exist
        let _ = std::fs::remove_file(format!("{}-wal", db_path));
        let _ = std::fs::remove_file(format!("{}-shm", db_path));
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
