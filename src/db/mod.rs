mod from_row;
pub mod queries;
mod schema;

pub use schema::init_db;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::models::StripeConfig;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state holding the database pool and configuration.
/// Passed explicitly into every handler - there is no ambient store.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    /// Base URL for building magic-login links (e.g. https://api.example.com)
    pub base_url: String,
    pub stripe: StripeConfig,
    /// Where the hosted checkout page sends the customer afterwards.
    pub success_url: String,
    pub cancel_url: String,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}
