pub mod reminder_storage;

use std::str::FromStr;

pub use sqlx;
use sqlx::{
    SqlitePool,
    migrate::{MigrateError, Migrator},
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub static MIGRATOR: Migrator = sqlx::migrate!();

/// Opens the database at `url`, creating the file when it does not exist yet.
pub async fn connect(url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;

    log::info!("Connected to reminder database {url}");
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}
