use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

pub mod init;
pub mod investment_queries;

/// Opens the store and makes sure the schema exists.
///
/// The pool holds a single connection so every statement against the
/// investment table is serialized, including `sqlite::memory:` databases,
/// which would otherwise be private to each connection.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None::<Duration>)
        .max_lifetime(None::<Duration>)
        .connect_with(options)
        .await?;

    init::create_investment(&pool).await?;
    init::add_missing_columns(&pool).await?;
    Ok(pool)
}
