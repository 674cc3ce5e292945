use sqlx::sqlite::SqliteQueryResult;
use sqlx::SqlitePool;
use tracing::info;

// added after the first release; older stores lack them
const TIMESTAMP_COLUMNS: [&str; 2] = ["created_at", "price_updated_at"];

pub async fn create_investment(pool: &SqlitePool) -> Result<SqliteQueryResult, sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS investment (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            initial_investment REAL NOT NULL,
            initial_investment_2 REAL,
            initial_investment_3 REAL,
            initial_investment_4 REAL,
            shares REAL NOT NULL,
            shares_2 REAL NOT NULL DEFAULT 0,
            shares_3 REAL NOT NULL DEFAULT 0,
            shares_4 REAL NOT NULL DEFAULT 0,
            sp500_price REAL NOT NULL,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            price_updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
}

/// Brings a table written without the timestamp columns up to the current
/// shape. Existing rows are stamped with the time of the upgrade.
pub async fn add_missing_columns(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let present: Vec<String> =
        sqlx::query_scalar("SELECT name FROM pragma_table_info('investment')")
            .fetch_all(pool)
            .await?;

    for column in TIMESTAMP_COLUMNS {
        if present.iter().any(|name| name == column) {
            continue;
        }
        // ADD COLUMN only takes constant defaults, so backfill separately
        sqlx::query(&format!("ALTER TABLE investment ADD COLUMN {column} DATETIME"))
            .execute(pool)
            .await?;
        let stamped = sqlx::query(&format!(
            "UPDATE investment SET {column} = CURRENT_TIMESTAMP WHERE {column} IS NULL"
        ))
        .execute(pool)
        .await?;
        info!("Added column investment.{} ({} existing rows stamped)", column, stamped.rows_affected());
    }
    Ok(())
}
