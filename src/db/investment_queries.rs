use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::{InvestmentRecord, NewInvestment, POSITION_COUNT};

const RECORD_COLUMNS: &str = "id, initial_investment, initial_investment_2, initial_investment_3, \
     initial_investment_4, shares, shares_2, shares_3, shares_4, sp500_price, created_at, \
     price_updated_at";

pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM investment")
        .fetch_one(pool)
        .await
}

/// Inserts `input` only when the table is empty. Returns the new row id, or
/// `None` when a record was already present.
pub async fn insert_if_empty(
    pool: &SqlitePool,
    input: &NewInvestment,
) -> Result<Option<i64>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM investment")
        .fetch_one(&mut *tx)
        .await?;
    if existing > 0 {
        tx.rollback().await?;
        return Ok(None);
    }

    let [amount_1, amount_2, amount_3, amount_4] = input.amounts;
    let [shares_1, shares_2, shares_3, shares_4] = input.shares;
    let now = Utc::now().naive_utc();

    let id = sqlx::query(
        r#"
        INSERT INTO investment
        (initial_investment, initial_investment_2, initial_investment_3, initial_investment_4,
         shares, shares_2, shares_3, shares_4, sp500_price, created_at, price_updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(amount_1.unwrap_or(0.0))
    .bind(amount_2)
    .bind(amount_3)
    .bind(amount_4)
    .bind(shares_1)
    .bind(shares_2)
    .bind(shares_3)
    .bind(shares_4)
    .bind(input.price)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    tx.commit().await?;
    Ok(Some(id))
}

pub async fn fetch_latest(pool: &SqlitePool) -> Result<Option<InvestmentRecord>, sqlx::Error> {
    sqlx::query_as::<_, InvestmentRecord>(&format!(
        "SELECT {RECORD_COLUMNS} FROM investment ORDER BY id DESC LIMIT 1"
    ))
    .fetch_optional(pool)
    .await
}

pub async fn update_price_and_shares(
    pool: &SqlitePool,
    id: i64,
    price: f64,
    shares: &[f64; POSITION_COUNT],
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE investment
        SET sp500_price = ?, shares = ?, shares_2 = ?, shares_3 = ?, shares_4 = ?,
            price_updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(price)
    .bind(shares[0])
    .bind(shares[1])
    .bind(shares[2])
    .bind(shares[3])
    .bind(Utc::now().naive_utc())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
