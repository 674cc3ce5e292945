use sqlx::SqlitePool;
use tracing::{error, info};

use crate::db;
use crate::errors::AppError;
use crate::models::{InvestmentRecord, NewInvestment, POSITION_COUNT};
use crate::services::price_service::IndexPriceSource;

#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    Created { id: i64, price: f64 },
    AlreadyExists,
}

/// Turns the 1-4 amounts given on the command line into position slots.
pub fn amounts_from_slice(amounts: &[f64]) -> Result<[Option<f64>; POSITION_COUNT], AppError> {
    if amounts.is_empty() || amounts.len() > POSITION_COUNT {
        return Err(AppError::Validation(format!(
            "expected between 1 and {POSITION_COUNT} amounts, got {}",
            amounts.len()
        )));
    }
    let mut slots = [None; POSITION_COUNT];
    for (slot, amount) in slots.iter_mut().zip(amounts) {
        *slot = Some(*amount);
    }
    Ok(slots)
}

fn validate_amounts(amounts: &[Option<f64>; POSITION_COUNT]) -> Result<(), AppError> {
    match amounts[0] {
        None => {
            return Err(AppError::Validation("the first investment amount is required".into()));
        }
        Some(a) if !a.is_finite() || a <= 0.0 => {
            return Err(AppError::Validation(format!(
                "investment 1 must be a positive amount, got {a}"
            )));
        }
        Some(_) => {}
    }
    // later positions may be zero, which buys nothing
    for (i, amount) in amounts.iter().enumerate().skip(1) {
        if let Some(a) = amount {
            if !a.is_finite() || *a < 0.0 {
                return Err(AppError::Validation(format!(
                    "investment {} must be zero or a positive amount, got {a}",
                    i + 1
                )));
            }
        }
    }
    Ok(())
}

pub async fn record_count(pool: &SqlitePool) -> Result<i64, AppError> {
    db::investment_queries::count(pool).await.map_err(|e| {
        error!("Failed to count investment records: {}", e);
        AppError::Db(e)
    })
}

/// Stores the one-off investment record, buying shares at the current index
/// price. Does nothing when a record already exists.
pub async fn create_record(
    pool: &SqlitePool,
    price_source: &dyn IndexPriceSource,
    amounts: [Option<f64>; POSITION_COUNT],
) -> Result<CreateOutcome, AppError> {
    if record_count(pool).await? > 0 {
        info!("The initial investment has already been saved");
        return Ok(CreateOutcome::AlreadyExists);
    }

    validate_amounts(&amounts)?;

    let price = price_source.fetch_index_price().await?;
    let input = NewInvestment::at_price(amounts, price);

    match db::investment_queries::insert_if_empty(pool, &input).await {
        Ok(Some(id)) => {
            info!("✓ Initial investment saved (record {}), shares bought at index price {:.2}",
                  id, price);
            Ok(CreateOutcome::Created { id, price })
        }
        Ok(None) => {
            info!("The initial investment was saved concurrently, keeping the existing record");
            Ok(CreateOutcome::AlreadyExists)
        }
        Err(e) => {
            error!("Failed to save initial investment: {}", e);
            Err(AppError::Db(e))
        }
    }
}

pub async fn latest_record(pool: &SqlitePool) -> Result<Option<InvestmentRecord>, AppError> {
    db::investment_queries::fetch_latest(pool).await.map_err(|e| {
        error!("Failed to fetch latest investment record: {}", e);
        AppError::Db(e)
    })
}

pub async fn update_price_and_shares(
    pool: &SqlitePool,
    id: i64,
    price: f64,
    shares: &[f64; POSITION_COUNT],
) -> Result<(), AppError> {
    match db::investment_queries::update_price_and_shares(pool, id, price, shares).await {
        Ok(0) => Err(AppError::NoRecordExists),
        Ok(_) => Ok(()),
        Err(e) => {
            error!("Failed to update investment record {}: {}", id, e);
            Err(AppError::Db(e))
        }
    }
}
