use sqlx::SqlitePool;
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{InvestmentRecord, ValuationResult};
use crate::services::investment_service;
use crate::services::price_service::IndexPriceSource;

/// Values every recorded position at `price`. Positions without an initial
/// amount report zero value and zero profit.
pub fn value_positions(record: &InvestmentRecord, price: f64) -> ValuationResult {
    let initial = record.initial_amounts();
    let shares = record.share_counts();

    let mut new_investment = [0.0; 4];
    let mut profit_loss = [0.0; 4];
    for (i, amount) in initial.iter().enumerate() {
        if let Some(amount) = amount {
            new_investment[i] = shares[i] * price;
            profit_loss[i] = new_investment[i] - amount;
        }
    }

    let total_invested: f64 = initial.iter().flatten().sum();
    let total_value: f64 = new_investment.iter().sum();

    ValuationResult {
        record_id: record.id,
        initial_investment: initial,
        shares,
        new_investment,
        profit_loss,
        sp500_price: price,
        total_invested,
        total_value,
        total_profit_loss: total_value - total_invested,
    }
}

/// Revalues the latest record at the current index price and stores that price.
///
/// Returns `Ok(None)` when no record has been created yet. A missing price is
/// an error; nothing is computed or written in that case.
pub async fn refresh(
    pool: &SqlitePool,
    price_source: &dyn IndexPriceSource,
) -> Result<Option<ValuationResult>, AppError> {
    let Some(record) = investment_service::latest_record(pool).await? else {
        info!("No investment found in the database to update");
        return Ok(None);
    };

    let price = price_source.fetch_index_price().await.map_err(|e| {
        error!("Cannot value record {} without an index price: {}", record.id, e);
        e
    })?;

    let valuation = value_positions(&record, price);

    // shares are fixed at creation; written back unchanged alongside the new price
    investment_service::update_price_and_shares(pool, record.id, price, &valuation.shares).await?;

    info!("Valued record {} at index price {:.2}: total {:.2}, P/L {:.2}",
          record.id, price, valuation.total_value, valuation.total_profit_loss);
    Ok(Some(valuation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::services::investment_service::create_record;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct SettablePrice(Mutex<Option<f64>>);

    impl SettablePrice {
        fn new(price: f64) -> Self {
            Self(Mutex::new(Some(price)))
        }

        fn set(&self, price: Option<f64>) {
            *self.0.lock().unwrap() = price;
        }
    }

    #[async_trait]
    impl IndexPriceSource for SettablePrice {
        async fn fetch_index_price(&self) -> Result<f64, AppError> {
            self.0.lock().unwrap().ok_or(AppError::PriceUnavailable)
        }
    }

    async fn seeded_pool(source: &SettablePrice) -> SqlitePool {
        let pool = db::connect("sqlite::memory:").await.unwrap();
        create_record(&pool, source, [Some(1000.0), Some(500.0), None, None])
            .await
            .unwrap();
        pool
    }

    #[tokio::test]
    async fn test_refresh_values_positions_at_new_price() {
        let source = SettablePrice::new(100.0);
        let pool = seeded_pool(&source).await;
        source.set(Some(110.0));

        let valuation = refresh(&pool, &source).await.unwrap().unwrap();

        assert_eq!(valuation.shares, [10.0, 5.0, 0.0, 0.0]);
        assert_eq!(valuation.new_investment, [1100.0, 550.0, 0.0, 0.0]);
        assert_eq!(valuation.profit_loss, [100.0, 50.0, 0.0, 0.0]);
        assert_eq!(valuation.sp500_price, 110.0);
        assert_eq!(valuation.total_invested, 1500.0);
        assert_eq!(valuation.total_profit_loss, 150.0);

        let stored = investment_service::latest_record(&pool).await.unwrap().unwrap();
        assert_eq!(stored.sp500_price, 110.0);
    }

    #[tokio::test]
    async fn test_refresh_on_empty_store_is_none() {
        let pool = db::connect("sqlite::memory:").await.unwrap();
        let source = SettablePrice::new(100.0);

        assert!(refresh(&pool, &source).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_without_price_is_explicit_failure() {
        let source = SettablePrice::new(100.0);
        let pool = seeded_pool(&source).await;
        source.set(None);

        let err = refresh(&pool, &source).await.unwrap_err();
        assert!(matches!(err, AppError::PriceUnavailable));

        // last good price is kept
        let stored = investment_service::latest_record(&pool).await.unwrap().unwrap();
        assert_eq!(stored.sp500_price, 100.0);
    }

    #[tokio::test]
    async fn test_shares_are_invariant_across_refreshes() {
        let source = SettablePrice::new(100.0);
        let pool = seeded_pool(&source).await;

        source.set(Some(120.0));
        let first = refresh(&pool, &source).await.unwrap().unwrap();
        source.set(Some(60.0));
        let second = refresh(&pool, &source).await.unwrap().unwrap();

        assert_eq!(first.shares, second.shares);
        assert_eq!(first.new_investment, [1200.0, 600.0, 0.0, 0.0]);
        assert_eq!(second.new_investment, [600.0, 300.0, 0.0, 0.0]);
        assert_eq!(second.profit_loss, [-400.0, -200.0, 0.0, 0.0]);

        let stored = investment_service::latest_record(&pool).await.unwrap().unwrap();
        assert_eq!(stored.share_counts(), [10.0, 5.0, 0.0, 0.0]);
    }
}
