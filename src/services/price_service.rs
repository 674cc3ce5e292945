use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep as async_sleep, timeout};
use tracing::{error, info, warn};

use crate::config::PriceConfig;
use crate::errors::AppError;
use crate::external::price_provider::PriceProvider;
use crate::services::currency_service::FixedRateConverter;

/// Latest index close, already converted into the local currency.
#[async_trait]
pub trait IndexPriceSource: Send + Sync {
    async fn fetch_index_price(&self) -> Result<f64, AppError>;
}

/// Fetches the index close from a [`PriceProvider`], retrying empty or failed
/// responses with a fixed delay. The whole loop runs under one deadline.
pub struct RetryingIndexPriceSource {
    provider: Arc<dyn PriceProvider>,
    converter: FixedRateConverter,
    symbol: String,
    retries: u32,
    delay: Duration,
    timeout: Duration,
}

impl RetryingIndexPriceSource {
    pub fn new(provider: Arc<dyn PriceProvider>, config: &PriceConfig) -> Result<Self, AppError> {
        Ok(Self {
            provider,
            converter: FixedRateConverter::new(config.exchange_rate)?,
            symbol: config.symbol.clone(),
            retries: config.retries.max(1),
            delay: config.delay,
            timeout: config.timeout,
        })
    }

    async fn latest_close(&self) -> Option<f64> {
        for attempt in 1..=self.retries {
            match self.provider.fetch_daily_history(&self.symbol, 1).await {
                Ok(points) => match points.last() {
                    Some(point) if point.close.is_finite() && point.close > 0.0 => {
                        return Some(point.close);
                    }
                    Some(point) => {
                        warn!("Ignoring unusable close {} for {} (attempt {}/{})",
                              point.close, self.symbol, attempt, self.retries);
                    }
                    None => {
                        warn!("Provider returned empty data for {} (attempt {}/{})",
                              self.symbol, attempt, self.retries);
                    }
                },
                Err(e) => {
                    warn!("Error fetching {} price: {} (attempt {}/{})",
                          self.symbol, e, attempt, self.retries);
                }
            }

            if attempt < self.retries {
                async_sleep(self.delay).await;
            }
        }
        None
    }
}

#[async_trait]
impl IndexPriceSource for RetryingIndexPriceSource {
    async fn fetch_index_price(&self) -> Result<f64, AppError> {
        match timeout(self.timeout, self.latest_close()).await {
            Ok(Some(close)) => {
                let local = self.converter.to_local(close);
                info!("✓ {} closed at {:.2}, {:.2} in local currency (rate {})",
                      self.symbol, close, local, self.converter.rate());
                Ok(local)
            }
            Ok(None) => {
                error!("✗ Giving up on {} price after {} attempts", self.symbol, self.retries);
                Err(AppError::PriceUnavailable)
            }
            Err(_) => {
                error!("✗ Fetching {} price exceeded {}s deadline",
                       self.symbol, self.timeout.as_secs_f64());
                Err(AppError::PriceUnavailable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::price_provider::{ExternalPricePoint, PriceProviderError};
    use chrono::NaiveDate;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    type Scripted = Result<Vec<ExternalPricePoint>, PriceProviderError>;

    struct ScriptedProvider {
        responses: Mutex<VecDeque<Scripted>>,
        calls: AtomicU32,
        latency: Duration,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Scripted>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicU32::new(0),
                latency: Duration::ZERO,
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PriceProvider for ScriptedProvider {
        async fn fetch_daily_history(
            &self,
            _ticker: &str,
            _days: u32,
        ) -> Result<Vec<ExternalPricePoint>, PriceProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.latency.is_zero() {
                async_sleep(self.latency).await;
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(PriceProviderError::NotFound))
        }
    }

    fn point(close: f64) -> ExternalPricePoint {
        ExternalPricePoint {
            date: NaiveDate::from_ymd_opt(2026, 10, 13).unwrap(),
            close,
        }
    }

    fn fast_config(retries: u32) -> PriceConfig {
        PriceConfig {
            retries,
            delay: Duration::from_millis(1),
            timeout: Duration::from_secs(5),
            ..PriceConfig::default()
        }
    }

    #[tokio::test]
    async fn test_converts_latest_close() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(vec![point(90.0), point(100.0)])]));
        let source = RetryingIndexPriceSource::new(provider.clone(), &fast_config(3)).unwrap();

        let price = source.fetch_index_price().await.unwrap();
        assert!((price - 380.0).abs() < 1e-9);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_retries_empty_and_failed_responses() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(vec![]),
            Err(PriceProviderError::Network("connection reset".into())),
            Ok(vec![point(100.0)]),
        ]));
        let config = PriceConfig { exchange_rate: 1.0, ..fast_config(3) };
        let source = RetryingIndexPriceSource::new(provider.clone(), &config).unwrap();

        assert_eq!(source.fetch_index_price().await.unwrap(), 100.0);
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_are_unavailable() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(PriceProviderError::RateLimited),
            Ok(vec![]),
            Err(PriceProviderError::NotFound),
            Ok(vec![point(100.0)]),
        ]));
        let source = RetryingIndexPriceSource::new(provider.clone(), &fast_config(3)).unwrap();

        let err = source.fetch_index_price().await.unwrap_err();
        assert!(matches!(err, AppError::PriceUnavailable));
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_deadline_bounds_slow_provider() {
        let mut provider = ScriptedProvider::new(vec![Ok(vec![point(100.0)])]);
        provider.latency = Duration::from_secs(2);
        let config = PriceConfig { timeout: Duration::from_millis(50), ..fast_config(3) };
        let source = RetryingIndexPriceSource::new(Arc::new(provider), &config).unwrap();

        let started = std::time::Instant::now();
        let err = source.fetch_index_price().await.unwrap_err();
        assert!(matches!(err, AppError::PriceUnavailable));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_rejects_invalid_exchange_rate() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let config = PriceConfig { exchange_rate: 0.0, ..fast_config(1) };
        assert!(RetryingIndexPriceSource::new(provider, &config).is_err());
    }
}
