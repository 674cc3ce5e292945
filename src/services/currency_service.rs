use crate::errors::AppError;

/// USD to ILS, as the positions have always been booked.
pub const DEFAULT_EXCHANGE_RATE: f64 = 3.8;

/// Converts index prices from the quote currency with a fixed rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedRateConverter {
    rate: f64,
}

impl FixedRateConverter {
    pub fn new(rate: f64) -> Result<Self, AppError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(AppError::Config(format!(
                "exchange rate must be a positive number, got {rate}"
            )));
        }
        Ok(Self { rate })
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn to_local(&self, native: f64) -> f64 {
        native * self.rate
    }
}

impl Default for FixedRateConverter {
    fn default() -> Self {
        Self { rate: DEFAULT_EXCHANGE_RATE }
    }
}
