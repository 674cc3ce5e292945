use serde::Serialize;

use super::investment::POSITION_COUNT;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationResult {
    pub record_id: i64,
    pub initial_investment: [Option<f64>; POSITION_COUNT],
    pub shares: [f64; POSITION_COUNT],
    /// Current value of each position at `sp500_price`.
    pub new_investment: [f64; POSITION_COUNT],
    pub profit_loss: [f64; POSITION_COUNT],
    pub sp500_price: f64,
    pub total_invested: f64,
    pub total_value: f64,
    pub total_profit_loss: f64,
}
