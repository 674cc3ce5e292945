use chrono::NaiveDateTime;
use sqlx::FromRow;

pub const POSITION_COUNT: usize = 4;

// One snapshot of the tracked positions. Only the latest row is ever read.
#[derive(Debug, Clone, FromRow)]
pub struct InvestmentRecord {
    pub id: i64,
    pub initial_investment: f64,
    pub initial_investment_2: Option<f64>,
    pub initial_investment_3: Option<f64>,
    pub initial_investment_4: Option<f64>,
    pub shares: f64,
    pub shares_2: f64,
    pub shares_3: f64,
    pub shares_4: f64,
    pub sp500_price: f64,
    pub created_at: NaiveDateTime,
    pub price_updated_at: NaiveDateTime,
}

impl InvestmentRecord {
    pub fn initial_amounts(&self) -> [Option<f64>; POSITION_COUNT] {
        [
            Some(self.initial_investment),
            self.initial_investment_2,
            self.initial_investment_3,
            self.initial_investment_4,
        ]
    }

    pub fn share_counts(&self) -> [f64; POSITION_COUNT] {
        [self.shares, self.shares_2, self.shares_3, self.shares_4]
    }
}

/// Values for a record that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvestment {
    pub amounts: [Option<f64>; POSITION_COUNT],
    pub shares: [f64; POSITION_COUNT],
    pub price: f64,
}

impl NewInvestment {
    /// Buys `amount / price` units for every present amount; absent positions hold nothing.
    pub fn at_price(amounts: [Option<f64>; POSITION_COUNT], price: f64) -> Self {
        let shares = amounts.map(|amount| amount.map_or(0.0, |a| a / price));
        Self { amounts, shares, price }
    }
}
