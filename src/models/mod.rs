mod investment;
mod valuation;

pub use investment::{InvestmentRecord, NewInvestment, POSITION_COUNT};
pub use valuation::ValuationResult;
