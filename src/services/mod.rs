pub mod auth_service;
pub mod currency_service;
pub mod investment_service;
pub mod price_service;
pub mod valuation_service;
