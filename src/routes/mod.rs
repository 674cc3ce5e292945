pub mod auth;
pub mod health;
pub mod home;
pub mod session;
pub mod valuation;
