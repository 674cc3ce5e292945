use std::sync::Arc;
use sqlx::SqlitePool;
use crate::services::auth_service::Authenticator;
use crate::services::price_service::IndexPriceSource;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub price_source: Arc<dyn IndexPriceSource>,
    pub auth: Arc<Authenticator>,
    pub currency_symbol: String,
}
