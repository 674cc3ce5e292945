use axum::extract::State;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tracing::{error, info};

use crate::errors::AppError;
use crate::routes::session::{redirect_found, Session};
use crate::services;
use crate::state::AppState;
use crate::views;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(home))
}

pub async fn home(session: Session, State(state): State<AppState>) -> Result<Response, AppError> {
    if !session.authenticated {
        info!("GET / - No session, redirecting to login");
        return Ok(redirect_found("/login"));
    }

    info!("GET / - Refreshing valuation");
    let valuation = services::valuation_service::refresh(&state.pool, state.price_source.as_ref())
        .await
        .map_err(|e| {
            error!("Failed to refresh valuation: {}", e);
            e
        })?
        .ok_or(AppError::NoRecordExists)?;

    Ok(Html(views::index_page(&valuation, &state.currency_symbol)).into_response())
}
