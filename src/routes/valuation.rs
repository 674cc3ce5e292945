use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tracing::{error, info, warn};

use crate::errors::{AppError, NO_RECORD_MESSAGE};
use crate::routes::session::Session;
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_valuation))
}

pub async fn get_valuation(
    session: Session,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    if !session.authenticated {
        warn!("GET /api/valuation - Rejected request without session");
        return Err(AppError::Unauthorized);
    }

    info!("GET /api/valuation - Refreshing valuation");
    let valuation = services::valuation_service::refresh(&state.pool, state.price_source.as_ref())
        .await
        .map_err(|e| {
            error!("Failed to refresh valuation: {}", e);
            e
        })?;

    match valuation {
        Some(valuation) => Ok(Json(valuation).into_response()),
        None => Ok((StatusCode::NOT_FOUND, Json(json!({ "error": NO_RECORD_MESSAGE }))).into_response()),
    }
}
