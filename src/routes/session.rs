use std::convert::Infallible;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::services::auth_service;
use crate::state::AppState;

/// Whether the request carries a valid session cookie.
pub struct Session {
    pub authenticated: bool,
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let authenticated = auth_service::session_token(&parts.headers)
            .map(|token| state.auth.validate_session(token))
            .unwrap_or(false);
        Ok(Session { authenticated })
    }
}

/// `302 Found` to `location`.
pub fn redirect_found(location: &'static str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}
