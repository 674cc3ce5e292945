use axum::extract::State;
use axum::http::{header, HeaderValue};
use axum::response::{Html, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::routes::session::redirect_found;
use crate::services::auth_service::Authenticator;
use crate::state::AppState;
use crate::views;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_form).post(login))
        .route("/logout", post(logout))
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    password: String,
}

pub async fn login_form() -> Html<String> {
    info!("GET /login - Rendering login form");
    Html(views::login_page())
}

pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    info!("POST /login - Login attempt");
    if !state.auth.verify_password(&form.password) {
        warn!("POST /login - Incorrect password");
        return Err(AppError::AuthenticationFailed);
    }

    let token = state.auth.issue_session()?;
    let cookie = HeaderValue::from_str(&state.auth.session_cookie(&token))
        .map_err(|e| AppError::Session(e.to_string()))?;

    let mut response = redirect_found("/");
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    info!("POST /login - Session authenticated");
    Ok(response)
}

pub async fn logout() -> Result<Response, AppError> {
    info!("POST /logout - Clearing session");
    let cookie = HeaderValue::from_str(&Authenticator::clear_cookie())
        .map_err(|e| AppError::Session(e.to_string()))?;

    let mut response = redirect_found("/login");
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}
