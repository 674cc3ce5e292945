use axum::http::StatusCode;
use axum::response::IntoResponse;
use sqlx::Error;
use thiserror::Error;

pub const NO_RECORD_MESSAGE: &str = "No investment found. Please save your initial investment first.";
pub const INCORRECT_PASSWORD_MESSAGE: &str = "incorrect password, try again.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Db(sqlx::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Index price unavailable")]
    PriceUnavailable,
    #[error("No investment record exists")]
    NoRecordExists,
    #[error("Authentication failed")]
    AuthenticationFailed,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Session error: {0}")]
    Session(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match self {
            // plain-text 200s; clients match on the message
            AppError::NoRecordExists => (StatusCode::OK, NO_RECORD_MESSAGE).into_response(),
            AppError::AuthenticationFailed => {
                (StatusCode::OK, INCORRECT_PASSWORD_MESSAGE).into_response()
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
            AppError::PriceUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Index price is currently unavailable, try again later.",
            )
                .into_response(),
            AppError::Db(_) | AppError::Session(_) | AppError::Config(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(value: Error) -> Self {
        AppError::Db(value)
    }
}
