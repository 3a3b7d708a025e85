use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::io;
use thiserror::Error;
use tracing::error;

/// Custom result type alias for the application
pub type Result<T> = std::result::Result<T, RoastError>;

pub const USERNAME_REQUIRED: &str = "Username is required";
pub const CLIENT_IP_INVALID: &str = "Client IP is invalid.";
pub const TOO_MANY_REQUESTS: &str = "Too many requests, try again later.";
pub const ROAST_FAILED: &str = "Error generating roast";

/// Errors that can occur while serving a roast
#[derive(Debug, Error)]
pub enum RoastError {
    /// Missing username or unresolvable client key
    #[error("Validation error: {0}")]
    Validation(String),

    /// The client used up its allowance for the current window
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Both the primary and fallback GitHub fetches failed
    #[error("GitHub fetch error: {0}")]
    UpstreamFetch(String),

    /// The model call failed or returned nothing usable
    #[error("Generation error: {0}")]
    Generation(String),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// HTTP request/response errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O errors
    #[error("IO error: {0}")]
    IO(#[from] io::Error),
}

impl RoastError {
    /// HTTP status reported to the caller
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::RateLimitExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the response body.
    ///
    /// Validation messages are already caller-facing. Everything that fails
    /// past the rate limiter collapses into one generic message so upstream
    /// detail never leaks.
    pub fn public_message(&self) -> &str {
        match self {
            Self::Validation(msg) => msg,
            Self::RateLimitExceeded(_) => TOO_MANY_REQUESTS,
            _ => ROAST_FAILED,
        }
    }
}

impl IntoResponse for RoastError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}: {}", ROAST_FAILED, self);
        }
        (status, Json(json!({ "message": self.public_message() }))).into_response()
    }
}
