use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use quire_gate::GateError;
use quire_store::StoreError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("publication is locked")]
    Locked,

    #[error("wrong password")]
    WrongPassword,

    #[error("too many attempts")]
    Throttled,

    #[error("not found")]
    NotFound,

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("gate error: {0}")]
    Gate(#[from] GateError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub locked: bool,
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized | Self::Locked | Self::WrongPassword => StatusCode::UNAUTHORIZED,
            Self::Throttled => StatusCode::TOO_MANY_REQUESTS,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Validation(_)) => StatusCode::BAD_REQUEST,
            Self::Store(StoreError::ContentTooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Store(StoreError::FilenameTaken { .. }) => StatusCode::CONFLICT,
            Self::Store(_)
            | Self::Gate(_)
            | Self::Config(_)
            | Self::Io(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) | Self::Store(StoreError::Validation(_)) => "BAD_REQUEST",
            Self::Store(StoreError::ContentTooLarge { .. }) => "CONTENT_TOO_LARGE",
            Self::Store(StoreError::FilenameTaken { .. }) => "FILENAME_TAKEN",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Locked => "LOCKED",
            Self::WrongPassword => "WRONG_PASSWORD",
            Self::Throttled => "THROTTLED",
            Self::NotFound => "NOT_FOUND",
            _ => "INTERNAL",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Storage and internal details stay in the log.
        let error = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "internal error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error,
            code: self.error_code(),
            locked: matches!(self, Self::Locked),
        };
        (status, Json(body)).into_response()
    }
}
