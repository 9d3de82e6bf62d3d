use axum::{
    Json,
    response::{IntoResponse, Response},
};
use http::StatusCode;
use serde_json::json;

use crate::api::KindError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppError {
    pub message: String,
    /// Status used when the error ends an HTTP request.
    pub status: StatusCode,
}

impl AppError {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

#[macro_export]
macro_rules! app_error {
    ($($arg:tt)*) => {
        $crate::error::AppError::new(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! app_err {
    ($($arg:tt)*) => {
        Err($crate::app_error!($($arg)*))
    };
}

impl std::error::Error for AppError {}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<KindError> for AppError {
    fn from(err: KindError) -> Self {
        let status = match &err {
            KindError::Api { .. } | KindError::Transport(_) => StatusCode::BAD_GATEWAY,
            KindError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            KindError::Unsupported(_) => StatusCode::NOT_FOUND,
            KindError::Extraction(_) | KindError::Panicked(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        app_error!("{err}").with_status(status)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
