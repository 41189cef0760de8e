//! HTTP mapping of [`Error`].
//!
//! Client errors carry their message in `{ "error": ... }`. Server-side failures are
//! logged in full and answered with a generic message.

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl Error {
    /// Status code this error is answered with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::TextRequired | Self::UnableToParseAmount | Self::Validation { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Config { .. } | Self::Database(_) | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}
