use axum::response::{IntoResponse, Response};
use http::StatusCode;
use thiserror::Error;

use crate::models::ErrorBody;

/// Failures surfaced by the relay endpoint.
///
/// The `Display` text of each variant is exactly what the caller sees in the `error` field.
/// Underlying causes (provider bodies, transport errors) are logged where they occur and
/// are never carried in here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("provider API key not configured on server")]
    ServiceMisconfigured,
    #[error("provider error: {}", .0.as_u16())]
    ProviderError(StatusCode),
    #[error("internal server error")]
    InternalError,
}

impl RelayError {
    /// HTTP status reported to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::MissingField(_) => StatusCode::BAD_REQUEST,
            RelayError::ServiceMisconfigured | RelayError::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            RelayError::ProviderError(status) => *status,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status(), axum::Json(self.body())).into_response()
    }
}

/// Failures seen by the conversation client when calling the relay endpoint.
///
/// The `Display` text becomes the detail of the apology turn.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Server(String),
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}
