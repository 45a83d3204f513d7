//! Error taxonomy of the HTTP surface and its JSON rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::catches::FeedError;
use crate::images::ImageError;
use crate::players::RegistryError;
use crate::sheets::GatewayError;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Missing or invalid request field.
    #[error("{0}")]
    InvalidInput(String),
    #[error("players sheet unavailable: {0}")]
    BackingStore(String),
    #[error("catch feed unavailable: {0}")]
    FeedUnavailable(String),
    /// Nothing to pick from; the message names what was empty.
    #[error("{0}")]
    EmptySequence(String),
    #[error("{0}")]
    ResourceNotFound(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        let (error, details) = match self {
            AppError::BackingStore(d) => {
                ("Failed to access players sheet".to_string(), Some(d.clone()))
            }
            AppError::FeedUnavailable(d) => {
                ("Failed to read receivers sheet".to_string(), Some(d.clone()))
            }
            AppError::InvalidInput(m)
            | AppError::EmptySequence(m)
            | AppError::ResourceNotFound(m) => (m.clone(), None),
        };
        ErrorBody { error, details }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        AppError::BackingStore(err.to_string())
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            invalid @ (RegistryError::MissingName | RegistryError::ReservedName(_)) => {
                AppError::InvalidInput(invalid.to_string())
            }
            RegistryError::Store(e) => e.into(),
        }
    }
}

impl From<FeedError> for AppError {
    fn from(err: FeedError) -> Self {
        AppError::FeedUnavailable(err.to_string())
    }
}

impl From<ImageError> for AppError {
    fn from(err: ImageError) -> Self {
        AppError::ResourceNotFound(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(AppError::InvalidInput("Missing name".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::BackingStore("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::FeedUnavailable("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::EmptySequence("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::ResourceNotFound("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn upstream_errors_carry_details() {
        let body = serde_json::to_value(AppError::from(GatewayError::TabNotFound("Players".into())).body()).unwrap();
        assert_eq!(body["error"], "Failed to access players sheet");
        assert_eq!(body["details"], "tab not found: Players");
    }

    #[test]
    fn client_errors_have_no_details() {
        let body = serde_json::to_value(AppError::from(RegistryError::MissingName).body()).unwrap();
        assert_eq!(body["error"], "Missing name");
        assert!(body.get("details").is_none());
    }
}
