//! HTTP error mapping for the gateway.

use anicare_core::{FieldError, StoreError, ValidationError};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub(crate) enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ApiError {
    pub(crate) fn store(context: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| ApiError::Store { context, source }
    }

    /// Body that is not JSON at all, reported with the same shape as a field failure.
    pub(crate) fn malformed(subject: &'static str, rejection: JsonRejection) -> Self {
        ApiError::Validation(ValidationError {
            subject,
            errors: vec![FieldError::new("body", rejection.body_text())],
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(e) => {
                tracing::debug!(target: "anicare::gateway", fields = ?e.fields(), "Rejected request: {}", e);
                let body = json!({
                    "message": format!("Invalid {}", e.subject),
                    "errors": e.errors,
                });
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "message": message }))).into_response()
            }
            ApiError::Store { context, source } => {
                tracing::error!(target: "anicare::gateway", error = %source, "{}", context);
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "message": context }))).into_response()
            }
        }
    }
}
