use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use inkpost_core::DomainError;
use inkpost_infra::StoreError;

/// Message sent to clients for every internal failure.
pub const INTERNAL_MESSAGE: &str = "Internal server error";

/// Error returned by request handlers.
///
/// `Internal` carries the underlying cause for the server log only; clients
/// always receive [`INTERNAL_MESSAGE`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Conflict(_) => "conflict",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => Self::Validation(msg),
            DomainError::InvalidId(msg) => Self::Validation(msg),
            DomainError::NotFound(msg) => Self::NotFound(msg),
            DomainError::Conflict(msg) => Self::Conflict(msg),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUserName(user_name) => Self::Conflict(user_name_taken(&user_name)),
            StoreError::Backend(msg) => Self::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        match self {
            Self::Internal(cause) => {
                tracing::error!(%cause, "request failed");
                json_error(status, code, INTERNAL_MESSAGE)
            }
            Self::Conflict(msg) => {
                tracing::info!(%msg, "request conflicted");
                json_error(status, code, msg)
            }
            Self::Validation(msg) | Self::NotFound(msg) => {
                tracing::debug!(%msg, code, "request rejected");
                json_error(status, code, msg)
            }
        }
    }
}

pub fn user_name_taken(user_name: &str) -> String {
    format!("Username {user_name} already taken")
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_status_codes() {
        assert_eq!(ApiError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Conflict("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn store_errors_map_to_conflict_or_internal() {
        assert_eq!(
            ApiError::from(StoreError::DuplicateUserName("kim".into())),
            ApiError::Conflict("Username kim already taken".into())
        );
        assert!(matches!(
            ApiError::from(StoreError::Backend("socket closed".into())),
            ApiError::Internal(_)
        ));
    }

    #[test]
    fn domain_errors_keep_their_message() {
        let err = ApiError::from(DomainError::missing_field("title"));
        assert_eq!(
            err,
            ApiError::Validation("Missing required field title in request body".into())
        );
        assert!(matches!(
            ApiError::from(DomainError::invalid_id("AuthorId: bad")),
            ApiError::Validation(_)
        ));
    }

    #[test]
    fn internal_response_hides_cause() {
        let res = ApiError::Internal("connection refused to 10.0.0.3".into()).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
