use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use inkpost_blog::{AuthorChanges, AuthorSummary, PostChanges, PostListItem};

use crate::app::errors::ApiError;

// -------------------------
// Body extraction
// -------------------------

/// JSON body extractor whose rejections are reported as validation errors
/// in the service's error format instead of the framework's default.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Path and body must name the same record.
pub fn ensure_matching_ids(path_id: &str, body_id: Option<&str>) -> Result<(), ApiError> {
    match body_id {
        Some(body_id) if !path_id.is_empty() && body_id == path_id => Ok(()),
        other => Err(ApiError::Validation(format!(
            "Request path id ({path_id}) and request body id ({}) have to match",
            other.unwrap_or("undefined")
        ))),
    }
}

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuthorRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAuthorRequest {
    pub id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_name: Option<String>,
}

impl UpdateAuthorRequest {
    pub fn into_changes(self) -> AuthorChanges {
        AuthorChanges {
            first_name: self.first_name,
            last_name: self.last_name,
            user_name: self.user_name,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub author_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePostRequest {
    pub id: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
}

impl UpdatePostRequest {
    pub fn into_changes(self) -> PostChanges {
        PostChanges {
            title: self.title,
            content: self.content,
        }
    }
}

// -------------------------
// Response envelopes
// -------------------------

#[derive(Debug, Serialize)]
pub struct AuthorListResponse {
    pub authors: Vec<AuthorSummary>,
}

#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub posts: Vec<PostListItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_ids_pass() {
        assert!(ensure_matching_ids("abc", Some("abc")).is_ok());
    }

    #[test]
    fn mismatched_or_missing_body_id_is_rejected() {
        let err = ensure_matching_ids("abc", Some("xyz")).unwrap_err();
        assert_eq!(
            err,
            ApiError::Validation(
                "Request path id (abc) and request body id (xyz) have to match".into()
            )
        );

        let err = ensure_matching_ids("abc", None).unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref m) if m.contains("(undefined)")));
    }

    #[test]
    fn update_author_request_keeps_only_sent_fields() {
        let req: UpdateAuthorRequest =
            serde_json::from_value(serde_json::json!({ "id": "1", "userName": "new" })).unwrap();
        let changes = req.into_changes();
        assert_eq!(changes.user_name.as_deref(), Some("new"));
        assert!(changes.first_name.is_none());
        assert!(changes.last_name.is_none());
    }

    #[test]
    fn post_requests_use_flat_author_id() {
        let req: CreatePostRequest = serde_json::from_value(serde_json::json!({
            "title": "t",
            "content": "c",
            "author_id": "42",
        }))
        .unwrap();
        assert_eq!(req.author_id.as_deref(), Some("42"));
    }
}
