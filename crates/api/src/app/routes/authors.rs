use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};

use inkpost_blog::{AuthorSummary, CreatedAuthor, NewAuthor};
use inkpost_core::AuthorId;
use inkpost_infra::{AuthorStore, PostStore};

use crate::app::dto::{self, ValidJson};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_authors).post(create_author))
        .route("/:id", put(update_author).delete(delete_author))
}

pub async fn list_authors(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Response, ApiError> {
    let authors: Vec<AuthorSummary> = services
        .authors()
        .list_authors()
        .await?
        .iter()
        .map(AuthorSummary::from)
        .collect();

    Ok((StatusCode::OK, Json(dto::AuthorListResponse { authors })).into_response())
}

pub async fn create_author(
    Extension(services): Extension<Arc<AppServices>>,
    ValidJson(body): ValidJson<dto::CreateAuthorRequest>,
) -> Result<Response, ApiError> {
    let new = NewAuthor::from_fields(body.first_name, body.last_name, body.user_name)?;

    services.ensure_user_name_available(&new.user_name, None).await?;

    let author = new.into_author(AuthorId::new());
    services.authors().insert_author(author.clone()).await?;

    tracing::info!(author_id = %author.id, user_name = %author.user_name, "author created");
    Ok((StatusCode::OK, Json(CreatedAuthor::from(&author))).into_response())
}

pub async fn update_author(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<dto::UpdateAuthorRequest>,
) -> Result<Response, ApiError> {
    dto::ensure_matching_ids(&id, body.id.as_deref())?;
    let author_id: AuthorId = id.parse()?;
    let changes = body.into_changes();

    let mut author = services
        .authors()
        .get_author(author_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Author {id} not found")))?;

    if changes.is_empty() {
        tracing::debug!(author_id = %author.id, "author update carried no changes");
        return Ok((StatusCode::OK, Json(AuthorSummary::from(&author))).into_response());
    }

    services
        .ensure_user_name_available(changes.resulting_user_name(&author), Some(author_id))
        .await?;

    changes.apply(&mut author);
    if !services.authors().update_author(author.clone()).await? {
        return Err(ApiError::NotFound(format!("Author {id} not found")));
    }

    tracing::info!(author_id = %author.id, "author updated");
    Ok((StatusCode::OK, Json(AuthorSummary::from(&author))).into_response())
}

pub async fn delete_author(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let author_id: AuthorId = id.parse()?;

    // Posts go first: if this fails the author must survive.
    let removed_posts = services.posts().delete_posts_by_author(author_id).await?;
    let removed = services.authors().delete_author(author_id).await?;

    tracing::info!(author_id = %author_id, removed, removed_posts, "author deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}
