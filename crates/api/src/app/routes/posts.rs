use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;

use inkpost_blog::{NewPost, PostDetail, PostListItem, PostWithAuthor};
use inkpost_core::PostId;
use inkpost_infra::{AuthorStore, PostStore};

use crate::app::dto::{self, ValidJson};
use crate::app::errors::ApiError;
use crate::app::services::{AppServices, POST_LIST_LIMIT};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/:id", get(get_post).put(update_post).delete(delete_post))
}

fn not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("Post {id} not found"))
}

/// Malformed ids cannot resolve to a post.
fn parse_post_id(id: &str) -> Result<PostId, ApiError> {
    id.parse().map_err(|_| not_found(id))
}

pub async fn list_posts(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Response, ApiError> {
    let posts = services.posts().list_posts(POST_LIST_LIMIT).await?;
    let posts: Vec<PostListItem> = services
        .resolve_posts(posts)
        .await?
        .iter()
        .map(PostListItem::from)
        .collect();

    Ok((StatusCode::OK, Json(dto::PostListResponse { posts })).into_response())
}

pub async fn get_post(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let post_id = parse_post_id(&id)?;
    let post = services
        .posts()
        .get_post(post_id)
        .await?
        .ok_or_else(|| not_found(&id))?;

    let joined = services.resolve_post(post).await?;
    Ok((StatusCode::OK, Json(PostDetail::from(&joined))).into_response())
}

pub async fn create_post(
    Extension(services): Extension<Arc<AppServices>>,
    ValidJson(body): ValidJson<dto::CreatePostRequest>,
) -> Result<Response, ApiError> {
    let new = NewPost::from_fields(body.title, body.content, body.author_id)?;

    let new_author_id = new.author;
    let author = services
        .authors()
        .get_author(new_author_id)
        .await?
        .ok_or_else(|| ApiError::Validation(format!("Author {new_author_id} does not exist")))?;

    let post = new.into_post(PostId::new(), Utc::now());
    services.posts().insert_post(post.clone()).await?;

    let joined = PostWithAuthor::new(post, author)
        .ok_or_else(|| ApiError::Internal("created post lost its author".into()))?;
    tracing::info!(post_id = %joined.post().id, author_id = %new_author_id, "post created");
    Ok((StatusCode::CREATED, Json(PostDetail::from(&joined))).into_response())
}

pub async fn update_post(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<dto::UpdatePostRequest>,
) -> Result<Response, ApiError> {
    dto::ensure_matching_ids(&id, body.id.as_deref())?;
    let post_id = parse_post_id(&id)?;
    let changes = body.into_changes();

    let mut post = services
        .posts()
        .get_post(post_id)
        .await?
        .ok_or_else(|| not_found(&id))?;

    if changes.is_empty() {
        tracing::debug!(post_id = %post.id, "post update carried no changes");
    } else {
        changes.apply(&mut post);
        if !services.posts().update_post(post.clone()).await? {
            return Err(not_found(&id));
        }
        tracing::info!(post_id = %post.id, "post updated");
    }

    let joined = services.resolve_post(post).await?;
    Ok((StatusCode::OK, Json(PostDetail::from(&joined))).into_response())
}

pub async fn delete_post(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    // A malformed id names no stored post, same as an unknown one.
    let Ok(post_id) = id.parse::<PostId>() else {
        tracing::debug!(post_id = %id, "delete of malformed post id ignored");
        return Ok(StatusCode::OK.into_response());
    };
    let removed = services.posts().delete_post(post_id).await?;

    tracing::info!(post_id = %post_id, removed, "post deleted");
    Ok(StatusCode::OK.into_response())
}
