use axum::Router;

pub mod authors;
pub mod posts;
pub mod system;

/// Router for all resource endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/authors", authors::router())
        .nest("/posts", posts::router())
}
