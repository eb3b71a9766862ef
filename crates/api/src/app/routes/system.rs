use axum::http::StatusCode;

/// Liveness probe. Does not touch the store.
pub async fn health() -> StatusCode {
    StatusCode::OK
}
