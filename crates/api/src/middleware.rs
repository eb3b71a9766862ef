use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};

/// Emit one `info` event per request: method, path, status and latency.
pub async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let res = next.run(req).await;

    tracing::info!(
        %method,
        path,
        status = res.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "request handled"
    );

    res
}
