use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

/// Log method, path, status and latency of every request.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let elapsed = start.elapsed();
    if status.is_server_error() {
        log::error!("{} {} -> {} ({:.1?})", method, path, status.as_u16(), elapsed);
    } else {
        log::info!("{} {} -> {} ({:.1?})", method, path, status.as_u16(), elapsed);
    }
    response
}
