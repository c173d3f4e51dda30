//! Shared utilities for integration tests.

use std::net::SocketAddr;

use axum::{extract::Request, http::HeaderMap, Router};
use tokio::net::TcpListener;

/// Start an upstream that answers every request with its method and target,
/// e.g. `GET /user/1/order/2?x=1`.
pub async fn start_echo_backend() -> SocketAddr {
    let app = Router::new().fallback(|req: Request| async move {
        let target = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_default();
        let mut headers = HeaderMap::new();
        if let Some(id) = req.headers().get("x-request-id") {
            headers.insert("x-seen-request-id", id.clone());
        }
        (headers, format!("{} {}", req.method(), target))
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// An address nothing is listening on.
#[allow(dead_code)]
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}
