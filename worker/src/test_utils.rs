use std::{net::SocketAddr, time::Duration};

use axum::{http::StatusCode, routing::get, Router};
use tokio::net::TcpListener;

/// Router con páginas fijas para los tests.
pub fn test_router() -> Router {
    Router::new()
        .route("/hello", get(|| async { "hello hello world" }))
        .route("/world", get(|| async { "world world world" }))
        .route(
            "/fox",
            get(|| async { "The quick brown fox jumps over the lazy dog" }),
        )
        .route(
            "/error",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error") }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "hello world"
            }),
        )
}

/// Levanta el router en 127.0.0.1 con un puerto libre y devuelve la dirección.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Dirección donde nadie escucha: cualquier conexión se rechaza.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
