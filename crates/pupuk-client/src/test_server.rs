//! In-process backend for the client tests.

use axum::Router;
use tokio::net::TcpListener;

/// Serves `router` on an ephemeral localhost port and returns the API base
/// URL (`http://127.0.0.1:<port>/api`).
///
/// Routes must be registered under `/api`; the websocket channel under
/// `/ws/orders` as in production.
pub async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{}/api", addr)
}
