//! Axum HTTP server wiring for the GraphQL endpoint.

use std::net::SocketAddr;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::get;
use axum::routing::post;
use http::HeaderMap;

use crate::graphql;
use crate::services::ExecutionService;

/// Build the main http router
pub fn main_router(service: ExecutionService) -> Router {
    Router::new()
        .route("/graphql", post(handle_graphql))
        .route("/health", get(health_check))
        .with_state(service)
}

async fn handle_graphql(
    State(service): State<ExecutionService>,
    headers: HeaderMap,
    Json(request): Json<graphql::Request>,
) -> Json<graphql::Response> {
    Json(service.execute(request, &headers).await)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "UP" }))
}

/// Bind the listener and serve until ctrl-c.
pub(crate) async fn serve(
    listen: SocketAddr,
    service: ExecutionService,
) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(listen).await?;
    tracing::info!("GraphQL endpoint exposed at http://{}/graphql 🚀", listener.local_addr()?);
    axum::serve(listener, main_router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    // serve until the process is asked to stop
    let _ = tokio::signal::ctrl_c().await;
}
