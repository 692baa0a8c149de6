// rest/mod.rs — HTTP API server.
//
// Axum server exposing the task/tag CRUD surface. All task/tag responses use
// the uniform envelope in `envelope.rs`.
//
// Endpoints:
//   GET    /tasks?sortBy=&sortOrder=&page=&total=
//   POST   /tasks/create
//   PUT    /tasks/{id}
//   DELETE /tasks/{id}
//   GET    /tags?page=&total=
//   GET    /tags/{id}
//   DELETE /tags/{id}
//   GET    /health

pub mod envelope;
pub mod routes;

use anyhow::Result;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::AppContext;

pub async fn start_rest_server(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    info!("REST API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        // Health
        .route("/health", get(routes::health::health))
        // Tasks
        .route("/tasks", get(routes::tasks::list_tasks))
        .route("/tasks/create", post(routes::tasks::create_task))
        .route(
            "/tasks/{id}",
            put(routes::tasks::update_task).delete(routes::tasks::delete_task),
        )
        // Tags
        .route("/tags", get(routes::tags::list_tags))
        .route(
            "/tags/{id}",
            get(routes::tags::get_tag).delete(routes::tags::delete_tag),
        )
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}
