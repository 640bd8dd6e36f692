use axum::{http::Method, middleware as axum_middleware, routing::get, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::db::services::{AssociationManager, TagRepository, TodoRepository};
use crate::server::config::ServerConfig;
use crate::web::routes::*;

pub use crate::web::error::AppError;

pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod presenter;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub todos: TodoRepository,
    pub tags: TagRepository,
    pub associations: AssociationManager,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Wires every repository to the single store handle.
    pub fn new(db: DatabaseConnection, config: Arc<ServerConfig>) -> Self {
        let db = Arc::new(db);
        Self {
            todos: TodoRepository::new(db.clone()),
            tags: TagRepository::new(db.clone()),
            associations: AssociationManager::new(db),
            config,
        }
    }
}

async fn health_check_handler() -> &'static str {
    "OK"
}

pub fn create_axum_router(db_pool: DatabaseConnection, config: Arc<ServerConfig>) -> Router {
    let app_state = Arc::new(AppState::new(db_pool, config));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check_handler))
        .merge(todo_routes::create_todos_router())
        .merge(tag_routes::create_tags_router())
        .with_state(app_state)
        .layer(axum_middleware::from_fn(
            crate::web::middleware::request_log::log_request,
        ))
        .layer(cors)
}
