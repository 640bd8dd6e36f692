use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::web::extract::{self, AppJson};
use crate::web::models::tag_models::{CreateTagRequest, UpdateTagRequest};
use crate::web::presenter::{ResourceUrls, TagView, TodoView};
use crate::web::{AppError, AppState};

// --- Route Handlers ---

async fn list_tags_handler(
    State(app_state): State<Arc<AppState>>,
    urls: ResourceUrls,
) -> Result<Json<Vec<TagView>>, AppError> {
    let tags = app_state.tags.list_all().await?;
    Ok(Json(
        tags.into_iter().map(|t| urls.tag_with_todos(t)).collect(),
    ))
}

async fn create_tag_handler(
    State(app_state): State<Arc<AppState>>,
    urls: ResourceUrls,
    AppJson(payload): AppJson<CreateTagRequest>,
) -> Result<(StatusCode, Json<TagView>), AppError> {
    let tag = app_state.tags.create(payload).await?;
    Ok((StatusCode::CREATED, Json(urls.tag(tag))))
}

async fn clear_tags_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<StatusCode, AppError> {
    app_state.tags.delete_all().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_tag_handler(
    State(app_state): State<Arc<AppState>>,
    urls: ResourceUrls,
    Path(raw_id): Path<String>,
) -> Result<Json<TagView>, AppError> {
    let tag_id = extract::tag_id(&raw_id)?;
    let tag = app_state.tags.get_one(tag_id).await?;
    Ok(Json(urls.tag_with_todos(tag)))
}

async fn update_tag_handler(
    State(app_state): State<Arc<AppState>>,
    urls: ResourceUrls,
    Path(raw_id): Path<String>,
    AppJson(payload): AppJson<UpdateTagRequest>,
) -> Result<Json<TagView>, AppError> {
    let tag_id = extract::tag_id(&raw_id)?;
    let tag = app_state.tags.update(tag_id, payload).await?;
    Ok(Json(urls.tag_with_todos(tag)))
}

async fn delete_tag_handler(
    State(app_state): State<Arc<AppState>>,
    urls: ResourceUrls,
    Path(raw_id): Path<String>,
) -> Result<Json<TagView>, AppError> {
    let tag_id = extract::tag_id(&raw_id)?;
    let deleted = app_state.tags.delete_one(tag_id).await?;
    Ok(Json(urls.tag(deleted)))
}

async fn list_tag_todos_handler(
    State(app_state): State<Arc<AppState>>,
    urls: ResourceUrls,
    Path(raw_id): Path<String>,
) -> Result<Json<Vec<TodoView>>, AppError> {
    let tag_id = extract::parse_id(&raw_id).ok_or_else(|| {
        AppError::NotFound(format!("Tag with ID {raw_id} not found or has no todos"))
    })?;
    let todos = app_state.associations.list_for_tag(tag_id).await?;
    Ok(Json(todos.into_iter().map(|t| urls.todo(t)).collect()))
}

// --- Router ---

pub fn create_tags_router() -> Router<Arc<AppState>> {
    let collection = get(list_tags_handler)
        .post(create_tag_handler)
        .delete(clear_tags_handler);
    let tag_todos = get(list_tag_todos_handler);

    Router::new()
        .route("/tags", collection.clone())
        .route("/tags/", collection)
        .route(
            "/tags/{id}",
            get(get_tag_handler)
                .patch(update_tag_handler)
                .delete(delete_tag_handler),
        )
        .route("/tags/{id}/todos", tag_todos.clone())
        .route("/tags/{id}/todos/", tag_todos)
}
