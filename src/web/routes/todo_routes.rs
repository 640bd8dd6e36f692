use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::db::services::AssociationPair;
use crate::web::extract::{self, AppJson};
use crate::web::models::tag_models::{tag_id_from_body, LinkTagRequest};
use crate::web::models::todo_models::{CreateTodoRequest, UpdateTodoRequest};
use crate::web::presenter::{ResourceUrls, TagView, TodoView};
use crate::web::{AppError, AppState};

// --- Todo Handlers ---

async fn list_todos_handler(
    State(app_state): State<Arc<AppState>>,
    urls: ResourceUrls,
) -> Result<Json<Vec<TodoView>>, AppError> {
    let todos = app_state.todos.list_all().await?;
    Ok(Json(
        todos.into_iter().map(|t| urls.todo_with_tags(t)).collect(),
    ))
}

async fn create_todo_handler(
    State(app_state): State<Arc<AppState>>,
    urls: ResourceUrls,
    AppJson(payload): AppJson<CreateTodoRequest>,
) -> Result<(StatusCode, Json<TodoView>), AppError> {
    let todo = app_state.todos.create(payload).await?;
    Ok((StatusCode::CREATED, Json(urls.todo(todo))))
}

async fn clear_todos_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<StatusCode, AppError> {
    app_state.todos.delete_all().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_todo_handler(
    State(app_state): State<Arc<AppState>>,
    urls: ResourceUrls,
    Path(raw_id): Path<String>,
) -> Result<Json<TodoView>, AppError> {
    let todo_id = extract::todo_id(&raw_id)?;
    let todo = app_state.todos.get_one(todo_id).await?;
    Ok(Json(urls.todo_with_tags(todo)))
}

async fn update_todo_handler(
    State(app_state): State<Arc<AppState>>,
    urls: ResourceUrls,
    Path(raw_id): Path<String>,
    AppJson(payload): AppJson<UpdateTodoRequest>,
) -> Result<Json<TodoView>, AppError> {
    let todo_id = extract::todo_id(&raw_id)?;
    let todo = app_state.todos.update(todo_id, payload).await?;
    Ok(Json(urls.todo_with_tags(todo)))
}

async fn delete_todo_handler(
    State(app_state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let todo_id = extract::todo_id(&raw_id)?;
    app_state.todos.delete_one(todo_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Todo/Tag Association Handlers ---

async fn list_todo_tags_handler(
    State(app_state): State<Arc<AppState>>,
    urls: ResourceUrls,
    Path(raw_id): Path<String>,
) -> Result<Json<Vec<TagView>>, AppError> {
    // Listing the tags of an unknown todo is an empty list, never a 404.
    let Some(todo_id) = extract::parse_id(&raw_id) else {
        return Ok(Json(Vec::new()));
    };
    let tags = app_state.associations.list_for_todo(todo_id).await?;
    Ok(Json(tags.into_iter().map(|t| urls.tag(t)).collect()))
}

async fn link_tag_handler(
    State(app_state): State<Arc<AppState>>,
    urls: ResourceUrls,
    Path(raw_id): Path<String>,
    AppJson(body): AppJson<LinkTagRequest>,
) -> Result<Json<Map<String, Value>>, AppError> {
    let tag_id = tag_id_from_body(&body)?;
    let todo_id = extract::todo_id(&raw_id)?;
    app_state.associations.link(todo_id, tag_id).await?;
    Ok(Json(urls.linked_tag(tag_id, body)))
}

async fn unlink_all_tags_handler(
    State(app_state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let todo_id = extract::todo_id(&raw_id)?;
    app_state.associations.unlink_all(todo_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn unlink_tag_handler(
    State(app_state): State<Arc<AppState>>,
    Path((raw_todo_id, raw_tag_id)): Path<(String, String)>,
) -> Result<Json<AssociationPair>, AppError> {
    let (Some(todo_id), Some(tag_id)) = (
        extract::parse_id(&raw_todo_id),
        extract::parse_id(&raw_tag_id),
    ) else {
        return Err(AppError::association_not_found(raw_todo_id, raw_tag_id));
    };
    let pair = app_state.associations.unlink_one(todo_id, tag_id).await?;
    Ok(Json(pair))
}

// --- Router ---

pub fn create_todos_router() -> Router<Arc<AppState>> {
    let collection = get(list_todos_handler)
        .post(create_todo_handler)
        .delete(clear_todos_handler);
    let todo_tags = get(list_todo_tags_handler)
        .post(link_tag_handler)
        .delete(unlink_all_tags_handler);

    Router::new()
        .route("/todos", collection.clone())
        .route("/todos/", collection)
        .route(
            "/todos/{id}",
            get(get_todo_handler)
                .patch(update_todo_handler)
                .delete(delete_todo_handler),
        )
        .route("/todos/{id}/tags", todo_tags.clone())
        .route("/todos/{id}/tags/", todo_tags)
        .route(
            "/todos/{id}/tags/{tag_id}",
            axum::routing::delete(unlink_tag_handler),
        )
}
