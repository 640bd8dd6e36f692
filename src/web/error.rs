use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn todo_not_found(id: impl std::fmt::Display) -> Self {
        AppError::NotFound(format!("Todo with ID {id} not found"))
    }

    pub fn tag_not_found(id: impl std::fmt::Display) -> Self {
        AppError::NotFound(format!("Tag with ID {id} not found"))
    }

    pub fn association_not_found(todo_id: impl std::fmt::Display, tag_id: impl std::fmt::Display) -> Self {
        AppError::NotFound(format!(
            "No association found between Todo ID {todo_id} and Tag ID {tag_id}"
        ))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::InvalidInput(msg) | AppError::NotFound(msg) => {
                serde_json::json!({ "error": msg })
            }
            AppError::DatabaseError(msg) => {
                error!(error = %msg, "Store failure while handling request.");
                serde_json::json!({
                    "message": "Internal server error",
                    "error": format!("Database error: {msg}"),
                })
            }
            AppError::InternalServerError(msg) => {
                error!(error = %msg, "Internal failure while handling request.");
                serde_json::json!({ "message": "Internal server error", "error": msg })
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InternalServerError(format!("JSON serialization/deserialization error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_body_has_only_error() {
        let (status, body) = body_json(AppError::todo_not_found(999)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, serde_json::json!({ "error": "Todo with ID 999 not found" }));
    }

    #[tokio::test]
    async fn test_invalid_input_is_bad_request() {
        let (status, body) =
            body_json(AppError::InvalidInput("\"title\" is a required field".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "\"title\" is a required field");
    }

    #[tokio::test]
    async fn test_store_failure_carries_message_and_error() {
        let err: AppError = sea_orm::DbErr::Custom("connection reset".into()).into();
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
        assert!(body["error"].as_str().unwrap().contains("connection reset"));
    }
}
