use serde::Deserialize;
use serde_json::{Map, Value};

use crate::web::error::AppError;

const TITLE_REQUIRED: &str = "\"title\" is a required field";
const TITLE_NOT_STRING: &str = "\"title\" must be a string with at least one character";
const ID_REQUIRED: &str = "\"id\" is a required field in the request body";
const ID_NOT_NUMERIC: &str = "\"id\" must be a numeric tag identifier";

/// Tag creation body. The title is kept as raw JSON so that a missing title
/// and a title of the wrong type can be told apart.
#[derive(Deserialize, Debug, Default)]
pub struct CreateTagRequest {
    #[serde(default)]
    pub title: Option<Value>,
}

#[derive(Deserialize, Debug, Default)]
pub struct UpdateTagRequest {
    #[serde(default, deserialize_with = "super::deserialize_some")]
    pub title: Option<Value>,
}

/// Body of `POST /todos/{id}/tags/`: a tag payload that must carry its `id`.
/// Every other field is echoed back untouched.
pub type LinkTagRequest = Map<String, Value>;

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

impl CreateTagRequest {
    pub fn validated_title(&self) -> Result<String, AppError> {
        match &self.title {
            None => Err(AppError::InvalidInput(TITLE_REQUIRED.to_string())),
            Some(value) if is_falsy(value) => Err(AppError::InvalidInput(TITLE_REQUIRED.to_string())),
            Some(Value::String(title)) => Ok(title.clone()),
            Some(_) => Err(AppError::InvalidInput(TITLE_NOT_STRING.to_string())),
        }
    }
}

impl UpdateTagRequest {
    /// `Ok(None)` when the title is absent and the stored one must be kept.
    pub fn validated_title(&self) -> Result<Option<String>, AppError> {
        match &self.title {
            None => Ok(None),
            Some(Value::String(title)) if !title.is_empty() => Ok(Some(title.clone())),
            Some(_) => Err(AppError::InvalidInput(TITLE_NOT_STRING.to_string())),
        }
    }
}

/// Extracts the tag identity from a link body. Accepts a JSON integer or a
/// numeric string, since identities are rendered as strings.
pub fn tag_id_from_body(body: &LinkTagRequest) -> Result<i32, AppError> {
    let value = match body.get("id") {
        Some(value) if !is_falsy(value) => value,
        _ => return Err(AppError::InvalidInput(ID_REQUIRED.to_string())),
    };
    let parsed = match value {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| AppError::InvalidInput(ID_NOT_NUMERIC.to_string()))
}
