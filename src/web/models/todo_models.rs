use serde::Deserialize;

use crate::db::entities::todo;

#[derive(Deserialize, Debug, Default)]
pub struct CreateTodoRequest {
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub order: Option<i32>,
}

/// Partial update of a todo. Absent fields keep their stored value; an
/// explicit `"title": null` clears the title.
#[derive(Deserialize, Debug, Default)]
pub struct UpdateTodoRequest {
    #[serde(default, deserialize_with = "super::deserialize_some")]
    pub title: Option<Option<String>>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub order: Option<i32>,
}

impl UpdateTodoRequest {
    pub fn merge_into(self, current: todo::Model) -> todo::Model {
        todo::Model {
            id: current.id,
            title: self.title.unwrap_or(current.title),
            completed: self.completed.unwrap_or(current.completed),
            order: self.order.unwrap_or(current.order),
        }
    }
}
