//! External JSON shapes of todos and tags.
//!
//! Every response body that carries a resource goes through [`ResourceUrls`],
//! the only place canonical URLs are built.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::db::aggregate::WithRelated;
use crate::db::entities::{tag, todo};

pub const TODOS: &str = "todos";
pub const TAGS: &str = "tags";

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TodoView {
    pub id: String,
    pub title: Option<String>,
    pub completed: bool,
    pub url: String,
    pub order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<TagView>>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TagView {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub todos: Option<Vec<TodoView>>,
}

/// Scheme and host that resource URLs are built from, resolved per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceUrls {
    scheme: String,
    host: String,
}

impl ResourceUrls {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }

    pub fn url(&self, collection: &str, id: i32) -> String {
        format!("{}://{}/{}/{}", self.scheme, self.host, collection, id)
    }

    pub fn todo(&self, model: todo::Model) -> TodoView {
        TodoView {
            id: model.id.to_string(),
            url: self.url(TODOS, model.id),
            title: model.title,
            completed: model.completed,
            order: model.order,
            tags: None,
        }
    }

    pub fn tag(&self, model: tag::Model) -> TagView {
        TagView {
            id: model.id.to_string(),
            url: self.url(TAGS, model.id),
            title: model.title,
            todos: None,
        }
    }

    pub fn todo_with_tags(&self, nested: WithRelated<todo::Model, tag::Model>) -> TodoView {
        let tags = nested.related.into_iter().map(|t| self.tag(t)).collect();
        TodoView {
            tags: Some(tags),
            ..self.todo(nested.item)
        }
    }

    pub fn tag_with_todos(&self, nested: WithRelated<tag::Model, todo::Model>) -> TagView {
        let todos = nested.related.into_iter().map(|t| self.todo(t)).collect();
        TagView {
            todos: Some(todos),
            ..self.tag(nested.item)
        }
    }

    /// Echoes a link request body with the tag's canonical `url` added.
    pub fn linked_tag(&self, tag_id: i32, mut body: Map<String, Value>) -> Map<String, Value> {
        body.insert("url".to_string(), Value::String(self.url(TAGS, tag_id)));
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn urls() -> ResourceUrls {
        ResourceUrls::new("http", "localhost:8080")
    }

    #[test]
    fn test_todo_view_matches_created_shape() {
        let view = urls().todo(todo::Model {
            id: 1,
            title: Some("Buy milk".into()),
            completed: false,
            order: 0,
        });
        assert_eq!(
            serde_json::to_value(view).unwrap(),
            json!({
                "id": "1",
                "title": "Buy milk",
                "completed": false,
                "order": 0,
                "url": "http://localhost:8080/todos/1",
            })
        );
    }

    #[test]
    fn test_nested_todo_carries_tag_urls() {
        let nested = WithRelated {
            item: todo::Model {
                id: 1,
                title: Some("Buy milk".into()),
                completed: true,
                order: 2,
            },
            related: vec![tag::Model {
                id: 1,
                title: "errand".into(),
            }],
        };
        let value = serde_json::to_value(urls().todo_with_tags(nested)).unwrap();
        assert_eq!(
            value["tags"],
            json!([{ "id": "1", "title": "errand", "url": "http://localhost:8080/tags/1" }])
        );
    }

    #[test]
    fn test_tag_without_links_serializes_empty_todos() {
        let nested = WithRelated {
            item: tag::Model {
                id: 3,
                title: "later".into(),
            },
            related: Vec::new(),
        };
        let value = serde_json::to_value(urls().tag_with_todos(nested)).unwrap();
        assert_eq!(value["todos"], json!([]));
        assert_eq!(value["url"], "http://localhost:8080/tags/3");
    }

    #[test]
    fn test_linked_tag_echoes_body() {
        let body = json!({ "id": "5", "title": "errand" });
        let echoed = urls().linked_tag(5, body.as_object().unwrap().clone());
        assert_eq!(
            Value::Object(echoed),
            json!({ "id": "5", "title": "errand", "url": "http://localhost:8080/tags/5" })
        );
    }
}
