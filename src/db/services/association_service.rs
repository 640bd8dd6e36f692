use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::db::entities::{tag, todo, todo_tag};
use crate::web::error::AppError;

/// The raw (todo, tag) pair of a removed link.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssociationPair {
    pub todo_id: i32,
    pub tag_id: i32,
}

#[derive(FromQueryResult, Debug)]
struct LinkedTagRow {
    tag_id: Option<i32>,
    tag_title: Option<String>,
}

#[derive(FromQueryResult, Debug)]
struct LinkedTodoRow {
    todo_id: Option<i32>,
    title: Option<String>,
    completed: Option<bool>,
    order: Option<i32>,
}

/// Maintains the `todo_tags` link table.
#[derive(Clone)]
pub struct AssociationManager {
    db: Arc<DatabaseConnection>,
}

impl AssociationManager {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Links a tag to an existing todo. The tag itself is not checked and an
    /// already existing link is stored again.
    pub async fn link(&self, todo_id: i32, tag_id: i32) -> Result<todo_tag::Model, AppError> {
        let txn = self.db.begin().await?;

        if todo::Entity::find_by_id(todo_id).one(&txn).await?.is_none() {
            return Err(AppError::todo_not_found(todo_id));
        }
        let link = todo_tag::ActiveModel {
            todo_id: Set(todo_id),
            tag_id: Set(tag_id),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        debug!(todo_id, tag_id, "Tag linked to todo.");
        Ok(link)
    }

    /// Tags linked to a todo. An unknown todo simply has no tags, and links
    /// to tags that no longer exist are skipped.
    pub async fn list_for_todo(&self, todo_id: i32) -> Result<Vec<tag::Model>, AppError> {
        let rows = todo_tag::Entity::find()
            .select_only()
            .column_as(tag::Column::Id, "tag_id")
            .column_as(tag::Column::Title, "tag_title")
            .join(JoinType::LeftJoin, todo_tag::Relation::Tag.def())
            .filter(todo_tag::Column::TodoId.eq(todo_id))
            .order_by_asc(todo_tag::Column::Id)
            .into_model::<LinkedTagRow>()
            .all(self.db.as_ref())
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                row.tag_id.map(|id| tag::Model {
                    id,
                    title: row.tag_title.unwrap_or_default(),
                })
            })
            .collect())
    }

    /// Todos linked to a tag. Unlike [`Self::list_for_todo`], an empty result
    /// is reported as not found.
    pub async fn list_for_tag(&self, tag_id: i32) -> Result<Vec<todo::Model>, AppError> {
        let rows = todo_tag::Entity::find()
            .select_only()
            .column(todo::Column::Id)
            .column(todo::Column::Title)
            .column(todo::Column::Completed)
            .column(todo::Column::Order)
            .join(JoinType::LeftJoin, todo_tag::Relation::Todo.def())
            .filter(todo_tag::Column::TagId.eq(tag_id))
            .order_by_asc(todo_tag::Column::Id)
            .into_model::<LinkedTodoRow>()
            .all(self.db.as_ref())
            .await?;

        let todos: Vec<todo::Model> = rows
            .into_iter()
            .filter_map(|row| {
                row.todo_id.map(|id| todo::Model {
                    id,
                    title: row.title,
                    completed: row.completed.unwrap_or(false),
                    order: row.order.unwrap_or(0),
                })
            })
            .collect();

        if todos.is_empty() {
            return Err(AppError::NotFound(format!(
                "Tag with ID {tag_id} not found or has no todos"
            )));
        }
        Ok(todos)
    }

    pub async fn unlink_all(&self, todo_id: i32) -> Result<u64, AppError> {
        let txn = self.db.begin().await?;

        if todo::Entity::find_by_id(todo_id).one(&txn).await?.is_none() {
            return Err(AppError::todo_not_found(todo_id));
        }
        let unlinked = todo_tag::Entity::delete_many()
            .filter(todo_tag::Column::TodoId.eq(todo_id))
            .exec(&txn)
            .await?
            .rows_affected;
        txn.commit().await?;

        debug!(todo_id, unlinked, "All tags unlinked from todo.");
        Ok(unlinked)
    }

    /// Removes the link between a todo and a tag (every duplicate of it) with
    /// a single conditional delete.
    pub async fn unlink_one(&self, todo_id: i32, tag_id: i32) -> Result<AssociationPair, AppError> {
        let result = todo_tag::Entity::delete_many()
            .filter(todo_tag::Column::TodoId.eq(todo_id))
            .filter(todo_tag::Column::TagId.eq(tag_id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::association_not_found(todo_id, tag_id));
        }
        debug!(todo_id, tag_id, removed = result.rows_affected, "Tag unlinked from todo.");
        Ok(AssociationPair { todo_id, tag_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::services::test_support::memory_db;
    use crate::db::services::{TagRepository, TodoRepository};
    use crate::web::models::tag_models::CreateTagRequest;
    use crate::web::models::todo_models::CreateTodoRequest;
    use serde_json::json;

    struct Fixture {
        todos: TodoRepository,
        tags: TagRepository,
        links: AssociationManager,
    }

    async fn fixture() -> Fixture {
        let db = memory_db().await;
        Fixture {
            todos: TodoRepository::new(db.clone()),
            tags: TagRepository::new(db.clone()),
            links: AssociationManager::new(db),
        }
    }

    impl Fixture {
        async fn todo(&self, title: &str) -> todo::Model {
            self.todos
                .create(CreateTodoRequest {
                    title: Some(title.to_string()),
                    ..Default::default()
                })
                .await
                .unwrap()
        }

        async fn tag(&self, title: &str) -> tag::Model {
            self.tags
                .create(CreateTagRequest { title: Some(json!(title)) })
                .await
                .unwrap()
        }
    }

    #[tokio::test]
    async fn test_link_is_visible_from_both_sides() {
        let f = fixture().await;
        let todo = f.todo("Buy milk").await;
        let tag = f.tag("errand").await;

        f.links.link(todo.id, tag.id).await.unwrap();

        assert_eq!(f.links.list_for_todo(todo.id).await.unwrap(), vec![tag.clone()]);
        assert_eq!(f.links.list_for_tag(tag.id).await.unwrap(), vec![todo]);
    }

    #[tokio::test]
    async fn test_link_requires_existing_todo_but_not_tag() {
        let f = fixture().await;
        assert!(matches!(f.links.link(7, 1).await, Err(AppError::NotFound(_))));

        let todo = f.todo("dangling").await;
        f.links.link(todo.id, 404).await.unwrap();
        assert!(f.links.list_for_todo(todo.id).await.unwrap().is_empty());
        assert!(f.todos.get_one(todo.id).await.unwrap().related.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_links_are_kept() {
        let f = fixture().await;
        let todo = f.todo("twice").await;
        let tag = f.tag("again").await;

        f.links.link(todo.id, tag.id).await.unwrap();
        f.links.link(todo.id, tag.id).await.unwrap();

        assert_eq!(f.links.list_for_todo(todo.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_for_todo_empty_but_list_for_tag_not_found() {
        let f = fixture().await;
        let todo = f.todo("lonely").await;
        let tag = f.tag("unused").await;

        assert!(f.links.list_for_todo(todo.id).await.unwrap().is_empty());
        match f.links.list_for_tag(tag.id).await {
            Err(AppError::NotFound(msg)) => {
                assert_eq!(msg, format!("Tag with ID {} not found or has no todos", tag.id))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unlink_one_removes_link() {
        let f = fixture().await;
        let todo = f.todo("Buy milk").await;
        let keep = f.tag("keep").await;
        let removed = f.tag("removed").await;
        f.links.link(todo.id, keep.id).await.unwrap();
        f.links.link(todo.id, removed.id).await.unwrap();

        let pair = f.links.unlink_one(todo.id, removed.id).await.unwrap();

        assert_eq!(pair, AssociationPair { todo_id: todo.id, tag_id: removed.id });
        assert_eq!(f.links.list_for_todo(todo.id).await.unwrap(), vec![keep]);
        assert!(matches!(
            f.links.unlink_one(todo.id, removed.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unlink_all_checks_todo_then_clears() {
        let f = fixture().await;
        assert!(matches!(f.links.unlink_all(1).await, Err(AppError::NotFound(_))));

        let todo = f.todo("busy").await;
        let a = f.tag("a").await;
        let b = f.tag("b").await;
        f.links.link(todo.id, a.id).await.unwrap();
        f.links.link(todo.id, b.id).await.unwrap();

        assert_eq!(f.links.unlink_all(todo.id).await.unwrap(), 2);
        assert!(f.links.list_for_todo(todo.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleting_tag_leaves_todo_listing_clean() {
        let f = fixture().await;
        let todo = f.todo("Buy milk").await;
        let tag = f.tag("errand").await;
        f.links.link(todo.id, tag.id).await.unwrap();

        f.tags.delete_one(tag.id).await.unwrap();

        assert!(f.links.list_for_todo(todo.id).await.unwrap().is_empty());
        assert!(f.todos.get_one(todo.id).await.unwrap().related.is_empty());
    }
}
