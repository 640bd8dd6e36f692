use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::debug;

use crate::db::aggregate::{fold_one, fold_rows, TodoTagRow, WithRelated};
use crate::db::entities::{tag, todo, todo_tag};
use crate::web::error::AppError;
use crate::web::models::todo_models::{CreateTodoRequest, UpdateTodoRequest};

pub type TodoWithTags = WithRelated<todo::Model, tag::Model>;

/// `todos LEFT JOIN todo_tags LEFT JOIN tags`, one row per link.
fn joined_todos() -> Select<todo::Entity> {
    todo::Entity::find()
        .select_only()
        .column(todo::Column::Id)
        .column(todo::Column::Title)
        .column(todo::Column::Completed)
        .column(todo::Column::Order)
        .column_as(tag::Column::Id, "tag_id")
        .column_as(tag::Column::Title, "tag_title")
        .join(JoinType::LeftJoin, todo::Relation::TodoTag.def())
        .join(JoinType::LeftJoin, todo_tag::Relation::Tag.def())
        .order_by_asc(todo::Column::Id)
        .order_by_asc(todo_tag::Column::Id)
}

pub(crate) async fn fetch_todo_with_tags<C: ConnectionTrait>(
    conn: &C,
    todo_id: i32,
) -> Result<Option<TodoWithTags>, DbErr> {
    let rows = joined_todos()
        .filter(todo::Column::Id.eq(todo_id))
        .into_model::<TodoTagRow>()
        .all(conn)
        .await?;
    Ok(fold_one(rows))
}

#[derive(Clone)]
pub struct TodoRepository {
    db: Arc<DatabaseConnection>,
}

impl TodoRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn create(&self, payload: CreateTodoRequest) -> Result<todo::Model, AppError> {
        let new_todo = todo::ActiveModel {
            title: Set(payload.title),
            completed: Set(payload.completed.unwrap_or(false)),
            order: Set(payload.order.unwrap_or(0)),
            ..Default::default()
        };
        let model = new_todo.insert(self.db.as_ref()).await?;
        debug!(todo_id = model.id, "Todo created.");
        Ok(model)
    }

    pub async fn get_one(&self, todo_id: i32) -> Result<TodoWithTags, AppError> {
        fetch_todo_with_tags(self.db.as_ref(), todo_id)
            .await?
            .ok_or_else(|| AppError::todo_not_found(todo_id))
    }

    pub async fn list_all(&self) -> Result<Vec<TodoWithTags>, AppError> {
        let rows = joined_todos()
            .into_model::<TodoTagRow>()
            .all(self.db.as_ref())
            .await?;
        Ok(fold_rows(rows))
    }

    /// Merge-on-read partial update. The read, the full-row write and the
    /// re-read of the nested view share one transaction.
    pub async fn update(
        &self,
        todo_id: i32,
        payload: UpdateTodoRequest,
    ) -> Result<TodoWithTags, AppError> {
        let txn = self.db.begin().await?;

        let current = todo::Entity::find_by_id(todo_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::todo_not_found(todo_id))?;
        let merged = payload.merge_into(current.clone());

        let mut active: todo::ActiveModel = current.into();
        active.title = Set(merged.title);
        active.completed = Set(merged.completed);
        active.order = Set(merged.order);
        active.update(&txn).await?;

        let updated = fetch_todo_with_tags(&txn, todo_id)
            .await?
            .ok_or_else(|| AppError::todo_not_found(todo_id))?;
        txn.commit().await?;

        debug!(todo_id, "Todo updated.");
        Ok(updated)
    }

    /// Deletes the todo and every link that points at it.
    pub async fn delete_one(&self, todo_id: i32) -> Result<(), AppError> {
        let txn = self.db.begin().await?;

        let deleted = todo::Entity::delete_by_id(todo_id).exec(&txn).await?;
        if deleted.rows_affected == 0 {
            return Err(AppError::todo_not_found(todo_id));
        }
        let unlinked = todo_tag::Entity::delete_many()
            .filter(todo_tag::Column::TodoId.eq(todo_id))
            .exec(&txn)
            .await?
            .rows_affected;
        txn.commit().await?;

        debug!(todo_id, unlinked, "Todo deleted.");
        Ok(())
    }

    /// Deletes every todo. All links are dropped with them, since each one
    /// would otherwise be left pointing at a missing todo.
    pub async fn delete_all(&self) -> Result<u64, AppError> {
        let txn = self.db.begin().await?;
        let deleted = todo::Entity::delete_many().exec(&txn).await?.rows_affected;
        let unlinked = todo_tag::Entity::delete_many().exec(&txn).await?.rows_affected;
        txn.commit().await?;

        debug!(deleted, unlinked, "All todos deleted.");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::services::test_support::memory_db;
    use crate::db::services::{AssociationManager, TagRepository};
    use crate::web::models::tag_models::CreateTagRequest;

    fn new_todo(title: &str) -> CreateTodoRequest {
        CreateTodoRequest {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_then_get_round_trips_all_fields() {
        let repo = TodoRepository::new(memory_db().await);

        let created = repo
            .create(CreateTodoRequest {
                title: Some("Buy milk".into()),
                completed: Some(true),
                order: Some(5),
            })
            .await
            .unwrap();
        let fetched = repo.get_one(created.id).await.unwrap();

        assert_eq!(fetched.item, created);
        assert!(fetched.related.is_empty());
    }

    #[tokio::test]
    async fn test_create_applies_defaults() {
        let repo = TodoRepository::new(memory_db().await);
        let created = repo.create(CreateTodoRequest::default()).await.unwrap();
        assert_eq!(created.title, None);
        assert!(!created.completed);
        assert_eq!(created.order, 0);
    }

    #[tokio::test]
    async fn test_get_missing_todo_is_not_found() {
        let repo = TodoRepository::new(memory_db().await);
        match repo.get_one(999).await {
            Err(AppError::NotFound(msg)) => assert_eq!(msg, "Todo with ID 999 not found"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_update_changes_nothing() {
        let repo = TodoRepository::new(memory_db().await);
        let created = repo.create(new_todo("Walk dog")).await.unwrap();

        let before = repo.get_one(created.id).await.unwrap();
        let updated = repo.update(created.id, UpdateTodoRequest::default()).await.unwrap();
        let after = repo.get_one(created.id).await.unwrap();

        assert_eq!(updated, before);
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_update_missing_todo_is_not_found() {
        let repo = TodoRepository::new(memory_db().await);
        let result = repo.update(42, UpdateTodoRequest::default()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_all_nests_tags_per_todo() {
        let db = memory_db().await;
        let todos = TodoRepository::new(db.clone());
        let tags = TagRepository::new(db.clone());
        let links = AssociationManager::new(db);

        let first = todos.create(new_todo("first")).await.unwrap();
        let second = todos.create(new_todo("second")).await.unwrap();
        let errand = tags
            .create(CreateTagRequest { title: Some("errand".into()) })
            .await
            .unwrap();
        links.link(second.id, errand.id).await.unwrap();

        let listed = todos.list_all().await.unwrap();

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].item.id, first.id);
        assert!(listed[0].related.is_empty());
        assert_eq!(listed[1].related, vec![errand]);
    }

    #[tokio::test]
    async fn test_delete_one_drops_links_and_reports_missing() {
        let db = memory_db().await;
        let todos = TodoRepository::new(db.clone());
        let links = AssociationManager::new(db);

        let todo = todos.create(new_todo("gone soon")).await.unwrap();
        links.link(todo.id, 1).await.unwrap();

        todos.delete_one(todo.id).await.unwrap();

        assert!(links.list_for_todo(todo.id).await.unwrap().is_empty());
        assert!(matches!(todos.delete_one(todo.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_all_succeeds_on_empty_store() {
        let repo = TodoRepository::new(memory_db().await);
        assert_eq!(repo.delete_all().await.unwrap(), 0);
        repo.create(new_todo("a")).await.unwrap();
        repo.create(new_todo("b")).await.unwrap();
        assert_eq!(repo.delete_all().await.unwrap(), 2);
        assert!(repo.list_all().await.unwrap().is_empty());
    }
}
