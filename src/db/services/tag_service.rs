use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::debug;

use crate::db::aggregate::{fold_one, fold_rows, TagTodoRow, WithRelated};
use crate::db::entities::{tag, todo, todo_tag};
use crate::web::error::AppError;
use crate::web::models::tag_models::{CreateTagRequest, UpdateTagRequest};

pub type TagWithTodos = WithRelated<tag::Model, todo::Model>;

/// `tags LEFT JOIN todo_tags LEFT JOIN todos`, one row per link.
fn joined_tags() -> Select<tag::Entity> {
    tag::Entity::find()
        .select_only()
        .column(tag::Column::Id)
        .column_as(tag::Column::Title, "tag_title")
        .column(todo::Column::Id)
        .column_as(todo::Column::Title, "todo_title")
        .column(todo::Column::Completed)
        .column(todo::Column::Order)
        .join(JoinType::LeftJoin, tag::Relation::TodoTag.def())
        .join(JoinType::LeftJoin, todo_tag::Relation::Todo.def())
        .order_by_asc(tag::Column::Id)
        .order_by_asc(todo_tag::Column::Id)
}

async fn fetch_tag_with_todos<C: ConnectionTrait>(
    conn: &C,
    tag_id: i32,
) -> Result<Option<TagWithTodos>, DbErr> {
    let rows = joined_tags()
        .filter(tag::Column::Id.eq(tag_id))
        .into_model::<TagTodoRow>()
        .all(conn)
        .await?;
    Ok(fold_one(rows))
}

#[derive(Clone)]
pub struct TagRepository {
    db: Arc<DatabaseConnection>,
}

impl TagRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn create(&self, payload: CreateTagRequest) -> Result<tag::Model, AppError> {
        let title = payload.validated_title()?;
        let model = tag::ActiveModel {
            title: Set(title),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;
        debug!(tag_id = model.id, "Tag created.");
        Ok(model)
    }

    pub async fn get_one(&self, tag_id: i32) -> Result<TagWithTodos, AppError> {
        fetch_tag_with_todos(self.db.as_ref(), tag_id)
            .await?
            .ok_or_else(|| AppError::tag_not_found(tag_id))
    }

    pub async fn list_all(&self) -> Result<Vec<TagWithTodos>, AppError> {
        let rows = joined_tags()
            .into_model::<TagTodoRow>()
            .all(self.db.as_ref())
            .await?;
        Ok(fold_rows(rows))
    }

    pub async fn update(
        &self,
        tag_id: i32,
        payload: UpdateTagRequest,
    ) -> Result<TagWithTodos, AppError> {
        let new_title = payload.validated_title()?;
        let txn = self.db.begin().await?;

        let current = tag::Entity::find_by_id(tag_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::tag_not_found(tag_id))?;
        let title = new_title.unwrap_or_else(|| current.title.clone());

        let mut active: tag::ActiveModel = current.into();
        active.title = Set(title);
        active.update(&txn).await?;

        let updated = fetch_tag_with_todos(&txn, tag_id)
            .await?
            .ok_or_else(|| AppError::tag_not_found(tag_id))?;
        txn.commit().await?;

        debug!(tag_id, "Tag updated.");
        Ok(updated)
    }

    /// Deletes the tag and every link that points at it, returning the
    /// deleted row.
    pub async fn delete_one(&self, tag_id: i32) -> Result<tag::Model, AppError> {
        let txn = self.db.begin().await?;

        let existing = tag::Entity::find_by_id(tag_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::tag_not_found(tag_id))?;
        tag::Entity::delete_by_id(tag_id).exec(&txn).await?;
        let unlinked = todo_tag::Entity::delete_many()
            .filter(todo_tag::Column::TagId.eq(tag_id))
            .exec(&txn)
            .await?
            .rows_affected;
        txn.commit().await?;

        debug!(tag_id, unlinked, "Tag deleted.");
        Ok(existing)
    }

    pub async fn delete_all(&self) -> Result<u64, AppError> {
        let txn = self.db.begin().await?;
        let deleted = tag::Entity::delete_many().exec(&txn).await?.rows_affected;
        let unlinked = todo_tag::Entity::delete_many().exec(&txn).await?.rows_affected;
        txn.commit().await?;

        debug!(deleted, unlinked, "All tags deleted.");
        Ok(deleted)
    }
}
