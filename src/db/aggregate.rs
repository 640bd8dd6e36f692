//! Folding of flat `LEFT JOIN` rows into nested resources.
//!
//! A join of `todos -> todo_tags -> tags` yields one row per (todo, tag) pair,
//! and one row with null tag columns for a todo without tags. The fold groups
//! those rows by the primary identity, keeping the order in which identities
//! first appear, and collects the non-null related side of every row.

use std::collections::HashMap;

use sea_orm::FromQueryResult;

use crate::db::entities::{tag, todo};

/// A primary resource together with the resources linked to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithRelated<P, R> {
    pub item: P,
    pub related: Vec<R>,
}

/// A flat row produced by a join of a primary table with a related one.
pub trait JoinedRow {
    type Primary;
    type Related;

    fn primary_id(&self) -> i32;

    /// Splits the row. The related side is `None` when its identity column is
    /// null, which covers both "no link" and "link to a missing row".
    fn into_parts(self) -> (Self::Primary, Option<Self::Related>);
}

pub fn fold_rows<R, I>(rows: I) -> Vec<WithRelated<R::Primary, R::Related>>
where
    R: JoinedRow,
    I: IntoIterator<Item = R>,
{
    let mut grouped: Vec<WithRelated<R::Primary, R::Related>> = Vec::new();
    let mut positions: HashMap<i32, usize> = HashMap::new();

    for row in rows {
        let id = row.primary_id();
        let (item, related) = row.into_parts();
        let position = *positions.entry(id).or_insert_with(|| {
            grouped.push(WithRelated {
                item,
                related: Vec::new(),
            });
            grouped.len() - 1
        });
        if let Some(related) = related {
            grouped[position].related.push(related);
        }
    }

    grouped
}

/// Folds the rows of a single-identity query. `None` means no row matched.
pub fn fold_one<R, I>(rows: I) -> Option<WithRelated<R::Primary, R::Related>>
where
    R: JoinedRow,
    I: IntoIterator<Item = R>,
{
    fold_rows(rows).into_iter().next()
}

/// `todos LEFT JOIN todo_tags LEFT JOIN tags` projection.
#[derive(FromQueryResult, Debug, Clone, PartialEq, Eq)]
pub struct TodoTagRow {
    pub todo_id: i32,
    pub title: Option<String>,
    pub completed: bool,
    pub order: i32,
    pub tag_id: Option<i32>,
    pub tag_title: Option<String>,
}

impl JoinedRow for TodoTagRow {
    type Primary = todo::Model;
    type Related = tag::Model;

    fn primary_id(&self) -> i32 {
        self.todo_id
    }

    fn into_parts(self) -> (todo::Model, Option<tag::Model>) {
        let todo = todo::Model {
            id: self.todo_id,
            title: self.title,
            completed: self.completed,
            order: self.order,
        };
        let tag = self.tag_id.map(|id| tag::Model {
            id,
            title: self.tag_title.unwrap_or_default(),
        });
        (todo, tag)
    }
}

/// `tags LEFT JOIN todo_tags LEFT JOIN todos` projection.
#[derive(FromQueryResult, Debug, Clone, PartialEq, Eq)]
pub struct TagTodoRow {
    pub tag_id: i32,
    pub tag_title: String,
    pub todo_id: Option<i32>,
    pub todo_title: Option<String>,
    pub completed: Option<bool>,
    pub order: Option<i32>,
}

impl JoinedRow for TagTodoRow {
    type Primary = tag::Model;
    type Related = todo::Model;

    fn primary_id(&self) -> i32 {
        self.tag_id
    }

    fn into_parts(self) -> (tag::Model, Option<todo::Model>) {
        let tag = tag::Model {
            id: self.tag_id,
            title: self.tag_title,
        };
        let todo = self.todo_id.map(|id| todo::Model {
            id,
            title: self.todo_title,
            completed: self.completed.unwrap_or(false),
            order: self.order.unwrap_or(0),
        });
        (tag, todo)
    }
}
