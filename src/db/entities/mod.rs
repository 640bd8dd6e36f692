//! SeaORM entities mapping the `todos`, `tags` and `todo_tags` tables.

pub mod tag;
pub mod todo;
pub mod todo_tag;
