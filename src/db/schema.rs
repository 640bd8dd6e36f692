use sea_orm::sea_query::{ColumnDef, Table, TableCreateStatement};
use sea_orm::{ConnectionTrait, DbErr};
use tracing::debug;

use crate::db::entities::{tag, todo, todo_tag};

fn todos_table() -> TableCreateStatement {
    Table::create()
        .table(todo::Entity)
        .if_not_exists()
        .col(
            ColumnDef::new(todo::Column::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(ColumnDef::new(todo::Column::Title).text().null())
        .col(
            ColumnDef::new(todo::Column::Completed)
                .boolean()
                .not_null()
                .default(false),
        )
        .col(ColumnDef::new(todo::Column::Order).integer().not_null().default(0))
        .to_owned()
}

fn tags_table() -> TableCreateStatement {
    Table::create()
        .table(tag::Entity)
        .if_not_exists()
        .col(
            ColumnDef::new(tag::Column::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(ColumnDef::new(tag::Column::Title).text().not_null())
        .to_owned()
}

// No foreign keys and no unique (todo_id, tag_id) constraint: links may
// reference a missing tag and may be duplicated.
fn todo_tags_table() -> TableCreateStatement {
    Table::create()
        .table(todo_tag::Entity)
        .if_not_exists()
        .col(
            ColumnDef::new(todo_tag::Column::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(ColumnDef::new(todo_tag::Column::TodoId).integer().not_null())
        .col(ColumnDef::new(todo_tag::Column::TagId).integer().not_null())
        .to_owned()
}

/// Creates the three tables when they are missing. Existing tables are left
/// untouched.
pub async fn ensure_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    for stmt in [todos_table(), tags_table(), todo_tags_table()] {
        db.execute(backend.build(&stmt)).await?;
    }
    debug!("Schema ensured.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DbBackend;

    #[test]
    fn test_todos_table_quotes_order_column() {
        let sql = DbBackend::Sqlite.build(&todos_table()).to_string();
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS \"todos\""));
        assert!(sql.contains("\"order\""));
        assert!(sql.contains("\"todo_id\""));
    }

    #[test]
    fn test_todo_tags_table_has_no_foreign_keys() {
        let sql = DbBackend::Postgres.build(&todo_tags_table()).to_string();
        assert!(!sql.to_uppercase().contains("FOREIGN KEY"));
        assert!(!sql.to_uppercase().contains("UNIQUE"));
    }
}
