//! Store access: entities, schema bootstrap, join-row aggregation and the
//! repositories built on top of them.

pub mod aggregate;
pub mod entities;
pub mod schema;
pub mod services;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::info;

/// Opens the store handle shared by every repository and makes sure the
/// tables exist.
///
/// In-memory SQLite databases live and die with their connection, so such
/// URLs are always opened with a single connection regardless of
/// `max_connections`.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<DatabaseConnection, DbErr> {
    let max_connections = if database_url.contains(":memory:") {
        1
    } else {
        max_connections.max(1)
    };

    let mut opt = ConnectOptions::new(database_url.to_owned());
    opt.max_connections(max_connections)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    info!(
        backend = ?db.get_database_backend(),
        max_connections,
        "Database connected."
    );

    schema::ensure_schema(&db).await?;
    Ok(db)
}
