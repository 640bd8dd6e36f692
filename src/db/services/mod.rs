//! Repositories over the store handle. Each one owns a clone of the shared
//! `Arc<DatabaseConnection>` created at startup; nothing here reaches for a
//! global connection.

pub mod association_service;
pub mod tag_service;
pub mod todo_service;

pub use association_service::{AssociationManager, AssociationPair};
pub use tag_service::TagRepository;
pub use todo_service::TodoRepository;

#[cfg(test)]
pub(crate) mod test_support {
    use sea_orm::DatabaseConnection;
    use std::sync::Arc;

    pub async fn memory_db() -> Arc<DatabaseConnection> {
        Arc::new(
            crate::db::connect("sqlite::memory:", 1)
                .await
                .expect("in-memory sqlite"),
        )
    }
}
