use sea_orm::Statement;
use sea_orm_migration::prelude::*;

const INDEX_NAME: &str = "idx_data_sources_live_name";

/// Live data source names are unique; soft-deleted rows keep their name
/// without blocking reuse.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute(Statement::from_string(
            manager.get_database_backend(),
            format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS {} ON data_sources (name) WHERE is_deleted = 0",
                INDEX_NAME
            ),
        ))
        .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute(Statement::from_string(
            manager.get_database_backend(),
            format!("DROP INDEX IF EXISTS {}", INDEX_NAME),
        ))
        .await?;
        Ok(())
    }
}
