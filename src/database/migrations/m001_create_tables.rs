use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DataSources::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DataSources::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DataSources::Name).string().not_null())
                    .col(ColumnDef::new(DataSources::SourceType).string().not_null())
                    .col(ColumnDef::new(DataSources::Host).string())
                    .col(ColumnDef::new(DataSources::Port).integer())
                    .col(ColumnDef::new(DataSources::Username).string())
                    .col(ColumnDef::new(DataSources::Password).string())
                    .col(ColumnDef::new(DataSources::Database).string())
                    .col(ColumnDef::new(DataSources::FilePath).text())
                    .col(ColumnDef::new(DataSources::ExtraParams).text())
                    .col(ColumnDef::new(DataSources::Description).text())
                    .col(
                        ColumnDef::new(DataSources::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DataSources::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DataSources::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Reports::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Reports::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Reports::Name).string().not_null())
                    .col(
                        ColumnDef::new(Reports::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Reports::DataSourceId).string().not_null())
                    .col(ColumnDef::new(Reports::Query).text().not_null())
                    .col(
                        ColumnDef::new(Reports::Columns)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Reports::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reports::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReportJobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReportJobs::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ReportJobs::ReportId).string().not_null())
                    .col(ColumnDef::new(ReportJobs::Format).string().not_null())
                    .col(
                        ColumnDef::new(ReportJobs::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(ReportJobs::FilePath).text())
                    .col(ColumnDef::new(ReportJobs::Error).text())
                    .col(ColumnDef::new(ReportJobs::StartedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(ReportJobs::CompletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(ReportJobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReportJobs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Jobs are polled per report
        manager
            .create_index(
                Index::create()
                    .name("idx_report_jobs_report_id")
                    .table(ReportJobs::Table)
                    .col(ReportJobs::ReportId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_data_sources_name")
                    .table(DataSources::Table)
                    .col(DataSources::Name)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReportJobs::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Reports::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(DataSources::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum DataSources {
    Table,
    Id,
    Name,
    SourceType,
    Host,
    Port,
    Username,
    Password,
    Database,
    FilePath,
    ExtraParams,
    Description,
    IsDeleted,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Reports {
    Table,
    Id,
    Name,
    Description,
    DataSourceId,
    Query,
    Columns,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ReportJobs {
    Table,
    Id,
    ReportId,
    Format,
    Status,
    FilePath,
    Error,
    StartedAt,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
}
