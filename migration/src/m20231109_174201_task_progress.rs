use sea_orm_migration::{prelude::*, sea_query::extension::postgres::Type};

use crate::m20231102_091512_courses_init::Task;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(ProgressStatus::Type)
                    .values([
                        ProgressStatus::NotStarted,
                        ProgressStatus::InProgress,
                        ProgressStatus::Completed,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TaskProgress::Table)
                    .col(ColumnDef::new(TaskProgress::UserId).uuid().not_null())
                    .col(ColumnDef::new(TaskProgress::TaskId).uuid().not_null())
                    .col(
                        ColumnDef::new(TaskProgress::Status)
                            .custom(ProgressStatus::Type)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TaskProgress::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(TaskProgress::LastUpdate)
                            .timestamp()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(TaskProgress::UserId)
                            .col(TaskProgress::TaskId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TaskProgress::Table, TaskProgress::TaskId)
                            .to(Task::Table, Task::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("courses_task_progress_task_id_idx")
                    .table(TaskProgress::Table)
                    .col(TaskProgress::TaskId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TaskProgress::Table).to_owned())
            .await?;
        manager
            .drop_type(Type::drop().name(ProgressStatus::Type).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
enum ProgressStatus {
    #[iden = "courses_progress_status"]
    Type,
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Iden)]
enum TaskProgress {
    #[iden = "courses_task_progress"]
    Table,
    UserId,
    TaskId,
    Status,
    Attempts,
    LastUpdate,
}
