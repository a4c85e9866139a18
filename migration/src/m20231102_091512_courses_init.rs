use sea_orm_migration::{prelude::*, sea_query::extension::postgres::Type};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(Visibility::Type)
                    .values([Visibility::Public, Visibility::Private])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Course::Table)
                    .col(ColumnDef::new(Course::Id).uuid().primary_key())
                    .col(ColumnDef::new(Course::Creator).uuid().null())
                    .col(ColumnDef::new(Course::Title).text().not_null())
                    .col(ColumnDef::new(Course::Description).text().not_null())
                    .col(
                        ColumnDef::new(Course::Visibility)
                            .custom(Visibility::Type)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Course::CreationTimestamp)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Section::Table)
                    .col(ColumnDef::new(Section::Id).uuid().primary_key())
                    .col(ColumnDef::new(Section::CourseId).uuid().not_null())
                    .col(ColumnDef::new(Section::Creator).uuid().null())
                    .col(ColumnDef::new(Section::Title).text().not_null())
                    .col(ColumnDef::new(Section::Description).text().not_null())
                    .col(
                        ColumnDef::new(Section::Visibility)
                            .custom(Visibility::Type)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Section::CreationTimestamp)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Section::Table, Section::CourseId)
                            .to(Course::Table, Course::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Room::Table)
                    .col(ColumnDef::new(Room::Id).uuid().primary_key())
                    .col(ColumnDef::new(Room::SectionId).uuid().not_null())
                    .col(ColumnDef::new(Room::Creator).uuid().null())
                    .col(ColumnDef::new(Room::Title).text().not_null())
                    .col(ColumnDef::new(Room::Description).text().not_null())
                    .col(
                        ColumnDef::new(Room::Visibility)
                            .custom(Visibility::Type)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Room::CreationTimestamp)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Room::Table, Room::SectionId)
                            .to(Section::Table, Section::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Task::Table)
                    .col(ColumnDef::new(Task::Id).uuid().primary_key())
                    .col(ColumnDef::new(Task::RoomId).uuid().null())
                    .col(ColumnDef::new(Task::Position).integer().not_null())
                    .col(
                        ColumnDef::new(Task::CreationTimestamp)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Task::Table, Task::RoomId)
                            .to(Room::Table, Room::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Task::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Room::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Section::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Course::Table).to_owned())
            .await?;
        manager
            .drop_type(Type::drop().name(Visibility::Type).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
pub enum Visibility {
    #[iden = "courses_visibility"]
    Type,
    Public,
    Private,
}

#[derive(Iden)]
pub enum Course {
    #[iden = "courses_courses"]
    Table,
    Id,
    Creator,
    Title,
    Description,
    Visibility,
    CreationTimestamp,
}

#[derive(Iden)]
pub enum Section {
    #[iden = "courses_sections"]
    Table,
    Id,
    CourseId,
    Creator,
    Title,
    Description,
    Visibility,
    CreationTimestamp,
}

#[derive(Iden)]
pub enum Room {
    #[iden = "courses_rooms"]
    Table,
    Id,
    SectionId,
    Creator,
    Title,
    Description,
    Visibility,
    CreationTimestamp,
}

#[derive(Iden)]
pub enum Task {
    #[iden = "courses_tasks"]
    Table,
    Id,
    RoomId,
    Position,
    CreationTimestamp,
}
