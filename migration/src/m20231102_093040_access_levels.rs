use sea_orm_migration::{prelude::*, sea_query::extension::postgres::Type};

use crate::m20231102_091512_courses_init::{Course, Room, Section};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(AccessLevel::Type)
                    .values([AccessLevel::Visitor, AccessLevel::Editor])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CourseAccess::Table)
                    .col(ColumnDef::new(CourseAccess::UserId).uuid().not_null())
                    .col(ColumnDef::new(CourseAccess::CourseId).uuid().not_null())
                    .col(
                        ColumnDef::new(CourseAccess::Level)
                            .custom(AccessLevel::Type)
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(CourseAccess::UserId)
                            .col(CourseAccess::CourseId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(CourseAccess::Table, CourseAccess::CourseId)
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
                    .table(SectionAccess::Table)
                    .col(ColumnDef::new(SectionAccess::UserId).uuid().not_null())
                    .col(ColumnDef::new(SectionAccess::SectionId).uuid().not_null())
                    .col(
                        ColumnDef::new(SectionAccess::Level)
                            .custom(AccessLevel::Type)
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(SectionAccess::UserId)
                            .col(SectionAccess::SectionId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(SectionAccess::Table, SectionAccess::SectionId)
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
                    .table(RoomAccess::Table)
                    .col(ColumnDef::new(RoomAccess::UserId).uuid().not_null())
                    .col(ColumnDef::new(RoomAccess::RoomId).uuid().not_null())
                    .col(
                        ColumnDef::new(RoomAccess::Level)
                            .custom(AccessLevel::Type)
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(RoomAccess::UserId)
                            .col(RoomAccess::RoomId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(RoomAccess::Table, RoomAccess::RoomId)
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
            .drop_table(Table::drop().table(RoomAccess::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SectionAccess::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CourseAccess::Table).to_owned())
            .await?;
        manager
            .drop_type(Type::drop().name(AccessLevel::Type).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
enum AccessLevel {
    #[iden = "courses_access_level"]
    Type,
    Visitor,
    Editor,
}

#[derive(Iden)]
enum CourseAccess {
    #[iden = "courses_course_access"]
    Table,
    UserId,
    CourseId,
    Level,
}

#[derive(Iden)]
enum SectionAccess {
    #[iden = "courses_section_access"]
    Table,
    UserId,
    SectionId,
    Level,
}

#[derive(Iden)]
enum RoomAccess {
    #[iden = "courses_room_access"]
    Table,
    UserId,
    RoomId,
    Level,
}
