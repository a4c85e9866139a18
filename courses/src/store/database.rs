use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use entity::{
    courses_course_access, courses_courses, courses_room_access, courses_rooms,
    courses_section_access, courses_sections, courses_task_progress, courses_tasks,
    sea_orm_active_enums::CoursesProgressStatus,
};
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveModelTrait, ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection,
    DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait, Unchanged,
};
use tracing::trace;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult, TaskCounts};
use crate::model::{
    AccessLevel, CompletionRecord, Container, ContainerId, Grant, ProgressStatus, Task,
};

/// [`Store`] backed by the `courses_*` tables.
#[derive(Debug, Clone)]
pub struct DatabaseStore {
    db: DatabaseConnection,
}

impl DatabaseStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn connect(config: &lib::config::Database) -> Result<Self, DbErr> {
        let mut db_options = ConnectOptions::new(config.url.to_string());
        db_options.connect_timeout(Duration::from_secs(config.connect_timeout));
        if let Some(max_connections) = config.max_connections {
            db_options.max_connections(max_connections);
        }
        Ok(Self::new(Database::connect(db_options).await?))
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

async fn find_container<C: ConnectionTrait>(
    db: &C,
    id: ContainerId,
) -> Result<Option<Container>, DbErr> {
    Ok(match id {
        ContainerId::Course(id) => courses_courses::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(Into::into),
        ContainerId::Section(id) => courses_sections::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(Into::into),
        ContainerId::Room(id) => courses_rooms::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(Into::into),
    })
}

async fn section_ids<C: ConnectionTrait>(db: &C, course_id: Uuid) -> Result<Vec<Uuid>, DbErr> {
    courses_sections::Entity::find()
        .select_only()
        .column(courses_sections::Column::Id)
        .filter(courses_sections::Column::CourseId.eq(course_id))
        .into_tuple()
        .all(db)
        .await
}

async fn room_ids<C: ConnectionTrait>(db: &C, sections: &[Uuid]) -> Result<Vec<Uuid>, DbErr> {
    if sections.is_empty() {
        return Ok(Vec::new());
    }
    courses_rooms::Entity::find()
        .select_only()
        .column(courses_rooms::Column::Id)
        .filter(courses_rooms::Column::SectionId.is_in(sections.iter().copied()))
        .into_tuple()
        .all(db)
        .await
}

/// Deletes the rooms together with their tasks, progress rows and grants.
async fn delete_rooms<C: ConnectionTrait>(db: &C, rooms: &[Uuid]) -> Result<(), DbErr> {
    if rooms.is_empty() {
        return Ok(());
    }
    let tasks: Vec<Uuid> = courses_tasks::Entity::find()
        .select_only()
        .column(courses_tasks::Column::Id)
        .filter(courses_tasks::Column::RoomId.is_in(rooms.iter().copied()))
        .into_tuple()
        .all(db)
        .await?;
    if !tasks.is_empty() {
        courses_task_progress::Entity::delete_many()
            .filter(courses_task_progress::Column::TaskId.is_in(tasks.iter().copied()))
            .exec(db)
            .await?;
        courses_tasks::Entity::delete_many()
            .filter(courses_tasks::Column::Id.is_in(tasks))
            .exec(db)
            .await?;
    }
    courses_room_access::Entity::delete_many()
        .filter(courses_room_access::Column::RoomId.is_in(rooms.iter().copied()))
        .exec(db)
        .await?;
    courses_rooms::Entity::delete_many()
        .filter(courses_rooms::Column::Id.is_in(rooms.iter().copied()))
        .exec(db)
        .await?;
    Ok(())
}

async fn delete_sections<C: ConnectionTrait>(db: &C, sections: &[Uuid]) -> Result<(), DbErr> {
    if sections.is_empty() {
        return Ok(());
    }
    courses_section_access::Entity::delete_many()
        .filter(courses_section_access::Column::SectionId.is_in(sections.iter().copied()))
        .exec(db)
        .await?;
    courses_sections::Entity::delete_many()
        .filter(courses_sections::Column::Id.is_in(sections.iter().copied()))
        .exec(db)
        .await?;
    Ok(())
}

fn parent_uuid(container: &Container) -> StoreResult<Uuid> {
    container
        .parent
        .map(ContainerId::uuid)
        .ok_or(StoreError::MissingParent(container.id))
}

#[async_trait]
impl Store for DatabaseStore {
    async fn container(&self, id: ContainerId) -> StoreResult<Option<Container>> {
        Ok(find_container(&self.db, id).await?)
    }

    async fn children(&self, id: ContainerId) -> StoreResult<Vec<Container>> {
        Ok(match id {
            ContainerId::Course(id) => courses_sections::Entity::find()
                .filter(courses_sections::Column::CourseId.eq(id))
                .order_by_asc(courses_sections::Column::CreationTimestamp)
                .all(&self.db)
                .await?
                .into_iter()
                .map(Into::into)
                .collect(),
            ContainerId::Section(id) => courses_rooms::Entity::find()
                .filter(courses_rooms::Column::SectionId.eq(id))
                .order_by_asc(courses_rooms::Column::CreationTimestamp)
                .all(&self.db)
                .await?
                .into_iter()
                .map(Into::into)
                .collect(),
            ContainerId::Room(_) => Vec::new(),
        })
    }

    async fn courses(&self) -> StoreResult<Vec<Container>> {
        Ok(courses_courses::Entity::find()
            .order_by_asc(courses_courses::Column::CreationTimestamp)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn grant(
        &self,
        user_id: Uuid,
        container: ContainerId,
    ) -> StoreResult<Option<AccessLevel>> {
        Ok(match container {
            ContainerId::Course(id) => courses_course_access::Entity::find_by_id((user_id, id))
                .one(&self.db)
                .await?
                .map(|x| x.level),
            ContainerId::Section(id) => courses_section_access::Entity::find_by_id((user_id, id))
                .one(&self.db)
                .await?
                .map(|x| x.level),
            ContainerId::Room(id) => courses_room_access::Entity::find_by_id((user_id, id))
                .one(&self.db)
                .await?
                .map(|x| x.level),
        })
    }

    async fn grants(&self, container: ContainerId) -> StoreResult<Vec<Grant>> {
        let rows: Vec<(Uuid, AccessLevel)> = match container {
            ContainerId::Course(id) => courses_course_access::Entity::find()
                .filter(courses_course_access::Column::CourseId.eq(id))
                .order_by_asc(courses_course_access::Column::UserId)
                .all(&self.db)
                .await?
                .into_iter()
                .map(|x| (x.user_id, x.level))
                .collect(),
            ContainerId::Section(id) => courses_section_access::Entity::find()
                .filter(courses_section_access::Column::SectionId.eq(id))
                .order_by_asc(courses_section_access::Column::UserId)
                .all(&self.db)
                .await?
                .into_iter()
                .map(|x| (x.user_id, x.level))
                .collect(),
            ContainerId::Room(id) => courses_room_access::Entity::find()
                .filter(courses_room_access::Column::RoomId.eq(id))
                .order_by_asc(courses_room_access::Column::UserId)
                .all(&self.db)
                .await?
                .into_iter()
                .map(|x| (x.user_id, x.level))
                .collect(),
        };
        Ok(rows
            .into_iter()
            .map(|(user_id, level)| Grant {
                user_id,
                container,
                level,
            })
            .collect())
    }

    async fn count_tasks(&self, rooms: &[Uuid], user_id: Uuid) -> StoreResult<TaskCounts> {
        if rooms.is_empty() {
            return Ok(TaskCounts::default());
        }
        let total = courses_tasks::Entity::find()
            .filter(courses_tasks::Column::RoomId.is_in(rooms.iter().copied()))
            .count(&self.db)
            .await?;
        let completed = courses_task_progress::Entity::find()
            .inner_join(courses_tasks::Entity)
            .filter(courses_task_progress::Column::UserId.eq(user_id))
            .filter(courses_task_progress::Column::Status.eq(CoursesProgressStatus::Completed))
            .filter(courses_tasks::Column::RoomId.is_in(rooms.iter().copied()))
            .count(&self.db)
            .await?;
        trace!("{} rooms: {completed}/{total} tasks completed", rooms.len());
        Ok(TaskCounts { total, completed })
    }

    async fn task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(courses_tasks::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Into::into))
    }

    async fn tasks(&self, room_id: Uuid) -> StoreResult<Vec<Task>> {
        Ok(courses_tasks::Entity::find()
            .filter(courses_tasks::Column::RoomId.eq(room_id))
            .order_by_asc(courses_tasks::Column::Position)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn completions(
        &self,
        user_id: Uuid,
        task_ids: &[Uuid],
    ) -> StoreResult<Vec<CompletionRecord>> {
        if task_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(courses_task_progress::Entity::find()
            .filter(courses_task_progress::Column::UserId.eq(user_id))
            .filter(courses_task_progress::Column::TaskId.is_in(task_ids.iter().copied()))
            .all(&self.db)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn insert_container(&self, container: Container) -> StoreResult<Container> {
        let txn = self.db.begin().await?;
        if let Some(parent) = container.parent {
            if find_container(&txn, parent).await?.is_none() {
                return Err(StoreError::MissingParent(container.id));
            }
        }
        let container: Container = match container.id {
            ContainerId::Course(id) => courses_courses::ActiveModel {
                id: Set(id),
                creator: Set(container.creator),
                title: Set(container.title),
                description: Set(container.description),
                visibility: Set(container.visibility),
                creation_timestamp: Set(container.creation_timestamp),
            }
            .insert(&txn)
            .await?
            .into(),
            ContainerId::Section(id) => courses_sections::ActiveModel {
                id: Set(id),
                course_id: Set(parent_uuid(&container)?),
                creator: Set(container.creator),
                title: Set(container.title),
                description: Set(container.description),
                visibility: Set(container.visibility),
                creation_timestamp: Set(container.creation_timestamp),
            }
            .insert(&txn)
            .await?
            .into(),
            ContainerId::Room(id) => courses_rooms::ActiveModel {
                id: Set(id),
                section_id: Set(parent_uuid(&container)?),
                creator: Set(container.creator),
                title: Set(container.title),
                description: Set(container.description),
                visibility: Set(container.visibility),
                creation_timestamp: Set(container.creation_timestamp),
            }
            .insert(&txn)
            .await?
            .into(),
        };
        txn.commit().await?;
        Ok(container)
    }

    async fn update_container(&self, container: Container) -> StoreResult<Option<Container>> {
        let updated = match container.id {
            ContainerId::Course(id) => courses_courses::ActiveModel {
                id: Unchanged(id),
                title: Set(container.title),
                description: Set(container.description),
                visibility: Set(container.visibility),
                ..Default::default()
            }
            .update(&self.db)
            .await
            .map(Container::from),
            ContainerId::Section(id) => courses_sections::ActiveModel {
                id: Unchanged(id),
                title: Set(container.title),
                description: Set(container.description),
                visibility: Set(container.visibility),
                ..Default::default()
            }
            .update(&self.db)
            .await
            .map(Container::from),
            ContainerId::Room(id) => courses_rooms::ActiveModel {
                id: Unchanged(id),
                title: Set(container.title),
                description: Set(container.description),
                visibility: Set(container.visibility),
                ..Default::default()
            }
            .update(&self.db)
            .await
            .map(Container::from),
        };
        match updated {
            Ok(container) => Ok(Some(container)),
            Err(DbErr::RecordNotUpdated) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete_container(&self, id: ContainerId) -> StoreResult<bool> {
        let txn = self.db.begin().await?;
        if find_container(&txn, id).await?.is_none() {
            return Ok(false);
        }

        match id {
            ContainerId::Course(course_id) => {
                let sections = section_ids(&txn, course_id).await?;
                let rooms = room_ids(&txn, &sections).await?;
                delete_rooms(&txn, &rooms).await?;
                delete_sections(&txn, &sections).await?;
                courses_course_access::Entity::delete_many()
                    .filter(courses_course_access::Column::CourseId.eq(course_id))
                    .exec(&txn)
                    .await?;
                courses_courses::Entity::delete_by_id(course_id)
                    .exec(&txn)
                    .await?;
            }
            ContainerId::Section(section_id) => {
                let rooms = room_ids(&txn, &[section_id]).await?;
                delete_rooms(&txn, &rooms).await?;
                delete_sections(&txn, &[section_id]).await?;
            }
            ContainerId::Room(room_id) => delete_rooms(&txn, &[room_id]).await?,
        }

        txn.commit().await?;
        Ok(true)
    }

    async fn upsert_grant(&self, grant: Grant) -> StoreResult<Option<Grant>> {
        let txn = self.db.begin().await?;
        if find_container(&txn, grant.container).await?.is_none() {
            return Ok(None);
        }
        match grant.container {
            ContainerId::Course(id) => {
                courses_course_access::Entity::insert(courses_course_access::ActiveModel {
                    user_id: Set(grant.user_id),
                    course_id: Set(id),
                    level: Set(grant.level),
                })
                .on_conflict(
                    OnConflict::columns([
                        courses_course_access::Column::UserId,
                        courses_course_access::Column::CourseId,
                    ])
                    .update_column(courses_course_access::Column::Level)
                    .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
            }
            ContainerId::Section(id) => {
                courses_section_access::Entity::insert(courses_section_access::ActiveModel {
                    user_id: Set(grant.user_id),
                    section_id: Set(id),
                    level: Set(grant.level),
                })
                .on_conflict(
                    OnConflict::columns([
                        courses_section_access::Column::UserId,
                        courses_section_access::Column::SectionId,
                    ])
                    .update_column(courses_section_access::Column::Level)
                    .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
            }
            ContainerId::Room(id) => {
                courses_room_access::Entity::insert(courses_room_access::ActiveModel {
                    user_id: Set(grant.user_id),
                    room_id: Set(id),
                    level: Set(grant.level),
                })
                .on_conflict(
                    OnConflict::columns([
                        courses_room_access::Column::UserId,
                        courses_room_access::Column::RoomId,
                    ])
                    .update_column(courses_room_access::Column::Level)
                    .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
            }
        }
        txn.commit().await?;
        Ok(Some(grant))
    }

    async fn delete_grant(&self, user_id: Uuid, container: ContainerId) -> StoreResult<bool> {
        let result = match container {
            ContainerId::Course(id) => {
                courses_course_access::Entity::delete_by_id((user_id, id))
                    .exec(&self.db)
                    .await?
            }
            ContainerId::Section(id) => {
                courses_section_access::Entity::delete_by_id((user_id, id))
                    .exec(&self.db)
                    .await?
            }
            ContainerId::Room(id) => {
                courses_room_access::Entity::delete_by_id((user_id, id))
                    .exec(&self.db)
                    .await?
            }
        };
        Ok(result.rows_affected > 0)
    }

    async fn insert_task(&self, room_id: Uuid) -> StoreResult<Task> {
        let txn = self.db.begin().await?;
        let position = courses_tasks::Entity::find()
            .filter(courses_tasks::Column::RoomId.eq(room_id))
            .count(&txn)
            .await?;
        let task = courses_tasks::ActiveModel {
            id: Set(Uuid::new_v4()),
            room_id: Set(Some(room_id)),
            position: Set(position as _),
            creation_timestamp: Set(Utc::now().naive_utc()),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;
        Ok(task.into())
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let txn = self.db.begin().await?;
        courses_task_progress::Entity::delete_many()
            .filter(courses_task_progress::Column::TaskId.eq(id))
            .exec(&txn)
            .await?;
        let result = courses_tasks::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }

    async fn upsert_completion(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        status: ProgressStatus,
    ) -> StoreResult<Option<CompletionRecord>> {
        let txn = self.db.begin().await?;
        if courses_tasks::Entity::find_by_id(task_id)
            .one(&txn)
            .await?
            .is_none()
        {
            return Ok(None);
        }
        courses_task_progress::Entity::insert(courses_task_progress::ActiveModel {
            user_id: Set(user_id),
            task_id: Set(task_id),
            status: Set(status),
            attempts: Set(1),
            last_update: Set(Utc::now().naive_utc()),
        })
        .on_conflict(
            OnConflict::columns([
                courses_task_progress::Column::UserId,
                courses_task_progress::Column::TaskId,
            ])
            .update_columns([
                courses_task_progress::Column::Status,
                courses_task_progress::Column::LastUpdate,
            ])
            .value(
                courses_task_progress::Column::Attempts,
                Expr::col((
                    courses_task_progress::Entity,
                    courses_task_progress::Column::Attempts,
                ))
                .add(1),
            )
            .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;
        let record = courses_task_progress::Entity::find_by_id((user_id, task_id))
            .one(&txn)
            .await?;
        txn.commit().await?;
        Ok(record.map(Into::into))
    }
}
