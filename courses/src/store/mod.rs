//! Storage collaborator of the engine.
//!
//! The resolver and the aggregator only need the read half of [`Store`]; the
//! write half is used by [`Courses`](crate::Courses) to keep the tree
//! consistent. Implementations must apply every write atomically.

use async_trait::async_trait;
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{
    AccessLevel, CompletionRecord, Container, ContainerId, Grant, ProgressStatus, Task,
};

pub use self::{database::DatabaseStore, memory::MemoryStore};

mod database;
mod memory;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),
    /// The parent is absent or has been deleted in the meantime.
    #[error("{0} cannot be stored without an existing parent")]
    MissingParent(ContainerId),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Task totals of a set of rooms for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    pub total: u64,
    pub completed: u64,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn container(&self, id: ContainerId) -> StoreResult<Option<Container>>;

    /// Direct children, oldest first. Rooms have none.
    async fn children(&self, id: ContainerId) -> StoreResult<Vec<Container>>;

    async fn courses(&self) -> StoreResult<Vec<Container>>;

    async fn grant(&self, user_id: Uuid, container: ContainerId)
        -> StoreResult<Option<AccessLevel>>;

    async fn grants(&self, container: ContainerId) -> StoreResult<Vec<Grant>>;

    /// Counts the distinct tasks in `rooms` and how many of them `user_id`
    /// has completed.
    async fn count_tasks(&self, rooms: &[Uuid], user_id: Uuid) -> StoreResult<TaskCounts>;

    async fn task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// Tasks of a room ordered by position.
    async fn tasks(&self, room_id: Uuid) -> StoreResult<Vec<Task>>;

    async fn completions(
        &self,
        user_id: Uuid,
        task_ids: &[Uuid],
    ) -> StoreResult<Vec<CompletionRecord>>;

    async fn insert_container(&self, container: Container) -> StoreResult<Container>;

    /// Returns `None` if the container does not exist (anymore).
    async fn update_container(&self, container: Container) -> StoreResult<Option<Container>>;

    /// Removes the container with its whole subtree, including grants, tasks
    /// and completion records. Either everything is removed or nothing.
    /// Returns `false` if the container did not exist.
    async fn delete_container(&self, id: ContainerId) -> StoreResult<bool>;

    /// Inserts the grant or replaces the level of an existing one. Returns
    /// `None` without writing anything if the container does not exist.
    async fn upsert_grant(&self, grant: Grant) -> StoreResult<Option<Grant>>;

    async fn delete_grant(&self, user_id: Uuid, container: ContainerId) -> StoreResult<bool>;

    /// Appends a new task at the end of the room.
    async fn insert_task(&self, room_id: Uuid) -> StoreResult<Task>;

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;

    /// Creates the record on first use, otherwise updates the status and
    /// counts another attempt. Returns `None` without writing anything if the
    /// task does not exist.
    async fn upsert_completion(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        status: ProgressStatus,
    ) -> StoreResult<Option<CompletionRecord>>;
}
