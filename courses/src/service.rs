use futures::future::join_all;
use key_rwlock::KeyRwLock;
use lib::auth::User;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    access,
    error::{Error, Result},
    model::{
        AccessLevel, CompletionRecord, Container, ContainerId, ContainerUpdate, Grant,
        NewContainer, ProgressStatus, Task, Visibility,
    },
    progress::{self, Progress},
    store::{Store, StoreError},
    visibility,
};

/// Entry point of the engine.
///
/// Reads never fail because of missing permissions; callers decide what to do
/// with the resolved [`AccessLevel`]. Writes check the visibility invariant
/// before anything is persisted.
pub struct Courses<S> {
    store: S,
    /// Held while the visibility of a container or its set of children changes.
    structure_lock: KeyRwLock<ContainerId>,
    grant_lock: KeyRwLock<(Uuid, ContainerId)>,
    progress_lock: KeyRwLock<(Uuid, Uuid)>,
}

/// A container as seen by one user.
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub container: Container,
    pub access: AccessLevel,
    pub progress: Progress,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskProgress {
    pub task: Task,
    /// `None` until the user first reports progress on the task.
    pub record: Option<CompletionRecord>,
}

impl<S: Store> Courses<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            structure_lock: Default::default(),
            grant_lock: Default::default(),
            progress_lock: Default::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn container(&self, id: ContainerId) -> Result<Container> {
        self.store.container(id).await?.ok_or(Error::NotFound(id))
    }

    /// Access level of `user` on the container. Unknown containers grant
    /// nothing.
    pub async fn effective_access(
        &self,
        id: ContainerId,
        user: Option<&User>,
    ) -> Option<AccessLevel> {
        match self.store.container(id).await {
            Ok(Some(container)) => access::effective_access(&self.store, &container, user).await,
            Ok(None) => {
                debug!("access check on unknown {id}");
                None
            }
            Err(err) => {
                warn!("could not load {id}: {err}");
                None
            }
        }
    }

    pub async fn has_access(
        &self,
        id: ContainerId,
        user: Option<&User>,
        require_edit: bool,
    ) -> bool {
        access::permits(self.effective_access(id, user).await, require_edit)
    }

    /// Checks whether a container with the `proposed` visibility may be placed
    /// below `parent`. A parent that does not exist imposes no restriction.
    pub async fn validate_visibility(
        &self,
        proposed: Visibility,
        parent: Option<ContainerId>,
    ) -> Result<()> {
        let parent = match parent {
            Some(parent) => self.store.container(parent).await?,
            None => None,
        };
        visibility::validate_visibility(proposed, parent.as_ref())
    }

    pub async fn progress(&self, id: ContainerId, user: &User) -> Progress {
        progress::progress(&self.store, id, user.id).await
    }

    /// All courses `user` can view, oldest first.
    pub async fn list_courses(&self, user: &User) -> Result<Vec<Overview>> {
        let courses = self.store.courses().await?;
        Ok(self.overview(courses, user).await)
    }

    /// The direct children of a course or section that `user` can view.
    pub async fn list_children(&self, parent: ContainerId, user: &User) -> Result<Vec<Overview>> {
        self.container(parent).await?;
        let children = self.store.children(parent).await?;
        Ok(self.overview(children, user).await)
    }

    async fn overview(&self, containers: Vec<Container>, user: &User) -> Vec<Overview> {
        join_all(containers.into_iter().map(|container| async move {
            let access = access::effective_access(&self.store, &container, Some(user)).await?;
            let progress = self.progress(container.id, user).await;
            Some(Overview {
                container,
                access,
                progress,
            })
        }))
        .await
        .into_iter()
        .flatten()
        .collect()
    }

    /// The tasks of a room in order, each with the completion record of `user`.
    pub async fn task_progress(&self, room_id: Uuid, user: &User) -> Result<Vec<TaskProgress>> {
        self.container(ContainerId::Room(room_id)).await?;
        let tasks = self.store.tasks(room_id).await?;
        let ids = tasks.iter().map(|t| t.id).collect::<Vec<_>>();
        let mut records = self.store.completions(user.id, &ids).await?;
        Ok(tasks
            .into_iter()
            .map(|task| {
                let record = records
                    .iter()
                    .position(|r| r.task_id == task.id)
                    .map(|i| records.swap_remove(i));
                TaskProgress { task, record }
            })
            .collect())
    }

    /// The direct grants on a container. Creators are not listed.
    pub async fn grants(&self, id: ContainerId) -> Result<Vec<Grant>> {
        self.container(id).await?;
        Ok(self.store.grants(id).await?)
    }

    pub async fn editors(&self, id: ContainerId) -> Result<Vec<Grant>> {
        Ok(self
            .grants(id)
            .await?
            .into_iter()
            .filter(|g| g.level == AccessLevel::Editor)
            .collect())
    }

    pub async fn create_course(&self, creator: &User, data: NewContainer) -> Result<Container> {
        let id = ContainerId::Course(Uuid::new_v4());
        let course = self
            .store
            .insert_container(data.into_container(id, None, creator.id))
            .await?;
        info!("{} created {id}", creator.id);
        Ok(course)
    }

    pub async fn create_section(
        &self,
        creator: &User,
        course_id: Uuid,
        data: NewContainer,
    ) -> Result<Container> {
        self.create_child(creator, ContainerId::Course(course_id), data)
            .await
    }

    pub async fn create_room(
        &self,
        creator: &User,
        section_id: Uuid,
        data: NewContainer,
    ) -> Result<Container> {
        self.create_child(creator, ContainerId::Section(section_id), data)
            .await
    }

    async fn create_child(
        &self,
        creator: &User,
        parent_id: ContainerId,
        data: NewContainer,
    ) -> Result<Container> {
        let Some(kind) = parent_id.kind().child() else {
            return Err(Error::NotFound(parent_id));
        };
        let _guard = self.structure_lock.write(parent_id).await;
        let parent = self.container(parent_id).await?;
        visibility::validate_visibility(data.visibility, Some(&parent))?;
        let id = kind.id(Uuid::new_v4());
        let container = match self
            .store
            .insert_container(data.into_container(id, Some(parent_id), creator.id))
            .await
        {
            Err(StoreError::MissingParent(_)) => return Err(Error::NotFound(parent_id)),
            result => result?,
        };
        info!("{} created {id} in {parent_id}", creator.id);
        Ok(container)
    }

    pub async fn update_container(
        &self,
        id: ContainerId,
        update: ContainerUpdate,
    ) -> Result<Container> {
        // Ancestors are locked before descendants.
        let _parent_guard = match self.container(id).await?.parent {
            Some(parent) => Some(self.structure_lock.write(parent).await),
            None => None,
        };
        let _guard = self.structure_lock.write(id).await;

        let mut container = self.container(id).await?;
        if let Some(visibility) = update.visibility {
            let parent = match container.parent {
                Some(parent) => self.store.container(parent).await?,
                None => None,
            };
            visibility::validate_visibility(visibility, parent.as_ref())?;
            let children = self.store.children(id).await?;
            visibility::validate_children(visibility, id, &children)?;
            container.visibility = visibility;
        }
        if let Some(title) = update.title {
            container.title = title;
        }
        if let Some(description) = update.description {
            container.description = description;
        }
        let container = self
            .store
            .update_container(container)
            .await?
            .ok_or(Error::NotFound(id))?;
        info!("updated {id}");
        Ok(container)
    }

    /// Deletes the container with everything below it.
    pub async fn delete_container(&self, id: ContainerId) -> Result<()> {
        let _guard = self.structure_lock.write(id).await;
        if !self.store.delete_container(id).await? {
            return Err(Error::NotFound(id));
        }
        info!("deleted {id}");
        Ok(())
    }

    pub async fn create_task(&self, room_id: Uuid) -> Result<Task> {
        self.container(ContainerId::Room(room_id)).await?;
        let task = self.store.insert_task(room_id).await?;
        info!("created task {} in room {room_id}", task.id);
        Ok(task)
    }

    pub async fn delete_task(&self, task_id: Uuid) -> Result<()> {
        if !self.store.delete_task(task_id).await? {
            return Err(Error::TaskNotFound(task_id));
        }
        info!("deleted task {task_id}");
        Ok(())
    }

    /// Grants `level` on the container to `user_id`, replacing an existing
    /// grant of the same user.
    pub async fn grant_access(
        &self,
        id: ContainerId,
        user_id: Uuid,
        level: AccessLevel,
    ) -> Result<Grant> {
        let _guard = self.grant_lock.write((user_id, id)).await;
        let grant = self
            .store
            .upsert_grant(Grant {
                user_id,
                container: id,
                level,
            })
            .await?
            .ok_or(Error::NotFound(id))?;
        info!("granted {level:?} on {id} to {user_id}");
        Ok(grant)
    }

    /// Returns whether there was a grant to remove.
    pub async fn revoke_access(&self, id: ContainerId, user_id: Uuid) -> Result<bool> {
        let _guard = self.grant_lock.write((user_id, id)).await;
        let removed = self.store.delete_grant(user_id, id).await?;
        if removed {
            info!("revoked access on {id} from {user_id}");
        }
        Ok(removed)
    }

    pub async fn update_progress(
        &self,
        user: &User,
        task_id: Uuid,
        status: ProgressStatus,
    ) -> Result<CompletionRecord> {
        let _guard = self.progress_lock.write((user.id, task_id)).await;
        let record = self
            .store
            .upsert_completion(user.id, task_id, status)
            .await?
            .ok_or(Error::TaskNotFound(task_id))?;
        debug!(
            "progress of {} on task {task_id}: {status:?} after {} attempts",
            user.id, record.attempts
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::MemoryStore;

    fn setup() -> (Courses<MemoryStore>, User) {
        (
            Courses::new(MemoryStore::new()),
            User::new(Uuid::new_v4()),
        )
    }

    #[tokio::test]
    async fn test_create_rejects_public_below_private() {
        let (courses, user) = setup();
        let course = courses
            .create_course(&user, NewContainer::new("Latin", ""))
            .await
            .unwrap();
        let result = courses
            .create_section(&user, course.id.uuid(), NewContainer::new("1", "").public())
            .await;
        assert!(matches!(
            result,
            Err(Error::VisibilityConflict { parent }) if parent == course.id
        ));
        assert!(courses.store().children(course.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_in_missing_parent() {
        let (courses, user) = setup();
        let id = Uuid::new_v4();
        assert!(matches!(
            courses.create_room(&user, id, NewContainer::new("", "")).await,
            Err(Error::NotFound(ContainerId::Section(x))) if x == id
        ));
        assert!(matches!(
            courses.create_task(id).await,
            Err(Error::NotFound(ContainerId::Room(x))) if x == id
        ));
    }

    #[tokio::test]
    async fn test_update_container() {
        let (courses, user) = setup();
        let course = courses
            .create_course(&user, NewContainer::new("Latin", "").public())
            .await
            .unwrap();
        let section = courses
            .create_section(&user, course.id.uuid(), NewContainer::new("1", "").public())
            .await
            .unwrap();

        let result = courses
            .update_container(
                course.id,
                ContainerUpdate {
                    visibility: Some(Visibility::Private),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(Error::VisibilityConflict { .. })));

        let section = courses
            .update_container(
                section.id,
                ContainerUpdate {
                    title: Some("Grammar".into()),
                    visibility: Some(Visibility::Private),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(section.title, "Grammar");
        assert_eq!(section.description, "");
        assert!(!section.is_public());

        let course = courses
            .update_container(
                course.id,
                ContainerUpdate {
                    visibility: Some(Visibility::Private),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!course.is_public());
    }

    #[tokio::test]
    async fn test_update_progress_requires_task() {
        let (courses, user) = setup();
        let id = Uuid::new_v4();
        assert!(matches!(
            courses
                .update_progress(&user, id, ProgressStatus::Completed)
                .await,
            Err(Error::TaskNotFound(x)) if x == id
        ));
        assert!(matches!(
            courses.delete_task(id).await,
            Err(Error::TaskNotFound(x)) if x == id
        ));
    }

    #[tokio::test]
    async fn test_task_progress() {
        let (courses, user) = setup();
        let course = courses
            .create_course(&user, NewContainer::new("", ""))
            .await
            .unwrap();
        let section = courses
            .create_section(&user, course.id.uuid(), NewContainer::new("", ""))
            .await
            .unwrap();
        let room = courses
            .create_room(&user, section.id.uuid(), NewContainer::new("", ""))
            .await
            .unwrap();
        let room_id = room.id.uuid();
        let first = courses.create_task(room_id).await.unwrap();
        let second = courses.create_task(room_id).await.unwrap();
        courses
            .update_progress(&user, second.id, ProgressStatus::InProgress)
            .await
            .unwrap();
        courses
            .update_progress(&user, second.id, ProgressStatus::Completed)
            .await
            .unwrap();

        let tasks = courses.task_progress(room_id, &user).await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].task.id, first.id);
        assert_eq!(tasks[0].record, None);
        assert_eq!(tasks[1].task.id, second.id);
        let record = tasks[1].record.as_ref().unwrap();
        assert_eq!(record.status, ProgressStatus::Completed);
        assert_eq!(record.attempts, 2);
    }

    #[tokio::test]
    async fn test_editors() {
        let (courses, user) = setup();
        let course = courses
            .create_course(&user, NewContainer::new("", ""))
            .await
            .unwrap();
        let editor = Uuid::new_v4();
        let visitor = Uuid::new_v4();
        courses
            .grant_access(course.id, editor, AccessLevel::Editor)
            .await
            .unwrap();
        courses
            .grant_access(course.id, visitor, AccessLevel::Visitor)
            .await
            .unwrap();

        assert_eq!(courses.grants(course.id).await.unwrap().len(), 2);
        let editors = courses.editors(course.id).await.unwrap();
        assert_eq!(editors.len(), 1);
        assert_eq!(editors[0].user_id, editor);

        assert!(courses.revoke_access(course.id, editor).await.unwrap());
        assert!(!courses.revoke_access(course.id, editor).await.unwrap());
        assert!(courses.editors(course.id).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_structure_writes_keep_visibility() {
        let courses = Arc::new(Courses::new(MemoryStore::new()));
        let user = User::new(Uuid::new_v4());
        for _ in 0..50 {
            let course = courses
                .create_course(&user, NewContainer::new("", "").public())
                .await
                .unwrap()
                .id;

            let create = tokio::spawn({
                let courses = Arc::clone(&courses);
                async move {
                    courses
                        .create_section(&user, course.uuid(), NewContainer::new("", "").public())
                        .await
                }
            });
            let hide = tokio::spawn({
                let courses = Arc::clone(&courses);
                async move {
                    courses
                        .update_container(
                            course,
                            ContainerUpdate {
                                visibility: Some(Visibility::Private),
                                ..Default::default()
                            },
                        )
                        .await
                }
            });
            let created = create.await.unwrap();
            let hidden = hide.await.unwrap();
            assert!(created.is_ok() ^ hidden.is_ok());

            let children = courses.store().children(course).await.unwrap();
            let course = courses.container(course).await.unwrap();
            assert!(course.is_public() || children.iter().all(|c| !c.is_public()));
        }
    }

    #[tokio::test]
    async fn test_writes_on_deleted_targets() {
        let (courses, user) = setup();
        let course = courses
            .create_course(&user, NewContainer::new("", ""))
            .await
            .unwrap();
        let section = courses
            .create_section(&user, course.id.uuid(), NewContainer::new("", ""))
            .await
            .unwrap();
        let room = courses
            .create_room(&user, section.id.uuid(), NewContainer::new("", ""))
            .await
            .unwrap();
        let task = courses.create_task(room.id.uuid()).await.unwrap();
        courses.delete_container(course.id).await.unwrap();

        assert!(matches!(
            courses
                .update_progress(&user, task.id, ProgressStatus::Completed)
                .await,
            Err(Error::TaskNotFound(x)) if x == task.id
        ));
        assert!(matches!(
            courses
                .grant_access(room.id, Uuid::new_v4(), AccessLevel::Editor)
                .await,
            Err(Error::NotFound(x)) if x == room.id
        ));
        assert!(matches!(
            courses
                .create_room(&user, section.id.uuid(), NewContainer::new("", ""))
                .await,
            Err(Error::NotFound(x)) if x == section.id
        ));
    }
}
