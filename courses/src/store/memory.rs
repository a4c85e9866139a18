use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use itertools::Itertools;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult, TaskCounts};
use crate::model::{
    AccessLevel, CompletionRecord, Container, ContainerId, Grant, ProgressStatus, Task,
};

/// Keeps the whole tree in keyed maps behind a single lock, so every write,
/// including a cascading delete, is applied atomically.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
    containers: HashMap<ContainerId, Container>,
    grants: HashMap<(Uuid, ContainerId), AccessLevel>,
    tasks: HashMap<Uuid, Task>,
    completions: HashMap<(Uuid, Uuid), CompletionRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl State {
    fn children(&self, id: ContainerId) -> Vec<Container> {
        self.containers
            .values()
            .filter(|c| c.parent == Some(id))
            .sorted_by_key(|c| (c.creation_timestamp, c.id))
            .cloned()
            .collect()
    }

    fn subtree(&self, root: ContainerId) -> HashSet<ContainerId> {
        let mut out = HashSet::new();
        let mut pending = vec![root];
        while let Some(id) = pending.pop() {
            if out.insert(id) {
                pending.extend(
                    self.containers
                        .values()
                        .filter(|c| c.parent == Some(id))
                        .map(|c| c.id),
                );
            }
        }
        out
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn container(&self, id: ContainerId) -> StoreResult<Option<Container>> {
        Ok(self.state.read().await.containers.get(&id).cloned())
    }

    async fn children(&self, id: ContainerId) -> StoreResult<Vec<Container>> {
        Ok(self.state.read().await.children(id))
    }

    async fn courses(&self) -> StoreResult<Vec<Container>> {
        Ok(self
            .state
            .read()
            .await
            .containers
            .values()
            .filter(|c| matches!(c.id, ContainerId::Course(_)))
            .sorted_by_key(|c| (c.creation_timestamp, c.id))
            .cloned()
            .collect())
    }

    async fn grant(
        &self,
        user_id: Uuid,
        container: ContainerId,
    ) -> StoreResult<Option<AccessLevel>> {
        Ok(self
            .state
            .read()
            .await
            .grants
            .get(&(user_id, container))
            .copied())
    }

    async fn grants(&self, container: ContainerId) -> StoreResult<Vec<Grant>> {
        Ok(self
            .state
            .read()
            .await
            .grants
            .iter()
            .filter(|((_, c), _)| *c == container)
            .map(|(&(user_id, container), &level)| Grant {
                user_id,
                container,
                level,
            })
            .sorted_by_key(|g| g.user_id)
            .collect())
    }

    async fn count_tasks(&self, rooms: &[Uuid], user_id: Uuid) -> StoreResult<TaskCounts> {
        let rooms = rooms.iter().copied().collect::<HashSet<_>>();
        let state = self.state.read().await;
        let tasks = state
            .tasks
            .values()
            .filter(|t| t.room_id.is_some_and(|r| rooms.contains(&r)))
            .map(|t| t.id)
            .collect::<HashSet<_>>();
        let completed = tasks
            .iter()
            .filter(|&&task_id| {
                state
                    .completions
                    .get(&(user_id, task_id))
                    .is_some_and(CompletionRecord::is_completed)
            })
            .count();
        Ok(TaskCounts {
            total: tasks.len() as _,
            completed: completed as _,
        })
    }

    async fn task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(self.state.read().await.tasks.get(&id).cloned())
    }

    async fn tasks(&self, room_id: Uuid) -> StoreResult<Vec<Task>> {
        Ok(self
            .state
            .read()
            .await
            .tasks
            .values()
            .filter(|t| t.room_id == Some(room_id))
            .sorted_by_key(|t| t.position)
            .cloned()
            .collect())
    }

    async fn completions(
        &self,
        user_id: Uuid,
        task_ids: &[Uuid],
    ) -> StoreResult<Vec<CompletionRecord>> {
        let state = self.state.read().await;
        Ok(task_ids
            .iter()
            .filter_map(|&task_id| state.completions.get(&(user_id, task_id)))
            .cloned()
            .collect())
    }

    async fn insert_container(&self, container: Container) -> StoreResult<Container> {
        let mut state = self.state.write().await;
        if let Some(parent) = container.parent {
            if !state.containers.contains_key(&parent) {
                return Err(StoreError::MissingParent(container.id));
            }
        }
        state.containers.insert(container.id, container.clone());
        Ok(container)
    }

    async fn update_container(&self, container: Container) -> StoreResult<Option<Container>> {
        let mut state = self.state.write().await;
        let Some(existing) = state.containers.get_mut(&container.id) else {
            return Ok(None);
        };
        *existing = container.clone();
        Ok(Some(container))
    }

    async fn delete_container(&self, id: ContainerId) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if !state.containers.contains_key(&id) {
            return Ok(false);
        }

        let subtree = state.subtree(id);
        let rooms = subtree
            .iter()
            .filter_map(|c| match c {
                ContainerId::Room(room_id) => Some(*room_id),
                _ => None,
            })
            .collect::<HashSet<_>>();
        let tasks = state
            .tasks
            .values()
            .filter(|t| t.room_id.is_some_and(|r| rooms.contains(&r)))
            .map(|t| t.id)
            .collect::<HashSet<_>>();

        state
            .completions
            .retain(|(_, task_id), _| !tasks.contains(task_id));
        state.tasks.retain(|task_id, _| !tasks.contains(task_id));
        state.grants.retain(|(_, c), _| !subtree.contains(c));
        state.containers.retain(|c, _| !subtree.contains(c));
        Ok(true)
    }

    async fn upsert_grant(&self, grant: Grant) -> StoreResult<Option<Grant>> {
        let mut state = self.state.write().await;
        if !state.containers.contains_key(&grant.container) {
            return Ok(None);
        }
        state
            .grants
            .insert((grant.user_id, grant.container), grant.level);
        Ok(Some(grant))
    }

    async fn delete_grant(&self, user_id: Uuid, container: ContainerId) -> StoreResult<bool> {
        Ok(self
            .state
            .write()
            .await
            .grants
            .remove(&(user_id, container))
            .is_some())
    }

    async fn insert_task(&self, room_id: Uuid) -> StoreResult<Task> {
        let mut state = self.state.write().await;
        let position = state
            .tasks
            .values()
            .filter(|t| t.room_id == Some(room_id))
            .count();
        let task = Task {
            id: Uuid::new_v4(),
            room_id: Some(room_id),
            position: position as _,
            creation_timestamp: Utc::now().naive_utc(),
        };
        state.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if state.tasks.remove(&id).is_none() {
            return Ok(false);
        }
        state.completions.retain(|(_, task_id), _| *task_id != id);
        Ok(true)
    }

    async fn upsert_completion(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        status: ProgressStatus,
    ) -> StoreResult<Option<CompletionRecord>> {
        let now = Utc::now().naive_utc();
        let mut state = self.state.write().await;
        if !state.tasks.contains_key(&task_id) {
            return Ok(None);
        }
        let record = state
            .completions
            .entry((user_id, task_id))
            .and_modify(|record| {
                record.status = status;
                record.attempts += 1;
                record.last_update = now;
            })
            .or_insert_with(|| CompletionRecord {
                user_id,
                task_id,
                status,
                attempts: 1,
                last_update: now,
            });
        Ok(Some(record.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewContainer, Visibility};

    fn container(id: ContainerId, parent: Option<ContainerId>) -> Container {
        NewContainer::new("title", "description").into_container(id, parent, Uuid::new_v4())
    }

    async fn tree(store: &MemoryStore) -> (ContainerId, ContainerId, ContainerId) {
        let course = ContainerId::Course(Uuid::new_v4());
        let section = ContainerId::Section(Uuid::new_v4());
        let room = ContainerId::Room(Uuid::new_v4());
        store.insert_container(container(course, None)).await.unwrap();
        store
            .insert_container(container(section, Some(course)))
            .await
            .unwrap();
        store
            .insert_container(container(room, Some(section)))
            .await
            .unwrap();
        (course, section, room)
    }

    #[tokio::test]
    async fn test_grant_upsert_replaces_level() {
        let store = MemoryStore::new();
        let (course, _, _) = tree(&store).await;
        let user_id = Uuid::new_v4();
        for level in [AccessLevel::Editor, AccessLevel::Editor] {
            store
                .upsert_grant(Grant {
                    user_id,
                    container: course,
                    level,
                })
                .await
                .unwrap();
        }
        let grants = store.grants(course).await.unwrap();
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].level, AccessLevel::Editor);

        store
            .upsert_grant(Grant {
                user_id,
                container: course,
                level: AccessLevel::Visitor,
            })
            .await
            .unwrap();
        assert_eq!(
            store.grant(user_id, course).await.unwrap(),
            Some(AccessLevel::Visitor)
        );
        assert_eq!(store.grants(course).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_completion_upsert_counts_attempts() {
        let store = MemoryStore::new();
        let (_, _, room) = tree(&store).await;
        let task = store.insert_task(room.uuid()).await.unwrap();
        let user_id = Uuid::new_v4();

        let first = store
            .upsert_completion(user_id, task.id, ProgressStatus::InProgress)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.attempts, 1);
        let second = store
            .upsert_completion(user_id, task.id, ProgressStatus::Completed)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.attempts, 2);
        assert!(second.is_completed());

        let records = store.completions(user_id, &[task.id]).await.unwrap();
        assert_eq!(records, [second]);

        assert_eq!(
            store
                .upsert_completion(user_id, Uuid::new_v4(), ProgressStatus::Completed)
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_task_positions() {
        let store = MemoryStore::new();
        let (_, _, room) = tree(&store).await;
        for _ in 0..3 {
            store.insert_task(room.uuid()).await.unwrap();
        }
        let positions = store
            .tasks(room.uuid())
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.position)
            .collect_vec();
        assert_eq!(positions, [0, 1, 2]);
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let store = MemoryStore::new();
        let (course, section, room) = tree(&store).await;
        let (other_course, _, other_room) = tree(&store).await;
        let user_id = Uuid::new_v4();
        let task = store.insert_task(room.uuid()).await.unwrap();
        let other_task = store.insert_task(other_room.uuid()).await.unwrap();
        for task_id in [task.id, other_task.id] {
            store
                .upsert_completion(user_id, task_id, ProgressStatus::Completed)
                .await
                .unwrap();
        }
        for container in [course, section, room, other_course] {
            store
                .upsert_grant(Grant {
                    user_id,
                    container,
                    level: AccessLevel::Visitor,
                })
                .await
                .unwrap();
        }

        assert!(store.delete_container(course).await.unwrap());
        assert!(!store.delete_container(course).await.unwrap());

        for id in [course, section, room] {
            assert_eq!(store.container(id).await.unwrap(), None);
            assert_eq!(store.grant(user_id, id).await.unwrap(), None);
        }
        assert_eq!(store.task(task.id).await.unwrap(), None);
        assert!(store
            .completions(user_id, &[task.id])
            .await
            .unwrap()
            .is_empty());

        assert!(store.container(other_course).await.unwrap().is_some());
        assert!(store.task(other_task.id).await.unwrap().is_some());
        assert_eq!(
            store.grant(user_id, other_course).await.unwrap(),
            Some(AccessLevel::Visitor)
        );
    }

    #[tokio::test]
    async fn test_count_tasks_ignores_orphans_and_other_users() {
        let store = MemoryStore::new();
        let (_, _, room) = tree(&store).await;
        let user_id = Uuid::new_v4();
        let a = store.insert_task(room.uuid()).await.unwrap();
        let b = store.insert_task(room.uuid()).await.unwrap();
        store
            .upsert_completion(user_id, a.id, ProgressStatus::Completed)
            .await
            .unwrap();
        store
            .upsert_completion(user_id, b.id, ProgressStatus::InProgress)
            .await
            .unwrap();
        store
            .upsert_completion(Uuid::new_v4(), b.id, ProgressStatus::Completed)
            .await
            .unwrap();
        store.state.write().await.tasks.insert(
            Uuid::new_v4(),
            Task {
                id: Uuid::new_v4(),
                room_id: None,
                position: 0,
                creation_timestamp: Utc::now().naive_utc(),
            },
        );

        let counts = store
            .count_tasks(&[room.uuid(), room.uuid()], user_id)
            .await
            .unwrap();
        assert_eq!(
            counts,
            TaskCounts {
                total: 2,
                completed: 1
            }
        );
        assert_eq!(
            store.count_tasks(&[], user_id).await.unwrap(),
            TaskCounts::default()
        );
    }

    #[tokio::test]
    async fn test_children_and_courses() {
        let store = MemoryStore::new();
        let (course, section, room) = tree(&store).await;
        let children = store.children(course).await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, section);
        assert_eq!(children[0].visibility, Visibility::Private);
        assert!(store.children(room).await.unwrap().is_empty());
        assert_eq!(
            store
                .courses()
                .await
                .unwrap()
                .into_iter()
                .map(|c| c.id)
                .collect_vec(),
            [course]
        );
    }

    #[tokio::test]
    async fn test_writes_after_delete_do_not_restore_anything() {
        let store = MemoryStore::new();
        let (course, section, room) = tree(&store).await;
        let task = store.insert_task(room.uuid()).await.unwrap();
        let course_data = store.container(course).await.unwrap().unwrap();
        let section_data = store.container(section).await.unwrap().unwrap();
        assert!(store.delete_container(course).await.unwrap());

        assert_eq!(store.update_container(course_data).await.unwrap(), None);
        assert_eq!(store.container(course).await.unwrap(), None);

        let user_id = Uuid::new_v4();
        let grant = Grant {
            user_id,
            container: section,
            level: AccessLevel::Editor,
        };
        assert_eq!(store.upsert_grant(grant).await.unwrap(), None);
        assert_eq!(store.grant(user_id, section).await.unwrap(), None);

        assert_eq!(
            store
                .upsert_completion(user_id, task.id, ProgressStatus::Completed)
                .await
                .unwrap(),
            None
        );
        assert!(store
            .completions(user_id, &[task.id])
            .await
            .unwrap()
            .is_empty());

        assert!(matches!(
            store.insert_container(section_data).await,
            Err(StoreError::MissingParent(id)) if id == section
        ));
        assert!(store.children(course).await.unwrap().is_empty());
    }
}
