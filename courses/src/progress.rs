//! Completion statistics of a user for any course, section or room.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::{
    model::ContainerId,
    store::{Store, StoreResult, TaskCounts},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Progress {
    pub completed: u64,
    pub total: u64,
    /// `100 * completed / total`, or `0.0` if there are no tasks.
    pub percent: f64,
}

impl Progress {
    pub fn new(completed: u64, total: u64) -> Self {
        let percent = if total > 0 {
            100.0 * completed as f64 / total as f64
        } else {
            0.0
        };
        Self {
            completed,
            total,
            percent,
        }
    }
}

impl From<TaskCounts> for Progress {
    fn from(counts: TaskCounts) -> Self {
        Self::new(counts.completed, counts.total)
    }
}

/// Collects the ids of all rooms in the subtree below `root` (including `root`
/// itself if it is a room).
pub async fn rooms_under<S: Store + ?Sized>(store: &S, root: ContainerId) -> StoreResult<Vec<Uuid>> {
    let mut visited = HashSet::new();
    let mut rooms = Vec::new();
    let mut pending = vec![root];
    while let Some(id) = pending.pop() {
        if !visited.insert(id) {
            debug!("{id} reached twice below {root}");
            continue;
        }
        match id {
            ContainerId::Room(room_id) => rooms.push(room_id),
            _ => pending.extend(store.children(id).await?.into_iter().map(|c| c.id)),
        }
    }
    Ok(rooms)
}

/// Computes the progress of `user_id` in the subtree below `root`.
///
/// Store errors are logged and reported as empty progress.
pub async fn progress<S: Store + ?Sized>(store: &S, root: ContainerId, user_id: Uuid) -> Progress {
    match count_tasks_under(store, root, user_id).await {
        Ok(counts) => {
            trace!(
                "progress of {user_id} in {root}: {}/{}",
                counts.completed,
                counts.total
            );
            counts.into()
        }
        Err(err) => {
            warn!("could not compute progress of {user_id} in {root}: {err}");
            Progress::default()
        }
    }
}

async fn count_tasks_under<S: Store + ?Sized>(
    store: &S,
    root: ContainerId,
    user_id: Uuid,
) -> StoreResult<TaskCounts> {
    let rooms = rooms_under(store, root).await?;
    store.count_tasks(&rooms, user_id).await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;
    use crate::{
        model::{NewContainer, ProgressStatus},
        store::MemoryStore,
    };

    #[test]
    fn test_progress_percent() {
        assert_eq!(Progress::new(0, 0).percent, 0.0);
        assert_eq!(Progress::new(2, 4).percent, 50.0);
        assert_eq!(Progress::new(3, 3).percent, 100.0);
        assert_eq!(Progress::new(0, 7).percent, 0.0);
    }

    async fn add(store: &MemoryStore, id: ContainerId, parent: Option<ContainerId>) {
        store
            .insert_container(NewContainer::new("", "").into_container(id, parent, Uuid::new_v4()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_scopes_are_consistent() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let course = ContainerId::Course(Uuid::new_v4());
        let sections = [
            ContainerId::Section(Uuid::new_v4()),
            ContainerId::Section(Uuid::new_v4()),
        ];
        add(&store, course, None).await;
        let mut rooms = Vec::new();
        for section in sections {
            add(&store, section, Some(course)).await;
            for _ in 0..2 {
                let room = Uuid::new_v4();
                add(&store, ContainerId::Room(room), Some(section)).await;
                rooms.push(room);
            }
        }

        for (i, &room) in rooms.iter().enumerate() {
            for j in 0..=i {
                let task = store.insert_task(room).await.unwrap();
                if j % 2 == 0 {
                    store
                        .upsert_completion(user, task.id, ProgressStatus::Completed)
                        .await
                        .unwrap();
                } else {
                    store
                        .upsert_completion(user, task.id, ProgressStatus::InProgress)
                        .await
                        .unwrap();
                }
            }
        }

        let mut completed = 0;
        let mut total = 0;
        for section in sections {
            let p = progress(&store, section, user).await;
            completed += p.completed;
            total += p.total;
        }
        let p = progress(&store, course, user).await;
        assert_eq!((p.completed, p.total), (completed, total));
        assert_eq!((p.completed, p.total), (6, 10));
        assert_eq!(p.percent, 60.0);

        let mut sorted = rooms_under(&store, course).await.unwrap();
        sorted.sort();
        rooms.sort();
        assert_eq!(sorted, rooms);
    }

    #[tokio::test]
    async fn test_progress_bounds() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let section = ContainerId::Section(Uuid::new_v4());
        let room = Uuid::new_v4();
        add(&store, section, None).await;
        add(&store, ContainerId::Room(room), Some(section)).await;

        assert_eq!(progress(&store, section, user).await, Progress::default());

        let task = store.insert_task(room).await.unwrap();
        store.insert_task(room).await.unwrap();
        for _ in 0..3 {
            store
                .upsert_completion(user, task.id, ProgressStatus::Completed)
                .await
                .unwrap();
        }
        let p = progress(&store, ContainerId::Room(room), user).await;
        assert!(p.completed <= p.total);
        assert!((0.0..=100.0).contains(&p.percent));
        assert_eq!(p, Progress::new(1, 2));

        let other = progress(&store, ContainerId::Room(room), Uuid::new_v4()).await;
        assert_eq!(other, Progress::new(0, 2));
    }

    #[tokio::test]
    async fn test_malformed_tree_terminates() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let course = ContainerId::Course(Uuid::new_v4());
        let section = ContainerId::Section(Uuid::new_v4());
        let room = Uuid::new_v4();
        add(&store, course, None).await;
        add(&store, section, Some(course)).await;
        add(&store, ContainerId::Room(room), Some(section)).await;
        let task = store.insert_task(room).await.unwrap();
        store
            .upsert_completion(user, task.id, ProgressStatus::Completed)
            .await
            .unwrap();

        let mut looped = store.container(section).await.unwrap().unwrap();
        looped.parent = Some(section);
        store.update_container(looped.clone()).await.unwrap();
        let p = timeout(Duration::from_secs(2), progress(&store, section, user))
            .await
            .unwrap();
        assert_eq!(p, Progress::new(1, 1));

        looped.parent = Some(course);
        store.update_container(looped).await.unwrap();
        let mut looped = store.container(course).await.unwrap().unwrap();
        looped.parent = Some(section);
        store.update_container(looped).await.unwrap();
        let rooms = timeout(Duration::from_secs(2), rooms_under(&store, course))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rooms, [room]);
    }

    #[tokio::test]
    async fn test_unknown_root_is_empty() {
        let store = MemoryStore::new();
        let p = progress(&store, ContainerId::Course(Uuid::new_v4()), Uuid::new_v4()).await;
        assert_eq!(p, Progress::default());
    }
}
