use std::fmt;

use chrono::{NaiveDateTime, Utc};
use entity::{
    courses_courses, courses_rooms, courses_sections, courses_task_progress, courses_tasks,
};
use serde::Serialize;
use uuid::Uuid;

pub use entity::sea_orm_active_enums::{
    CoursesAccessLevel as AccessLevel, CoursesProgressStatus as ProgressStatus,
    CoursesVisibility as Visibility,
};

/// Identity of a node in the Course → Section → Room tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ContainerId {
    Course(Uuid),
    Section(Uuid),
    Room(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Course,
    Section,
    Room,
}

impl ContainerId {
    pub fn uuid(self) -> Uuid {
        match self {
            Self::Course(id) | Self::Section(id) | Self::Room(id) => id,
        }
    }

    pub fn kind(self) -> ContainerKind {
        match self {
            Self::Course(_) => ContainerKind::Course,
            Self::Section(_) => ContainerKind::Section,
            Self::Room(_) => ContainerKind::Room,
        }
    }
}

impl ContainerKind {
    /// The kind of the direct children, `None` for rooms.
    pub fn child(self) -> Option<Self> {
        match self {
            Self::Course => Some(Self::Section),
            Self::Section => Some(Self::Room),
            Self::Room => None,
        }
    }

    pub fn id(self, id: Uuid) -> ContainerId {
        match self {
            Self::Course => ContainerId::Course(id),
            Self::Section => ContainerId::Section(id),
            Self::Room => ContainerId::Room(id),
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Course => "course",
            Self::Section => "section",
            Self::Room => "room",
        })
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.uuid())
    }
}

/// A course, section or room together with its resolved parent reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Container {
    pub id: ContainerId,
    pub parent: Option<ContainerId>,
    /// `None` once the creating user has been deleted.
    pub creator: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub visibility: Visibility,
    pub creation_timestamp: NaiveDateTime,
}

impl Container {
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    pub fn is_creator(&self, user_id: Uuid) -> bool {
        self.creator == Some(user_id)
    }
}

impl From<courses_courses::Model> for Container {
    fn from(course: courses_courses::Model) -> Self {
        Self {
            id: ContainerId::Course(course.id),
            parent: None,
            creator: course.creator,
            title: course.title,
            description: course.description,
            visibility: course.visibility,
            creation_timestamp: course.creation_timestamp,
        }
    }
}

impl From<courses_sections::Model> for Container {
    fn from(section: courses_sections::Model) -> Self {
        Self {
            id: ContainerId::Section(section.id),
            parent: Some(ContainerId::Course(section.course_id)),
            creator: section.creator,
            title: section.title,
            description: section.description,
            visibility: section.visibility,
            creation_timestamp: section.creation_timestamp,
        }
    }
}

impl From<courses_rooms::Model> for Container {
    fn from(room: courses_rooms::Model) -> Self {
        Self {
            id: ContainerId::Room(room.id),
            parent: Some(ContainerId::Section(room.section_id)),
            creator: room.creator,
            title: room.title,
            description: room.description,
            visibility: room.visibility,
            creation_timestamp: room.creation_timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContainer {
    pub title: String,
    pub description: String,
    pub visibility: Visibility,
}

impl NewContainer {
    /// New containers are private unless stated otherwise.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            visibility: Visibility::Private,
        }
    }

    pub fn public(mut self) -> Self {
        self.visibility = Visibility::Public;
        self
    }

    pub(crate) fn into_container(
        self,
        id: ContainerId,
        parent: Option<ContainerId>,
        creator: Uuid,
    ) -> Container {
        Container {
            id,
            parent,
            creator: Some(creator),
            title: self.title,
            description: self.description,
            visibility: self.visibility,
            creation_timestamp: Utc::now().naive_utc(),
        }
    }
}

/// Partial update; `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub visibility: Option<Visibility>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Grant {
    pub user_id: Uuid,
    pub container: ContainerId,
    pub level: AccessLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: Uuid,
    /// Orphaned tasks belong to no subtree.
    pub room_id: Option<Uuid>,
    pub position: i32,
    pub creation_timestamp: NaiveDateTime,
}

impl From<courses_tasks::Model> for Task {
    fn from(task: courses_tasks::Model) -> Self {
        Self {
            id: task.id,
            room_id: task.room_id,
            position: task.position,
            creation_timestamp: task.creation_timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionRecord {
    pub user_id: Uuid,
    pub task_id: Uuid,
    pub status: ProgressStatus,
    pub attempts: i32,
    pub last_update: NaiveDateTime,
}

impl CompletionRecord {
    pub fn is_completed(&self) -> bool {
        self.status == ProgressStatus::Completed
    }
}

impl From<courses_task_progress::Model> for CompletionRecord {
    fn from(progress: courses_task_progress::Model) -> Self {
        Self {
            user_id: progress.user_id,
            task_id: progress.task_id,
            status: progress.status,
            attempts: progress.attempts,
            last_update: progress.last_update,
        }
    }
}
