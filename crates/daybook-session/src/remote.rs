use chrono::{DateTime, NaiveDate, Utc};
use daybook_core::{Area, DbResult, Project, Recurrence, Subtask, Tag, Task, When};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fields sent to the remote store when creating a task. The remote answers
/// with the authoritative entity carrying a durable id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub project: Option<Uuid>,
    #[serde(default)]
    pub area: Option<Uuid>,
    #[serde(default)]
    pub when: Option<When>,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
}

/// Partial field update; `None` leaves the field untouched. Clearable fields
/// have their own dedicated operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskFields {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub when: Option<When>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    pub projects: Vec<Project>,
    pub areas: Vec<Area>,
    pub tags: Vec<Tag>,
}

/// The hosted backend, one async-free method per mutation the session
/// replays. Consumed, never implemented here; errors should carry
/// `ErrorKind::Transient` for network/5xx-class failures and
/// `ErrorKind::Rejected` for validation/4xx-class ones.
pub trait RemoteStore {
    fn fetch_all(&self) -> DbResult<Snapshot>;

    fn create_task(&self, draft: &TaskDraft) -> DbResult<Task>;
    fn update_task_fields(&self, id: Uuid, fields: &TaskFields) -> DbResult<()>;
    fn set_task_due_date(&self, id: Uuid, due_date: Option<NaiveDate>) -> DbResult<()>;
    fn set_task_when(&self, id: Uuid, when: Option<When>) -> DbResult<()>;
    fn set_task_grouping(&self, id: Uuid, project: Option<Uuid>, area: Option<Uuid>)
    -> DbResult<()>;
    fn set_task_recurrence(&self, id: Uuid, recurrence: Option<Recurrence>) -> DbResult<()>;
    fn set_task_completion(
        &self,
        id: Uuid,
        completed: bool,
        completed_at: Option<DateTime<Utc>>,
    ) -> DbResult<()>;
    fn delete_task(&self, id: Uuid) -> DbResult<()>;
    fn delete_completed_tasks(&self) -> DbResult<()>;

    fn create_subtask(&self, task_id: Uuid, title: &str) -> DbResult<Subtask>;
    fn set_subtask_completion(&self, subtask_id: Uuid, completed: bool) -> DbResult<()>;
    fn delete_subtask(&self, subtask_id: Uuid) -> DbResult<()>;
    fn reorder_subtasks(&self, task_id: Uuid, ordered: &[Uuid]) -> DbResult<()>;

    fn create_project(
        &self,
        name: &str,
        color: &str,
        area_id: Option<Uuid>,
    ) -> DbResult<Project>;
    fn delete_project(&self, id: Uuid) -> DbResult<()>;

    fn create_area(&self, name: &str, color: &str) -> DbResult<Area>;
    fn delete_area(&self, id: Uuid) -> DbResult<()>;

    fn create_tag(&self, name: &str, color: &str) -> DbResult<Tag>;
    fn delete_tag(&self, id: Uuid) -> DbResult<()>;
    fn add_tag_to_task(&self, task_id: Uuid, tag_id: Uuid) -> DbResult<()>;
    fn remove_tag_from_task(&self, task_id: Uuid, tag_id: Uuid) -> DbResult<()>;
}
