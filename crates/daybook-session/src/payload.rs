use crate::remote::{TaskDraft, TaskFields};
use chrono::NaiveDate;
use daybook_core::{DaybookError, DbResult, EntityId, Recurrence, When};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Replay payloads for queued operations. Each captures the minimal data
/// needed to repeat the effect against the remote store; the optimistic
/// session state is never serialized.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTaskPayload {
    pub temp_id: EntityId,
    #[serde(flatten)]
    pub draft: TaskDraft,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleTaskPayload {
    pub id: EntityId,
    pub is_completing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteTaskPayload {
    pub id: EntityId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "field")]
pub enum TaskUpdate {
    Fields(TaskFields),
    DueDate { due_date: Option<NaiveDate> },
    When { when: Option<When> },
    Grouping {
        project: Option<Uuid>,
        area: Option<Uuid>,
    },
    Recurrence { recurrence: Option<Recurrence> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateTaskPayload {
    pub id: EntityId,
    #[serde(flatten)]
    pub update: TaskUpdate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSubtaskPayload {
    pub task_id: EntityId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleSubtaskPayload {
    pub subtask_id: Uuid,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteSubtaskPayload {
    pub subtask_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateProjectPayload {
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub area_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteProjectPayload {
    pub id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAreaPayload {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteAreaPayload {
    pub id: Uuid,
}

pub fn encode<T: Serialize>(payload: &T) -> DbResult<Value> {
    serde_json::to_value(payload)
        .map_err(|err| DaybookError::io(format!("failed to encode queue payload: {err}")))
}

pub fn parse<T: for<'de> Deserialize<'de>>(payload: &Value) -> DbResult<T> {
    serde_json::from_value(payload.clone())
        .map_err(|err| DaybookError::rejected(format!("malformed queue payload: {err}")))
}
