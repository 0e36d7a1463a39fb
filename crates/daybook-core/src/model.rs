use chrono::{DateTime, NaiveDate, Utc};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

const PENDING_PREFIX: &str = "temp-";

/// Identity of a task in the session store. A locally created task carries a
/// `Pending` id until the remote store confirms the create, at which point the
/// whole entity is replaced by its `Confirmed` counterpart in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityId {
    Pending(Uuid),
    Confirmed(Uuid),
}

impl EntityId {
    pub fn new_pending() -> Self {
        Self::Pending(Uuid::new_v4())
    }

    pub fn confirmed(id: Uuid) -> Self {
        Self::Confirmed(id)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    pub fn as_uuid(&self) -> Uuid {
        match self {
            Self::Pending(id) | Self::Confirmed(id) => *id,
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        if let Some(rest) = input.strip_prefix(PENDING_PREFIX) {
            return Uuid::parse_str(rest).ok().map(Self::Pending);
        }
        Uuid::parse_str(input).ok().map(Self::Confirmed)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending(id) => write!(f, "{PENDING_PREFIX}{id}"),
            Self::Confirmed(id) => write!(f, "{id}"),
        }
    }
}

// The wire form stays the prefixed string so persisted queue payloads written
// before the tagged id existed remain readable.
impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid entity id '{raw}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceKind {
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    pub kind: RecurrenceKind,
    pub interval: u32,
}

impl Recurrence {
    pub fn new(kind: RecurrenceKind, interval: u32) -> Self {
        Self {
            kind,
            interval: interval.max(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum When {
    Today,
    Evening,
    Someday,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Inbox,
    Today,
    Upcoming,
    Someday,
    Logbook,
}

impl View {
    /// Bucket assigned to tasks created from this view.
    pub fn default_when(self) -> Option<When> {
        match self {
            View::Today => Some(When::Today),
            View::Someday => Some(When::Someday),
            View::Inbox | View::Upcoming | View::Logbook => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: Uuid,
    pub title: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
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
    #[serde(default)]
    pub tags: Vec<Uuid>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub area_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: Uuid,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub color: String,
}
