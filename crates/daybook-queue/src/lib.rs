mod slot;

pub use slot::{MemorySlot, SlotStorage, SqliteSlot};

use chrono::{DateTime, Utc};
use daybook_core::DbResult;
use daybook_crypto::Codec;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};
use uuid::Uuid;

/// Storage key shared with earlier releases of the app; the slot name is
/// part of the on-device format.
pub const QUEUE_SLOT: &str = "offline_sync_queue";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Task,
    Subtask,
    Project,
    Area,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Update,
    Delete,
    Toggle,
}

/// A mutation captured while offline, waiting to be replayed against the
/// remote store. Only the sync engine mutates `retry_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedOperation {
    pub id: Uuid,
    pub domain: Domain,
    pub action: Action,
    pub payload: Value,
    pub enqueued_at: DateTime<Utc>,
    #[serde(default)]
    pub retry_count: u32,
}

/// The persisted queue: an append-only list of operations serialized through
/// the codec into one storage slot. Every operation is read-modify-write of
/// the whole list; the storage backend is injected so the queue tests without
/// a real device store.
#[derive(Debug, Clone)]
pub struct QueueStore<S: SlotStorage> {
    slot: S,
    codec: Codec,
}

impl<S: SlotStorage> QueueStore<S> {
    pub fn new(slot: S, codec: Codec) -> Self {
        Self { slot, codec }
    }

    pub fn enqueue(&self, domain: Domain, action: Action, payload: Value) -> DbResult<Uuid> {
        let op = QueuedOperation {
            id: Uuid::new_v4(),
            domain,
            action,
            payload,
            enqueued_at: Utc::now(),
            retry_count: 0,
        };

        let id = op.id;
        self.mutate(|queue| queue.push(op))?;
        debug!(%id, "queued offline operation");
        Ok(id)
    }

    pub fn remove_many(&self, ids: &HashSet<Uuid>) -> DbResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        self.mutate(|queue| queue.retain(|op| !ids.contains(&op.id)))
    }

    pub fn update_retry_counts(&self, updates: &HashMap<Uuid, u32>) -> DbResult<()> {
        if updates.is_empty() {
            return Ok(());
        }

        self.mutate(|queue| {
            for op in queue.iter_mut() {
                if let Some(count) = updates.get(&op.id) {
                    op.retry_count = *count;
                }
            }
        })
    }

    /// Removals and retry-count updates from one drain pass, applied in a
    /// single read-modify-write to keep the lost-update window minimal.
    pub fn apply_drain_outcome(
        &self,
        removals: &HashSet<Uuid>,
        retry_updates: &HashMap<Uuid, u32>,
    ) -> DbResult<()> {
        if removals.is_empty() && retry_updates.is_empty() {
            return Ok(());
        }

        self.mutate(|queue| {
            queue.retain(|op| !removals.contains(&op.id));
            for op in queue.iter_mut() {
                if let Some(count) = retry_updates.get(&op.id) {
                    op.retry_count = *count;
                }
            }
        })
    }

    /// Full queue contents in enqueue order. A corrupt or undecodable blob
    /// yields an empty list; the queue must never take the app down.
    pub fn read_all(&self) -> Vec<QueuedOperation> {
        let raw = match self.slot.read() {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(error) => {
                warn!("failed to read queue slot, treating queue as empty: {error}");
                return Vec::new();
            }
        };

        let text = if Codec::looks_encrypted(&raw) {
            self.codec.decrypt(&raw)
        } else {
            raw
        };

        match serde_json::from_str::<Vec<QueuedOperation>>(&text) {
            Ok(queue) => queue,
            Err(error) => {
                warn!("corrupt queue blob, treating queue as empty: {error}");
                Vec::new()
            }
        }
    }

    pub fn pending_count(&self) -> usize {
        self.read_all().len()
    }

    pub fn clear(&self) -> DbResult<()> {
        self.slot.clear()
    }

    fn mutate(&self, transform: impl FnOnce(&mut Vec<QueuedOperation>)) -> DbResult<()> {
        let mut queue = self.read_all();
        transform(&mut queue);

        let encoded = serde_json::to_string(&queue).map_err(|err| {
            daybook_core::DaybookError::io(format!("failed to encode queue: {err}"))
        })?;

        self.slot.write(&self.codec.encrypt(&encoded))
    }
}
