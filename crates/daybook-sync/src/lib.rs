use daybook_core::DbResult;
use daybook_queue::{Action, Domain, QueueStore, SlotStorage};
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

pub const MAX_RETRIES: u32 = 3;
pub const BASE_DELAY_MS: u64 = 1000;

// 2^6 * base is the largest backoff we will ever sleep, regardless of how
// high a caller sets the retry ceiling.
const MAX_BACKOFF_SHIFT: u32 = 6;

pub type Handler<'a> = Box<dyn Fn(&Value) -> DbResult<()> + 'a>;

/// Replay handlers keyed by `(domain, action)`. The engine stays generic:
/// the session layer owns the set of supported mutations and injects them
/// per drain call.
#[derive(Default)]
pub struct HandlerSet<'a> {
    handlers: HashMap<(Domain, Action), Handler<'a>>,
}

impl<'a> HandlerSet<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        mut self,
        domain: Domain,
        action: Action,
        handler: impl Fn(&Value) -> DbResult<()> + 'a,
    ) -> Self {
        self.handlers.insert((domain, action), Box::new(handler));
        self
    }

    fn get(&self, domain: Domain, action: Action) -> Option<&Handler<'a>> {
        self.handlers.get(&(domain, action))
    }
}

/// What one drain pass decided for a single operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpOutcome {
    Succeeded,
    Retry {
        next_retry_count: u32,
        backoff: Duration,
    },
    Abandoned,
}

/// Pure classification of one handler result. Transient and rejected remote
/// failures are treated alike: both retry to the ceiling. The error is still
/// threaded through so a future split stays local to this function.
pub fn decide(
    result: &DbResult<()>,
    retry_count: u32,
    max_retries: u32,
    base_delay: Duration,
) -> OpOutcome {
    match result {
        Ok(()) => OpOutcome::Succeeded,
        Err(_) if retry_count >= max_retries => OpOutcome::Abandoned,
        Err(_) => OpOutcome::Retry {
            next_retry_count: retry_count + 1,
            backoff: backoff_delay(retry_count, base_delay),
        },
    }
}

pub fn backoff_delay(attempt: u32, base_delay: Duration) -> Duration {
    let multiplier = 1u32 << attempt.min(MAX_BACKOFF_SHIFT);
    base_delay.saturating_mul(multiplier)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Synced,
    WillRetry,
    SyncFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    pub succeeded: usize,
    pub retrying: usize,
    pub failed: usize,
}

impl DrainReport {
    pub fn is_empty(&self) -> bool {
        self.succeeded == 0 && self.retrying == 0 && self.failed == 0
    }

    /// Aggregate counts only; per-operation detail never reaches the user.
    pub fn notices(&self) -> Vec<Notice> {
        let mut notices = Vec::new();
        if self.succeeded > 0 {
            notices.push(Notice {
                kind: NoticeKind::Synced,
                count: self.succeeded,
            });
        }
        if self.retrying > 0 {
            notices.push(Notice {
                kind: NoticeKind::WillRetry,
                count: self.retrying,
            });
        }
        if self.failed > 0 {
            notices.push(Notice {
                kind: NoticeKind::SyncFailed,
                count: self.failed,
            });
        }
        notices
    }
}

pub type Sleeper = Box<dyn Fn(Duration) + Send + Sync>;

/// Drains the persisted queue against injected handlers: Idle → Draining →
/// Idle, one drain at a time. The backoff sleep is injected so the decision
/// logic tests without real delays.
pub struct SyncEngine {
    max_retries: u32,
    base_delay: Duration,
    draining: AtomicBool,
    sleeper: Sleeper,
}

impl SyncEngine {
    pub fn new() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay: Duration::from_millis(BASE_DELAY_MS),
            draining: AtomicBool::new(false),
            sleeper: Box::new(std::thread::sleep),
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_sleeper(mut self, sleeper: impl Fn(Duration) + Send + Sync + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::SeqCst)
    }

    /// One pass over a snapshot of the queue. A no-op while offline or while
    /// another drain is running. Operations enqueued mid-pass wait for the
    /// next pass.
    pub fn drain<S: SlotStorage>(
        &self,
        queue: &QueueStore<S>,
        handlers: &HandlerSet<'_>,
        online: bool,
    ) -> DrainReport {
        if !online {
            return DrainReport::default();
        }

        if self.draining.swap(true, Ordering::SeqCst) {
            debug!("drain already in progress, skipping");
            return DrainReport::default();
        }

        let report = self.drain_snapshot(queue, handlers);
        self.draining.store(false, Ordering::SeqCst);
        report
    }

    fn drain_snapshot<S: SlotStorage>(
        &self,
        queue: &QueueStore<S>,
        handlers: &HandlerSet<'_>,
    ) -> DrainReport {
        let snapshot = queue.read_all();
        if snapshot.is_empty() {
            return DrainReport::default();
        }

        let mut report = DrainReport::default();
        let mut removals: HashSet<_> = HashSet::new();
        let mut retry_updates: HashMap<_, u32> = HashMap::new();

        for op in &snapshot {
            let result = match handlers.get(op.domain, op.action) {
                Some(handler) => handler(&op.payload),
                None => {
                    // Unhandled pairs fall through as handled; the queue must
                    // not wedge on an operation nothing can replay.
                    debug!(id = %op.id, ?op.domain, ?op.action, "no handler registered");
                    Ok(())
                }
            };

            match decide(&result, op.retry_count, self.max_retries, self.base_delay) {
                OpOutcome::Succeeded => {
                    removals.insert(op.id);
                    report.succeeded += 1;
                }
                OpOutcome::Abandoned => {
                    warn!(id = %op.id, retries = op.retry_count, "dropping operation after retry ceiling");
                    removals.insert(op.id);
                    report.failed += 1;
                }
                OpOutcome::Retry {
                    next_retry_count,
                    backoff,
                } => {
                    retry_updates.insert(op.id, next_retry_count);
                    report.retrying += 1;
                    (self.sleeper)(backoff);
                }
            }
        }

        if let Err(error) = queue.apply_drain_outcome(&removals, &retry_updates) {
            warn!("failed to write drain outcome back to queue: {error}");
        }

        report
    }
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::new()
    }
}
