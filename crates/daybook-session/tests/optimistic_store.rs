use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use daybook_core::{
    DaybookError, DbResult, EntityId, ErrorKind, Recurrence, RecurrenceKind, Subtask, Tag, Task,
    View, When,
};
use daybook_crypto::Codec;
use daybook_queue::{MemorySlot, QueueStore};
use daybook_session::{
    Applied, OptimisticStore, RemoteStore, SessionEvent, Snapshot, TaskDraft, TaskFields,
};
use daybook_sync::SyncEngine;
use std::cell::{Cell, RefCell};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Default)]
struct FakeRemote {
    state: RefCell<Snapshot>,
    fail: Cell<bool>,
    fetches: Cell<usize>,
    calls: RefCell<Vec<String>>,
}

impl FakeRemote {
    fn new() -> Self {
        Self::default()
    }

    fn failing() -> Self {
        let remote = Self::default();
        remote.fail.set(true);
        remote
    }

    fn check(&self) -> DbResult<()> {
        if self.fail.get() {
            Err(DaybookError::transient("remote unavailable"))
        } else {
            Ok(())
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }

    fn task_count(&self) -> usize {
        self.state.borrow().tasks.len()
    }
}

impl RemoteStore for FakeRemote {
    fn fetch_all(&self) -> DbResult<Snapshot> {
        self.check()?;
        self.fetches.set(self.fetches.get() + 1);
        Ok(self.state.borrow().clone())
    }

    fn create_task(&self, draft: &TaskDraft) -> DbResult<Task> {
        self.check()?;
        let task = Task {
            id: EntityId::confirmed(Uuid::new_v4()),
            title: draft.title.clone(),
            notes: draft.notes.clone(),
            completed: false,
            completed_at: None,
            created_at: Utc::now(),
            due_date: draft.due_date,
            project: draft.project,
            area: draft.area,
            when: draft.when,
            recurrence: draft.recurrence,
            tags: Vec::new(),
            subtasks: Vec::new(),
        };
        self.state.borrow_mut().tasks.push(task.clone());
        Ok(task)
    }

    fn update_task_fields(&self, id: Uuid, fields: &TaskFields) -> DbResult<()> {
        self.check()?;
        self.record(format!("update_task_fields:{id}"));
        let mut state = self.state.borrow_mut();
        if let Some(task) = state.tasks.iter_mut().find(|t| t.id.as_uuid() == id) {
            if let Some(title) = &fields.title {
                task.title = title.clone();
            }
            if let Some(notes) = &fields.notes {
                task.notes = Some(notes.clone());
            }
            if let Some(due_date) = fields.due_date {
                task.due_date = Some(due_date);
            }
            if let Some(when) = fields.when {
                task.when = Some(when);
            }
        }
        Ok(())
    }

    fn set_task_due_date(&self, id: Uuid, due_date: Option<NaiveDate>) -> DbResult<()> {
        self.check()?;
        self.record(format!("set_task_due_date:{id}"));
        let mut state = self.state.borrow_mut();
        if let Some(task) = state.tasks.iter_mut().find(|t| t.id.as_uuid() == id) {
            task.due_date = due_date;
        }
        Ok(())
    }

    fn set_task_when(&self, id: Uuid, when: Option<When>) -> DbResult<()> {
        self.check()?;
        self.record(format!("set_task_when:{id}"));
        let mut state = self.state.borrow_mut();
        if let Some(task) = state.tasks.iter_mut().find(|t| t.id.as_uuid() == id) {
            task.when = when;
        }
        Ok(())
    }

    fn set_task_grouping(
        &self,
        id: Uuid,
        project: Option<Uuid>,
        area: Option<Uuid>,
    ) -> DbResult<()> {
        self.check()?;
        let mut state = self.state.borrow_mut();
        if let Some(task) = state.tasks.iter_mut().find(|t| t.id.as_uuid() == id) {
            task.project = project;
            task.area = area;
        }
        Ok(())
    }

    fn set_task_recurrence(&self, id: Uuid, recurrence: Option<Recurrence>) -> DbResult<()> {
        self.check()?;
        let mut state = self.state.borrow_mut();
        if let Some(task) = state.tasks.iter_mut().find(|t| t.id.as_uuid() == id) {
            task.recurrence = recurrence;
        }
        Ok(())
    }

    fn set_task_completion(
        &self,
        id: Uuid,
        completed: bool,
        completed_at: Option<DateTime<Utc>>,
    ) -> DbResult<()> {
        self.check()?;
        self.record(format!("set_task_completion:{id}:{completed}"));
        let mut state = self.state.borrow_mut();
        if let Some(task) = state.tasks.iter_mut().find(|t| t.id.as_uuid() == id) {
            task.completed = completed;
            task.completed_at = completed_at;
        }
        Ok(())
    }

    fn delete_task(&self, id: Uuid) -> DbResult<()> {
        self.check()?;
        self.record(format!("delete_task:{id}"));
        self.state
            .borrow_mut()
            .tasks
            .retain(|task| task.id.as_uuid() != id);
        Ok(())
    }

    fn delete_completed_tasks(&self) -> DbResult<()> {
        self.check()?;
        self.state.borrow_mut().tasks.retain(|task| !task.completed);
        Ok(())
    }

    fn create_subtask(&self, task_id: Uuid, title: &str) -> DbResult<Subtask> {
        self.check()?;
        let subtask = Subtask {
            id: Uuid::new_v4(),
            title: title.to_string(),
            completed: false,
        };
        let mut state = self.state.borrow_mut();
        if let Some(task) = state.tasks.iter_mut().find(|t| t.id.as_uuid() == task_id) {
            task.subtasks.push(subtask.clone());
        }
        Ok(subtask)
    }

    fn set_subtask_completion(&self, subtask_id: Uuid, completed: bool) -> DbResult<()> {
        self.check()?;
        self.record(format!("set_subtask_completion:{subtask_id}:{completed}"));
        let mut state = self.state.borrow_mut();
        for task in state.tasks.iter_mut() {
            if let Some(subtask) = task.subtasks.iter_mut().find(|s| s.id == subtask_id) {
                subtask.completed = completed;
            }
        }
        Ok(())
    }

    fn delete_subtask(&self, subtask_id: Uuid) -> DbResult<()> {
        self.check()?;
        let mut state = self.state.borrow_mut();
        for task in state.tasks.iter_mut() {
            task.subtasks.retain(|s| s.id != subtask_id);
        }
        Ok(())
    }

    fn reorder_subtasks(&self, task_id: Uuid, ordered: &[Uuid]) -> DbResult<()> {
        self.check()?;
        self.record(format!("reorder_subtasks:{task_id}:{}", ordered.len()));
        Ok(())
    }

    fn create_project(
        &self,
        name: &str,
        color: &str,
        area_id: Option<Uuid>,
    ) -> DbResult<daybook_core::Project> {
        self.check()?;
        let project = daybook_core::Project {
            id: Uuid::new_v4(),
            name: name.to_string(),
            color: color.to_string(),
            area_id,
        };
        self.state.borrow_mut().projects.push(project.clone());
        Ok(project)
    }

    fn delete_project(&self, id: Uuid) -> DbResult<()> {
        self.check()?;
        self.state.borrow_mut().projects.retain(|p| p.id != id);
        Ok(())
    }

    fn create_area(&self, name: &str, color: &str) -> DbResult<daybook_core::Area> {
        self.check()?;
        let area = daybook_core::Area {
            id: Uuid::new_v4(),
            name: name.to_string(),
            color: color.to_string(),
        };
        self.state.borrow_mut().areas.push(area.clone());
        Ok(area)
    }

    fn delete_area(&self, id: Uuid) -> DbResult<()> {
        self.check()?;
        let mut state = self.state.borrow_mut();
        state.areas.retain(|a| a.id != id);
        for project in state.projects.iter_mut() {
            if project.area_id == Some(id) {
                project.area_id = None;
            }
        }
        Ok(())
    }

    fn create_tag(&self, name: &str, color: &str) -> DbResult<Tag> {
        self.check()?;
        let tag = Tag {
            id: Uuid::new_v4(),
            name: name.to_string(),
            color: color.to_string(),
        };
        self.state.borrow_mut().tags.push(tag.clone());
        Ok(tag)
    }

    fn delete_tag(&self, id: Uuid) -> DbResult<()> {
        self.check()?;
        self.state.borrow_mut().tags.retain(|t| t.id != id);
        Ok(())
    }

    fn add_tag_to_task(&self, task_id: Uuid, tag_id: Uuid) -> DbResult<()> {
        self.check()?;
        let mut state = self.state.borrow_mut();
        if let Some(task) = state.tasks.iter_mut().find(|t| t.id.as_uuid() == task_id) {
            task.tags.push(tag_id);
        }
        Ok(())
    }

    fn remove_tag_from_task(&self, task_id: Uuid, tag_id: Uuid) -> DbResult<()> {
        self.check()?;
        let mut state = self.state.borrow_mut();
        if let Some(task) = state.tasks.iter_mut().find(|t| t.id.as_uuid() == task_id) {
            task.tags.retain(|id| *id != tag_id);
        }
        Ok(())
    }
}

type SharedClock = Arc<Mutex<DateTime<Utc>>>;

fn fixture_clock() -> SharedClock {
    Arc::new(Mutex::new(
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single().expect("clock"),
    ))
}

fn advance(clock: &SharedClock, by: Duration) {
    *clock.lock().expect("clock lock") += by;
}

fn fixture_store(clock: &SharedClock) -> OptimisticStore<MemorySlot> {
    let queue = QueueStore::new(MemorySlot::new(), Codec::with_key([13u8; 32]));
    let handle = Arc::clone(clock);
    OptimisticStore::new(queue)
        .with_engine(SyncEngine::new().with_sleeper(|_| {}))
        .with_clock(move || *handle.lock().expect("clock lock"))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[test]
fn offline_creates_queue_and_drain_reconciles() {
    let clock = fixture_clock();
    let mut store = fixture_store(&clock);
    let remote = FakeRemote::new();

    store.set_online(false);
    for title in ["one", "two", "three"] {
        let applied = store
            .add_task(&remote, title, View::Inbox, None, None, None)
            .expect("add task offline");
        assert_eq!(applied, Applied::Queued);
    }

    assert_eq!(store.pending_count(), 3);
    assert_eq!(store.tasks().len(), 3);
    assert!(store.tasks().iter().all(|task| task.id.is_pending()));
    assert_eq!(remote.task_count(), 0);

    assert!(store.set_online(true));
    let report = store.sync_offline_changes(&remote).expect("drain");

    assert_eq!(report.succeeded, 3);
    assert_eq!(store.pending_count(), 0);
    assert_eq!(remote.task_count(), 3);
    assert_eq!(store.tasks().len(), 3);
    assert!(store.tasks().iter().all(|task| !task.id.is_pending()));

    let events = store.take_events();
    assert!(events.contains(&SessionEvent::Synced { count: 3 }));
}

#[test]
fn online_create_replaces_temporary_entity_in_place() {
    let clock = fixture_clock();
    let mut store = fixture_store(&clock);
    let remote = FakeRemote::new();

    store
        .add_task(&remote, "first", View::Inbox, None, None, None)
        .expect("add");
    store
        .add_task(&remote, "second", View::Inbox, None, None, None)
        .expect("add");

    // Newest first, both confirmed, order preserved through replacement.
    assert_eq!(store.tasks()[0].title, "second");
    assert_eq!(store.tasks()[1].title, "first");
    assert!(store.tasks().iter().all(|task| !task.id.is_pending()));
}

#[test]
fn failed_online_create_rolls_the_task_back_out() {
    let clock = fixture_clock();
    let mut store = fixture_store(&clock);
    let remote = FakeRemote::failing();

    let error = store
        .add_task(&remote, "doomed", View::Inbox, None, None, None)
        .expect_err("create must fail");

    assert_eq!(error.kind, ErrorKind::Transient);
    assert!(store.tasks().is_empty());
    assert_eq!(store.pending_count(), 0);
}

#[test]
fn empty_title_is_rejected_before_any_mutation() {
    let clock = fixture_clock();
    let mut store = fixture_store(&clock);
    let remote = FakeRemote::new();

    let error = store
        .add_task(&remote, "  \u{0} ", View::Inbox, None, None, None)
        .expect_err("must reject");

    assert_eq!(error.kind, ErrorKind::Validation);
    assert!(store.tasks().is_empty());
    assert_eq!(store.pending_count(), 0);
}

#[test]
fn toggle_failure_restores_exact_prior_state() {
    let clock = fixture_clock();
    let mut store = fixture_store(&clock);
    let remote = FakeRemote::new();

    store
        .add_task(&remote, "flaky", View::Today, None, None, None)
        .expect("add");
    let id = store.tasks()[0].id;
    assert!(!store.tasks()[0].completed);
    assert_eq!(store.tasks()[0].completed_at, None);

    remote.fail.set(true);
    let error = store.toggle_task(&remote, id).expect_err("toggle must fail");
    assert_eq!(error.kind, ErrorKind::Transient);

    let task = &store.tasks()[0];
    assert!(!task.completed);
    assert_eq!(task.completed_at, None);
    assert!(!store.is_task_loading(id));
}

#[test]
fn completed_task_stays_visible_for_the_grace_window() {
    let clock = fixture_clock();
    let mut store = fixture_store(&clock);
    let remote = FakeRemote::new();

    store
        .add_task(&remote, "visible", View::Today, None, None, None)
        .expect("add");
    let id = store.tasks()[0].id;

    store.toggle_task(&remote, id).expect("toggle");
    assert!(store.tasks()[0].completed);
    assert_eq!(store.task_count(View::Today), 1);

    // Window still open after half the delay.
    advance(&clock, Duration::milliseconds(500));
    store.expire_completions();
    assert_eq!(store.task_count(View::Today), 1);

    advance(&clock, Duration::milliseconds(600));
    store.expire_completions();
    assert_eq!(store.task_count(View::Today), 0);
    assert_eq!(store.task_count(View::Logbook), 1);
}

#[test]
fn toggling_back_cancels_the_grace_window() {
    let clock = fixture_clock();
    let mut store = fixture_store(&clock);
    let remote = FakeRemote::new();

    store
        .add_task(&remote, "bounce", View::Today, None, None, None)
        .expect("add");
    let id = store.tasks()[0].id;

    store.toggle_task(&remote, id).expect("complete");
    store.toggle_task(&remote, id).expect("uncomplete");

    advance(&clock, Duration::milliseconds(1500));
    store.expire_completions();

    assert!(!store.tasks()[0].completed);
    assert_eq!(store.tasks()[0].completed_at, None);
    assert_eq!(store.task_count(View::Today), 1);
}

#[test]
fn deleting_a_task_clears_its_grace_window() {
    let clock = fixture_clock();
    let mut store = fixture_store(&clock);
    let remote = FakeRemote::new();

    store
        .add_task(&remote, "short lived", View::Today, None, None, None)
        .expect("add");
    let id = store.tasks()[0].id;

    store.toggle_task(&remote, id).expect("complete");
    store.delete_task(&remote, id).expect("delete");

    assert!(store.tasks().is_empty());
    advance(&clock, Duration::milliseconds(2000));
    store.expire_completions();
    assert_eq!(store.task_count(View::Today), 0);
}

#[test]
fn completing_a_recurring_task_schedules_exactly_one_sibling() {
    let clock = fixture_clock();
    let mut store = fixture_store(&clock);
    let remote = FakeRemote::new();

    store
        .add_task(&remote, "water plants", View::Today, Some(date(2026, 3, 1)), None, None)
        .expect("add");
    let id = store.tasks()[0].id;
    store
        .update_task_recurrence(&remote, id, Some(Recurrence::new(RecurrenceKind::Weekly, 2)))
        .expect("set recurrence");

    store.toggle_task(&remote, id).expect("complete");

    assert_eq!(store.tasks().len(), 2);
    let sibling = &store.tasks()[0];
    assert_ne!(sibling.id, id);
    assert!(!sibling.completed);
    assert_eq!(sibling.title, "water plants");
    assert_eq!(sibling.due_date, Some(date(2026, 3, 15)));
    assert_eq!(
        sibling.recurrence,
        Some(Recurrence::new(RecurrenceKind::Weekly, 2))
    );

    let original = store
        .tasks()
        .iter()
        .find(|task| task.id == id)
        .expect("original survives");
    assert!(original.completed);
    assert_eq!(
        original.recurrence,
        Some(Recurrence::new(RecurrenceKind::Weekly, 2))
    );

    let events = store.take_events();
    assert!(events.contains(&SessionEvent::RecurrenceScheduled {
        due: date(2026, 3, 15)
    }));
}

#[test]
fn offline_toggle_does_not_roll_over_recurrence() {
    let clock = fixture_clock();
    let mut store = fixture_store(&clock);
    let remote = FakeRemote::new();

    store
        .add_task(&remote, "stretch", View::Today, Some(date(2026, 3, 1)), None, None)
        .expect("add");
    let id = store.tasks()[0].id;
    store
        .update_task_recurrence(&remote, id, Some(Recurrence::new(RecurrenceKind::Daily, 1)))
        .expect("set recurrence");

    store.set_online(false);
    store.toggle_task(&remote, id).expect("toggle offline");

    assert_eq!(store.tasks().len(), 1);
    assert_eq!(store.pending_count(), 1);
}

#[test]
fn always_failing_replay_is_dropped_after_four_attempts() {
    let clock = fixture_clock();
    let mut store = fixture_store(&clock);
    let remote = FakeRemote::new();

    store
        .add_task(&remote, "stubborn", View::Inbox, None, None, None)
        .expect("add");
    let id = store.tasks()[0].id;

    store.set_online(false);
    store.toggle_task(&remote, id).expect("toggle offline");
    assert_eq!(store.pending_count(), 1);
    store.set_online(true);

    remote.fail.set(true);
    let mut failed = 0usize;
    let mut attempts = 0usize;
    while store.pending_count() > 0 {
        attempts += 1;
        assert!(attempts <= 4, "operation should be dropped by now");
        let report = store.sync_offline_changes(&remote).expect("drain");
        failed += report.failed;
    }

    assert_eq!(attempts, 4);
    assert_eq!(failed, 1);
    assert_eq!(store.pending_count(), 0);

    let events = store.take_events();
    assert!(events.contains(&SessionEvent::SyncFailed { count: 1 }));
    assert_eq!(
        events
            .iter()
            .filter(|event| matches!(event, SessionEvent::SyncFailed { .. }))
            .count(),
        1
    );
}

#[test]
fn draining_an_empty_queue_changes_nothing() {
    let clock = fixture_clock();
    let mut store = fixture_store(&clock);
    let remote = FakeRemote::new();

    let report = store.sync_offline_changes(&remote).expect("drain");
    assert!(report.is_empty());
    assert_eq!(store.pending_count(), 0);
    assert_eq!(remote.fetches.get(), 0);
    assert!(store.take_events().is_empty());
}

#[test]
fn offline_field_updates_replay_through_the_queue() {
    let clock = fixture_clock();
    let mut store = fixture_store(&clock);
    let remote = FakeRemote::new();

    store
        .add_task(&remote, "reschedule me", View::Inbox, None, None, None)
        .expect("add");
    let id = store.tasks()[0].id;

    store.set_online(false);
    store
        .update_task_due_date(&remote, id, Some(date(2026, 4, 2)))
        .expect("update offline");
    assert_eq!(store.tasks()[0].due_date, Some(date(2026, 4, 2)));
    assert_eq!(store.pending_count(), 1);

    store.set_online(true);
    let report = store.sync_offline_changes(&remote).expect("drain");
    assert_eq!(report.succeeded, 1);

    assert!(
        remote
            .calls
            .borrow()
            .iter()
            .any(|call| call.starts_with("set_task_due_date:"))
    );
    assert_eq!(remote.state.borrow().tasks[0].due_date, Some(date(2026, 4, 2)));
}

#[test]
fn failed_field_update_rolls_back() {
    let clock = fixture_clock();
    let mut store = fixture_store(&clock);
    let remote = FakeRemote::new();

    store
        .add_task(&remote, "original title", View::Inbox, None, None, None)
        .expect("add");
    let id = store.tasks()[0].id;

    remote.fail.set(true);
    let fields = TaskFields {
        title: Some("new title".to_string()),
        ..TaskFields::default()
    };
    store
        .update_task(&remote, id, fields)
        .expect_err("update must fail");

    assert_eq!(store.tasks()[0].title, "original title");
}

#[test]
fn subtask_toggle_rolls_back_on_failure() {
    let clock = fixture_clock();
    let mut store = fixture_store(&clock);
    let remote = FakeRemote::new();

    store
        .add_task(&remote, "parent", View::Inbox, None, None, None)
        .expect("add");
    let task_id = store.tasks()[0].id;
    store
        .add_subtask(&remote, task_id, "child")
        .expect("add subtask");
    let subtask_id = store.tasks()[0].subtasks[0].id;

    remote.fail.set(true);
    store
        .toggle_subtask(&remote, task_id, subtask_id)
        .expect_err("toggle must fail");

    assert!(!store.tasks()[0].subtasks[0].completed);
}

#[test]
fn undo_delete_window_restores_or_commits() {
    let clock = fixture_clock();
    let mut store = fixture_store(&clock);
    let remote = FakeRemote::new();

    store
        .add_task(&remote, "keep me", View::Inbox, None, None, None)
        .expect("add");
    store
        .add_task(&remote, "drop me", View::Inbox, None, None, None)
        .expect("add");
    let keep = store.tasks().iter().find(|t| t.title == "keep me").expect("keep").id;
    let drop = store.tasks().iter().find(|t| t.title == "drop me").expect("drop").id;

    store.schedule_delete(keep).expect("schedule");
    store.schedule_delete(drop).expect("schedule");
    assert_eq!(store.task_count(View::Inbox), 0);

    assert!(store.undo_delete(keep));
    assert_eq!(store.task_count(View::Inbox), 1);

    advance(&clock, Duration::milliseconds(6000));
    let deleted = store.expire_deletes(&remote).expect("expire");
    assert_eq!(deleted, 1);

    assert_eq!(store.tasks().len(), 1);
    assert_eq!(store.tasks()[0].id, keep);
    assert_eq!(remote.task_count(), 1);
}

#[test]
fn clear_logbook_offline_queues_one_delete_per_task() {
    let clock = fixture_clock();
    let mut store = fixture_store(&clock);
    let remote = FakeRemote::new();

    for title in ["a", "b", "c"] {
        store
            .add_task(&remote, title, View::Inbox, None, None, None)
            .expect("add");
    }
    let ids: Vec<EntityId> = store.tasks().iter().map(|t| t.id).collect();
    for id in &ids[..2] {
        store.toggle_task(&remote, *id).expect("complete");
    }

    store.set_online(false);
    let cleared = store.clear_logbook(&remote).expect("clear");
    assert_eq!(cleared, 2);
    assert_eq!(store.tasks().len(), 1);
    assert_eq!(store.pending_count(), 2);

    store.set_online(true);
    let report = store.sync_offline_changes(&remote).expect("drain");
    assert_eq!(report.succeeded, 2);
    assert_eq!(remote.task_count(), 1);
}

#[test]
fn tag_changes_require_connectivity() {
    let clock = fixture_clock();
    let mut store = fixture_store(&clock);
    let remote = FakeRemote::new();

    store.set_online(false);
    let error = store
        .create_tag(&remote, "errands", "#AABBCC")
        .expect_err("must fail offline");
    assert_eq!(error.kind, ErrorKind::Transient);
    assert!(store.tags().is_empty());
}

#[test]
fn deleting_an_area_detaches_its_projects() {
    let clock = fixture_clock();
    let mut store = fixture_store(&clock);
    let remote = FakeRemote::new();

    store.add_area(&remote, "Home", None).expect("area");
    let area_id = store.areas()[0].id;
    store
        .add_project(&remote, "Garden", None, Some(area_id))
        .expect("project");

    store.delete_area(&remote, area_id).expect("delete area");

    assert!(store.areas().is_empty());
    assert_eq!(store.projects().len(), 1);
    assert_eq!(store.projects()[0].area_id, None);
    assert_eq!(store.orphan_projects().len(), 1);
}

#[test]
fn refetch_rebuilds_the_view_model_wholesale() {
    let clock = fixture_clock();
    let mut store = fixture_store(&clock);
    let remote = FakeRemote::new();

    remote
        .create_task(&TaskDraft {
            title: "server truth".to_string(),
            notes: None,
            due_date: None,
            project: None,
            area: None,
            when: None,
            recurrence: None,
        })
        .expect("seed remote");

    store.refetch(&remote).expect("refetch");
    assert_eq!(store.tasks().len(), 1);
    assert_eq!(store.tasks()[0].title, "server truth");
    assert_eq!(remote.fetches.get(), 1);
}
