use crate::payload::{
    CreateAreaPayload, CreateProjectPayload, CreateSubtaskPayload, CreateTaskPayload,
    DeleteAreaPayload, DeleteProjectPayload, DeleteSubtaskPayload, DeleteTaskPayload, TaskUpdate,
    ToggleSubtaskPayload, ToggleTaskPayload, UpdateTaskPayload, encode, parse,
};
use crate::remote::{RemoteStore, TaskDraft, TaskFields};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use daybook_core::sanitize::{sanitize_color, sanitize_name, sanitize_notes, sanitize_title};
use daybook_core::{
    Area, DaybookError, DbResult, EntityId, Project, Recurrence, Subtask, Tag, Task, View, When,
    next_due_date,
};
use daybook_queue::{Action, Domain, QueueStore, SlotStorage};
use daybook_sync::{DrainReport, HandlerSet, NoticeKind, SyncEngine};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

/// How long a just-completed task stays visible in its originating list.
pub const COMPLETION_DELAY_MS: i64 = 1000;
/// How long a delete can be undone before it is committed.
pub const UNDO_DELETE_DELAY_MS: i64 = 5000;

pub type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// How a mutation settled: confirmed by the remote store, or captured in the
/// offline queue with the optimistic state left as local truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Confirmed,
    Queued,
}

// Notification data for the host to render; the store never shows toasts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SessionEvent {
    SavedOffline { domain: Domain },
    RecurrenceScheduled { due: NaiveDate },
    Synced { count: usize },
    WillRetry { count: usize },
    SyncFailed { count: usize },
    LogbookCleared { count: usize },
}

/// The in-memory collection the UI reads. Every mutation lands here first;
/// the remote store catches up afterwards (directly when online, through the
/// queue when not), and the collection is rebuilt wholesale from the remote
/// on session start and after every successful drain.
pub struct OptimisticStore<S: SlotStorage> {
    queue: QueueStore<S>,
    engine: SyncEngine,
    clock: Clock,
    online: bool,
    tasks: Vec<Task>,
    projects: Vec<Project>,
    areas: Vec<Area>,
    tags: Vec<Tag>,
    loading_tasks: HashSet<EntityId>,
    recently_completed: HashMap<EntityId, DateTime<Utc>>,
    pending_deletes: HashMap<EntityId, DateTime<Utc>>,
    events: Vec<SessionEvent>,
}

impl<S: SlotStorage> OptimisticStore<S> {
    pub fn new(queue: QueueStore<S>) -> Self {
        Self {
            queue,
            engine: SyncEngine::new(),
            clock: Box::new(Utc::now),
            online: true,
            tasks: Vec::new(),
            projects: Vec::new(),
            areas: Vec::new(),
            tags: Vec::new(),
            loading_tasks: HashSet::new(),
            recently_completed: HashMap::new(),
            pending_deletes: HashMap::new(),
            events: Vec::new(),
        }
    }

    pub fn with_engine(mut self, engine: SyncEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    // --- connectivity ----------------------------------------------------

    /// Returns true on the offline→online transition, which is the host's
    /// cue to call `sync_offline_changes`.
    pub fn set_online(&mut self, online: bool) -> bool {
        let came_online = online && !self.online;
        self.online = online;
        came_online
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn pending_count(&self) -> usize {
        self.queue.pending_count()
    }

    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    // --- accessors -------------------------------------------------------

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn is_task_loading(&self, id: EntityId) -> bool {
        self.loading_tasks.contains(&id)
    }

    // --- task operations -------------------------------------------------

    pub fn add_task(
        &mut self,
        remote: &dyn RemoteStore,
        title: &str,
        view: View,
        due_date: Option<NaiveDate>,
        project: Option<Uuid>,
        area: Option<Uuid>,
    ) -> DbResult<Applied> {
        let title = sanitize_title(title);
        if title.is_empty() {
            return Err(DaybookError::validation("task title is empty"));
        }

        let draft = TaskDraft {
            title,
            notes: None,
            due_date,
            project,
            area,
            when: view.default_when(),
            recurrence: None,
        };

        self.create_task_from_draft(remote, draft)
    }

    fn create_task_from_draft(
        &mut self,
        remote: &dyn RemoteStore,
        draft: TaskDraft,
    ) -> DbResult<Applied> {
        let temp_id = EntityId::new_pending();
        let now = (self.clock)();
        let task = Task {
            id: temp_id,
            title: draft.title.clone(),
            notes: draft.notes.clone(),
            completed: false,
            completed_at: None,
            created_at: now,
            due_date: draft.due_date,
            project: draft.project,
            area: draft.area,
            when: draft.when,
            recurrence: draft.recurrence,
            tags: Vec::new(),
            subtasks: Vec::new(),
        };
        self.tasks.insert(0, task);

        if !self.online {
            let queued = encode(&CreateTaskPayload { temp_id, draft })
                .and_then(|payload| self.queue.enqueue(Domain::Task, Action::Create, payload));
            return match queued {
                Ok(_) => {
                    self.events.push(SessionEvent::SavedOffline {
                        domain: Domain::Task,
                    });
                    Ok(Applied::Queued)
                }
                Err(error) => {
                    self.tasks.retain(|task| task.id != temp_id);
                    Err(error)
                }
            };
        }

        match remote.create_task(&draft) {
            Ok(confirmed) => {
                // The temporary entity is replaced outright, keeping its
                // position in the collection.
                if let Some(slot) = self.tasks.iter_mut().find(|task| task.id == temp_id) {
                    *slot = confirmed;
                }
                Ok(Applied::Confirmed)
            }
            Err(error) => {
                self.tasks.retain(|task| task.id != temp_id);
                Err(error)
            }
        }
    }

    pub fn toggle_task(&mut self, remote: &dyn RemoteStore, id: EntityId) -> DbResult<Applied> {
        let now = (self.clock)();
        let snapshot = self
            .find_task(id)
            .cloned()
            .ok_or_else(|| DaybookError::validation(format!("unknown task '{id}'")))?;

        let is_completing = !snapshot.completed;
        let original_completed_at = snapshot.completed_at;

        self.loading_tasks.insert(id);
        if is_completing {
            self.recently_completed
                .insert(id, now + Duration::milliseconds(COMPLETION_DELAY_MS));
        } else {
            self.recently_completed.remove(&id);
        }

        if let Some(task) = self.find_task_mut(id) {
            task.completed = is_completing;
            task.completed_at = is_completing.then_some(now);
        }

        if !self.online {
            let queued = encode(&ToggleTaskPayload { id, is_completing })
                .and_then(|payload| self.queue.enqueue(Domain::Task, Action::Toggle, payload));
            self.loading_tasks.remove(&id);
            return match queued {
                Ok(_) => {
                    self.events.push(SessionEvent::SavedOffline {
                        domain: Domain::Task,
                    });
                    Ok(Applied::Queued)
                }
                Err(error) => {
                    self.rollback_toggle(id, is_completing, original_completed_at);
                    Err(error)
                }
            };
        }

        let result =
            remote.set_task_completion(id.as_uuid(), is_completing, is_completing.then_some(now));
        let outcome = match result {
            Ok(()) => {
                if is_completing && snapshot.recurrence.is_some() {
                    self.roll_over_recurrence(remote, &snapshot, now)
                } else {
                    Ok(Applied::Confirmed)
                }
            }
            Err(error) => {
                self.rollback_toggle(id, is_completing, original_completed_at);
                Err(error)
            }
        };

        self.loading_tasks.remove(&id);
        outcome
    }

    // The completion write has settled by the time this runs; a failed
    // rollover surfaces its own error without undoing the completion.
    fn roll_over_recurrence(
        &mut self,
        remote: &dyn RemoteStore,
        completed: &Task,
        now: DateTime<Utc>,
    ) -> DbResult<Applied> {
        let rule = completed
            .recurrence
            .ok_or_else(|| DaybookError::validation("task has no recurrence"))?;
        let due = next_due_date(completed.due_date, &rule, now.date_naive());

        let draft = TaskDraft {
            title: completed.title.clone(),
            notes: completed.notes.clone(),
            due_date: Some(due),
            project: completed.project,
            area: completed.area,
            when: completed.when,
            recurrence: Some(rule),
        };

        let applied = self.create_task_from_draft(remote, draft)?;
        self.events.push(SessionEvent::RecurrenceScheduled { due });
        Ok(applied)
    }

    fn rollback_toggle(
        &mut self,
        id: EntityId,
        attempted_completing: bool,
        original_completed_at: Option<DateTime<Utc>>,
    ) {
        if let Some(task) = self.find_task_mut(id) {
            task.completed = !attempted_completing;
            task.completed_at = original_completed_at;
        }
        if attempted_completing {
            self.recently_completed.remove(&id);
        }
    }

    pub fn delete_task(&mut self, remote: &dyn RemoteStore, id: EntityId) -> DbResult<Applied> {
        self.recently_completed.remove(&id);
        self.pending_deletes.remove(&id);
        self.loading_tasks.remove(&id);

        let position = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| DaybookError::validation(format!("unknown task '{id}'")))?;
        let removed = self.tasks.remove(position);

        if !self.online {
            let queued = encode(&DeleteTaskPayload { id })
                .and_then(|payload| self.queue.enqueue(Domain::Task, Action::Delete, payload));
            return match queued {
                Ok(_) => {
                    self.events.push(SessionEvent::SavedOffline {
                        domain: Domain::Task,
                    });
                    Ok(Applied::Queued)
                }
                Err(error) => {
                    self.tasks.insert(position, removed);
                    Err(error)
                }
            };
        }

        match remote.delete_task(id.as_uuid()) {
            Ok(()) => Ok(Applied::Confirmed),
            Err(error) => {
                self.tasks.insert(position, removed);
                Err(error)
            }
        }
    }

    pub fn update_task(
        &mut self,
        remote: &dyn RemoteStore,
        id: EntityId,
        mut fields: TaskFields,
    ) -> DbResult<Applied> {
        if let Some(title) = fields.title.take() {
            let cleaned = sanitize_title(&title);
            if cleaned.is_empty() {
                return Err(DaybookError::validation("task title is empty"));
            }
            fields.title = Some(cleaned);
        }
        if let Some(notes) = fields.notes.take() {
            fields.notes = Some(sanitize_notes(&notes));
        }

        let prior = self
            .find_task(id)
            .cloned()
            .ok_or_else(|| DaybookError::validation(format!("unknown task '{id}'")))?;

        if let Some(task) = self.find_task_mut(id) {
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

        let update = TaskUpdate::Fields(fields.clone());
        self.finish_task_update(remote, id, update, prior, move |remote, uuid| {
            remote.update_task_fields(uuid, &fields)
        })
    }

    pub fn update_task_due_date(
        &mut self,
        remote: &dyn RemoteStore,
        id: EntityId,
        due_date: Option<NaiveDate>,
    ) -> DbResult<Applied> {
        let prior = self
            .find_task(id)
            .cloned()
            .ok_or_else(|| DaybookError::validation(format!("unknown task '{id}'")))?;

        if let Some(task) = self.find_task_mut(id) {
            task.due_date = due_date;
        }

        self.finish_task_update(
            remote,
            id,
            TaskUpdate::DueDate { due_date },
            prior,
            move |remote, uuid| remote.set_task_due_date(uuid, due_date),
        )
    }

    pub fn move_task(
        &mut self,
        remote: &dyn RemoteStore,
        id: EntityId,
        target: View,
    ) -> DbResult<Applied> {
        let when = target.default_when();
        let prior = self
            .find_task(id)
            .cloned()
            .ok_or_else(|| DaybookError::validation(format!("unknown task '{id}'")))?;

        if let Some(task) = self.find_task_mut(id) {
            task.when = when;
        }

        self.finish_task_update(
            remote,
            id,
            TaskUpdate::When { when },
            prior,
            move |remote, uuid| remote.set_task_when(uuid, when),
        )
    }

    pub fn update_task_project(
        &mut self,
        remote: &dyn RemoteStore,
        id: EntityId,
        project: Option<Uuid>,
        area: Option<Uuid>,
    ) -> DbResult<Applied> {
        let prior = self
            .find_task(id)
            .cloned()
            .ok_or_else(|| DaybookError::validation(format!("unknown task '{id}'")))?;

        if let Some(task) = self.find_task_mut(id) {
            task.project = project;
            task.area = area;
        }

        self.finish_task_update(
            remote,
            id,
            TaskUpdate::Grouping { project, area },
            prior,
            move |remote, uuid| remote.set_task_grouping(uuid, project, area),
        )
    }

    pub fn update_task_recurrence(
        &mut self,
        remote: &dyn RemoteStore,
        id: EntityId,
        recurrence: Option<Recurrence>,
    ) -> DbResult<Applied> {
        let prior = self
            .find_task(id)
            .cloned()
            .ok_or_else(|| DaybookError::validation(format!("unknown task '{id}'")))?;

        if let Some(task) = self.find_task_mut(id) {
            task.recurrence = recurrence;
        }

        self.finish_task_update(
            remote,
            id,
            TaskUpdate::Recurrence { recurrence },
            prior,
            move |remote, uuid| remote.set_task_recurrence(uuid, recurrence),
        )
    }

    fn finish_task_update(
        &mut self,
        remote: &dyn RemoteStore,
        id: EntityId,
        update: TaskUpdate,
        prior: Task,
        call: impl FnOnce(&dyn RemoteStore, Uuid) -> DbResult<()>,
    ) -> DbResult<Applied> {
        if !self.online {
            let queued = encode(&UpdateTaskPayload { id, update })
                .and_then(|payload| self.queue.enqueue(Domain::Task, Action::Update, payload));
            return match queued {
                Ok(_) => {
                    self.events.push(SessionEvent::SavedOffline {
                        domain: Domain::Task,
                    });
                    Ok(Applied::Queued)
                }
                Err(error) => {
                    self.restore_task(prior);
                    Err(error)
                }
            };
        }

        match call(remote, id.as_uuid()) {
            Ok(()) => Ok(Applied::Confirmed),
            Err(error) => {
                self.restore_task(prior);
                Err(error)
            }
        }
    }

    fn restore_task(&mut self, prior: Task) {
        if let Some(task) = self.find_task_mut(prior.id) {
            *task = prior;
        }
    }

    /// Reorders within the given view only; ordering is a local concern and
    /// realigns with the remote on the next refetch.
    pub fn reorder_tasks(&mut self, active: EntityId, over: EntityId, view: View) {
        let member: Vec<usize> = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| self.in_view(task, view))
            .map(|(index, _)| index)
            .collect();

        let Some(from) = member.iter().position(|&i| self.tasks[i].id == active) else {
            return;
        };
        let Some(to) = member.iter().position(|&i| self.tasks[i].id == over) else {
            return;
        };

        let mut view_tasks: Vec<Task> = member.iter().map(|&i| self.tasks[i].clone()).collect();
        let moved = view_tasks.remove(from);
        view_tasks.insert(to, moved);

        for (slot, task) in member.into_iter().zip(view_tasks) {
            self.tasks[slot] = task;
        }
    }

    // --- subtask operations ----------------------------------------------

    pub fn add_subtask(
        &mut self,
        remote: &dyn RemoteStore,
        task_id: EntityId,
        title: &str,
    ) -> DbResult<Applied> {
        let title = sanitize_title(title);
        if title.is_empty() {
            return Err(DaybookError::validation("subtask title is empty"));
        }

        let provisional = Subtask {
            id: Uuid::new_v4(),
            title: title.clone(),
            completed: false,
        };
        let provisional_id = provisional.id;

        let task = self
            .find_task_mut(task_id)
            .ok_or_else(|| DaybookError::validation(format!("unknown task '{task_id}'")))?;
        task.subtasks.push(provisional);

        if !self.online {
            let queued = encode(&CreateSubtaskPayload { task_id, title })
                .and_then(|payload| self.queue.enqueue(Domain::Subtask, Action::Create, payload));
            return match queued {
                Ok(_) => {
                    self.events.push(SessionEvent::SavedOffline {
                        domain: Domain::Subtask,
                    });
                    Ok(Applied::Queued)
                }
                Err(error) => {
                    self.remove_subtask_local(task_id, provisional_id);
                    Err(error)
                }
            };
        }

        match remote.create_subtask(task_id.as_uuid(), &title) {
            Ok(confirmed) => {
                if let Some(task) = self.find_task_mut(task_id)
                    && let Some(slot) = task
                        .subtasks
                        .iter_mut()
                        .find(|subtask| subtask.id == provisional_id)
                {
                    *slot = confirmed;
                }
                Ok(Applied::Confirmed)
            }
            Err(error) => {
                self.remove_subtask_local(task_id, provisional_id);
                Err(error)
            }
        }
    }

    pub fn toggle_subtask(
        &mut self,
        remote: &dyn RemoteStore,
        task_id: EntityId,
        subtask_id: Uuid,
    ) -> DbResult<Applied> {
        let original = self
            .find_task(task_id)
            .and_then(|task| task.subtasks.iter().find(|subtask| subtask.id == subtask_id))
            .map(|subtask| subtask.completed)
            .ok_or_else(|| DaybookError::validation(format!("unknown subtask '{subtask_id}'")))?;
        let completed = !original;

        self.set_subtask_completed_local(task_id, subtask_id, completed);

        if !self.online {
            let queued = encode(&ToggleSubtaskPayload {
                subtask_id,
                completed,
            })
            .and_then(|payload| self.queue.enqueue(Domain::Subtask, Action::Toggle, payload));
            return match queued {
                Ok(_) => {
                    self.events.push(SessionEvent::SavedOffline {
                        domain: Domain::Subtask,
                    });
                    Ok(Applied::Queued)
                }
                Err(error) => {
                    self.set_subtask_completed_local(task_id, subtask_id, original);
                    Err(error)
                }
            };
        }

        match remote.set_subtask_completion(subtask_id, completed) {
            Ok(()) => Ok(Applied::Confirmed),
            Err(error) => {
                self.set_subtask_completed_local(task_id, subtask_id, original);
                Err(error)
            }
        }
    }

    pub fn delete_subtask(
        &mut self,
        remote: &dyn RemoteStore,
        task_id: EntityId,
        subtask_id: Uuid,
    ) -> DbResult<Applied> {
        let task = self
            .find_task_mut(task_id)
            .ok_or_else(|| DaybookError::validation(format!("unknown task '{task_id}'")))?;
        let position = task
            .subtasks
            .iter()
            .position(|subtask| subtask.id == subtask_id)
            .ok_or_else(|| DaybookError::validation(format!("unknown subtask '{subtask_id}'")))?;
        let removed = task.subtasks.remove(position);

        if !self.online {
            let queued = encode(&DeleteSubtaskPayload { subtask_id })
                .and_then(|payload| self.queue.enqueue(Domain::Subtask, Action::Delete, payload));
            return match queued {
                Ok(_) => {
                    self.events.push(SessionEvent::SavedOffline {
                        domain: Domain::Subtask,
                    });
                    Ok(Applied::Queued)
                }
                Err(error) => {
                    if let Some(task) = self.find_task_mut(task_id) {
                        task.subtasks.insert(position, removed);
                    }
                    Err(error)
                }
            };
        }

        match remote.delete_subtask(subtask_id) {
            Ok(()) => Ok(Applied::Confirmed),
            Err(error) => {
                if let Some(task) = self.find_task_mut(task_id) {
                    task.subtasks.insert(position, removed);
                }
                Err(error)
            }
        }
    }

    pub fn reorder_subtasks(
        &mut self,
        remote: &dyn RemoteStore,
        task_id: EntityId,
        active: Uuid,
        over: Uuid,
    ) -> DbResult<()> {
        let task = self
            .find_task_mut(task_id)
            .ok_or_else(|| DaybookError::validation(format!("unknown task '{task_id}'")))?;

        let Some(from) = task.subtasks.iter().position(|s| s.id == active) else {
            return Ok(());
        };
        let Some(to) = task.subtasks.iter().position(|s| s.id == over) else {
            return Ok(());
        };

        let prior = task.subtasks.clone();
        let moved = task.subtasks.remove(from);
        task.subtasks.insert(to, moved);
        let ordered: Vec<Uuid> = task.subtasks.iter().map(|s| s.id).collect();

        if !self.online {
            return Ok(());
        }

        match remote.reorder_subtasks(task_id.as_uuid(), &ordered) {
            Ok(()) => Ok(()),
            Err(error) => {
                if let Some(task) = self.find_task_mut(task_id) {
                    task.subtasks = prior;
                }
                Err(error)
            }
        }
    }

    // --- project and area operations -------------------------------------

    pub fn add_project(
        &mut self,
        remote: &dyn RemoteStore,
        name: &str,
        color: Option<&str>,
        area_id: Option<Uuid>,
    ) -> DbResult<Applied> {
        let name = sanitize_name(name);
        if name.is_empty() {
            return Err(DaybookError::validation("project name is empty"));
        }
        let color = sanitize_color(color.unwrap_or_default());

        let provisional_id = Uuid::new_v4();
        self.projects.push(Project {
            id: provisional_id,
            name: name.clone(),
            color: color.clone(),
            area_id,
        });

        if !self.online {
            let queued = encode(&CreateProjectPayload {
                name,
                color,
                area_id,
            })
            .and_then(|payload| self.queue.enqueue(Domain::Project, Action::Create, payload));
            return match queued {
                Ok(_) => {
                    self.events.push(SessionEvent::SavedOffline {
                        domain: Domain::Project,
                    });
                    Ok(Applied::Queued)
                }
                Err(error) => {
                    self.projects.retain(|project| project.id != provisional_id);
                    Err(error)
                }
            };
        }

        match remote.create_project(&name, &color, area_id) {
            Ok(confirmed) => {
                if let Some(slot) = self
                    .projects
                    .iter_mut()
                    .find(|project| project.id == provisional_id)
                {
                    *slot = confirmed;
                }
                Ok(Applied::Confirmed)
            }
            Err(error) => {
                self.projects.retain(|project| project.id != provisional_id);
                Err(error)
            }
        }
    }

    pub fn delete_project(&mut self, remote: &dyn RemoteStore, id: Uuid) -> DbResult<Applied> {
        let position = self
            .projects
            .iter()
            .position(|project| project.id == id)
            .ok_or_else(|| DaybookError::validation(format!("unknown project '{id}'")))?;
        let removed = self.projects.remove(position);

        if !self.online {
            let queued = encode(&DeleteProjectPayload { id })
                .and_then(|payload| self.queue.enqueue(Domain::Project, Action::Delete, payload));
            return match queued {
                Ok(_) => {
                    self.events.push(SessionEvent::SavedOffline {
                        domain: Domain::Project,
                    });
                    Ok(Applied::Queued)
                }
                Err(error) => {
                    self.projects.insert(position, removed);
                    Err(error)
                }
            };
        }

        match remote.delete_project(id) {
            Ok(()) => Ok(Applied::Confirmed),
            Err(error) => {
                self.projects.insert(position, removed);
                Err(error)
            }
        }
    }

    pub fn add_area(
        &mut self,
        remote: &dyn RemoteStore,
        name: &str,
        color: Option<&str>,
    ) -> DbResult<Applied> {
        let name = sanitize_name(name);
        if name.is_empty() {
            return Err(DaybookError::validation("area name is empty"));
        }
        let color = sanitize_color(color.unwrap_or_default());

        let provisional_id = Uuid::new_v4();
        self.areas.push(Area {
            id: provisional_id,
            name: name.clone(),
            color: color.clone(),
        });

        if !self.online {
            let queued = encode(&CreateAreaPayload { name, color })
                .and_then(|payload| self.queue.enqueue(Domain::Area, Action::Create, payload));
            return match queued {
                Ok(_) => {
                    self.events.push(SessionEvent::SavedOffline {
                        domain: Domain::Area,
                    });
                    Ok(Applied::Queued)
                }
                Err(error) => {
                    self.areas.retain(|area| area.id != provisional_id);
                    Err(error)
                }
            };
        }

        match remote.create_area(&name, &color) {
            Ok(confirmed) => {
                if let Some(slot) = self
                    .areas
                    .iter_mut()
                    .find(|area| area.id == provisional_id)
                {
                    *slot = confirmed;
                }
                Ok(Applied::Confirmed)
            }
            Err(error) => {
                self.areas.retain(|area| area.id != provisional_id);
                Err(error)
            }
        }
    }

    pub fn delete_area(&mut self, remote: &dyn RemoteStore, id: Uuid) -> DbResult<Applied> {
        let position = self
            .areas
            .iter()
            .position(|area| area.id == id)
            .ok_or_else(|| DaybookError::validation(format!("unknown area '{id}'")))?;
        let removed = self.areas.remove(position);

        // Projects grouped under the area are detached, remotely and locally.
        let detached: Vec<Uuid> = self
            .projects
            .iter()
            .filter(|project| project.area_id == Some(id))
            .map(|project| project.id)
            .collect();
        for project in self.projects.iter_mut() {
            if project.area_id == Some(id) {
                project.area_id = None;
            }
        }

        let restore = |store: &mut Self| {
            store.areas.insert(position, removed.clone());
            for project in store.projects.iter_mut() {
                if detached.contains(&project.id) {
                    project.area_id = Some(id);
                }
            }
        };

        if !self.online {
            let queued = encode(&DeleteAreaPayload { id })
                .and_then(|payload| self.queue.enqueue(Domain::Area, Action::Delete, payload));
            return match queued {
                Ok(_) => {
                    self.events.push(SessionEvent::SavedOffline {
                        domain: Domain::Area,
                    });
                    Ok(Applied::Queued)
                }
                Err(error) => {
                    restore(self);
                    Err(error)
                }
            };
        }

        match remote.delete_area(id) {
            Ok(()) => Ok(Applied::Confirmed),
            Err(error) => {
                restore(self);
                Err(error)
            }
        }
    }

    // --- tag operations ---------------------------------------------------
    //
    // Tags sit outside the queue's domain set, so they are the one surface
    // that genuinely needs connectivity.

    fn require_online(&self) -> DbResult<()> {
        if self.online {
            Ok(())
        } else {
            Err(DaybookError::transient(
                "tag changes are not queued offline; reconnect and retry",
            ))
        }
    }

    pub fn create_tag(
        &mut self,
        remote: &dyn RemoteStore,
        name: &str,
        color: &str,
    ) -> DbResult<Tag> {
        self.require_online()?;
        let name = sanitize_name(name);
        if name.is_empty() {
            return Err(DaybookError::validation("tag name is empty"));
        }
        let color = sanitize_color(color);

        let tag = remote.create_tag(&name, &color)?;
        self.tags.push(tag.clone());
        Ok(tag)
    }

    pub fn delete_tag(&mut self, remote: &dyn RemoteStore, id: Uuid) -> DbResult<()> {
        self.require_online()?;
        let position = self
            .tags
            .iter()
            .position(|tag| tag.id == id)
            .ok_or_else(|| DaybookError::validation(format!("unknown tag '{id}'")))?;
        let removed = self.tags.remove(position);

        let memberships: Vec<EntityId> = self
            .tasks
            .iter()
            .filter(|task| task.tags.contains(&id))
            .map(|task| task.id)
            .collect();
        for task in self.tasks.iter_mut() {
            task.tags.retain(|tag_id| *tag_id != id);
        }

        match remote.delete_tag(id) {
            Ok(()) => Ok(()),
            Err(error) => {
                self.tags.insert(position, removed);
                for task in self.tasks.iter_mut() {
                    if memberships.contains(&task.id) {
                        task.tags.push(id);
                    }
                }
                Err(error)
            }
        }
    }

    pub fn add_tag_to_task(
        &mut self,
        remote: &dyn RemoteStore,
        task_id: EntityId,
        tag_id: Uuid,
    ) -> DbResult<()> {
        self.require_online()?;
        if !self.tags.iter().any(|tag| tag.id == tag_id) {
            return Err(DaybookError::validation(format!("unknown tag '{tag_id}'")));
        }

        let task = self
            .find_task_mut(task_id)
            .ok_or_else(|| DaybookError::validation(format!("unknown task '{task_id}'")))?;
        if task.tags.contains(&tag_id) {
            return Ok(());
        }
        task.tags.push(tag_id);

        match remote.add_tag_to_task(task_id.as_uuid(), tag_id) {
            Ok(()) => Ok(()),
            Err(error) => {
                if let Some(task) = self.find_task_mut(task_id) {
                    task.tags.retain(|id| *id != tag_id);
                }
                Err(error)
            }
        }
    }

    pub fn remove_tag_from_task(
        &mut self,
        remote: &dyn RemoteStore,
        task_id: EntityId,
        tag_id: Uuid,
    ) -> DbResult<()> {
        self.require_online()?;
        let task = self
            .find_task_mut(task_id)
            .ok_or_else(|| DaybookError::validation(format!("unknown task '{task_id}'")))?;
        let Some(position) = task.tags.iter().position(|id| *id == tag_id) else {
            return Ok(());
        };
        task.tags.remove(position);

        match remote.remove_tag_from_task(task_id.as_uuid(), tag_id) {
            Ok(()) => Ok(()),
            Err(error) => {
                if let Some(task) = self.find_task_mut(task_id) {
                    task.tags.insert(position, tag_id);
                }
                Err(error)
            }
        }
    }

    // --- logbook ----------------------------------------------------------

    pub fn clear_logbook(&mut self, remote: &dyn RemoteStore) -> DbResult<usize> {
        let removed: Vec<(usize, Task)> = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| task.completed)
            .map(|(index, task)| (index, task.clone()))
            .collect();
        if removed.is_empty() {
            return Ok(0);
        }

        self.tasks.retain(|task| !task.completed);
        for (_, task) in &removed {
            self.recently_completed.remove(&task.id);
            self.pending_deletes.remove(&task.id);
        }

        let count = removed.len();
        let restore = |store: &mut Self| {
            for (index, task) in removed.iter().cloned() {
                let slot = index.min(store.tasks.len());
                store.tasks.insert(slot, task);
            }
        };

        if !self.online {
            // The effect replays as one delete per completed task.
            for (_, task) in &removed {
                let queued = encode(&DeleteTaskPayload { id: task.id })
                    .and_then(|payload| self.queue.enqueue(Domain::Task, Action::Delete, payload));
                if let Err(error) = queued {
                    restore(self);
                    return Err(error);
                }
            }
            self.events.push(SessionEvent::LogbookCleared { count });
            return Ok(count);
        }

        match remote.delete_completed_tasks() {
            Ok(()) => {
                self.events.push(SessionEvent::LogbookCleared { count });
                Ok(count)
            }
            Err(error) => {
                restore(self);
                Err(error)
            }
        }
    }

    // --- completion grace window and undo-delete --------------------------

    /// Drops grace-window entries whose deadline has passed. The host drives
    /// this from its tick; completed tasks then leave their lists.
    pub fn expire_completions(&mut self) {
        let now = (self.clock)();
        self.recently_completed.retain(|_, deadline| *deadline > now);
    }

    pub fn schedule_delete(&mut self, id: EntityId) -> DbResult<()> {
        if self.find_task(id).is_none() {
            return Err(DaybookError::validation(format!("unknown task '{id}'")));
        }
        let deadline = (self.clock)() + Duration::milliseconds(UNDO_DELETE_DELAY_MS);
        self.pending_deletes.insert(id, deadline);
        Ok(())
    }

    pub fn undo_delete(&mut self, id: EntityId) -> bool {
        self.pending_deletes.remove(&id).is_some()
    }

    pub fn is_pending_delete(&self, id: EntityId) -> bool {
        self.pending_deletes.contains_key(&id)
    }

    /// Commits every pending delete whose undo window has closed. Returns
    /// the number of tasks deleted.
    pub fn expire_deletes(&mut self, remote: &dyn RemoteStore) -> DbResult<usize> {
        let now = (self.clock)();
        let expired: Vec<EntityId> = self
            .pending_deletes
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(id, _)| *id)
            .collect();

        let mut deleted = 0usize;
        for id in expired {
            self.pending_deletes.remove(&id);
            if self.find_task(id).is_none() {
                continue;
            }
            self.delete_task(remote, id)?;
            deleted += 1;
        }
        Ok(deleted)
    }

    pub fn cancel_all_pending_deletes(&mut self) {
        self.pending_deletes.clear();
    }

    /// Clears every timer-like registry. Call on unmount so no deadline
    /// fires against a task id that no longer exists.
    pub fn teardown(&mut self) {
        self.recently_completed.clear();
        self.pending_deletes.clear();
        self.loading_tasks.clear();
    }

    // --- views ------------------------------------------------------------

    fn in_view(&self, task: &Task, view: View) -> bool {
        if self.pending_deletes.contains_key(&task.id) {
            return false;
        }

        let visible = !task.completed || self.recently_completed.contains_key(&task.id);
        match view {
            View::Inbox => visible && task.when.is_none(),
            View::Today => visible && task.when == Some(When::Today),
            View::Upcoming => visible && task.due_date.is_some(),
            View::Someday => visible && task.when == Some(When::Someday),
            View::Logbook => task.completed,
        }
    }

    pub fn tasks_for_view(&self, view: View) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| self.in_view(task, view))
            .collect()
    }

    pub fn tasks_for_project(&self, project_id: Uuid) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| {
                !self.pending_deletes.contains_key(&task.id)
                    && (!task.completed || self.recently_completed.contains_key(&task.id))
                    && task.project == Some(project_id)
            })
            .collect()
    }

    pub fn tasks_for_area(&self, area_id: Uuid) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| {
                !self.pending_deletes.contains_key(&task.id)
                    && (!task.completed || self.recently_completed.contains_key(&task.id))
                    && task.area == Some(area_id)
            })
            .collect()
    }

    pub fn task_count(&self, view: View) -> usize {
        self.tasks_for_view(view).len()
    }

    pub fn projects_for_area(&self, area_id: Uuid) -> Vec<&Project> {
        self.projects
            .iter()
            .filter(|project| project.area_id == Some(area_id))
            .collect()
    }

    pub fn orphan_projects(&self) -> Vec<&Project> {
        self.projects
            .iter()
            .filter(|project| project.area_id.is_none())
            .collect()
    }

    // --- refetch and drain ------------------------------------------------

    /// Rebuilds the whole view model from the remote store's ground truth.
    pub fn refetch(&mut self, remote: &dyn RemoteStore) -> DbResult<()> {
        let snapshot = remote.fetch_all()?;
        self.tasks = snapshot.tasks;
        self.projects = snapshot.projects;
        self.areas = snapshot.areas;
        self.tags = snapshot.tags;
        self.teardown();
        Ok(())
    }

    /// Replays the offline queue against the remote store and, after any
    /// successes, realigns the view model with a wholesale refetch.
    pub fn sync_offline_changes(&mut self, remote: &dyn RemoteStore) -> DbResult<DrainReport> {
        let now = (self.clock)();
        let handlers = replay_handlers(remote, now);
        let report = self.engine.drain(&self.queue, &handlers, self.online);

        for notice in report.notices() {
            self.events.push(match notice.kind {
                NoticeKind::Synced => SessionEvent::Synced {
                    count: notice.count,
                },
                NoticeKind::WillRetry => SessionEvent::WillRetry {
                    count: notice.count,
                },
                NoticeKind::SyncFailed => SessionEvent::SyncFailed {
                    count: notice.count,
                },
            });
        }

        if report.succeeded > 0 {
            self.refetch(remote)?;
        }
        Ok(report)
    }

    // --- internals --------------------------------------------------------

    fn find_task(&self, id: EntityId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    fn find_task_mut(&mut self, id: EntityId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }

    fn remove_subtask_local(&mut self, task_id: EntityId, subtask_id: Uuid) {
        if let Some(task) = self.find_task_mut(task_id) {
            task.subtasks.retain(|subtask| subtask.id != subtask_id);
        }
    }

    fn set_subtask_completed_local(&mut self, task_id: EntityId, subtask_id: Uuid, completed: bool) {
        if let Some(task) = self.find_task_mut(task_id)
            && let Some(subtask) = task
                .subtasks
                .iter_mut()
                .find(|subtask| subtask.id == subtask_id)
        {
            subtask.completed = completed;
        }
    }
}

/// The replay handler for every (domain, action) pair the store enqueues.
/// Operations that still reference a pending id are skipped: their create
/// never confirmed, so there is nothing durable to touch, and the refetch
/// after the drain settles the difference.
fn replay_handlers<'a>(remote: &'a dyn RemoteStore, now: DateTime<Utc>) -> HandlerSet<'a> {
    HandlerSet::new()
        .register(Domain::Task, Action::Create, move |payload| {
            let parsed: CreateTaskPayload = parse(payload)?;
            remote.create_task(&parsed.draft).map(|_| ())
        })
        .register(Domain::Task, Action::Toggle, move |payload| {
            let parsed: ToggleTaskPayload = parse(payload)?;
            match parsed.id {
                EntityId::Pending(_) => skip_pending(parsed.id),
                EntityId::Confirmed(id) => remote.set_task_completion(
                    id,
                    parsed.is_completing,
                    parsed.is_completing.then_some(now),
                ),
            }
        })
        .register(Domain::Task, Action::Delete, move |payload| {
            let parsed: DeleteTaskPayload = parse(payload)?;
            match parsed.id {
                EntityId::Pending(_) => skip_pending(parsed.id),
                EntityId::Confirmed(id) => remote.delete_task(id),
            }
        })
        .register(Domain::Task, Action::Update, move |payload| {
            let parsed: UpdateTaskPayload = parse(payload)?;
            let id = match parsed.id {
                EntityId::Pending(_) => return skip_pending(parsed.id),
                EntityId::Confirmed(id) => id,
            };
            match parsed.update {
                TaskUpdate::Fields(fields) => remote.update_task_fields(id, &fields),
                TaskUpdate::DueDate { due_date } => remote.set_task_due_date(id, due_date),
                TaskUpdate::When { when } => remote.set_task_when(id, when),
                TaskUpdate::Grouping { project, area } => {
                    remote.set_task_grouping(id, project, area)
                }
                TaskUpdate::Recurrence { recurrence } => {
                    remote.set_task_recurrence(id, recurrence)
                }
            }
        })
        .register(Domain::Subtask, Action::Create, move |payload| {
            let parsed: CreateSubtaskPayload = parse(payload)?;
            match parsed.task_id {
                EntityId::Pending(_) => skip_pending(parsed.task_id),
                EntityId::Confirmed(id) => remote.create_subtask(id, &parsed.title).map(|_| ()),
            }
        })
        .register(Domain::Subtask, Action::Toggle, move |payload| {
            let parsed: ToggleSubtaskPayload = parse(payload)?;
            remote.set_subtask_completion(parsed.subtask_id, parsed.completed)
        })
        .register(Domain::Subtask, Action::Delete, move |payload| {
            let parsed: DeleteSubtaskPayload = parse(payload)?;
            remote.delete_subtask(parsed.subtask_id)
        })
        .register(Domain::Project, Action::Create, move |payload| {
            let parsed: CreateProjectPayload = parse(payload)?;
            remote
                .create_project(&parsed.name, &parsed.color, parsed.area_id)
                .map(|_| ())
        })
        .register(Domain::Project, Action::Delete, move |payload| {
            let parsed: DeleteProjectPayload = parse(payload)?;
            remote.delete_project(parsed.id)
        })
        .register(Domain::Area, Action::Create, move |payload| {
            let parsed: CreateAreaPayload = parse(payload)?;
            remote.create_area(&parsed.name, &parsed.color).map(|_| ())
        })
        .register(Domain::Area, Action::Delete, move |payload| {
            let parsed: DeleteAreaPayload = parse(payload)?;
            remote.delete_area(parsed.id)
        })
}

fn skip_pending(id: EntityId) -> DbResult<()> {
    debug!(%id, "skipping replay against an unconfirmed id");
    Ok(())
}
