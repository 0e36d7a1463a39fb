mod payload;
mod remote;
mod store;

pub use payload::{
    CreateAreaPayload, CreateProjectPayload, CreateSubtaskPayload, CreateTaskPayload,
    DeleteAreaPayload, DeleteProjectPayload, DeleteSubtaskPayload, DeleteTaskPayload,
    TaskUpdate, ToggleSubtaskPayload, ToggleTaskPayload, UpdateTaskPayload,
};
pub use remote::{RemoteStore, Snapshot, TaskDraft, TaskFields};
pub use store::{
    Applied, COMPLETION_DELAY_MS, Clock, OptimisticStore, SessionEvent, UNDO_DELETE_DELAY_MS,
};
