mod error;
mod model;
mod recurrence;
pub mod sanitize;

pub use error::{DaybookError, DbResult, ErrorKind, ExitCode};
pub use model::{
    Area, EntityId, Project, Recurrence, RecurrenceKind, Subtask, Tag, Task, View, When,
};
pub use recurrence::next_due_date;
