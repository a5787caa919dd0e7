pub mod task;
pub mod time;

pub use task::{Document, MutableField, NewTaskRequest, TaskPatch};
pub use time::LastModified;
