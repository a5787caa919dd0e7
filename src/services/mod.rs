pub mod seed;
pub mod status;
pub mod task_service;
pub mod update_guard;

pub use status::{DueStatus, StatusFilter};
pub use task_service::{TaskService, UpdateOutcome};
