pub mod task_runner;
pub mod task_supervisor;

pub use task_runner::{draw_interval, RunOutcome, RunSummary, TaskRunner};
pub use task_supervisor::{TaskSupervisor, INTERRUPTED_MESSAGE};
