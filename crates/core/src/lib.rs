pub mod config;
pub mod errors;
pub mod models;
pub mod traits;
pub mod validation;

pub use config::*;
pub use errors::*;
pub use models::{
    ProbeOutcome, ProbeReport, ProbeResult, SimulationConfig, Task, TaskConfig, TaskDetail,
    TaskStatus, TaskSummary,
};
pub use traits::{ProbeExecutor, TaskControlService, TaskRepository};
pub use validation::{is_valid_target, validate_target};
