pub mod components;
pub mod executors;
pub mod retry;
pub mod user_agents;

pub use components::{RunOutcome, RunSummary, TaskRunner, TaskSupervisor, INTERRUPTED_MESSAGE};
pub use executors::HttpProbeExecutor;
pub use retry::{AttemptOutcome, FailureKind, RetryPolicy};

#[cfg(test)]
mod executors_test;
