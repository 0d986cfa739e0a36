pub mod control_service;
pub mod repository;
pub mod task_executor;

pub use control_service::*;
pub use repository::*;
pub use task_executor::*;
