pub mod manager;
pub mod memory;
pub mod sqlite;

pub use manager::{DatabaseManager, DatabaseType};
pub use memory::InMemoryTaskRepository;
pub use sqlite::SqliteTaskRepository;
