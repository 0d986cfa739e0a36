use std::sync::Arc;

use simulator_core::{config::DatabaseConfig, traits::TaskRepository, SimulatorResult};
use tracing::info;

use super::{memory::InMemoryTaskRepository, sqlite::SqliteTaskRepository};

/// 注册表类型，由URL决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    SQLite,
    Memory,
}

impl DatabaseType {
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("memory:") {
            DatabaseType::Memory
        } else {
            DatabaseType::SQLite
        }
    }
}

enum Backend {
    SQLite(Arc<SqliteTaskRepository>),
    Memory(Arc<InMemoryTaskRepository>),
}

/// Unified database manager
pub struct DatabaseManager {
    backend: Backend,
}

impl DatabaseManager {
    /// 按配置创建注册表，SQLite会自动建表
    pub async fn new(config: &DatabaseConfig) -> SimulatorResult<Self> {
        let backend = match DatabaseType::from_url(&config.url) {
            DatabaseType::SQLite => {
                Backend::SQLite(Arc::new(SqliteTaskRepository::connect(config).await?))
            }
            DatabaseType::Memory => Backend::Memory(Arc::new(InMemoryTaskRepository::new())),
        };
        info!("任务注册表已就绪: {:?}", DatabaseType::from_url(&config.url));
        Ok(Self { backend })
    }

    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(InMemoryTaskRepository::new())),
        }
    }

    pub fn database_type(&self) -> DatabaseType {
        match self.backend {
            Backend::SQLite(_) => DatabaseType::SQLite,
            Backend::Memory(_) => DatabaseType::Memory,
        }
    }

    pub async fn health_check(&self) -> SimulatorResult<()> {
        match &self.backend {
            Backend::SQLite(repo) => repo.health_check().await,
            Backend::Memory(_) => Ok(()),
        }
    }

    pub async fn close(&self) {
        if let Backend::SQLite(repo) = &self.backend {
            repo.close().await;
        }
    }

    pub fn task_repository(&self) -> Arc<dyn TaskRepository> {
        match &self.backend {
            Backend::SQLite(repo) => repo.clone() as Arc<dyn TaskRepository>,
            Backend::Memory(repo) => repo.clone() as Arc<dyn TaskRepository>,
        }
    }
}
