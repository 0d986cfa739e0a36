use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use simulator_core::{
    config::DatabaseConfig,
    models::{ProbeOutcome, ProbeReport, ProbeResult, Task, TaskConfig, TaskDetail, TaskStatus, TaskSummary},
    traits::TaskRepository,
    SimulatorError, SimulatorResult,
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow},
    Row, SqlitePool,
};
use tracing::{debug, instrument};

const TASK_COLUMNS: &str = "id, url, min_interval, max_interval, count, timeout, retries, retry_delay, \
     status, success_count, fail_count, created_at, updated_at";

pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 按配置建立连接池并运行迁移
    ///
    /// `:memory:` 数据库每个连接都是独立的库，所以强制只用一个长期存活的连接。
    pub async fn connect(config: &DatabaseConfig) -> SimulatorResult<Self> {
        debug!("Connecting SQLite task repository at: {}", config.url);

        let in_memory = config.url.contains(":memory:");
        let mut connect_options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true);
        if !in_memory {
            connect_options = connect_options.journal_mode(SqliteJournalMode::Wal);
        }

        let mut pool_options = SqlitePoolOptions::new()
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds));
        pool_options = if in_memory {
            pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options
                .max_connections(config.max_connections)
                .min_connections(config.min_connections)
        };

        let pool = pool_options.connect_with(connect_options).await?;

        let repository = Self { pool };
        repository.migrate().await?;
        Ok(repository)
    }

    /// 独立的内存数据库，主要用于测试
    pub async fn in_memory() -> SimulatorResult<Self> {
        Self::connect(&DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            ..DatabaseConfig::default()
        })
        .await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// 建表，可重复执行
    pub async fn migrate(&self) -> SimulatorResult<()> {
        debug!("Running SQLite database migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                url TEXT NOT NULL,
                min_interval INTEGER NOT NULL,
                max_interval INTEGER NOT NULL,
                count INTEGER NOT NULL,
                timeout INTEGER NOT NULL,
                retries INTEGER NOT NULL DEFAULT 0,
                retry_delay INTEGER NOT NULL DEFAULT 1,
                status TEXT NOT NULL DEFAULT 'running',
                success_count INTEGER NOT NULL DEFAULT 0,
                fail_count INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS task_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                task_id TEXT NOT NULL,
                status TEXT NOT NULL,
                status_code INTEGER NOT NULL DEFAULT 0,
                message TEXT NOT NULL,
                created_at DATETIME NOT NULL,
                FOREIGN KEY (task_id) REFERENCES tasks(id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        let indexes = [
            "CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status)",
            "CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks(created_at)",
            "CREATE INDEX IF NOT EXISTS idx_task_results_task_id ON task_results(task_id)",
        ];
        for index_sql in indexes {
            sqlx::query(index_sql).execute(&self.pool).await?;
        }

        debug!("Successfully completed SQLite database migrations");
        Ok(())
    }

    pub async fn health_check(&self) -> SimulatorResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn row_to_task(row: &SqliteRow) -> SimulatorResult<Task> {
        Ok(Task {
            id: row.try_get("id")?,
            config: TaskConfig {
                url: row.try_get("url")?,
                min_interval: column_u32(row, "min_interval")?,
                max_interval: column_u32(row, "max_interval")?,
                count: column_u32(row, "count")?,
                timeout: column_u32(row, "timeout")?,
                retries: column_u32(row, "retries")?,
                retry_delay: column_u32(row, "retry_delay")?,
            },
            status: row.try_get("status")?,
            success_count: column_u32(row, "success_count")?,
            fail_count: column_u32(row, "fail_count")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_summary(row: &SqliteRow) -> SimulatorResult<TaskSummary> {
        Ok(TaskSummary {
            id: row.try_get("id")?,
            url: row.try_get("url")?,
            status: row.try_get("status")?,
            success_count: column_u32(row, "success_count")?,
            fail_count: column_u32(row, "fail_count")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_result(row: &SqliteRow) -> SimulatorResult<ProbeResult> {
        let status_code: i64 = row.try_get("status_code")?;
        Ok(ProbeResult {
            id: row.try_get("id")?,
            outcome: row.try_get("status")?,
            status_code: u16::try_from(status_code).map_err(|_| {
                SimulatorError::Internal(format!("状态码超出范围: {status_code}"))
            })?,
            message: row.try_get("message")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

fn column_u32(row: &SqliteRow, column: &str) -> SimulatorResult<u32> {
    let value: i64 = row.try_get(column)?;
    u32::try_from(value)
        .map_err(|_| SimulatorError::Internal(format!("字段 {column} 超出范围: {value}")))
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    #[instrument(skip(self, task), fields(task_id = %task.id, url = %task.config.url))]
    async fn create(&self, task: &Task) -> SimulatorResult<Task> {
        let sql = format!(
            "INSERT INTO tasks ({TASK_COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING {TASK_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&task.id)
            .bind(&task.config.url)
            .bind(i64::from(task.config.min_interval))
            .bind(i64::from(task.config.max_interval))
            .bind(i64::from(task.config.count))
            .bind(i64::from(task.config.timeout))
            .bind(i64::from(task.config.retries))
            .bind(i64::from(task.config.retry_delay))
            .bind(task.status)
            .bind(i64::from(task.success_count))
            .bind(i64::from(task.fail_count))
            .bind(task.created_at)
            .bind(task.updated_at)
            .fetch_one(&self.pool)
            .await?;

        let created = Self::row_to_task(&row)?;
        debug!("创建任务成功: {}", created.id);
        Ok(created)
    }

    #[instrument(skip(self), fields(task_id = %id))]
    async fn get(&self, id: &str) -> SimulatorResult<Option<TaskDetail>> {
        // 两次查询共用一个读事务（同一个WAL快照），计数器和结果总是一致
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?");
        let Some(row) = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            debug!("查询任务不存在: {}", id);
            return Ok(None);
        };
        let task = Self::row_to_task(&row)?;

        let results = sqlx::query(
            "SELECT id, status, status_code, message, created_at FROM task_results \
             WHERE task_id = ? ORDER BY id ASC",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?
        .iter()
        .map(Self::row_to_result)
        .collect::<SimulatorResult<Vec<_>>>()?;

        tx.commit().await?;
        Ok(Some(TaskDetail { task, results }))
    }

    #[instrument(skip(self))]
    async fn list(&self, status: Option<TaskStatus>) -> SimulatorResult<Vec<TaskSummary>> {
        let rows = match status {
            Some(status) => {
                sqlx::query(
                    "SELECT id, url, status, success_count, fail_count, created_at FROM tasks \
                     WHERE status = ? ORDER BY created_at DESC, rowid DESC",
                )
                .bind(status)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT id, url, status, success_count, fail_count, created_at FROM tasks \
                     ORDER BY created_at DESC, rowid DESC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(Self::row_to_summary).collect()
    }

    #[instrument(skip(self), fields(task_id = %id))]
    async fn delete(&self, id: &str) -> SimulatorResult<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(SimulatorError::task_not_found(id));
        }

        debug!("删除任务成功: {}", id);
        Ok(())
    }

    #[instrument(skip(self, report), fields(task_id = %id, outcome = %report.outcome))]
    async fn record_probe(&self, id: &str, report: &ProbeReport) -> SimulatorResult<Task> {
        let (success_delta, fail_delta) = match report.outcome {
            ProbeOutcome::Success => (1_i64, 0_i64),
            ProbeOutcome::Failure => (0, 1),
        };
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "UPDATE tasks SET success_count = success_count + ?, fail_count = fail_count + ?, \
             updated_at = ? \
             WHERE id = ? AND status = 'running' AND success_count + fail_count < count \
             RETURNING {TASK_COLUMNS}"
        );
        let Some(row) = sqlx::query(&sql)
            .bind(success_delta)
            .bind(fail_delta)
            .bind(now)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            tx.rollback().await?;
            return Err(SimulatorError::task_not_found(id));
        };
        let task = Self::row_to_task(&row)?;

        sqlx::query(
            "INSERT INTO task_results (task_id, status, status_code, message, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(report.outcome)
        .bind(i64::from(report.status_code))
        .bind(&report.message)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(task)
    }

    #[instrument(skip(self), fields(task_id = %id, status = %status))]
    async fn finish(&self, id: &str, status: TaskStatus) -> SimulatorResult<()> {
        if !TaskStatus::Running.can_transition_to(status) {
            return Err(SimulatorError::InvalidConfig(format!(
                "任务只能转换到终态: {status}"
            )));
        }

        let result = sqlx::query(
            "UPDATE tasks SET status = ?, updated_at = ? WHERE id = ? AND status = 'running'",
        )
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(SimulatorError::task_not_found(id));
        }
        Ok(())
    }

    #[instrument(skip(self, message), fields(task_id = %id))]
    async fn fail(&self, id: &str, message: &str) -> SimulatorResult<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // 第一条语句必须是写操作：延迟事务从读锁升级为写锁时，若其他连接已提交会直接返回 SQLITE_BUSY
        let Some(row) = sqlx::query(
            "UPDATE tasks SET status = 'failed', updated_at = ? \
             WHERE id = ? AND status = 'running' \
             RETURNING success_count + fail_count AS attempted, count",
        )
        .bind(now)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            tx.rollback().await?;
            return Err(SimulatorError::task_not_found(id));
        };
        let attempted: i64 = row.try_get("attempted")?;
        let count: i64 = row.try_get("count")?;

        // 访问次数已满时只改状态，保证结果数不超过 count
        if attempted < count {
            let report = ProbeReport::aborted(message);
            sqlx::query(
                "INSERT INTO task_results (task_id, status, status_code, message, created_at) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(id)
            .bind(report.outcome)
            .bind(i64::from(report.status_code))
            .bind(&report.message)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            sqlx::query("UPDATE tasks SET fail_count = fail_count + 1 WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_running(&self) -> SimulatorResult<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>("SELECT id FROM tasks WHERE status = 'running'")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }
}
