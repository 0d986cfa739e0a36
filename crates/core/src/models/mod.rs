//! # 数据模型
//!
//! 模拟访问任务的核心数据结构。
//!
//! ## 核心模型
//!
//! ### Task - 模拟任务
//! 一次模拟运行：不可变的配置、实时计数器以及状态。
//!
//! ### ProbeResult - 探测结果
//! 只追加的单次探测记录，隶属于唯一的任务，随任务级联删除。
//!
//! ## 状态流转
//!
//! ```text
//! Running → Completed   (达到配置的访问次数)
//!    ↓
//!  Failed               (循环中出现未分类的错误)
//! ```
//!
//! ## 数据库映射
//!
//! ### tasks 表
//! - `id` - UUID 主键
//! - `url`、`min_interval` … `retry_delay` - 任务配置
//! - `status` - running / completed / failed
//! - `success_count`、`fail_count` - 计数器
//! - `created_at`、`updated_at`
//!
//! ### task_results 表
//! - `id` - 自增主键，隐含创建顺序
//! - `task_id` - 外键，`ON DELETE CASCADE`
//! - `status` - success / failure
//! - `status_code`、`message`、`created_at`

pub mod probe;
pub mod task;

pub use probe::*;
pub use task::*;
