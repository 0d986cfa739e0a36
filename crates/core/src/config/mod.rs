//! 应用配置
//!
//! 加载顺序（后者覆盖前者）：
//!
//! 1. 内置默认值
//! 2. TOML 配置文件（显式指定的路径必须存在；否则依次尝试
//!    `config/simulator.toml`、`simulator.toml`）
//! 3. 环境变量，前缀 `SIMULATOR`，层级分隔符 `__`，
//!    例如 `SIMULATOR__API__BIND_ADDRESS=127.0.0.1:9000`

pub mod models;

#[cfg(test)]
mod tests;

pub use models::*;
