//! # Simulator API
//!
//! 模拟访问任务的 REST 接口，基于 Axum。
//!
//! ## API 端点
//!
//! 以下路径挂载在 `api.path_prefix`（默认 `/api`）之下：
//!
//! - `POST /tasks` - 创建任务，立即返回 201，访问在后台进行
//! - `GET /tasks` - 任务列表，最新的在前，可用 `?status=` 过滤
//! - `GET /tasks/{id}` - 任务详情，包含按时间排列的探测结果
//! - `DELETE /tasks/{id}` - 删除任务及其结果
//! - `GET /health` - 健康检查
//!
//! ## 错误响应
//!
//! ```json
//! {
//!   "error": {
//!     "code": "INVALID_URL",
//!     "message": "无效的URL: not a url",
//!     "suggestions": ["..."]
//!   },
//!   "timestamp": "2024-01-01T00:00:00Z"
//! }
//! ```
//!
//! URL 或参数不合法返回 400，任务不存在返回 404，其余错误返回 500。

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use simulator_core::{config::ApiConfig, config::SimulationDefaults, traits::TaskControlService};
use tower::ServiceBuilder;

use middleware::{cors_layer, request_logging, timeout_layer, trace_layer};
use routes::{create_routes, AppState};

/// 创建完整的API应用：挂载前缀并加上中间件
pub fn create_app(
    task_controller: Arc<dyn TaskControlService>,
    defaults: SimulationDefaults,
    api_config: &ApiConfig,
) -> Router {
    let state = AppState {
        task_controller,
        defaults,
    };

    let routes = create_routes(state);
    let router = if api_config.path_prefix.is_empty() {
        routes
    } else {
        Router::new().nest(&api_config.path_prefix, routes)
    };

    let router = router.layer(
        ServiceBuilder::new()
            .layer(trace_layer())
            .layer(timeout_layer(api_config.request_timeout_seconds))
            .layer(axum::middleware::from_fn(request_logging)),
    );

    if api_config.cors_enabled {
        router.layer(cors_layer(&api_config.cors_origins))
    } else {
        router
    }
}
