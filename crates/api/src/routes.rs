use std::sync::Arc;

use axum::{routing::get, Router};
use simulator_core::{config::SimulationDefaults, traits::TaskControlService};

use crate::handlers::{
    health::health_check,
    tasks::{create_task, delete_task, get_task, list_tasks},
};

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub task_controller: Arc<dyn TaskControlService>,
    pub defaults: SimulationDefaults,
}

/// 创建API路由（不含前缀）
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/{id}", get(get_task).delete(delete_task))
        .with_state(state)
}
