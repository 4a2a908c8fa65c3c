//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

use crate::{handlers, middleware::AppState};

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点（健康检查）
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check));

    // 设备
    let device_routes = Router::new()
        .route(
            "/api/v1/devices",
            get(handlers::device::list_devices).post(handlers::device::create_device),
        )
        .route("/api/v1/devices/search", get(handlers::device::search_devices))
        .route(
            "/api/v1/devices/{id}",
            get(handlers::device::get_device)
                .put(handlers::device::update_device)
                .delete(handlers::device::delete_device),
        )
        .route(
            "/api/v1/devices/{id}/history",
            get(handlers::device::get_device_history),
        );

    // 变更历史
    let history_routes =
        Router::new().route("/api/v1/history", get(handlers::history::list_history));

    Router::new()
        .merge(public_routes)
        .merge(device_routes)
        .merge(history_routes)
        .layer(RequestBodyLimitLayer::new(
            state.config.server.request_body_limit_bytes,
        ))
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
        .with_state(state)
}
