//! 设备管理的 HTTP 处理器

use crate::{
    error::AppError,
    middleware::{ApiJson, AppState},
    models::device::{CreateDeviceRequest, DevicePatch},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// 列出设备
pub async fn list_devices(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let service = &state.device_service;
    let limit = query.limit.unwrap_or_else(|| service.default_page_size());
    let devices = service.list_devices(query.offset, limit).await?;

    Ok(Json(json!({
        "devices": devices,
        "count": devices.len()
    })))
}

/// 注册设备
pub async fn create_device(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateDeviceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let device = state.device_service.create_device(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Device created",
            "device": device
        })),
    ))
}

/// 搜索设备
pub async fn search_devices(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let devices = state.device_service.search_devices(&query.q).await?;

    Ok(Json(json!({
        "devices": devices,
        "count": devices.len()
    })))
}

/// 获取设备详情
pub async fn get_device(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let device = state.device_service.get_device(id).await?;

    Ok(Json(device))
}

/// 更新设备
pub async fn update_device(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ApiJson(patch): ApiJson<DevicePatch>,
) -> Result<impl IntoResponse, AppError> {
    let device = state.device_service.update_device(id, patch).await?;

    Ok(Json(json!({
        "message": "Device updated",
        "device": device
    })))
}

/// 删除设备
pub async fn delete_device(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.device_service.delete_device(id).await?;

    Ok(Json(json!({
        "message": "Device deleted"
    })))
}

/// 设备变更历史
pub async fn get_device_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let history = state.device_service.get_device_history(id).await?;

    Ok(Json(json!({
        "history": history,
        "count": history.len()
    })))
}
