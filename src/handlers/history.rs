//! 变更历史的 HTTP 处理器

use crate::{error::AppError, handlers::device::ListQuery, middleware::AppState};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// 列出全部变更历史（最新在前）
pub async fn list_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let service = &state.device_service;
    let limit = query.limit.unwrap_or_else(|| service.default_page_size());
    let history = service.get_all_history(query.offset, limit).await?;

    Ok(Json(json!({
        "history": history,
        "count": history.len()
    })))
}
