//! 错误处理单元测试
//!
//! 测试应用错误类型的各种行为

use axum::{http::StatusCode, response::IntoResponse};
use edge_inventory::error::AppError;
use http_body_util::BodyExt;

// ==================== 错误状态码测试 ====================

#[test]
fn test_error_status_codes() {
    assert_eq!(AppError::NotFound("device 1".to_string()).status_code(), StatusCode::NOT_FOUND);
    assert_eq!(AppError::Conflict("dup".to_string()).status_code(), StatusCode::CONFLICT);
    assert_eq!(AppError::Validation("error".to_string()).status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        AppError::Storage("down".to_string()).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn test_database_error_status_code() {
    let db_error = sqlx::Error::RowNotFound;
    let app_error = AppError::Database(db_error);
    assert_eq!(app_error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_config_error_status_code() {
    let app_error = AppError::Config("Invalid config".to_string());
    assert_eq!(app_error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_internal_error_status_code() {
    let app_error = AppError::Internal("Something went wrong".to_string());
    assert_eq!(app_error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

// ==================== 错误消息测试 ====================

#[test]
fn test_duplicate_hardware_address_message() {
    let error = AppError::duplicate_hardware_address("AA:BB:CC:DD:EE:FF");
    assert!(matches!(error, AppError::Conflict(_)));
    assert!(error.user_message().contains("AA:BB:CC:DD:EE:FF"));
}

#[test]
fn test_storage_message_hides_details() {
    let error = AppError::storage("connection reset by peer at 10.0.0.3");
    assert_eq!(error.user_message(), "Database error occurred");
}

#[test]
fn test_from_config_error() {
    let error: AppError = config::ConfigError::Message("bad".to_string()).into();
    assert!(matches!(error, AppError::Config(_)));
}

// ==================== 错误响应测试 ====================

#[tokio::test]
async fn test_error_response_envelope() {
    let response = AppError::not_found("device 7").into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(json["error"]["code"], 404);
    assert_eq!(json["error"]["message"], "Resource not found: device 7");
    assert!(json["error"]["request_id"].is_string());
}

#[tokio::test]
async fn test_database_error_response_hides_driver_text() {
    let response = AppError::Database(sqlx::Error::PoolTimedOut).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(!body.to_lowercase().contains("pool"));
}
