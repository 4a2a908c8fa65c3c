//! 边缘设备资产库
//! 设备记录、字段级变更历史与 HTTP 接口

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;
