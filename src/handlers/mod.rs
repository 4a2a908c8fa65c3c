//! HTTP 处理器模块

pub mod device;
pub mod health;
pub mod history;
