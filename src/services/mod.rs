//! Business logic services layer

pub mod audit_service;
pub mod device_service;
pub mod diff;

pub use audit_service::{AuditService, SYSTEM_ACTOR};
pub use device_service::DeviceService;
