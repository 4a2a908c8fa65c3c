//! 数据模型模块
//! 设备台账与变更历史

pub mod address;
pub mod device;
pub mod history;
