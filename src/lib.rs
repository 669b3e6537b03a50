//! # Hospital
//!
//! 医院管理仪表盘的门面包，统一导出核心模型、记录引擎与管理模块。

pub use hospital_admin;
pub use hospital_core;
pub use hospital_records;
