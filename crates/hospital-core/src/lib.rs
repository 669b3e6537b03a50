//! # Hospital Core
//!
//! 医院仪表盘的核心模块，提供记录数据结构、错误定义和通用工具。

pub mod error;
pub mod models;
pub mod utils;

pub use error::{FieldError, HospitalError, Result, ValidationErrors};
pub use models::*;
