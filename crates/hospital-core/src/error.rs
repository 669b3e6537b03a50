//! 错误定义模块

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 单个字段的校验失败原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// 草稿校验结果中的错误集合
///
/// `missing` 按 schema 字段顺序列出空缺的必填字段，
/// `invalid` 列出无法解析或超出取值范围的字段。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub missing: Vec<String>,
    pub invalid: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.invalid.is_empty()
    }

    /// 所有出错字段名（缺失在前，无效在后）
    pub fn fields(&self) -> Vec<&str> {
        self.missing
            .iter()
            .map(String::as_str)
            .chain(self.invalid.iter().map(|e| e.field.as_str()))
            .collect()
    }

    /// 某字段是否出错，供表单逐字段提示
    pub fn has_field(&self, field: &str) -> bool {
        self.fields().contains(&field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("missing required fields: {}", self.missing.join(", ")));
        }
        for error in &self.invalid {
            parts.push(format!("{}: {}", error.field, error.reason));
        }
        write!(f, "{}", parts.join("; "))
    }
}

/// 医院仪表盘统一错误类型
#[derive(Error, Debug)]
pub enum HospitalError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("验证错误: {0}")]
    Validation(ValidationErrors),

    #[error("解析错误: 字段 {field}: {reason}")]
    Parse { field: String, reason: String },

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("记录ID重复: {0}")]
    DuplicateId(String),

    #[error("未知字段: {0}")]
    UnknownField(String),

    #[error("只读字段: {0}")]
    ReadOnlyField(String),

    #[error("认证错误: {0}")]
    Authentication(String),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("无效状态转换: 从 {from} 到 {event}")]
    InvalidStateTransition { from: String, event: String },

    #[error("系统内部错误: {0}")]
    Internal(String),
}

/// 医院仪表盘统一结果类型
pub type Result<T> = std::result::Result<T, HospitalError>;
