//! 编辑会话
//!
//! 保存正在新建或编辑的记录草稿。草稿以原始文本保存用户输入，
//! 只有校验通过后才会解析为类型化记录并写入仓库。

use chrono::NaiveDate;
use hospital_core::utils::is_blank;
use hospital_core::{FieldError, HospitalError, Record, RecordId, Result, ValidationErrors};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::repository::Repository;
use crate::schema::{Chip, Schema};

/// 会话模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditMode {
    Create,
    Edit,
}

/// 提交结果；校验失败是预期情况，作为返回值而不是错误
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    Committed(RecordId),
    Rejected(ValidationErrors),
}

/// 单条记录的编辑草稿
#[derive(Debug, Clone)]
pub struct EditSession {
    mode: EditMode,
    schema: Arc<Schema>,
    id: RecordId,
    draft: BTreeMap<&'static str, String>,
    errors: Option<ValidationErrors>,
}

impl EditSession {
    /// 以初始记录开始会话
    pub fn start(mode: EditMode, schema: Arc<Schema>, initial: &Record) -> Self {
        let draft = schema
            .fields
            .iter()
            .map(|spec| {
                let raw = initial.get(spec.name).map(|v| v.to_string()).unwrap_or_default();
                (spec.name, raw)
            })
            .collect();

        tracing::debug!("Started {:?} session for {} {}", mode, schema.singular, initial.id);

        Self {
            mode,
            id: initial.id.clone(),
            schema,
            draft,
            errors: None,
        }
    }

    /// 新建会话：空白记录加上 schema 默认值
    pub fn create(schema: Arc<Schema>, id: RecordId, today: NaiveDate) -> Self {
        let blank = schema.blank_record(id, today);
        Self::start(EditMode::Create, schema, &blank)
    }

    /// 编辑已有记录
    pub fn edit(schema: Arc<Schema>, record: &Record) -> Self {
        Self::start(EditMode::Edit, schema, record)
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// 草稿中某字段的原始输入
    pub fn value(&self, field: &str) -> Option<&str> {
        if field == "id" {
            return Some(self.id.as_str());
        }
        self.draft.get(field).map(String::as_str)
    }

    /// 最近一次提交失败时的错误
    pub fn errors(&self) -> Option<&ValidationErrors> {
        self.errors.as_ref()
    }

    /// 设置字段，返回新的会话状态；原会话不变
    ///
    /// 派生属性总是从草稿当前取值查表，因此与枚举字段在同一步更新。
    pub fn set_field(&self, field: &str, value: impl Into<String>) -> Result<Self> {
        if field == "id" || self.schema.is_derived(field) {
            return Err(HospitalError::ReadOnlyField(field.to_string()));
        }
        let spec = self
            .schema
            .spec(field)
            .ok_or_else(|| HospitalError::UnknownField(field.to_string()))?;

        let mut next = self.clone();
        next.draft.insert(spec.name, value.into());
        if let Some(errors) = next.errors.as_mut() {
            errors.missing.retain(|f| f != field);
            errors.invalid.retain(|e| e.field != field);
        }
        Ok(next)
    }

    /// 草稿的派生属性
    pub fn derived(&self, name: &str) -> Option<String> {
        let derived = self.schema.derived_field(name)?;
        self.schema.derive(name, self.value(derived.source))
    }

    /// 草稿在枚举字段上的显示芯片
    pub fn chip(&self, field: &str) -> Option<Chip> {
        let set = self.schema.choice_set(field)?;
        self.value(field)
            .filter(|raw| !is_blank(raw))
            .map(|raw| set.chip(raw.trim()))
    }

    /// 校验草稿
    ///
    /// 缺失的必填字段按 schema 顺序列出；无法解析或超出范围的取值列为无效。
    pub fn validate(&self) -> std::result::Result<Record, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let mut record = Record::new(self.id.clone());

        for spec in &self.schema.fields {
            let raw = self.draft.get(spec.name).map(String::as_str).unwrap_or("");
            if is_blank(raw) {
                if spec.required {
                    errors.missing.push(spec.name.to_string());
                }
                continue;
            }
            match spec.parse(raw) {
                Ok(value) => {
                    record.set(spec.name, value);
                }
                Err(reason) => errors.invalid.push(FieldError::new(spec.name, reason)),
            }
        }

        if errors.is_empty() {
            Ok(record)
        } else {
            Err(errors)
        }
    }

    /// 提交到仓库
    ///
    /// 校验失败时不修改仓库，错误记录在会话上并返回 `Rejected`。
    /// 仓库层错误（记录已不存在、ID重复）作为 `Err` 返回。
    pub fn commit(&mut self, repository: &mut Repository) -> Result<CommitOutcome> {
        let record = match self.validate() {
            Ok(record) => record,
            Err(errors) => {
                self.errors = Some(errors.clone());
                return Ok(CommitOutcome::Rejected(errors));
            }
        };

        match self.mode {
            EditMode::Create => repository.insert(record)?,
            EditMode::Edit => repository.replace(&self.id, record)?,
        }

        self.errors = None;
        Ok(CommitOutcome::Committed(self.id.clone()))
    }

    /// 丢弃草稿，不影响仓库
    pub fn discard(self) {
        tracing::debug!("Discarded {:?} session for {} {}", self.mode, self.schema.singular, self.id);
    }
}
