//! 删除确认
//!
//! 删除前的同步确认关口，渲染层可以实现为模态框或任意阻塞式提示。

use hospital_core::{HospitalError, Record, RecordId, Result};
use serde::{Deserialize, Serialize};

use crate::repository::Repository;

/// 确认结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confirmation {
    Confirmed,
    Cancelled,
}

impl From<bool> for Confirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            Confirmation::Confirmed
        } else {
            Confirmation::Cancelled
        }
    }
}

/// 待确认的删除请求
#[derive(Debug, Clone)]
pub struct DeleteRequest {
    pub singular: String,
    pub record: Record,
}

impl DeleteRequest {
    pub fn message(&self) -> String {
        format!(
            "Are you sure you want to delete {} {}?",
            self.singular, self.record.id
        )
    }
}

/// 确认提示
pub trait ConfirmPrompt {
    fn confirm(&mut self, request: &DeleteRequest) -> Confirmation;
}

impl<F> ConfirmPrompt for F
where
    F: FnMut(&DeleteRequest) -> Confirmation,
{
    fn confirm(&mut self, request: &DeleteRequest) -> Confirmation {
        self(request)
    }
}

/// 询问后删除；记录不存在时直接报错，不会询问
pub fn confirm_delete(
    repository: &mut Repository,
    singular: &str,
    id: &RecordId,
    prompt: &mut dyn ConfirmPrompt,
) -> Result<Confirmation> {
    let record = repository
        .get(id)
        .ok_or_else(|| HospitalError::NotFound(id.to_string()))?;

    let request = DeleteRequest {
        singular: singular.to_string(),
        record: record.clone(),
    };
    let answer = prompt.confirm(&request);
    if answer == Confirmation::Confirmed {
        repository.delete(id)?;
    }
    Ok(answer)
}
