//! 分组汇总
//!
//! 按枚举字段声明的取值分组，统计每组记录数并对数值字段求和。
//! 分组来自 schema 的声明集合而不是数据中出现的取值，
//! 没有记录的分组同样出现，计数和合计为零。

use hospital_core::{HospitalError, Record, Result};
use serde::Serialize;

use crate::schema::{Chip, Schema};

/// 单个分组的汇总
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub value: String,
    pub count: usize,
    pub total: f64,
    pub chip: Chip,
}

/// 汇总结果，分组按声明顺序排列
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub group_field: String,
    pub sum_field: String,
    pub groups: Vec<GroupSummary>,
}

impl Summary {
    pub fn get(&self, value: &str) -> Option<&GroupSummary> {
        self.groups.iter().find(|g| g.value == value)
    }

    pub fn total_count(&self) -> usize {
        self.groups.iter().map(|g| g.count).sum()
    }

    pub fn grand_total(&self) -> f64 {
        self.groups.iter().map(|g| g.total).sum()
    }
}

/// 按 `group_field` 分组并对 `sum_field` 求和
pub fn summarize(records: &[Record], schema: &Schema, group_field: &str, sum_field: &str) -> Result<Summary> {
    let numeric = schema.spec(sum_field).map(|s| s.kind.is_numeric()).unwrap_or(false);
    if !numeric {
        return Err(HospitalError::Config(format!(
            "{} field '{}' is not a numeric field",
            schema.name, sum_field
        )));
    }
    group(records, schema, group_field, Some(sum_field))
}

/// 只按 `group_field` 计数，合计恒为零
pub fn count_by(records: &[Record], schema: &Schema, group_field: &str) -> Result<Summary> {
    group(records, schema, group_field, None)
}

fn group(records: &[Record], schema: &Schema, group_field: &str, sum_field: Option<&str>) -> Result<Summary> {
    let set = schema.choice_set(group_field).ok_or_else(|| {
        HospitalError::Config(format!(
            "{} field '{}' is not an enum field",
            schema.name, group_field
        ))
    })?;

    let mut groups: Vec<GroupSummary> = set
        .labels()
        .map(|label| GroupSummary {
            value: label.to_string(),
            count: 0,
            total: 0.0,
            chip: set.chip(label),
        })
        .collect();

    for record in records {
        let Some(label) = record.str_field(group_field) else {
            continue;
        };
        // 未声明的取值不计入任何分组
        if let Some(group) = groups.iter_mut().find(|g| g.value == label) {
            group.count += 1;
            if let Some(field) = sum_field {
                group.total += record.get(field).and_then(|v| v.as_number()).unwrap_or(0.0);
            }
        }
    }

    tracing::debug!(
        "Grouped {} {} by {} into {} groups",
        records.len(),
        schema.name,
        group_field,
        groups.len()
    );

    Ok(Summary {
        group_field: group_field.to_string(),
        sum_field: sum_field.unwrap_or_default().to_string(),
        groups,
    })
}
