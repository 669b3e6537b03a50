//! 记录模式定义
//!
//! 描述一个记录集合的字段列表、字段类型、必填约束、搜索字段、
//! 新建默认值，以及由枚举取值查表得到的派生显示属性。

use chrono::{NaiveDate, NaiveTime};
use hospital_core::utils::is_blank;
use hospital_core::{Record, RecordId, Value};
use serde::Serialize;

/// 枚举取值及其固定的显示颜色、图标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceOption {
    pub label: &'static str,
    pub color: &'static str,
    pub icon: Option<&'static str>,
}

/// 枚举字段声明的取值集合
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceSet {
    pub options: &'static [ChoiceOption],
    /// 开放集合接受未声明的取值，显示时使用 `fallback`
    pub open: bool,
    pub fallback: ChoiceOption,
}

impl ChoiceSet {
    pub const fn closed(options: &'static [ChoiceOption], fallback: ChoiceOption) -> Self {
        Self {
            options,
            open: false,
            fallback,
        }
    }

    pub const fn open(options: &'static [ChoiceOption], fallback: ChoiceOption) -> Self {
        Self {
            options,
            open: true,
            fallback,
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.options.iter().map(|o| o.label)
    }

    pub fn lookup(&self, label: &str) -> Option<&'static ChoiceOption> {
        self.options.iter().find(|o| o.label == label)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.lookup(label).is_some()
    }

    /// 取值对应的显示芯片，未声明的取值使用回退颜色
    pub fn chip(&self, label: &str) -> Chip {
        let option = self.lookup(label).copied().unwrap_or(self.fallback);
        Chip {
            label: label.to_string(),
            color: option.color,
            icon: option.icon,
        }
    }
}

/// 派生显示属性，渲染层据此绘制状态标签
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chip {
    pub label: String,
    pub color: &'static str,
    pub icon: Option<&'static str>,
}

/// 字段类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    PositiveInteger,
    NonNegativeNumber,
    /// `YYYY-MM-DD`
    Date,
    /// `HH:MM`
    Time,
    Choice(ChoiceSet),
}

impl FieldKind {
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::PositiveInteger | FieldKind::NonNegativeNumber)
    }
}

/// 新建记录时的字段默认值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    None,
    Value(&'static str),
    /// 草稿创建当天
    Today,
}

/// 单个字段的声明
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub default: FieldDefault,
}

impl FieldSpec {
    pub fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
            default: FieldDefault::None,
        }
    }

    pub fn text(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, default: FieldDefault) -> Self {
        self.default = default;
        self
    }

    /// 解析草稿中的原始输入
    ///
    /// 数值字段解析失败即视为无效，不会被当作零。
    pub fn parse(&self, raw: &str) -> std::result::Result<Value, String> {
        let input = raw.trim();
        match &self.kind {
            FieldKind::Text => Ok(Value::Text(input.to_string())),
            FieldKind::PositiveInteger => {
                let n: i64 = input
                    .parse()
                    .map_err(|_| format!("'{}' is not a whole number", input))?;
                if n <= 0 {
                    return Err("must be a positive whole number".to_string());
                }
                Ok(Value::Integer(n))
            }
            FieldKind::NonNegativeNumber => {
                let n: f64 = input
                    .parse()
                    .map_err(|_| format!("'{}' is not a number", input))?;
                if !n.is_finite() {
                    return Err(format!("'{}' is not a number", input));
                }
                if n < 0.0 {
                    return Err("must not be negative".to_string());
                }
                Ok(Value::Number(n))
            }
            FieldKind::Date => NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|_| format!("'{}' is not a date (YYYY-MM-DD)", input)),
            FieldKind::Time => NaiveTime::parse_from_str(input, "%H:%M")
                .map(Value::Time)
                .map_err(|_| format!("'{}' is not a time (HH:MM)", input)),
            FieldKind::Choice(set) => {
                if set.open || set.contains(input) {
                    Ok(Value::Choice(input.to_string()))
                } else {
                    let allowed: Vec<&str> = set.labels().collect();
                    Err(format!("'{}' is not one of: {}", input, allowed.join(", ")))
                }
            }
        }
    }
}

/// 派生属性种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedAttribute {
    Color,
    Icon,
}

/// 派生字段：由枚举字段的取值查表得到，不可单独编辑
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedField {
    pub name: &'static str,
    pub source: &'static str,
    pub attribute: DerivedAttribute,
}

/// 记录集合的模式
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// 集合名称，例如 `patients`
    pub name: &'static str,
    /// 单条记录的称呼，用于提示文字
    pub singular: &'static str,
    pub id_prefix: char,
    pub fields: Vec<FieldSpec>,
    pub search_fields: Vec<&'static str>,
    pub derived: Vec<DerivedField>,
}

impl Schema {
    pub fn new(name: &'static str, singular: &'static str, id_prefix: char) -> Self {
        Self {
            name,
            singular,
            id_prefix,
            fields: Vec::new(),
            search_fields: Vec::new(),
            derived: Vec::new(),
        }
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn searchable(mut self, fields: &[&'static str]) -> Self {
        self.search_fields.extend_from_slice(fields);
        self
    }

    /// 为枚举字段声明颜色和图标两个派生字段
    pub fn derive_display(mut self, source: &'static str, color: &'static str, icon: &'static str) -> Self {
        self.derived.push(DerivedField {
            name: color,
            source,
            attribute: DerivedAttribute::Color,
        });
        self.derived.push(DerivedField {
            name: icon,
            source,
            attribute: DerivedAttribute::Icon,
        });
        self
    }

    pub fn spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }

    pub fn choice_set(&self, field: &str) -> Option<&ChoiceSet> {
        match self.spec(field).map(|f| &f.kind) {
            Some(FieldKind::Choice(set)) => Some(set),
            _ => None,
        }
    }

    pub fn derived_field(&self, name: &str) -> Option<&DerivedField> {
        self.derived.iter().find(|d| d.name == name)
    }

    pub fn is_derived(&self, name: &str) -> bool {
        self.derived_field(name).is_some()
    }

    /// 显示芯片所用的枚举字段（第一个声明了派生属性的字段）
    pub fn chip_field(&self) -> Option<&'static str> {
        self.derived.first().map(|d| d.source)
    }

    /// 按源字段取值计算派生属性
    pub fn derive(&self, name: &str, source_value: Option<&str>) -> Option<String> {
        let derived = self.derived_field(name)?;
        let set = self.choice_set(derived.source)?;
        let chip = set.chip(source_value?);
        match derived.attribute {
            DerivedAttribute::Color => Some(chip.color.to_string()),
            DerivedAttribute::Icon => chip.icon.map(str::to_string),
        }
    }

    /// 读取记录的派生属性
    pub fn derived_value(&self, record: &Record, name: &str) -> Option<String> {
        let derived = self.derived_field(name)?;
        self.derive(name, record.str_field(derived.source))
    }

    /// 记录在枚举字段上的显示芯片
    pub fn chip(&self, record: &Record, field: &str) -> Option<Chip> {
        let set = self.choice_set(field)?;
        record.str_field(field).map(|label| set.chip(label))
    }

    /// 新建用的空白记录：只填入 schema 声明的默认值
    pub fn blank_record(&self, id: RecordId, today: NaiveDate) -> Record {
        let mut record = Record::new(id);
        for spec in &self.fields {
            let raw = match spec.default {
                FieldDefault::None => continue,
                FieldDefault::Value(v) => v.to_string(),
                FieldDefault::Today => today.format("%Y-%m-%d").to_string(),
            };
            if is_blank(&raw) {
                continue;
            }
            if let Ok(value) = spec.parse(&raw) {
                record.set(spec.name, value);
            }
        }
        record
    }
}
