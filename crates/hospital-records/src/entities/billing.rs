//! 账单

use chrono::NaiveDate;
use hospital_core::{HospitalError, Record, RecordId, Value};
use serde::{Deserialize, Serialize};

use super::{date, number, text, ymd, NEUTRAL};
use crate::schema::{ChoiceOption, ChoiceSet, FieldDefault, FieldKind, FieldSpec, Schema};

/// 账单状态显示表，顺序与 [`BillStatus`] 一致
pub const BILL_STATUS_OPTIONS: &[ChoiceOption] = &[
    ChoiceOption { label: "Paid", color: "#4caf50", icon: Some("check_circle") },
    ChoiceOption { label: "Pending", color: "#ff9800", icon: Some("schedule") },
    ChoiceOption { label: "Overdue", color: "#f44336", icon: Some("warning") },
];

pub const BILL_STATUSES: ChoiceSet = ChoiceSet::closed(BILL_STATUS_OPTIONS, NEUTRAL);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BillStatus {
    Paid,
    Pending,
    Overdue,
}

impl BillStatus {
    pub const ALL: [BillStatus; 3] = [BillStatus::Paid, BillStatus::Pending, BillStatus::Overdue];

    pub fn option(&self) -> &'static ChoiceOption {
        &BILL_STATUS_OPTIONS[*self as usize]
    }

    pub fn label(&self) -> &'static str {
        self.option().label
    }

    pub fn color(&self) -> &'static str {
        self.option().color
    }

    pub fn icon(&self) -> Option<&'static str> {
        self.option().icon
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }

    /// 未结清的账单
    pub fn is_outstanding(&self) -> bool {
        !matches!(self, BillStatus::Paid)
    }
}

pub fn schema() -> Schema {
    Schema::new("billings", "bill", 'B')
        .field(FieldSpec::text("patient_name", "Patient Name").required())
        .field(FieldSpec::new("date", "Date", FieldKind::Date).required())
        .field(FieldSpec::text("service", "Service").required())
        .field(FieldSpec::new("amount", "Amount", FieldKind::NonNegativeNumber).required())
        .field(
            FieldSpec::new("status", "Status", FieldKind::Choice(BILL_STATUSES))
                .required()
                .default_value(FieldDefault::Value("Pending")),
        )
        .searchable(&["patient_name", "id", "service"])
        .derive_display("status", "status_color", "status_icon")
}

/// 账单记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: RecordId,
    pub patient_name: String,
    pub date: NaiveDate,
    pub service: String,
    pub amount: f64,
    pub status: BillStatus,
}

impl From<Bill> for Record {
    fn from(b: Bill) -> Self {
        Record::new(b.id)
            .with("patient_name", Value::Text(b.patient_name))
            .with("date", Value::Date(b.date))
            .with("service", Value::Text(b.service))
            .with("amount", Value::Number(b.amount))
            .with("status", Value::Choice(b.status.label().to_string()))
    }
}

impl TryFrom<&Record> for Bill {
    type Error = HospitalError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        let status = text(record, "status")?;
        Ok(Self {
            id: record.id.clone(),
            patient_name: text(record, "patient_name")?,
            date: date(record, "date")?,
            service: text(record, "service")?,
            amount: number(record, "amount")?,
            status: BillStatus::from_label(&status).ok_or_else(|| HospitalError::Parse {
                field: "status".to_string(),
                reason: format!("unknown status '{}'", status),
            })?,
        })
    }
}

/// 账单初始数据
pub fn fixtures() -> Vec<Bill> {
    vec![
        Bill {
            id: RecordId::new("B001"),
            patient_name: "John Smith".to_string(),
            date: ymd(2024, 1, 15),
            service: "Consultation".to_string(),
            amount: 150.0,
            status: BillStatus::Paid,
        },
        Bill {
            id: RecordId::new("B002"),
            patient_name: "Sarah Johnson".to_string(),
            date: ymd(2024, 1, 16),
            service: "Laboratory Tests".to_string(),
            amount: 300.0,
            status: BillStatus::Pending,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_table() {
        assert_eq!(BillStatus::Paid.icon(), Some("check_circle"));
        assert_eq!(BillStatus::Pending.color(), "#ff9800");
        assert_eq!(BillStatus::Overdue.icon(), Some("warning"));
        assert_eq!(BillStatus::from_label("Refunded"), None);
        assert!(BillStatus::Overdue.is_outstanding());
        assert!(!BillStatus::Paid.is_outstanding());
    }

    #[test]
    fn test_record_conversion() {
        let original = fixtures().remove(1);
        let record = Record::from(original.clone());

        assert_eq!(record.get("amount"), Some(&Value::Number(300.0)));
        assert_eq!(Bill::try_from(&record).unwrap(), original);
    }

    #[test]
    fn test_derived_icon_follows_status() {
        let schema = schema();
        let record = Record::from(fixtures().remove(0));
        assert_eq!(schema.derived_value(&record, "status_icon").as_deref(), Some("check_circle"));
        assert_eq!(schema.derived_value(&record, "status_color").as_deref(), Some("#4caf50"));
    }

    #[test]
    fn test_amount_must_be_non_negative() {
        let schema = schema();
        let amount = schema.spec("amount").unwrap();
        assert!(amount.parse("-5").is_err());
        assert!(amount.parse("0").is_ok());
    }
}
