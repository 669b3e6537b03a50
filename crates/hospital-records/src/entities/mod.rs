//! 三个记录集合的模式、类型化实体与初始数据

pub mod appointment;
pub mod billing;
pub mod patient;

use chrono::{NaiveDate, NaiveTime};
use hospital_core::{HospitalError, Record, Result};
use serde::{Deserialize, Serialize};

use crate::schema::{ChoiceOption, Schema};

pub use appointment::{Activity, Appointment, AppointmentStatus};
pub use billing::{Bill, BillStatus};
pub use patient::Patient;

/// 未声明取值的中性显示
pub(crate) const NEUTRAL: ChoiceOption = ChoiceOption {
    label: "",
    color: "#757575",
    icon: None,
};

/// 记录集合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Patients,
    Appointments,
    Billings,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Patients, Collection::Appointments, Collection::Billings];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Patients => "patients",
            Collection::Appointments => "appointments",
            Collection::Billings => "billings",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name().eq_ignore_ascii_case(name))
    }

    pub fn schema(&self) -> Schema {
        match self {
            Collection::Patients => patient::schema(),
            Collection::Appointments => appointment::schema(),
            Collection::Billings => billing::schema(),
        }
    }

    /// 集合的初始数据
    pub fn fixtures(&self) -> Vec<Record> {
        match self {
            Collection::Patients => patient::fixtures().into_iter().map(Record::from).collect(),
            Collection::Appointments => appointment::fixtures().into_iter().map(Record::from).collect(),
            Collection::Billings => billing::fixtures().into_iter().map(Record::from).collect(),
        }
    }
}

fn missing(field: &str) -> HospitalError {
    HospitalError::Parse {
        field: field.to_string(),
        reason: "missing or wrong type".to_string(),
    }
}

pub(crate) fn text(record: &Record, field: &str) -> Result<String> {
    record.str_field(field).map(str::to_string).ok_or_else(|| missing(field))
}

pub(crate) fn optional_text(record: &Record, field: &str) -> Option<String> {
    record.str_field(field).map(str::to_string)
}

pub(crate) fn positive(record: &Record, field: &str) -> Result<u32> {
    record
        .get(field)
        .and_then(|v| v.as_integer())
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| missing(field))
}

pub(crate) fn number(record: &Record, field: &str) -> Result<f64> {
    record.get(field).and_then(|v| v.as_number()).ok_or_else(|| missing(field))
}

pub(crate) fn date(record: &Record, field: &str) -> Result<NaiveDate> {
    record.get(field).and_then(|v| v.as_date()).ok_or_else(|| missing(field))
}

pub(crate) fn time(record: &Record, field: &str) -> Result<NaiveTime> {
    record.get(field).and_then(|v| v.as_time()).ok_or_else(|| missing(field))
}

pub(crate) fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

pub(crate) fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}
