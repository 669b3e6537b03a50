//! 预约

use chrono::{NaiveDate, NaiveTime};
use hospital_core::{HospitalError, Record, RecordId, Value};
use serde::{Deserialize, Serialize};

use super::{date, hm, optional_text, positive, text, time, ymd, NEUTRAL};
use crate::schema::{ChoiceOption, ChoiceSet, FieldDefault, FieldKind, FieldSpec, Schema};

/// 预约状态显示表，顺序与 [`AppointmentStatus`] 一致
pub const APPOINTMENT_STATUS_OPTIONS: &[ChoiceOption] = &[
    ChoiceOption { label: "Scheduled", color: "#2196f3", icon: Some("circle") },
    ChoiceOption { label: "Completed", color: "#4caf50", icon: Some("circle") },
    ChoiceOption { label: "Cancelled", color: "#f44336", icon: Some("circle") },
    ChoiceOption { label: "No Show", color: "#ff9800", icon: Some("circle") },
];

pub const APPOINTMENT_STATUSES: ChoiceSet = ChoiceSet::closed(APPOINTMENT_STATUS_OPTIONS, NEUTRAL);

/// 就诊项目，顺序与 [`Activity`] 一致
pub const ACTIVITY_OPTIONS: &[ChoiceOption] = &[
    ChoiceOption { label: "Regular Checkup", ..NEUTRAL },
    ChoiceOption { label: "Consultation", ..NEUTRAL },
    ChoiceOption { label: "Follow-up", ..NEUTRAL },
    ChoiceOption { label: "Surgery", ..NEUTRAL },
    ChoiceOption { label: "Laboratory Test", ..NEUTRAL },
    ChoiceOption { label: "X-Ray/Imaging", ..NEUTRAL },
    ChoiceOption { label: "Physical Therapy", ..NEUTRAL },
    ChoiceOption { label: "Vaccination", ..NEUTRAL },
];

pub const ACTIVITIES: ChoiceSet = ChoiceSet::closed(ACTIVITY_OPTIONS, NEUTRAL);

/// 预约状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::NoShow,
    ];

    pub fn option(&self) -> &'static ChoiceOption {
        &APPOINTMENT_STATUS_OPTIONS[*self as usize]
    }

    pub fn label(&self) -> &'static str {
        self.option().label
    }

    pub fn color(&self) -> &'static str {
        self.option().color
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }
}

/// 就诊项目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Activity {
    RegularCheckup,
    Consultation,
    FollowUp,
    Surgery,
    LaboratoryTest,
    XRayImaging,
    PhysicalTherapy,
    Vaccination,
}

impl Activity {
    pub const ALL: [Activity; 8] = [
        Activity::RegularCheckup,
        Activity::Consultation,
        Activity::FollowUp,
        Activity::Surgery,
        Activity::LaboratoryTest,
        Activity::XRayImaging,
        Activity::PhysicalTherapy,
        Activity::Vaccination,
    ];

    pub fn label(&self) -> &'static str {
        ACTIVITY_OPTIONS[*self as usize].label
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.label() == label)
    }
}

pub fn schema() -> Schema {
    Schema::new("appointments", "appointment", 'A')
        .field(FieldSpec::text("patient_name", "Patient Name").required())
        .field(FieldSpec::text("patient_id", "Patient ID").required())
        .field(FieldSpec::new("age", "Age", FieldKind::PositiveInteger).required())
        .field(FieldSpec::text("contact", "Contact").required())
        .field(FieldSpec::new("activity", "Activity", FieldKind::Choice(ACTIVITIES)).required())
        .field(FieldSpec::text("doctor", "Doctor").required())
        .field(FieldSpec::new("date", "Date", FieldKind::Date).required())
        .field(FieldSpec::new("time", "Time", FieldKind::Time).required())
        .field(
            FieldSpec::new("status", "Status", FieldKind::Choice(APPOINTMENT_STATUSES))
                .required()
                .default_value(FieldDefault::Value("Scheduled")),
        )
        .field(FieldSpec::text("purpose", "Purpose").required())
        .field(FieldSpec::text("notes", "Notes"))
        .searchable(&["patient_name", "patient_id", "doctor"])
        .derive_display("status", "status_color", "status_icon")
}

/// 预约记录；患者ID按值引用，不做外键校验
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: RecordId,
    pub patient_name: String,
    pub patient_id: String,
    pub age: u32,
    pub contact: String,
    pub activity: Activity,
    pub doctor: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AppointmentStatus,
    pub purpose: String,
    pub notes: Option<String>,
}

impl From<Appointment> for Record {
    fn from(a: Appointment) -> Self {
        let record = Record::new(a.id)
            .with("patient_name", Value::Text(a.patient_name))
            .with("patient_id", Value::Text(a.patient_id))
            .with("age", Value::Integer(i64::from(a.age)))
            .with("contact", Value::Text(a.contact))
            .with("activity", Value::Choice(a.activity.label().to_string()))
            .with("doctor", Value::Text(a.doctor))
            .with("date", Value::Date(a.date))
            .with("time", Value::Time(a.time))
            .with("status", Value::Choice(a.status.label().to_string()))
            .with("purpose", Value::Text(a.purpose));
        match a.notes {
            Some(notes) => record.with("notes", Value::Text(notes)),
            None => record,
        }
    }
}

impl TryFrom<&Record> for Appointment {
    type Error = HospitalError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        let activity = text(record, "activity")?;
        let status = text(record, "status")?;
        Ok(Self {
            id: record.id.clone(),
            patient_name: text(record, "patient_name")?,
            patient_id: text(record, "patient_id")?,
            age: positive(record, "age")?,
            contact: text(record, "contact")?,
            activity: Activity::from_label(&activity).ok_or_else(|| HospitalError::Parse {
                field: "activity".to_string(),
                reason: format!("unknown activity '{}'", activity),
            })?,
            doctor: text(record, "doctor")?,
            date: date(record, "date")?,
            time: time(record, "time")?,
            status: AppointmentStatus::from_label(&status).ok_or_else(|| HospitalError::Parse {
                field: "status".to_string(),
                reason: format!("unknown status '{}'", status),
            })?,
            purpose: text(record, "purpose")?,
            notes: optional_text(record, "notes"),
        })
    }
}

/// 预约初始数据
pub fn fixtures() -> Vec<Appointment> {
    vec![
        Appointment {
            id: RecordId::new("A001"),
            patient_name: "John Doe".to_string(),
            patient_id: "P001".to_string(),
            age: 45,
            contact: "(555) 123-4567".to_string(),
            activity: Activity::RegularCheckup,
            doctor: "Dr. Smith".to_string(),
            date: ymd(2024, 1, 20),
            time: hm(9, 0),
            status: AppointmentStatus::Scheduled,
            purpose: "Follow-up".to_string(),
            notes: Some("Regular checkup for hypertension".to_string()),
        },
        Appointment {
            id: RecordId::new("A002"),
            patient_name: "Jane Smith".to_string(),
            patient_id: "P002".to_string(),
            age: 32,
            contact: "(555) 234-5678".to_string(),
            activity: Activity::Consultation,
            doctor: "Dr. Johnson".to_string(),
            date: ymd(2024, 1, 21),
            time: hm(10, 30),
            status: AppointmentStatus::Completed,
            purpose: "Consultation".to_string(),
            notes: Some("Diabetes monitoring".to_string()),
        },
        Appointment {
            id: RecordId::new("A003"),
            patient_name: "Mike Wilson".to_string(),
            patient_id: "P003".to_string(),
            age: 28,
            contact: "(555) 345-6789".to_string(),
            activity: Activity::LaboratoryTest,
            doctor: "Dr. Brown".to_string(),
            date: ymd(2024, 1, 22),
            time: hm(14, 0),
            status: AppointmentStatus::Scheduled,
            purpose: "Blood Test".to_string(),
            notes: Some("Annual health checkup".to_string()),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_tables_line_up() {
        for status in AppointmentStatus::ALL {
            assert_eq!(AppointmentStatus::from_label(status.label()), Some(status));
        }
        for activity in Activity::ALL {
            assert_eq!(Activity::from_label(activity.label()), Some(activity));
        }
        assert_eq!(AppointmentStatus::NoShow.label(), "No Show");
        assert_eq!(AppointmentStatus::Cancelled.color(), "#f44336");
        assert_eq!(Activity::XRayImaging.label(), "X-Ray/Imaging");
    }

    #[test]
    fn test_record_conversion() {
        let original = fixtures().remove(0);
        let record = Record::from(original.clone());

        assert_eq!(record.text("time").as_deref(), Some("09:00"));
        assert_eq!(Appointment::try_from(&record).unwrap(), original);
    }

    #[test]
    fn test_notes_are_optional() {
        let schema = schema();
        assert!(!schema.spec("notes").unwrap().required);
        assert_eq!(schema.required_fields().count(), schema.fields.len() - 1);
    }

    #[test]
    fn test_activity_is_closed() {
        let schema = schema();
        assert!(schema.spec("activity").unwrap().parse("Dance Class").is_err());
        assert!(schema.spec("status").unwrap().parse("Postponed").is_err());
    }
}
