//! 患者

use chrono::NaiveDate;
use hospital_core::{HospitalError, Record, RecordId, Value};
use serde::{Deserialize, Serialize};

use super::{date, positive, text, ymd, NEUTRAL};
use crate::schema::{ChoiceOption, ChoiceSet, FieldDefault, FieldKind, FieldSpec, Schema};

/// 已知的患者状态及显示颜色；状态是开放集合，其他取值使用中性颜色
pub const PATIENT_STATUS_OPTIONS: &[ChoiceOption] = &[
    ChoiceOption { label: "New", color: "#1976d2", icon: Some("circle") },
    ChoiceOption { label: "Stable", color: "#4caf50", icon: Some("circle") },
    ChoiceOption { label: "Critical", color: "#f44336", icon: Some("circle") },
    ChoiceOption { label: "Recovering", color: "#2196f3", icon: Some("circle") },
    ChoiceOption { label: "Under Observation", color: "#ff9800", icon: Some("circle") },
];

pub const PATIENT_STATUSES: ChoiceSet = ChoiceSet::open(
    PATIENT_STATUS_OPTIONS,
    ChoiceOption { icon: Some("circle"), ..NEUTRAL },
);

pub fn schema() -> Schema {
    Schema::new("patients", "patient", 'P')
        .field(FieldSpec::text("name", "Name").required())
        .field(FieldSpec::new("age", "Age", FieldKind::PositiveInteger).required())
        .field(FieldSpec::text("gender", "Gender").required())
        .field(FieldSpec::text("contact", "Contact").required())
        .field(FieldSpec::text("blood_group", "Blood Group").required())
        .field(
            FieldSpec::new("status", "Status", FieldKind::Choice(PATIENT_STATUSES))
                .required()
                .default_value(FieldDefault::Value("New")),
        )
        .field(FieldSpec::text("doctor", "Doctor").required())
        .field(FieldSpec::text("diagnosis", "Diagnosis").required())
        .field(FieldSpec::text("address", "Address").required())
        .field(
            FieldSpec::new("admission_date", "Admission Date", FieldKind::Date)
                .required()
                .default_value(FieldDefault::Today),
        )
        .searchable(&["name", "id", "diagnosis"])
        .derive_display("status", "status_color", "status_icon")
}

/// 患者记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: RecordId,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub contact: String,
    pub diagnosis: String,
    pub status: String,
    pub doctor: String,
    pub address: String,
    pub blood_group: String,
    pub admission_date: NaiveDate,
}

impl Patient {
    pub fn status_color(&self) -> &'static str {
        PATIENT_STATUSES.chip(&self.status).color
    }
}

impl From<Patient> for Record {
    fn from(p: Patient) -> Self {
        Record::new(p.id)
            .with("name", Value::Text(p.name))
            .with("age", Value::Integer(i64::from(p.age)))
            .with("gender", Value::Text(p.gender))
            .with("contact", Value::Text(p.contact))
            .with("diagnosis", Value::Text(p.diagnosis))
            .with("status", Value::Choice(p.status))
            .with("doctor", Value::Text(p.doctor))
            .with("address", Value::Text(p.address))
            .with("blood_group", Value::Text(p.blood_group))
            .with("admission_date", Value::Date(p.admission_date))
    }
}

impl TryFrom<&Record> for Patient {
    type Error = HospitalError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record.id.clone(),
            name: text(record, "name")?,
            age: positive(record, "age")?,
            gender: text(record, "gender")?,
            contact: text(record, "contact")?,
            diagnosis: text(record, "diagnosis")?,
            status: text(record, "status")?,
            doctor: text(record, "doctor")?,
            address: text(record, "address")?,
            blood_group: text(record, "blood_group")?,
            admission_date: date(record, "admission_date")?,
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn patient(
    id: &str,
    name: &str,
    age: u32,
    gender: &str,
    contact: &str,
    diagnosis: &str,
    status: &str,
    doctor: &str,
    address: &str,
    blood_group: &str,
    admission_date: NaiveDate,
) -> Patient {
    Patient {
        id: RecordId::new(id),
        name: name.to_string(),
        age,
        gender: gender.to_string(),
        contact: contact.to_string(),
        diagnosis: diagnosis.to_string(),
        status: status.to_string(),
        doctor: doctor.to_string(),
        address: address.to_string(),
        blood_group: blood_group.to_string(),
        admission_date,
    }
}

/// 患者初始数据
pub fn fixtures() -> Vec<Patient> {
    vec![
        patient(
            "P001", "John Doe", 45, "Male", "(555) 123-4567", "Hypertension", "Stable",
            "Dr. Smith", "123 Main St, City", "A+", ymd(2024, 1, 15),
        ),
        patient(
            "P002", "Jane Smith", 32, "Female", "(555) 234-5678", "Diabetes Type 2", "Critical",
            "Dr. Johnson", "456 Oak St, City", "B-", ymd(2024, 1, 10),
        ),
        patient(
            "P003", "Mike Johnson", 28, "Male", "(555) 345-6789", "Fracture", "Recovering",
            "Dr. Williams", "789 Pine St, City", "O+", ymd(2024, 1, 12),
        ),
        patient(
            "P004", "Sarah Williams", 52, "Female", "(555) 456-7890", "Pneumonia",
            "Under Observation", "Dr. Brown", "321 Elm St, City", "AB+", ymd(2024, 1, 14),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_conversion() {
        let original = fixtures().remove(1);
        let record = Record::from(original.clone());

        assert_eq!(record.str_field("status"), Some("Critical"));
        assert_eq!(Patient::try_from(&record).unwrap(), original);
        assert_eq!(original.status_color(), "#f44336");
    }

    #[test]
    fn test_open_status_accepts_unknown_labels() {
        let schema = schema();
        let status = schema.spec("status").unwrap();
        assert!(status.parse("Discharged").is_ok());
        assert_eq!(schema.derive("status_color", Some("Discharged")).as_deref(), Some("#757575"));
        assert_eq!(schema.derive("status_color", Some("Stable")).as_deref(), Some("#4caf50"));
    }

    #[test]
    fn test_all_fields_required() {
        let schema = schema();
        assert_eq!(schema.required_fields().count(), schema.fields.len());
    }

    #[test]
    fn test_incomplete_record_fails_conversion() {
        let record = Record::new(RecordId::new("P009")).with("name", Value::Text("A".to_string()));
        assert!(matches!(Patient::try_from(&record), Err(HospitalError::Parse { .. })));
    }
}
