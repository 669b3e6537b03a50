//! 实体仓储端到端测试

use chrono::NaiveDate;
use hospital_core::RecordId;
use hospital_records::{
    Collection, CommitOutcome, Confirmation, DeleteRequest, EntityStore, IdStrategy, Patient,
    SessionState,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
}

fn patients() -> EntityStore {
    EntityStore::for_collection(Collection::Patients, IdStrategy::Sequential).unwrap()
}

fn yes(_: &DeleteRequest) -> Confirmation {
    Confirmation::Confirmed
}

fn fill_patient(store: &mut EntityStore) {
    for (field, value) in [
        ("name", "Alex Lee"),
        ("age", "40"),
        ("gender", "Male"),
        ("contact", "(555) 999-0000"),
        ("blood_group", "O-"),
        ("doctor", "Dr. Smith"),
        ("diagnosis", "Migraine"),
        ("address", "1 Harbor Rd, City"),
    ] {
        store.on_set_field(field, value).unwrap();
    }
}

#[test]
fn test_add_patient_then_mark_critical() {
    let mut store = patients();

    let session = store.on_add(today()).unwrap();
    assert_eq!(session.id().as_str(), "P005");
    assert_eq!(session.value("status"), Some("New"));
    assert_eq!(session.value("admission_date"), Some("2024-02-01"));

    fill_patient(&mut store);
    let outcome = store.on_save().unwrap();
    assert_eq!(outcome, CommitOutcome::Committed(RecordId::new("P005")));
    assert_eq!(store.state(), SessionState::Idle);

    let rows = store.rows();
    assert_eq!(rows.len(), 5);
    let added = &rows[4];
    assert_eq!(added.record.str_field("name"), Some("Alex Lee"));
    assert_eq!(added.chip.as_ref().unwrap().color, "#1976d2");

    // 修改状态后派生颜色在同一步更新
    store.on_edit(&RecordId::new("P005")).unwrap();
    let session = store.on_set_field("status", "Critical").unwrap();
    assert_eq!(session.derived("status_color").as_deref(), Some("#f44336"));
    store.on_save().unwrap();

    let stored = store.repository().get(&RecordId::new("P005")).unwrap();
    assert_eq!(
        store.schema().derived_value(stored, "status_color").as_deref(),
        Some("#f44336")
    );
    let patient = Patient::try_from(stored).unwrap();
    assert_eq!(patient.age, 40);
    assert_eq!(patient.status, "Critical");
}

#[test]
fn test_search_by_name_id_and_diagnosis() {
    let mut store = patients();

    store.on_search("john");
    let ids: Vec<String> = store.rows().iter().map(|r| r.record.id.to_string()).collect();
    assert_eq!(ids, vec!["P001", "P003"]);

    store.on_search("p004");
    assert_eq!(store.rows().len(), 1);

    store.on_search("FRACTURE");
    assert_eq!(store.rows()[0].record.id.as_str(), "P003");

    // 医生不在搜索字段内
    store.on_search("Dr. Brown");
    assert!(store.rows().is_empty());
}

#[test]
fn test_appointment_search_fields() {
    let mut store = EntityStore::for_collection(Collection::Appointments, IdStrategy::Sequential).unwrap();

    store.on_search("dr. johnson");
    let rows = store.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].record.id.as_str(), "A002");
    assert_eq!(rows[0].chip.as_ref().unwrap().color, "#4caf50");

    store.on_search("P003");
    assert_eq!(store.rows()[0].record.str_field("patient_name"), Some("Mike Wilson"));
}

#[test]
fn test_sequential_collision_is_refused() {
    let mut store = patients();
    let mut prompt = yes;
    store.on_delete(&RecordId::new("P002"), &mut prompt).unwrap();

    // count + 1 = 4，与仍然存在的 P004 重号
    store.on_add(today()).unwrap();
    fill_patient(&mut store);
    let result = store.on_save();

    assert!(result.is_err());
    assert_eq!(store.repository().len(), 3);
    assert_eq!(store.state(), SessionState::Drafting);
    store.on_cancel().unwrap();
}

#[test]
fn test_monotonic_ids_after_delete() {
    let mut store = EntityStore::for_collection(Collection::Patients, IdStrategy::Monotonic).unwrap();
    let mut prompt = yes;
    store.on_delete(&RecordId::new("P002"), &mut prompt).unwrap();

    let session = store.on_add(today()).unwrap();
    assert_eq!(session.id().as_str(), "P005");
    fill_patient(&mut store);
    assert!(matches!(store.on_save().unwrap(), CommitOutcome::Committed(_)));
    assert_eq!(store.repository().len(), 4);
}

#[test]
fn test_billing_summary_includes_empty_overdue() {
    let store = EntityStore::for_collection(Collection::Billings, IdStrategy::Sequential).unwrap();
    let summary = store.summarize("status", "amount").unwrap();

    let paid = summary.get("Paid").unwrap();
    assert_eq!((paid.count, paid.total), (1, 150.0));
    let pending = summary.get("Pending").unwrap();
    assert_eq!((pending.count, pending.total), (1, 300.0));
    let overdue = summary.get("Overdue").unwrap();
    assert_eq!((overdue.count, overdue.total), (0, 0.0));
    assert_eq!(overdue.chip.icon, Some("warning"));
}

#[test]
fn test_cancelled_delete_keeps_record() {
    let mut store = patients();
    let version = store.snapshot().version();
    let mut messages = Vec::new();
    let mut prompt = |request: &DeleteRequest| {
        messages.push(request.message());
        Confirmation::Cancelled
    };

    let answer = store.on_delete(&RecordId::new("P003"), &mut prompt).unwrap();
    assert_eq!(answer, Confirmation::Cancelled);
    assert_eq!(store.snapshot().version(), version);
    assert_eq!(messages, vec!["Are you sure you want to delete patient P003?"]);
}
