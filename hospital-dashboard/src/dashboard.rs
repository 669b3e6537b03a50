//! 仪表盘总览

use chrono::{DateTime, Local};
use hospital_core::Result;
use hospital_records::{BillStatus, EntityStore, Summary};
use serde::Serialize;

/// 仪表盘页的统计数据
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub patients: usize,
    pub appointments: usize,
    pub bills: usize,
    pub patients_by_status: Summary,
    pub appointments_by_status: Summary,
    /// 未结清账单金额
    pub outstanding: f64,
    /// 已收款金额
    pub collected: f64,
    pub now: Option<DateTime<Local>>,
}

impl Overview {
    pub fn collect(
        patients: &EntityStore,
        appointments: &EntityStore,
        billings: &EntityStore,
        now: Option<DateTime<Local>>,
    ) -> Result<Self> {
        let billing = billings.summarize("status", "amount")?;
        let (collected, outstanding) = billing.groups.iter().fold((0.0, 0.0), |(paid, open), group| {
            match BillStatus::from_label(&group.value) {
                Some(status) if status.is_outstanding() => (paid, open + group.total),
                Some(_) => (paid + group.total, open),
                None => (paid, open),
            }
        });

        Ok(Self {
            patients: patients.repository().len(),
            appointments: appointments.repository().len(),
            bills: billings.repository().len(),
            patients_by_status: patients.count_by("status")?,
            appointments_by_status: appointments.count_by("status")?,
            outstanding,
            collected,
            now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hospital_records::{Collection, IdStrategy};

    fn store(collection: Collection) -> EntityStore {
        EntityStore::for_collection(collection, IdStrategy::Sequential).unwrap()
    }

    #[test]
    fn test_overview_from_fixtures() {
        let overview = Overview::collect(
            &store(Collection::Patients),
            &store(Collection::Appointments),
            &store(Collection::Billings),
            None,
        )
        .unwrap();

        assert_eq!((overview.patients, overview.appointments, overview.bills), (4, 3, 2));
        assert_eq!(overview.outstanding, 300.0);
        assert_eq!(overview.collected, 150.0);

        let critical = overview.patients_by_status.get("Critical").unwrap();
        assert_eq!(critical.count, 1);
        assert_eq!(critical.chip.color, "#f44336");
        assert_eq!(overview.patients_by_status.get("New").unwrap().count, 0);
        assert_eq!(overview.appointments_by_status.get("Scheduled").unwrap().count, 2);
        assert_eq!(overview.appointments_by_status.get("No Show").unwrap().count, 0);
    }
}
