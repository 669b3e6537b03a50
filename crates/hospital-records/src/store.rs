//! 记录集合的实体仓储
//!
//! 组合 schema、仓库、搜索词和编辑会话，把展示层的操作意图
//! 转换为对仓库的修改。每个集合各有一个实体仓储，互不依赖。

use chrono::NaiveDate;
use hospital_core::{HospitalError, Record, RecordId, Result};
use serde::Serialize;
use std::sync::Arc;

use crate::aggregate::{self, Summary};
use crate::confirm::{confirm_delete, ConfirmPrompt, Confirmation};
use crate::entities::Collection;
use crate::query;
use crate::repository::{IdStrategy, Repository, Snapshot};
use crate::schema::{Chip, Schema};
use crate::session::{CommitOutcome, EditSession};
use crate::state_machine::{SessionEvent, SessionState, SessionStateMachine};

/// 列表中的一行：记录及其状态芯片
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub record: Record,
    pub chip: Option<Chip>,
}

/// 展示层发出的操作意图
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Search(String),
    Add { today: NaiveDate },
    Edit(RecordId),
    SetField { field: String, value: String },
    Save,
    Cancel,
    Delete(RecordId),
}

/// 意图处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum Reaction {
    /// 视图需要重新渲染，仓库未变
    Refreshed,
    Saved(CommitOutcome),
    Deleted(Confirmation),
}

/// 单个集合的实体仓储
#[derive(Debug)]
pub struct EntityStore {
    schema: Arc<Schema>,
    repository: Repository,
    search_term: String,
    session: Option<EditSession>,
    state_machine: SessionStateMachine,
    state: SessionState,
}

impl EntityStore {
    pub fn new(schema: Schema, strategy: IdStrategy) -> Self {
        Self {
            schema: Arc::new(schema),
            repository: Repository::new(strategy),
            search_term: String::new(),
            session: None,
            state_machine: SessionStateMachine::new(),
            state: SessionState::Idle,
        }
    }

    /// 以初始数据创建
    pub fn with_fixtures(schema: Schema, strategy: IdStrategy, records: Vec<Record>) -> Result<Self> {
        let mut store = Self::new(schema, strategy);
        store.repository = Repository::with_records(strategy, records)?;
        tracing::debug!(
            "Seeded {} with {} records",
            store.schema.name,
            store.repository.len()
        );
        Ok(store)
    }

    /// 某个集合的实体仓储，带初始数据
    pub fn for_collection(collection: Collection, strategy: IdStrategy) -> Result<Self> {
        Self::with_fixtures(collection.schema(), strategy, collection.fixtures())
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn snapshot(&self) -> Snapshot {
        self.repository.snapshot()
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// 当前状态下允许的会话事件，按声明顺序排列
    pub fn available_events(&self) -> Vec<SessionEvent> {
        SessionEvent::ALL
            .into_iter()
            .filter(|event| self.state_machine.can_transition(self.state, *event))
            .collect()
    }

    /// 当前搜索词过滤后的记录
    pub fn rows(&self) -> Vec<Row> {
        let fields = &self.schema.search_fields;
        let chip_field = self.schema.chip_field();
        query::search(self.repository.list(), &self.search_term, fields)
            .into_iter()
            .map(|record| Row {
                chip: chip_field.and_then(|field| self.schema.chip(record, field)),
                record: record.clone(),
            })
            .collect()
    }

    pub fn on_search(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        tracing::debug!("Search {} for '{}'", self.schema.name, self.search_term);
    }

    /// 打开新建对话框
    pub fn on_add(&mut self, today: NaiveDate) -> Result<&EditSession> {
        let next = self.state_machine.transition(self.state, SessionEvent::Start)?;
        let id = self.repository.next_id(self.schema.id_prefix);
        self.state = next;
        let session = EditSession::create(Arc::clone(&self.schema), id, today);
        Ok(&*self.session.insert(session))
    }

    /// 打开编辑对话框
    pub fn on_edit(&mut self, id: &RecordId) -> Result<&EditSession> {
        let next = self.state_machine.transition(self.state, SessionEvent::Start)?;
        let record = self
            .repository
            .get(id)
            .ok_or_else(|| HospitalError::NotFound(id.to_string()))?;
        let session = EditSession::edit(Arc::clone(&self.schema), record);
        self.state = next;
        Ok(&*self.session.insert(session))
    }

    pub fn on_set_field(&mut self, field: &str, value: impl Into<String>) -> Result<&EditSession> {
        let session = self.active_session()?;
        let updated = session.set_field(field, value)?;
        Ok(&*self.session.insert(updated))
    }

    /// 保存草稿
    ///
    /// 校验失败时会话保留并带上错误，状态回到起草中。
    pub fn on_save(&mut self) -> Result<CommitOutcome> {
        self.state = self.state_machine.transition(self.state, SessionEvent::Commit)?;
        let Some(session) = self.session.as_mut() else {
            return Err(HospitalError::Internal("committing without a draft".to_string()));
        };

        let mode = session.mode();
        let outcome = match session.commit(&mut self.repository) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.state = self.state_machine.transition(self.state, SessionEvent::CommitFailed)?;
                tracing::warn!("Save of {} {} failed: {}", self.schema.singular, session.id(), e);
                return Err(e);
            }
        };

        match &outcome {
            CommitOutcome::Committed(id) => {
                self.state = self.state_machine.transition(self.state, SessionEvent::CommitSucceeded)?;
                self.session = None;
                tracing::info!(
                    "{:?} {} {} ({} records)",
                    mode,
                    self.schema.singular,
                    id,
                    self.repository.len()
                );
            }
            CommitOutcome::Rejected(errors) => {
                self.state = self.state_machine.transition(self.state, SessionEvent::CommitFailed)?;
                tracing::warn!("Rejected {} {}: {}", self.schema.singular, session.id(), errors);
            }
        }
        Ok(outcome)
    }

    /// 关闭对话框，丢弃草稿
    pub fn on_cancel(&mut self) -> Result<()> {
        self.state = self.state_machine.transition(self.state, SessionEvent::Discard)?;
        if let Some(session) = self.session.take() {
            session.discard();
        }
        Ok(())
    }

    /// 确认后删除
    pub fn on_delete(&mut self, id: &RecordId, prompt: &mut dyn ConfirmPrompt) -> Result<Confirmation> {
        let answer = confirm_delete(&mut self.repository, self.schema.singular, id, prompt)?;
        match answer {
            Confirmation::Confirmed => tracing::info!(
                "Deleted {} {} ({} records)",
                self.schema.singular,
                id,
                self.repository.len()
            ),
            Confirmation::Cancelled => tracing::debug!("Delete of {} {} cancelled", self.schema.singular, id),
        }
        Ok(answer)
    }

    /// 按枚举字段汇总
    pub fn summarize(&self, group_field: &str, sum_field: &str) -> Result<Summary> {
        aggregate::summarize(self.repository.list(), &self.schema, group_field, sum_field)
    }

    pub fn count_by(&self, group_field: &str) -> Result<Summary> {
        aggregate::count_by(self.repository.list(), &self.schema, group_field)
    }

    /// 统一入口
    pub fn dispatch(&mut self, intent: Intent, prompt: &mut dyn ConfirmPrompt) -> Result<Reaction> {
        match intent {
            Intent::Search(term) => self.on_search(term),
            Intent::Add { today } => {
                self.on_add(today)?;
            }
            Intent::Edit(id) => {
                self.on_edit(&id)?;
            }
            Intent::SetField { field, value } => {
                self.on_set_field(&field, value)?;
            }
            Intent::Save => return self.on_save().map(Reaction::Saved),
            Intent::Cancel => self.on_cancel()?,
            Intent::Delete(id) => return self.on_delete(&id, prompt).map(Reaction::Deleted),
        }
        Ok(Reaction::Refreshed)
    }

    fn active_session(&self) -> Result<&EditSession> {
        match (&self.session, self.state) {
            (Some(session), SessionState::Drafting) => Ok(session),
            _ => Err(HospitalError::InvalidStateTransition {
                from: format!("{:?}", self.state),
                event: "SetField".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::DeleteRequest;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
    }

    fn billings() -> EntityStore {
        EntityStore::for_collection(Collection::Billings, IdStrategy::Sequential).unwrap()
    }

    fn no(_: &DeleteRequest) -> Confirmation {
        Confirmation::Cancelled
    }

    #[test]
    fn test_rows_carry_chips() {
        let store = billings();
        let rows = store.rows();
        assert_eq!(rows.len(), 2);
        let chip = rows[0].chip.as_ref().unwrap();
        assert_eq!(chip.label, "Paid");
        assert_eq!(chip.icon, Some("check_circle"));
    }

    #[test]
    fn test_rows_and_summary_serialize_to_json() {
        let store = billings();
        let rows = serde_json::to_value(store.rows()).unwrap();
        assert_eq!(rows[0]["record"]["id"], "B001");
        assert_eq!(rows[0]["chip"]["color"], "#4caf50");
        assert_eq!(rows[1]["chip"]["icon"], "schedule");
        // 派生颜色只在芯片里，不随记录持久化
        assert!(rows[0]["record"]["values"].get("status_color").is_none());

        let record: Record = serde_json::from_value(rows[1]["record"].clone()).unwrap();
        assert_eq!(&record, store.repository().get(&RecordId::new("B002")).unwrap());

        let summary = serde_json::to_value(store.summarize("status", "amount").unwrap()).unwrap();
        assert_eq!(summary["groups"][2]["value"], "Overdue");
        assert_eq!(summary["groups"][2]["count"], 0);
        assert_eq!(summary["groups"][0]["total"], 150.0);
    }

    #[test]
    fn test_available_events_follow_dialog() {
        let mut store = billings();
        assert_eq!(store.available_events(), vec![SessionEvent::Start]);

        store.on_add(today()).unwrap();
        assert_eq!(
            store.available_events(),
            vec![SessionEvent::Discard, SessionEvent::Commit]
        );

        store.on_cancel().unwrap();
        assert_eq!(store.available_events(), vec![SessionEvent::Start]);
    }

    #[test]
    fn test_search_filters_rows() {
        let mut store = billings();
        store.on_search("LABORATORY");
        let rows = store.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record.id.as_str(), "B002");

        store.on_search("   ");
        assert_eq!(store.rows().len(), 2);
    }

    #[test]
    fn test_one_dialog_at_a_time() {
        let mut store = billings();
        store.on_add(today()).unwrap();
        assert_eq!(store.state(), SessionState::Drafting);
        assert!(matches!(
            store.on_edit(&RecordId::new("B001")),
            Err(HospitalError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_rejected_save_keeps_draft() {
        let mut store = billings();
        store.on_add(today()).unwrap();
        let outcome = store.on_save().unwrap();

        assert!(matches!(outcome, CommitOutcome::Rejected(_)));
        assert_eq!(store.state(), SessionState::Drafting);
        assert!(store.session().unwrap().errors().is_some());
        assert_eq!(store.repository().len(), 2);
    }

    #[test]
    fn test_cancel_discards_draft() {
        let mut store = billings();
        store.on_edit(&RecordId::new("B002")).unwrap();
        store.on_set_field("status", "Paid").unwrap();
        store.on_cancel().unwrap();

        assert_eq!(store.state(), SessionState::Idle);
        assert!(store.session().is_none());
        assert_eq!(store.repository().list()[1].str_field("status"), Some("Pending"));
    }

    #[test]
    fn test_set_field_without_dialog_fails() {
        let mut store = billings();
        assert!(store.on_set_field("status", "Paid").is_err());
        assert!(store.on_save().is_err());
        assert!(store.on_cancel().is_err());
    }

    #[test]
    fn test_edit_unknown_record() {
        let mut store = billings();
        assert!(matches!(
            store.on_edit(&RecordId::new("B404")),
            Err(HospitalError::NotFound(_))
        ));
        assert_eq!(store.state(), SessionState::Idle);
    }

    #[test]
    fn test_dispatch_routes_intents() {
        let mut store = billings();
        let mut prompt = no;

        let reaction = store
            .dispatch(Intent::Add { today: today() }, &mut prompt)
            .unwrap();
        assert_eq!(reaction, Reaction::Refreshed);
        assert_eq!(store.session().unwrap().id().as_str(), "B003");

        for (field, value) in [
            ("patient_name", "Alex Lee"),
            ("date", "2024-02-01"),
            ("service", "X-Ray"),
            ("amount", "75"),
        ] {
            store
                .dispatch(
                    Intent::SetField {
                        field: field.to_string(),
                        value: value.to_string(),
                    },
                    &mut prompt,
                )
                .unwrap();
        }

        let saved = store.dispatch(Intent::Save, &mut prompt).unwrap();
        assert_eq!(saved, Reaction::Saved(CommitOutcome::Committed(RecordId::new("B003"))));

        let deleted = store
            .dispatch(Intent::Delete(RecordId::new("B003")), &mut prompt)
            .unwrap();
        assert_eq!(deleted, Reaction::Deleted(Confirmation::Cancelled));
        assert_eq!(store.repository().len(), 3);

        let summary = store.summarize("status", "amount").unwrap();
        assert_eq!(summary.get("Pending").unwrap().total, 375.0);
    }
}
