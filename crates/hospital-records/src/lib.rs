//! # 记录管理模块
//!
//! 患者、预约、账单三个集合共用的通用记录引擎，包括：
//! - 记录模式：字段类型、必填约束、默认值和派生显示属性
//! - 记录仓库：按插入顺序保存记录的不可变快照
//! - 搜索与汇总：不区分大小写的子串搜索，按枚举字段分组求和
//! - 编辑会话：草稿、校验、提交，以及删除前的确认

pub mod aggregate;
pub mod confirm;
pub mod entities;
pub mod query;
pub mod repository;
pub mod schema;
pub mod session;
pub mod state_machine;
pub mod store;

// 重新导出主要类型
pub use aggregate::{count_by, summarize, GroupSummary, Summary};
pub use confirm::{confirm_delete, ConfirmPrompt, Confirmation, DeleteRequest};
pub use entities::{
    Activity, Appointment, AppointmentStatus, Bill, BillStatus, Collection, Patient,
};
pub use query::search;
pub use repository::{IdStrategy, Repository, Snapshot};
pub use schema::{Chip, ChoiceOption, ChoiceSet, FieldDefault, FieldKind, FieldSpec, Schema};
pub use session::{CommitOutcome, EditMode, EditSession};
pub use state_machine::{SessionEvent, SessionState, SessionStateMachine};
pub use store::{EntityStore, Intent, Reaction, Row};
