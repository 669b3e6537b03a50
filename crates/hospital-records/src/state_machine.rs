//! 编辑会话状态机
//!
//! 管理新建/编辑对话框的生命周期：空闲、起草中、提交中

use hospital_core::{HospitalError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 会话状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,       // 空闲
    Drafting,   // 起草中
    Committing, // 提交中
}

/// 会话事件
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    Start,
    Discard,
    Commit,
    CommitSucceeded,
    CommitFailed,
}

impl SessionEvent {
    pub const ALL: [SessionEvent; 5] = [
        SessionEvent::Start,
        SessionEvent::Discard,
        SessionEvent::Commit,
        SessionEvent::CommitSucceeded,
        SessionEvent::CommitFailed,
    ];
}

/// 编辑会话状态机
#[derive(Debug)]
pub struct SessionStateMachine {
    transitions: HashMap<(SessionState, SessionEvent), SessionState>,
}

impl SessionStateMachine {
    /// 创建新的状态机实例
    pub fn new() -> Self {
        let mut transitions = HashMap::new();

        transitions.insert((SessionState::Idle, SessionEvent::Start), SessionState::Drafting);
        transitions.insert((SessionState::Drafting, SessionEvent::Discard), SessionState::Idle);
        transitions.insert((SessionState::Drafting, SessionEvent::Commit), SessionState::Committing);
        transitions.insert((SessionState::Committing, SessionEvent::CommitSucceeded), SessionState::Idle);
        // 提交失败回到起草状态，草稿带上错误信息
        transitions.insert((SessionState::Committing, SessionEvent::CommitFailed), SessionState::Drafting);

        Self { transitions }
    }

    /// 检查状态转换是否有效
    pub fn can_transition(&self, from: SessionState, event: SessionEvent) -> bool {
        self.transitions.contains_key(&(from, event))
    }

    /// 执行状态转换
    pub fn transition(&self, from: SessionState, event: SessionEvent) -> Result<SessionState> {
        match self.transitions.get(&(from, event)) {
            Some(to) => Ok(*to),
            None => Err(HospitalError::InvalidStateTransition {
                from: format!("{:?}", from),
                event: format!("{:?}", event),
            }),
        }
    }
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
