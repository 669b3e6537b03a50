//! 内存记录仓库
//!
//! 按插入顺序保存一个集合的记录。每次修改都会生成新的不可变快照，
//! 观察者可以通过版本号或指针比较快速判断是否变化。

use hospital_core::{HospitalError, Record, RecordId, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 记录ID分配策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// 前缀 + (当前记录数 + 1)，删除后可能与现存记录重号
    #[default]
    Sequential,
    /// 前缀 + (历史最大序号 + 1)，从不复用
    Monotonic,
}

/// 仓库在某一时刻的不可变快照
#[derive(Debug, Clone)]
pub struct Snapshot {
    version: u64,
    records: Arc<Vec<Record>>,
}

impl Snapshot {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 两个快照是否共享同一份数据
    pub fn same_as(&self, other: &Snapshot) -> bool {
        Arc::ptr_eq(&self.records, &other.records)
    }
}

/// 记录仓库
#[derive(Debug)]
pub struct Repository {
    strategy: IdStrategy,
    snapshot: Snapshot,
    high_water: usize,
}

impl Repository {
    /// 创建空仓库
    pub fn new(strategy: IdStrategy) -> Self {
        Self {
            strategy,
            snapshot: Snapshot {
                version: 0,
                records: Arc::new(Vec::new()),
            },
            high_water: 0,
        }
    }

    /// 以初始数据创建仓库，ID重复时报错
    pub fn with_records(strategy: IdStrategy, records: Vec<Record>) -> Result<Self> {
        let mut repository = Self::new(strategy);
        for record in records {
            repository.insert(record)?;
        }
        Ok(repository)
    }

    pub fn strategy(&self) -> IdStrategy {
        self.strategy
    }

    /// 按插入顺序列出所有记录
    pub fn list(&self) -> &[Record] {
        self.snapshot.records()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.clone()
    }

    pub fn version(&self) -> u64 {
        self.snapshot.version
    }

    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.list().iter().find(|r| &r.id == id)
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.get(id).is_some()
    }

    /// 追加记录
    pub fn insert(&mut self, record: Record) -> Result<()> {
        if self.contains(&record.id) {
            return Err(HospitalError::DuplicateId(record.id.to_string()));
        }

        if let Some(sequence) = sequence_of(&record.id) {
            self.high_water = self.high_water.max(sequence);
        }

        let id = record.id.clone();
        let mut records = self.list().to_vec();
        records.push(record);
        self.publish(records);

        tracing::debug!("Inserted record {} (version {})", id, self.version());
        Ok(())
    }

    /// 整条替换记录，位置保持不变；ID不可修改
    pub fn replace(&mut self, id: &RecordId, record: Record) -> Result<()> {
        let position = self
            .position(id)
            .ok_or_else(|| HospitalError::NotFound(id.to_string()))?;

        if &record.id != id {
            return Err(HospitalError::ReadOnlyField("id".to_string()));
        }

        let mut records = self.list().to_vec();
        records[position] = record;
        self.publish(records);

        tracing::debug!("Replaced record {} (version {})", id, self.version());
        Ok(())
    }

    /// 删除记录并返回被删除的记录
    pub fn delete(&mut self, id: &RecordId) -> Result<Record> {
        let position = self
            .position(id)
            .ok_or_else(|| HospitalError::NotFound(id.to_string()))?;

        let mut records = self.list().to_vec();
        let removed = records.remove(position);
        self.publish(records);

        tracing::debug!("Deleted record {} (version {})", id, self.version());
        Ok(removed)
    }

    /// 下一个可分配的ID
    pub fn next_id(&self, prefix: char) -> RecordId {
        let sequence = match self.strategy {
            IdStrategy::Sequential => self.len() + 1,
            IdStrategy::Monotonic => self.high_water.max(self.len()) + 1,
        };
        RecordId::sequential(prefix, sequence)
    }

    fn position(&self, id: &RecordId) -> Option<usize> {
        self.list().iter().position(|r| &r.id == id)
    }

    fn publish(&mut self, records: Vec<Record>) {
        self.snapshot = Snapshot {
            version: self.snapshot.version + 1,
            records: Arc::new(records),
        };
    }
}

fn sequence_of(id: &RecordId) -> Option<usize> {
    let prefix = id.as_str().chars().next()?;
    id.sequence(prefix)
}
