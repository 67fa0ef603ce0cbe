use std::collections::{HashMap, VecDeque};
use std::sync::{PoisonError, RwLock};

use shared::ResultRecord;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Result not found")]
    NotFound,
}

#[derive(Default)]
struct Entries {
    records: HashMap<String, ResultRecord>,
    order: VecDeque<String>,
}

/// In-process map from result id to the response that produced it.
/// Unbounded unless a capacity is given, in which case the oldest insert is
/// evicted first.
#[derive(Default)]
pub struct ResultStore {
    entries: RwLock<Entries>,
    capacity: Option<usize>,
}

impl ResultStore {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            capacity,
        }
    }

    pub fn put(&self, id: String, record: ResultRecord) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        if entries.records.insert(id.clone(), record).is_some() {
            return;
        }
        entries.order.push_back(id);

        if let Some(capacity) = self.capacity {
            while entries.order.len() > capacity {
                if let Some(oldest) = entries.order.pop_front() {
                    entries.records.remove(&oldest);
                    log::debug!("Evicted result {}", oldest);
                }
            }
        }
    }

    pub fn get(&self, id: &str) -> Result<ResultRecord, StoreError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.records.get(id).cloned().ok_or(StoreError::NotFound)
    }

    #[cfg(test)]
    pub fn contains(&self, id: &str) -> bool {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.records.len()
    }
}
