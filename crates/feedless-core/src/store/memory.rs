use std::collections::HashMap;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parking_lot::RwLock;

use super::{
    latest_about_value, now_millis, record_key, AboutIndex, FriendsGraph, LogStore, LogWriter,
};
use crate::error::QueryResult;
use crate::models::{Content, LogRecord, RecordValue, Tombstones, TrustGraph};
use crate::query::{Query, RecordStream};

/// In-process log used for embedding and tests.
///
/// The attribute index is derived from the stored records unless an entry
/// has been pinned with [`MemoryLog::pin_index_value`], which lets callers
/// reproduce an index that lags behind the log.
#[derive(Default)]
pub struct MemoryLog {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    /// Append order.
    records: Vec<LogRecord>,
    pinned_index: HashMap<(String, String), Option<String>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = LogRecord>) -> Self {
        let log = Self::new();
        for record in records {
            log.insert(record);
        }
        log
    }

    /// Stores an already-keyed record; duplicates by key are ignored.
    pub fn insert(&self, record: LogRecord) -> bool {
        let mut state = self.state.write();
        if state.records.iter().any(|r| r.key == record.key) {
            return false;
        }
        state.records.push(record);
        true
    }

    pub fn pin_index_value(&self, key: &str, dest: &str, value: Option<&str>) {
        self.state.write().pinned_index.insert(
            (key.to_string(), dest.to_string()),
            value.map(str::to_string),
        );
    }

    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records ordered by timestamp, ties broken by append order.
    fn ordered(&self, newest_first: bool) -> Vec<LogRecord> {
        let mut records = self.state.read().records.clone();
        records.sort_by_key(LogRecord::timestamp);
        if newest_first {
            records.reverse();
        }
        records
    }
}

impl LogStore for MemoryLog {
    fn read(&self, query: &Query) -> RecordStream {
        let records = self.ordered(query.reverse);
        let limit = query.limit.unwrap_or(usize::MAX);
        let query = query.clone();

        stream::iter(
            records
                .into_iter()
                .filter(move |record| query.matches(record))
                .take(limit)
                .map(Ok),
        )
        .boxed()
    }
}

#[async_trait]
impl FriendsGraph for MemoryLog {
    async fn get_graph(&self) -> QueryResult<TrustGraph> {
        let state = self.state.read();
        Ok(TrustGraph::from_contacts(&state.records))
    }

    async fn is_following(&self, source: &str, dest: &str) -> QueryResult<bool> {
        Ok(self.get_graph().await?.follows(source, dest))
    }
}

#[async_trait]
impl AboutIndex for MemoryLog {
    async fn latest_value(&self, key: &str, dest: &str) -> QueryResult<Option<String>> {
        if let Some(pinned) = self
            .state
            .read()
            .pinned_index
            .get(&(key.to_string(), dest.to_string()))
        {
            return Ok(pinned.clone());
        }
        let records = self.ordered(true);
        let tombstones = Tombstones::from_records(&records);
        Ok(latest_about_value(&records, &tombstones, key, dest))
    }
}

#[async_trait]
impl LogWriter for MemoryLog {
    async fn append(&self, author: &str, content: Content, private: bool) -> QueryResult<LogRecord> {
        let mut state = self.state.write();

        let sequence = state
            .records
            .iter()
            .filter(|r| r.author() == author)
            .map(|r| r.value.sequence)
            .max()
            .unwrap_or(0)
            + 1;
        let newest = state.records.iter().map(LogRecord::timestamp).max();
        let timestamp = match newest {
            Some(ts) => now_millis().max(ts.saturating_add(1)),
            None => now_millis(),
        };

        let value = RecordValue {
            author: author.to_string(),
            sequence,
            timestamp,
            private,
            content,
        };
        let record = LogRecord {
            key: record_key(&value)?,
            value,
        };
        state.records.push(record.clone());
        Ok(record)
    }
}
