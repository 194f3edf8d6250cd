//! Log query facade: the query type every backend accepts, the lazy record
//! stream it produces, and helpers for combining streams.

pub mod merge;
pub mod predicate;

use futures::stream::BoxStream;
use futures::TryStreamExt;

use crate::error::QueryResult;
use crate::models::LogRecord;

pub use merge::merge_newest_first;
pub use predicate::{field_value, Field, FieldValue, Predicate, Scalar};

/// Lazily produced records, newest first unless the query says otherwise.
pub type RecordStream = BoxStream<'static, QueryResult<LogRecord>>;

/// A filtered read over the whole log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// `None` scans everything.
    pub filter: Option<Predicate>,
    /// Newest first when true.
    pub reverse: bool,
    pub limit: Option<usize>,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            filter: None,
            reverse: true,
            limit: None,
        }
    }
}

impl Query {
    pub fn new(filter: Predicate) -> Self {
        Self {
            filter: Some(filter),
            ..Default::default()
        }
    }

    /// Alternative filter branches, any of which admits a record.
    pub fn any_of(branches: Vec<Predicate>) -> Self {
        match branches.len() {
            0 => Self::default(),
            _ => Self::new(Predicate::Or(branches)),
        }
    }

    pub fn everything() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn oldest_first(mut self) -> Self {
        self.reverse = false;
        self
    }

    pub fn matches(&self, record: &LogRecord) -> bool {
        self.filter.as_ref().map_or(true, |p| p.matches(record))
    }
}

/// Drains a record stream, stopping at the first error.
pub async fn collect_records(stream: RecordStream) -> QueryResult<Vec<LogRecord>> {
    stream.try_collect().await
}
