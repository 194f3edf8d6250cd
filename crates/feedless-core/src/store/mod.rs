//! Collaborators owned by the log database, seen through narrow traits.
//!
//! The query layer only ever reads through [`LogStore`], [`FriendsGraph`]
//! and [`AboutIndex`]; [`LogWriter`] exists for the boundary's publish and
//! vanish actions.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use futures::TryStreamExt;
use sha2::{Digest, Sha256};

use crate::constants::content_types;
use crate::error::{QueryError, QueryResult};
use crate::models::{AttributeValue, Content, LogRecord, RecordValue, Tombstones, TrustGraph};
use crate::query::{Predicate, Query, RecordStream};

pub use memory::MemoryLog;
pub use sqlite::SqliteLog;

/// Filtered, reverse-chronological reads over the whole log.
pub trait LogStore: Send + Sync {
    /// Returns a lazy stream; failures surface as stream items.
    fn read(&self, query: &Query) -> RecordStream;
}

/// Snapshot access to the follow graph.
#[async_trait]
pub trait FriendsGraph: Send + Sync {
    async fn get_graph(&self) -> QueryResult<TrustGraph>;

    async fn is_following(&self, source: &str, dest: &str) -> QueryResult<bool>;
}

/// Precomputed "latest value" index for profile attributes.
///
/// May lag behind the log; resolvers consult it only as a fallback.
#[async_trait]
pub trait AboutIndex: Send + Sync {
    async fn latest_value(&self, key: &str, dest: &str) -> QueryResult<Option<String>>;
}

/// Appends unsigned records on behalf of a local identity.
#[async_trait]
pub trait LogWriter: Send + Sync {
    async fn append(&self, author: &str, content: Content, private: bool) -> QueryResult<LogRecord>;
}

/// Content address of a record value: `%<sha256 hex>.sha256`.
pub fn record_key(value: &RecordValue) -> QueryResult<String> {
    let bytes = serde_json::to_vec(value)?;
    let digest = Sha256::digest(&bytes);
    Ok(format!("%{}.sha256", hex::encode(digest)))
}

/// Value of the newest `about` assertion of `key` for `dest` that neither
/// retracts the attribute nor was deleted by its author.
///
/// `records` must be ordered newest first.
pub fn latest_about_value<'a>(
    records: impl IntoIterator<Item = &'a LogRecord>,
    tombstones: &Tombstones,
    key: &str,
    dest: &str,
) -> Option<String> {
    records
        .into_iter()
        .filter(|record| !tombstones.hides(record))
        .find_map(|record| match record.content() {
            Content::About(about) if about.about == dest => about.current(key),
            _ => None,
        })
        .and_then(AttributeValue::value)
        .map(str::to_string)
}

/// Every `delete` record in the log.
pub async fn load_tombstones(log: &dyn LogStore) -> QueryResult<Tombstones> {
    let deletes = Query::new(Predicate::content_type(content_types::DELETE));

    log.read(&deletes)
        .try_fold(Tombstones::new(), |mut tombstones, record| async move {
            if let Content::Delete(delete) = record.content() {
                tombstones.insert(record.author(), &delete.dest);
            }
            Ok(tombstones)
        })
        .await
}

pub(crate) fn storage_error(err: impl std::fmt::Display) -> QueryError {
    QueryError::QueryFailure(err.to_string())
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
