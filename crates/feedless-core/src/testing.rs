//! Record builders and fault-injecting wrappers shared by unit tests.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde_json::{json, Value};

use crate::error::QueryError;
use crate::models::LogRecord;
use crate::query::{Field, Predicate, Query, RecordStream, Scalar};
use crate::store::{LogStore, MemoryLog};

fn record(key: &str, author: &str, ts: i64, private: bool, content: Value) -> LogRecord {
    serde_json::from_value(json!({
        "key": key,
        "value": {
            "author": author,
            "sequence": 1,
            "timestamp": ts,
            "private": private,
            "content": content,
        }
    }))
    .expect("fixture record")
}

pub fn post(key: &str, author: &str, ts: i64, text: &str) -> LogRecord {
    record(key, author, ts, false, json!({ "type": "post", "text": text }))
}

pub fn reply(key: &str, author: &str, ts: i64, root: &str) -> LogRecord {
    record(key, author, ts, false, json!({ "type": "post", "text": "reply", "root": root }))
}

pub fn secret(key: &str, author: &str, ts: i64, recps: &[&str]) -> LogRecord {
    record(key, author, ts, true, json!({ "type": "post", "text": "psst", "recps": recps }))
}

pub fn secret_reply(key: &str, author: &str, ts: i64, root: &str) -> LogRecord {
    record(key, author, ts, true, json!({ "type": "post", "text": "psst", "root": root }))
}

pub fn about(key: &str, author: &str, ts: i64, target: &str, attr: &str, value: &str) -> LogRecord {
    record(key, author, ts, false, json!({ "type": "about", "about": target, attr: value }))
}

pub fn about_removed(key: &str, author: &str, ts: i64, target: &str, attr: &str) -> LogRecord {
    record(
        key,
        author,
        ts,
        false,
        json!({ "type": "about", "about": target, attr: { "remove": true } }),
    )
}

pub fn contact(key: &str, author: &str, ts: i64, target: &str, following: bool) -> LogRecord {
    record(
        key,
        author,
        ts,
        false,
        json!({ "type": "contact", "contact": target, "following": following }),
    )
}

pub fn delete(key: &str, author: &str, ts: i64, dest: &str) -> LogRecord {
    record(key, author, ts, false, json!({ "type": "delete", "dest": dest }))
}

/// Which reads a [`FailingLog`] rejects.
#[derive(Debug, Clone, Copy)]
pub enum FailOn {
    /// Any read whose filter pins the content type.
    ContentType(&'static str),
    Everything,
}

/// Delegates to a [`MemoryLog`] but fails selected reads.
pub struct FailingLog {
    inner: Arc<MemoryLog>,
    fail_on: FailOn,
}

pub fn failing_log(inner: Arc<MemoryLog>, fail_on: FailOn) -> Arc<FailingLog> {
    Arc::new(FailingLog { inner, fail_on })
}

fn pins_type(predicate: &Predicate, kind: &str) -> bool {
    match predicate {
        Predicate::Eq(Field::Type, Scalar::Str(value)) => value == kind,
        Predicate::And(all) | Predicate::Or(all) => all.iter().any(|p| pins_type(p, kind)),
        _ => false,
    }
}

impl LogStore for FailingLog {
    fn read(&self, query: &Query) -> RecordStream {
        let fails = match self.fail_on {
            FailOn::Everything => true,
            FailOn::ContentType(kind) => query.filter.as_ref().is_some_and(|p| pins_type(p, kind)),
        };
        if fails {
            return stream::iter(vec![Err(QueryError::QueryFailure("injected".to_string()))]).boxed();
        }
        self.inner.read(query)
    }
}

pub fn queries_over(log: Arc<MemoryLog>) -> crate::views::Queries {
    crate::views::Queries::from_backend(log, &crate::config::CoreConfig::new("unused"))
}
