use std::collections::{HashMap, HashSet};

use super::record::{Content, LogRecord};

/// `delete` records indexed by the key they retract.
///
/// A delete only counts when its author wrote the target record, or when
/// the caller names a moderator whose deletes also apply (a profile owner on
/// their own wall and inbox).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tombstones {
    deleters: HashMap<String, HashSet<String>>,
}

impl Tombstones {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects every `delete` record in `records`, ignoring other content.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a LogRecord>) -> Self {
        let mut tombstones = Self::new();
        for record in records {
            if let Content::Delete(delete) = record.content() {
                tombstones.insert(record.author(), &delete.dest);
            }
        }
        tombstones
    }

    pub fn insert(&mut self, deleter: &str, dest: &str) {
        self.deleters
            .entry(dest.to_string())
            .or_default()
            .insert(deleter.to_string());
    }

    /// True when `record`'s own author deleted it.
    pub fn hides(&self, record: &LogRecord) -> bool {
        self.deleted_by(&record.key, record.author())
    }

    /// True when `record` was deleted by its author or by `moderator`.
    pub fn hides_for(&self, record: &LogRecord, moderator: &str) -> bool {
        self.hides(record) || self.deleted_by(&record.key, moderator)
    }

    pub fn len(&self) -> usize {
        self.deleters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deleters.is_empty()
    }

    fn deleted_by(&self, key: &str, author: &str) -> bool {
        self.deleters
            .get(key)
            .is_some_and(|authors| authors.contains(author))
    }
}
