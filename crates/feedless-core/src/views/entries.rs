use serde::Deserialize;
use tracing::debug;

use super::Queries;
use crate::error::QueryResult;
use crate::models::LogRecord;
use crate::query::{collect_records, Predicate, Query};

/// Optional narrowing for [`Queries::get_all_entries`]; both clauses must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EntryFilter {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl EntryFilter {
    fn predicate(&self) -> Option<Predicate> {
        let mut clauses = Vec::new();
        if let Some(author) = &self.author {
            clauses.push(Predicate::author(author));
        }
        if let Some(kind) = &self.kind {
            clauses.push(Predicate::content_type(kind));
        }
        match clauses.len() {
            0 => None,
            1 => clauses.pop(),
            _ => Some(Predicate::And(clauses)),
        }
    }
}

impl Queries {
    /// Raw records, newest first, for inspection. No enrichment, tombstones
    /// included.
    pub async fn get_all_entries(&self, filter: &EntryFilter) -> QueryResult<Vec<LogRecord>> {
        debug!(target: "queries::entries", ?filter, "Fetching");

        let query = Query {
            filter: filter.predicate(),
            ..Query::everything()
        }
        .limit(self.limits.entries);

        let entries = collect_records(self.log.read(&query)).await?;
        debug!(target: "queries::entries", count = entries.len(), "Done");
        Ok(entries)
    }
}
