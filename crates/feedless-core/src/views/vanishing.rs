use tracing::debug;

use super::Queries;
use crate::constants::content_types;
use crate::error::QueryResult;
use crate::models::{EnrichedPost, LogRecord, Profile};
use crate::query::{collect_records, merge_newest_first, Field, Predicate, Query};

impl Queries {
    /// Private posts addressed to `profile`, newest first, excluding
    /// anything deleted by the profile or by the message's author.
    ///
    /// The message scan and the tombstone scan run concurrently; the
    /// retraction filter is applied once both have finished, before authors
    /// are resolved.
    pub async fn get_vanishing_messages(&self, profile: &Profile) -> QueryResult<Vec<EnrichedPost>> {
        debug!(target: "queries::messages", profile = %profile.id, "Fetching");
        let limit = self.limits.vanishing_per_source;

        let thread_replies = Query::new(Predicate::And(vec![
            Predicate::private(),
            Predicate::content_type(content_types::POST),
            Predicate::eq(Field::Root, profile.id.as_str()),
        ]))
        .limit(limit);
        let addressed = Query::new(Predicate::And(vec![
            Predicate::private(),
            Predicate::content_type(content_types::POST),
            Predicate::Absent(Field::Root),
            Predicate::contains(Field::Recps, &profile.id),
        ]))
        .limit(limit);

        let messages = collect_records(merge_newest_first(
            self.log.read(&thread_replies),
            self.log.read(&addressed),
        ));
        let (messages, tombstones) = futures::join!(messages, self.tombstones());
        let (messages, tombstones) = (messages?, tombstones?);

        let remaining: Vec<LogRecord> = messages
            .into_iter()
            .filter(|message| !tombstones.hides_for(message, &profile.id))
            .collect();
        let visible = self.enrich_posts(remaining).await?;
        debug!(target: "queries::messages", count = visible.len(), "Done");
        Ok(visible)
    }
}
