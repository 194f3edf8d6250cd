use tracing::debug;

use super::Queries;
use crate::constants::content_types;
use crate::error::QueryResult;
use crate::models::{EnrichedPost, LogRecord, Profile};
use crate::query::{collect_records, merge_newest_first, Field, Predicate, Query};

impl Queries {
    /// Public wall of `profile`, newest first: replies to the profile's
    /// thread plus the profile's own top-level posts, minus anything the
    /// profile or the post's author deleted.
    pub async fn get_posts(&self, profile: &Profile) -> QueryResult<Vec<EnrichedPost>> {
        debug!(target: "queries::posts", profile = %profile.id, "Fetching");
        let limit = self.limits.posts_per_source;

        let replies = Query::new(Predicate::And(vec![
            Predicate::public(),
            Predicate::eq(Field::Root, profile.id.as_str()),
        ]))
        .limit(limit);
        let own_posts = Query::new(Predicate::And(vec![
            Predicate::author(&profile.id),
            Predicate::public(),
            Predicate::content_type(content_types::POST),
            Predicate::Absent(Field::Root),
        ]))
        .limit(limit);

        let merged = merge_newest_first(self.log.read(&replies), self.log.read(&own_posts));
        let (records, tombstones) =
            futures::try_join!(collect_records(merged), self.tombstones())?;

        let posts: Vec<LogRecord> = records
            .into_iter()
            .filter(|record| record.as_post().is_some())
            .filter(|record| !tombstones.hides_for(record, &profile.id))
            .collect();

        let enriched = self.enrich_posts(posts).await?;
        debug!(target: "queries::posts", count = enriched.len(), "Done");
        Ok(enriched)
    }
}
