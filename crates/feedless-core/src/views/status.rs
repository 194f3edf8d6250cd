use std::collections::HashSet;

use tracing::debug;

use super::{graph_failure, Queries};
use crate::constants::content_types;
use crate::error::QueryResult;
use crate::models::{Content, FriendshipStatus};
use crate::query::{collect_records, Field, Predicate, Query};

impl Queries {
    /// Relationship of `source` towards `dest`.
    pub async fn get_friendship_status(
        &self,
        source: &str,
        dest: &str,
    ) -> QueryResult<FriendshipStatus> {
        debug!(target: "queries::friendship_status", source, dest, "Fetching");

        let (source_follows, dest_follows, rejected) = futures::try_join!(
            async { self.graph.is_following(source, dest).await.map_err(graph_failure) },
            async { self.graph.is_following(dest, source).await.map_err(graph_failure) },
            self.rejected_by(source),
        )?;

        let status = FriendshipStatus::decide(source_follows, dest_follows, rejected.contains(dest));
        debug!(target: "queries::friendship_status", status = status.as_str(), "Done");
        Ok(status)
    }

    /// Everyone `author` has published an explicit unfollow for, ignoring
    /// unfollows `author` later deleted.
    async fn rejected_by(&self, author: &str) -> QueryResult<HashSet<String>> {
        let rejections = Query::new(Predicate::And(vec![
            Predicate::author(author),
            Predicate::content_type(content_types::CONTACT),
            Predicate::eq(Field::Following, false),
        ]))
        .limit(self.limits.rejections);

        let (records, tombstones) =
            futures::try_join!(collect_records(self.log.read(&rejections)), self.tombstones())?;

        Ok(records
            .into_iter()
            .filter(|record| !tombstones.hides(record))
            .filter_map(|record| match record.value.content {
                Content::Contact(contact) => Some(contact.contact),
                _ => None,
            })
            .collect())
    }
}
