use tracing::debug;

use super::{graph_failure, Queries};
use crate::error::QueryResult;
use crate::join;
use crate::models::relationship::Connection;
use crate::models::{FriendLists, Profile, TrustGraph};

impl Queries {
    /// Buckets everyone connected to `profile` in the follow graph.
    ///
    /// A graph failure fails the call. Profiles that cannot be resolved are
    /// listed bare rather than dropped.
    pub async fn get_friends(&self, profile: &Profile) -> QueryResult<FriendLists> {
        debug!(target: "queries::friends", profile = %profile.id, "Fetching");

        let graph = self.graph.get_graph().await.map_err(graph_failure)?;
        let connections = classify_connections(&graph, &profile.id);

        let resolved =
            join::best_effort(connections.iter().map(|(id, _)| self.profiles.resolve(id))).await;

        let mut lists = FriendLists::default();
        for ((id, connection), outcome) in connections.into_iter().zip(resolved) {
            let friend = outcome.unwrap_or_else(|_| Profile::unresolved(id));
            lists.push(connection, friend);
        }

        debug!(
            target: "queries::friends",
            friends = lists.friends.len(),
            sent = lists.requests_sent.len(),
            received = lists.requests_received.len(),
            "Done"
        );
        Ok(lists)
    }
}

/// Relationship of every other identity in `graph` to `me`.
///
/// Someone following `me` counts as a received request only while `me` has
/// never had an edge towards them: an explicit unfollow (non-positive
/// weight) hides the request, a missing edge does not.
pub fn classify_connections(graph: &TrustGraph, me: &str) -> Vec<(String, Connection)> {
    graph
        .identities()
        .into_iter()
        .filter(|id| *id != me)
        .filter_map(|id| {
            let outgoing = graph.weight(me, id);
            let following = outgoing.is_some_and(|w| w > 0);
            let followed_back = graph.follows(id, me);

            let connection = match (following, followed_back) {
                (true, true) => Connection::Friend,
                (true, false) => Connection::RequestSent,
                (false, true) if outgoing.is_none() => Connection::RequestReceived,
                _ => return None,
            };
            Some((id.to_string(), connection))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::QueryError;
    use crate::store::MemoryLog;
    use crate::testing::*;

    fn classify(graph: TrustGraph) -> Vec<(String, Connection)> {
        classify_connections(&graph, "A")
    }

    #[test]
    fn test_one_way_follow_is_request_sent() {
        let graph = TrustGraph::from([("A", &[("B", 1)][..]), ("B", &[][..])]);
        assert_eq!(classify(graph), vec![("B".to_string(), Connection::RequestSent)]);
    }

    #[test]
    fn test_mutual_follow_is_friends() {
        let graph = TrustGraph::from([("A", &[("B", 1)][..]), ("B", &[("A", 1)][..])]);
        assert_eq!(classify(graph), vec![("B".to_string(), Connection::Friend)]);
    }

    #[test]
    fn test_incoming_follow_is_request_received() {
        let graph = TrustGraph::from([("A", &[][..]), ("B", &[("A", 1)][..])]);
        assert_eq!(classify(graph), vec![("B".to_string(), Connection::RequestReceived)]);
    }

    #[test]
    fn test_explicit_unfollow_hides_request() {
        let graph = TrustGraph::from([("A", &[("B", -1)][..]), ("B", &[("A", 1)][..])]);
        assert!(classify(graph).is_empty());

        let zero = TrustGraph::from([("A", &[("B", 0)][..]), ("B", &[("A", 1)][..])]);
        assert!(classify(zero).is_empty());
    }

    #[test]
    fn test_unknown_profile_has_no_connections() {
        let graph = TrustGraph::from([("B", &[("C", 1)][..])]);
        assert!(classify(graph).is_empty());
    }

    #[tokio::test]
    async fn test_get_friends_buckets_resolved_profiles() {
        let log = Arc::new(MemoryLog::with_records([
            contact("%1", "A", 1, "B", true),
            contact("%2", "B", 2, "A", true),
            contact("%3", "A", 3, "C", true),
            contact("%4", "D", 4, "A", true),
            contact("%5", "E", 5, "A", true),
            contact("%6", "A", 6, "E", false),
            about("%7", "B", 7, "B", "name", "Bea"),
        ]));
        let lists = queries_over(log)
            .get_friends(&Profile::unresolved("A"))
            .await
            .unwrap();

        assert_eq!(lists.friends.len(), 1);
        assert_eq!(lists.friends[0].name.as_deref(), Some("Bea"));
        assert_eq!(lists.requests_sent, vec![Profile::unresolved("C")]);
        assert_eq!(lists.requests_received, vec![Profile::unresolved("D")]);
    }

    #[tokio::test]
    async fn test_profile_failures_degrade() {
        let log = Arc::new(MemoryLog::with_records([
            contact("%1", "A", 1, "B", true),
            about("%2", "B", 2, "B", "name", "Bea"),
        ]));
        let broken = failing_log(log.clone(), FailOn::ContentType("about"));
        let queries = crate::views::Queries::with_cache(
            broken,
            log.clone(),
            log,
            Arc::new(crate::profile::ProfileCache::new(std::time::Duration::from_secs(300))),
            Default::default(),
        );

        let lists = queries.get_friends(&Profile::unresolved("A")).await.unwrap();
        assert_eq!(lists.requests_sent, vec![Profile::unresolved("B")]);
    }

    struct BrokenGraph;

    #[async_trait::async_trait]
    impl crate::store::FriendsGraph for BrokenGraph {
        async fn get_graph(&self) -> QueryResult<TrustGraph> {
            Err(QueryError::QueryFailure("graph offline".to_string()))
        }

        async fn is_following(&self, _source: &str, _dest: &str) -> QueryResult<bool> {
            Err(QueryError::QueryFailure("graph offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_graph_failure_is_fatal() {
        let log = Arc::new(MemoryLog::new());
        let queries = crate::views::Queries::with_cache(
            log.clone(),
            Arc::new(BrokenGraph),
            log,
            Arc::new(crate::profile::ProfileCache::new(std::time::Duration::from_secs(300))),
            Default::default(),
        );

        let err = queries.get_friends(&Profile::unresolved("A")).await.unwrap_err();
        assert!(matches!(err, QueryError::GraphLookup(_)));
    }
}
