//! Profile resolution: the newest self-asserted `about` value per attribute,
//! falling back to the database's latest-value index.

pub mod cache;

use std::sync::Arc;

use futures::TryStreamExt;
use tracing::warn;

use crate::constants::{attributes, content_types};
use crate::error::{QueryError, QueryResult};
use crate::models::{Content, Profile, Tombstones};
use crate::query::{Field, Predicate, Query};
use crate::store::{load_tombstones, AboutIndex, LogStore};

pub use cache::{Clock, ManualClock, ProfileCache, SystemClock};

#[derive(Clone)]
pub struct ProfileResolver {
    log: Arc<dyn LogStore>,
    index: Arc<dyn AboutIndex>,
    cache: Arc<ProfileCache>,
}

impl ProfileResolver {
    pub fn new(log: Arc<dyn LogStore>, index: Arc<dyn AboutIndex>, cache: Arc<ProfileCache>) -> Self {
        Self { log, index, cache }
    }

    pub fn cache(&self) -> &Arc<ProfileCache> {
        &self.cache
    }

    /// Resolves name, image and description concurrently.
    ///
    /// Any failing lookup fails the whole resolution; the failure is logged
    /// with the identity and nothing is cached.
    pub async fn resolve(&self, id: &str) -> QueryResult<Profile> {
        if let Some(profile) = self.cache.get(id) {
            return Ok(profile);
        }

        let lookups = async {
            let tombstones = load_tombstones(self.log.as_ref()).await?;
            futures::try_join!(
                self.attribute(id, attributes::NAME, &tombstones),
                self.attribute(id, attributes::IMAGE, &tombstones),
                self.attribute(id, attributes::DESCRIPTION, &tombstones),
            )
        }
        .await;
        let (name, image, description) = lookups.map_err(|err| {
            warn!(target: "queries::profile", identity = %id, error = %err, "Could not retrieve profile");
            QueryError::ProfileResolution {
                identity: id.to_string(),
                message: err.to_string(),
            }
        })?;

        let profile = Profile {
            id: id.to_string(),
            name,
            image,
            description,
        };
        self.cache.insert(profile.clone());
        Ok(profile)
    }

    /// Like [`resolve`](Self::resolve) but degrades to a bare profile.
    pub async fn resolve_or_unresolved(&self, id: &str) -> Profile {
        match self.resolve(id).await {
            Ok(profile) => profile,
            Err(_) => Profile::unresolved(id),
        }
    }

    /// Only the identity's own `about` records are eligible, so third-party
    /// claims never override the index. Records the identity deleted are
    /// skipped.
    async fn attribute(
        &self,
        id: &str,
        key: &str,
        tombstones: &Tombstones,
    ) -> QueryResult<Option<String>> {
        let own_abouts = Query::new(Predicate::And(vec![
            Predicate::author(id),
            Predicate::content_type(content_types::ABOUT),
            Predicate::eq(Field::About, id),
        ]));

        let mut records = self.log.read(&own_abouts);
        while let Some(record) = records.try_next().await? {
            if tombstones.hides(&record) {
                continue;
            }
            let Content::About(about) = record.content() else {
                continue;
            };
            if let Some(value) = about.current(key) {
                return Ok(value.value().map(str::to_string));
            }
        }

        self.index.latest_value(key, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryLog;
    use crate::testing::{about, about_removed, delete, failing_log, FailOn};
    use std::time::Duration;

    fn resolver_for(log: Arc<MemoryLog>, clock: Arc<ManualClock>) -> ProfileResolver {
        let cache = Arc::new(ProfileCache::with_clock(Duration::from_secs(300), clock));
        ProfileResolver::new(log.clone(), log, cache)
    }

    #[tokio::test]
    async fn test_unknown_identity_resolves_empty() {
        let log = Arc::new(MemoryLog::new());
        let resolver = resolver_for(log, Arc::new(ManualClock::new()));

        let profile = resolver.resolve("@nobody").await.unwrap();
        assert_eq!(profile, Profile::unresolved("@nobody"));
    }

    #[tokio::test]
    async fn test_self_assertion_beats_lagging_index() {
        let log = Arc::new(MemoryLog::with_records([about("%1", "@a", 20, "@a", "name", "Fresh")]));
        log.pin_index_value("name", "@a", Some("Stale"));
        log.pin_index_value("image", "@a", Some("&img"));
        let resolver = resolver_for(log, Arc::new(ManualClock::new()));

        let profile = resolver.resolve("@a").await.unwrap();
        assert_eq!(profile.name.as_deref(), Some("Fresh"));
        assert_eq!(profile.image.as_deref(), Some("&img"));
        assert_eq!(profile.description, None);
    }

    #[tokio::test]
    async fn test_removed_attribute_falls_through_to_older_assertion() {
        let log = Arc::new(MemoryLog::with_records([
            about("%1", "@a", 10, "@a", "name", "Old"),
            about_removed("%2", "@a", 20, "@a", "name"),
        ]));
        log.pin_index_value("name", "@a", Some("Indexed"));
        let resolver = resolver_for(log, Arc::new(ManualClock::new()));

        let profile = resolver.resolve("@a").await.unwrap();
        assert_eq!(profile.name.as_deref(), Some("Old"));
    }

    #[tokio::test]
    async fn test_self_deleted_assertion_is_ignored() {
        let log = Arc::new(MemoryLog::with_records([
            about("%1", "@x", 10, "@x", "name", "Public"),
            about("%2", "@x", 20, "@x", "name", "Secret"),
            delete("%3", "@x", 30, "%2"),
        ]));
        let resolver = resolver_for(log, Arc::new(ManualClock::new()));

        assert_eq!(resolver.resolve("@x").await.unwrap().name.as_deref(), Some("Public"));
    }

    #[tokio::test]
    async fn test_deleted_only_assertion_does_not_leak_through_index() {
        let log = Arc::new(MemoryLog::with_records([
            about("%1", "@x", 10, "@x", "name", "Secret"),
            delete("%2", "@x", 20, "%1"),
        ]));
        let resolver = resolver_for(log, Arc::new(ManualClock::new()));

        assert_eq!(resolver.resolve("@x").await.unwrap().name, None);
    }

    #[tokio::test]
    async fn test_third_party_claims_are_ignored() {
        let log = Arc::new(MemoryLog::with_records([about("%1", "@b", 10, "@a", "name", "Fake")]));
        log.pin_index_value("name", "@a", None);
        let resolver = resolver_for(log, Arc::new(ManualClock::new()));

        assert_eq!(resolver.resolve("@a").await.unwrap().name, None);
    }

    #[tokio::test]
    async fn test_cache_is_rebuilt_after_interval() {
        let log = Arc::new(MemoryLog::with_records([about("%1", "@a", 10, "@a", "name", "Ann")]));
        let clock = Arc::new(ManualClock::new());
        let resolver = resolver_for(log.clone(), clock.clone());

        assert_eq!(resolver.resolve("@a").await.unwrap().name.as_deref(), Some("Ann"));

        log.insert(about("%2", "@a", 20, "@a", "name", "Annie"));
        assert_eq!(
            resolver.resolve("@a").await.unwrap().name.as_deref(),
            Some("Ann"),
            "memoized until the interval elapses"
        );

        clock.advance(Duration::from_secs(300));
        assert_eq!(resolver.resolve("@a").await.unwrap().name.as_deref(), Some("Annie"));
    }

    #[tokio::test]
    async fn test_failure_is_reported_and_not_cached() {
        let log = Arc::new(MemoryLog::with_records([about("%1", "@a", 10, "@a", "name", "Ann")]));
        let broken = failing_log(log.clone(), FailOn::ContentType("about"));
        let cache = Arc::new(ProfileCache::new(Duration::from_secs(300)));
        let resolver = ProfileResolver::new(broken, log, cache.clone());

        let err = resolver.resolve("@a").await.unwrap_err();
        assert!(matches!(err, QueryError::ProfileResolution { ref identity, .. } if identity == "@a"));
        assert!(cache.is_empty());
        assert_eq!(resolver.resolve_or_unresolved("@a").await, Profile::unresolved("@a"));
    }
}
