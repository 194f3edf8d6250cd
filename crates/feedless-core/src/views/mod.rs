//! User-facing views over the log: posts, vanishing messages, people
//! search, friend lists, friendship status and the raw entry browser.
//!
//! Outside the entry browser, a `delete` record hides its target when the
//! delete's author also wrote the target. On a profile's wall and in its
//! vanishing messages the profile's own deletes apply as well.
//!
//! Failure policy per view:
//! - posts, vanishing messages: author enrichment is fail-fast
//! - friends: profile enrichment degrades to bare profiles
//! - friendship status, friends: graph failures are fatal

mod entries;
mod friends;
mod people;
mod posts;
mod status;
mod vanishing;

use std::sync::Arc;

use crate::config::{CoreConfig, QueryLimits};
use crate::error::{QueryError, QueryResult};
use crate::join;
use crate::models::{EnrichedPost, LogRecord, Tombstones};
use crate::profile::{ProfileCache, ProfileResolver};
use crate::store::{load_tombstones, AboutIndex, FriendsGraph, LogStore};

pub use entries::EntryFilter;
pub use friends::classify_connections;

#[derive(Clone)]
pub struct Queries {
    log: Arc<dyn LogStore>,
    graph: Arc<dyn FriendsGraph>,
    profiles: ProfileResolver,
    limits: QueryLimits,
}

impl Queries {
    pub fn new(
        log: Arc<dyn LogStore>,
        graph: Arc<dyn FriendsGraph>,
        index: Arc<dyn AboutIndex>,
        config: &CoreConfig,
    ) -> Self {
        let cache = Arc::new(ProfileCache::new(config.profile_cache_interval));
        Self::with_cache(log, graph, index, cache, config.limits)
    }

    pub fn with_cache(
        log: Arc<dyn LogStore>,
        graph: Arc<dyn FriendsGraph>,
        index: Arc<dyn AboutIndex>,
        cache: Arc<ProfileCache>,
        limits: QueryLimits,
    ) -> Self {
        Self {
            profiles: ProfileResolver::new(log.clone(), index, cache),
            log,
            graph,
            limits,
        }
    }

    /// One backend serving all three collaborator roles.
    pub fn from_backend<B>(backend: Arc<B>, config: &CoreConfig) -> Self
    where
        B: LogStore + FriendsGraph + AboutIndex + 'static,
    {
        Self::new(backend.clone(), backend.clone(), backend, config)
    }

    pub fn profiles(&self) -> &ProfileResolver {
        &self.profiles
    }

    /// Every `delete` record in the log.
    async fn tombstones(&self) -> QueryResult<Tombstones> {
        load_tombstones(self.log.as_ref()).await
    }

    /// Attaches each author's profile; one failed resolution fails the batch.
    async fn enrich_posts(&self, records: Vec<LogRecord>) -> QueryResult<Vec<EnrichedPost>> {
        join::fail_fast(records.into_iter().map(|record| async move {
            let author_profile = self.profiles.resolve(record.author()).await?;
            Ok(EnrichedPost {
                record,
                author_profile,
            })
        }))
        .await
    }
}

fn graph_failure(err: QueryError) -> QueryError {
    match err {
        QueryError::GraphLookup(_) => err,
        other => QueryError::GraphLookup(other.to_string()),
    }
}
