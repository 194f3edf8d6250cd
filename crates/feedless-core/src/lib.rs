pub mod compose;
pub mod config;
pub mod constants;
pub mod error;
pub mod join;
pub mod models;
pub mod profile;
pub mod query;
pub mod store;
pub mod tracing_setup;
pub mod views;

#[cfg(test)]
mod testing;

pub use config::{CoreConfig, QueryLimits};
pub use error::{QueryError, QueryResult};
pub use models::{
    Content, EnrichedPost, FriendLists, FriendshipStatus, Identity, LogRecord, Profile, TrustGraph,
};
pub use views::{EntryFilter, Queries};
