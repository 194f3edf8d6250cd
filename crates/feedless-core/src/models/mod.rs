pub mod graph;
pub mod profile;
pub mod record;
pub mod relationship;
pub mod tombstone;

pub use graph::TrustGraph;
pub use profile::{EnrichedPost, Profile};
pub use record::{
    AboutContent, AttributeValue, ContactContent, Content, DeleteContent, LogRecord, PostContent,
    RecordValue,
};
pub use relationship::{FriendLists, FriendshipStatus};
pub use tombstone::Tombstones;

/// Opaque author identity (public key equivalent).
pub type Identity = String;

/// Content-addressed record id.
pub type RecordKey = String;
