//! Application-wide constants
//!
//! Query limits and cache timings shared by the aggregators and the
//! outer boundary.

use std::time::Duration;

/// How often the profile cache is wiped wholesale.
pub const PROFILE_CACHE_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Per-source cap for the two post streams (replies and own root posts).
pub const POSTS_SOURCE_LIMIT: usize = 100;

/// Per-source cap for the two vanishing message streams.
pub const VANISHING_SOURCE_LIMIT: usize = 100;

/// Cap on `contact` records scanned when looking for rejected requests.
pub const REJECTIONS_LIMIT: usize = 100;

/// Cap for the generic entry browser.
pub const ENTRIES_LIMIT: usize = 500;

/// Default maximum characters per chunk when splitting long posts.
pub const SMALL_POST_LIMIT: usize = 140;

/// Version stamped on every response crossing the UI boundary.
pub const RESPONSE_SCHEMA_VERSION: u32 = 1;

/// Profile attributes resolved for every identity.
pub mod attributes {
    pub const NAME: &str = "name";
    pub const IMAGE: &str = "image";
    pub const DESCRIPTION: &str = "description";
}

/// Content `type` tags understood by the query layer.
pub mod content_types {
    pub const POST: &str = "post";
    pub const ABOUT: &str = "about";
    pub const CONTACT: &str = "contact";
    pub const DELETE: &str = "delete";
}
