use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    ENTRIES_LIMIT, POSTS_SOURCE_LIMIT, PROFILE_CACHE_INTERVAL, REJECTIONS_LIMIT,
    VANISHING_SOURCE_LIMIT,
};

#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub data_dir: PathBuf,
    /// Interval after which every cached profile is dropped.
    pub profile_cache_interval: Duration,
    pub limits: QueryLimits,
}

/// Upper bounds on work done by a single aggregator call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    pub posts_per_source: usize,
    pub vanishing_per_source: usize,
    pub rejections: usize,
    pub entries: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            posts_per_source: POSTS_SOURCE_LIMIT,
            vanishing_per_source: VANISHING_SOURCE_LIMIT,
            rejections: REJECTIONS_LIMIT,
            entries: ENTRIES_LIMIT,
        }
    }
}

impl CoreConfig {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            profile_cache_interval: PROFILE_CACHE_INTERVAL,
            limits: QueryLimits::default(),
        }
    }

    pub fn with_profile_cache_interval(mut self, interval: Duration) -> Self {
        self.profile_cache_interval = interval;
        self
    }

    /// `~/.feedless`, or `./feedless_data` when there is no home directory.
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .map(|home| home.join(".feedless"))
            .unwrap_or_else(|| PathBuf::from("feedless_data"))
    }

    /// Location of the SQLite log inside `data_dir`.
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("log.sqlite")
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new(Self::default_data_dir())
    }
}
