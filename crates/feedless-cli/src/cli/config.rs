use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use feedless_core::CoreConfig;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// CLI configuration that can be loaded from a JSON file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CliConfig {
    /// Directory holding the log database; defaults to `~/.feedless`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Address the HTTP API listens on
    pub bind_addr: String,

    /// Seconds between wholesale profile cache clears
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_cache_interval_secs: Option<u64>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            profile_cache_interval_secs: None,
        }
    }
}

impl CliConfig {
    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: CliConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn core_config(&self) -> CoreConfig {
        let data_dir = self
            .data_dir
            .clone()
            .unwrap_or_else(CoreConfig::default_data_dir);
        let config = CoreConfig::new(data_dir);
        match self.profile_cache_interval_secs {
            Some(secs) => config.with_profile_cache_interval(Duration::from_secs(secs)),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_full() {
        let json = r#"{
            "dataDir": "/tmp/feedless-test",
            "bindAddr": "0.0.0.0:8080",
            "profileCacheIntervalSecs": 30
        }"#;
        let config: CliConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/feedless-test")));
        assert_eq!(config.bind_addr, "0.0.0.0:8080");

        let core = config.core_config();
        assert_eq!(core.log_path(), PathBuf::from("/tmp/feedless-test/log.sqlite"));
        assert_eq!(core.profile_cache_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_parse_config_minimal() {
        let config: CliConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(
            config.core_config().profile_cache_interval,
            Duration::from_secs(300)
        );
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = CliConfig::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
