//! Cleanup configuration.
//!
//! Loads and validates the cleanup configuration from TOML. Every optional
//! field has a documented default; unknown fields are rejected.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Descriptions owned by managed services. Interfaces whose description
/// contains one of these are never touched.
pub const DEFAULT_RESERVED_DESCRIPTIONS: &[&str] =
    &["ELB", "Amazon EKS", "AWS-mgmt", "NAT Gateway", "Kubernetes.io"];

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Classification filters applied by the detector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    /// Extra reserved-description markers, added to the built-in set
    pub reserved_descriptions: Vec<String>,

    /// Only interfaces carrying one of these tag keys are candidates
    pub include_tag_keys: Vec<String>,

    /// Interfaces carrying one of these tag keys are never candidates
    pub exclude_tag_keys: Vec<String>,

    /// Minimum age in days (needs a known creation time)
    pub older_than_days: Option<f64>,

    /// Tag-key prefixes that mark an available interface as a likely orphan
    /// (e.g. `kubernetes.io/cluster/`). Empty disables the heuristic.
    pub orphan_tag_prefixes: Vec<String>,
}

impl FilterConfig {
    /// Built-in reserved markers followed by the configured ones.
    pub fn reserved_markers(&self) -> impl Iterator<Item = &str> {
        DEFAULT_RESERVED_DESCRIPTIONS
            .iter()
            .copied()
            .chain(self.reserved_descriptions.iter().map(String::as_str))
    }

    pub fn with_exclude_tag_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_tag_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_include_tag_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_tag_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_older_than_days(mut self, days: f64) -> Self {
        self.older_than_days = Some(days);
        self
    }

    /// Validate filter configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(days) = self.older_than_days {
            if !days.is_finite() || days < 0.0 {
                return Err(ConfigError::invalid_config(
                    "filter.older_than_days",
                    format!("must be a non-negative number, got {}", days),
                ));
            }
        }

        if self.reserved_descriptions.iter().any(String::is_empty) {
            return Err(ConfigError::invalid_config(
                "filter.reserved_descriptions",
                "empty marker would match every description",
            ));
        }

        Ok(())
    }
}

/// Options for the cleanup orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleanupOptions {
    /// Record what would happen without changing anything
    #[serde(default)]
    pub dry_run: bool,

    /// Only remove security-group associations, never delete
    #[serde(default)]
    pub disassociate_only: bool,

    /// Remove only this group (and skip interfaces without it)
    #[serde(default)]
    pub target_security_group_id: Option<String>,

    /// Substituted when the remaining group set would be empty
    #[serde(default)]
    pub default_security_group_id: Option<String>,

    /// Maximum candidates processed at once within one region
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,

    /// Upper bound on waiting for a detach to settle, in milliseconds
    #[serde(default = "default_detach_wait_ms")]
    pub detach_wait_ms: u64,

    /// Attachment polling interval while waiting, in milliseconds
    #[serde(default = "default_detach_poll_interval_ms")]
    pub detach_poll_interval_ms: u64,

    /// Pause between disassociation and the retry delete, in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_concurrency_limit() -> usize {
    4
}

fn default_detach_wait_ms() -> u64 {
    5000
}

fn default_detach_poll_interval_ms() -> u64 {
    1000
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            disassociate_only: false,
            target_security_group_id: None,
            default_security_group_id: None,
            concurrency_limit: default_concurrency_limit(),
            detach_wait_ms: default_detach_wait_ms(),
            detach_poll_interval_ms: default_detach_poll_interval_ms(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl CleanupOptions {
    /// Options with every wait disabled. Meant for tests and simulations.
    pub fn immediate() -> Self {
        Self {
            detach_wait_ms: 0,
            detach_poll_interval_ms: 0,
            retry_delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_disassociate_only(mut self, disassociate_only: bool) -> Self {
        self.disassociate_only = disassociate_only;
        self
    }

    pub fn with_target_security_group(mut self, group_id: impl Into<String>) -> Self {
        self.target_security_group_id = Some(group_id.into());
        self
    }

    pub fn with_default_security_group(mut self, group_id: impl Into<String>) -> Self {
        self.default_security_group_id = Some(group_id.into());
        self
    }

    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    /// Target group, ignoring empty strings.
    pub fn target_security_group(&self) -> Option<&str> {
        self.target_security_group_id.as_deref().filter(|g| !g.is_empty())
    }

    /// Default group, ignoring empty strings.
    pub fn default_security_group(&self) -> Option<&str> {
        self.default_security_group_id.as_deref().filter(|g| !g.is_empty())
    }

    /// Get detach wait as Duration
    pub fn detach_wait(&self) -> Duration {
        Duration::from_millis(self.detach_wait_ms)
    }

    /// Get detach poll interval as Duration
    pub fn detach_poll_interval(&self) -> Duration {
        Duration::from_millis(self.detach_poll_interval_ms)
    }

    /// Get retry delay as Duration
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Validate cleanup options
    pub fn validate(&self) -> ConfigResult<()> {
        if self.concurrency_limit == 0 {
            return Err(ConfigError::invalid_config(
                "cleanup.concurrency_limit",
                "must be at least 1",
            ));
        }

        if self.detach_wait_ms > 0 && self.detach_poll_interval_ms == 0 {
            return Err(ConfigError::invalid_config(
                "cleanup.detach_poll_interval_ms",
                "must be > 0 when detach_wait_ms is set",
            ));
        }

        if self.target_security_group_id.as_deref() == Some("") {
            return Err(ConfigError::invalid_config(
                "cleanup.target_security_group_id",
                "must not be empty",
            ));
        }

        if self.default_security_group_id.as_deref() == Some("") {
            return Err(ConfigError::invalid_config(
                "cleanup.default_security_group_id",
                "must not be empty",
            ));
        }

        Ok(())
    }
}

/// Complete cleanup configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleanupConfig {
    /// Regions to scan
    #[serde(default)]
    pub regions: Vec<String>,

    /// Detection filters
    #[serde(default)]
    pub filter: FilterConfig,

    /// Cleanup options
    #[serde(default)]
    pub cleanup: CleanupOptions,

    /// Log verbosity (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            regions: Vec::new(),
            filter: FilterConfig::default(),
            cleanup: CleanupOptions::default(),
            log_level: default_log_level(),
        }
    }
}

impl CleanupConfig {
    /// Creates a configuration for the given regions with default settings.
    pub fn for_regions<I, S>(regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            regions: regions.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|source| ConfigError::Parse { source })
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.regions.is_empty() {
            return Err(ConfigError::invalid_config(
                "regions",
                "at least one region must be specified",
            ));
        }

        if let Some(region) = self.regions.iter().find(|r| r.trim().is_empty()) {
            return Err(ConfigError::invalid_config(
                "regions",
                format!("invalid region name '{}'", region),
            ));
        }

        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::invalid_config(
                "log_level",
                format!(
                    "'{}' is not one of {}",
                    self.log_level,
                    LOG_LEVELS.join(", ")
                ),
            ));
        }

        self.filter.validate()?;
        self.cleanup.validate()
    }

    /// Regions in configured order with duplicates removed.
    pub fn unique_regions(&self) -> Vec<String> {
        let mut regions: Vec<String> = Vec::with_capacity(self.regions.len());
        for region in &self.regions {
            if !regions.contains(region) {
                regions.push(region.clone());
            }
        }
        regions
    }
}
