//! Command line interface.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use eni_cleanup::{CleanupConfig, HookPhase};
use std::path::PathBuf;
use std::time::Duration;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Reclaim orphaned network interfaces before a stack's security groups
/// and subnets are deleted
#[derive(Parser, Debug)]
#[command(name = "eni-cleanupd")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to a TOML configuration file
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Region to scan; repeat for several (replaces the configured list)
    #[arg(short = 'r', long = "region")]
    pub regions: Vec<String>,

    /// Record what would happen without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Only remove security-group associations, never delete
    #[arg(long)]
    pub disassociate_only: bool,

    /// Only touch interfaces in this security group, and only remove it
    #[arg(long)]
    pub security_group_id: Option<String>,

    /// Security group to leave on an interface that would end up with none
    #[arg(long)]
    pub default_security_group_id: Option<String>,

    /// Maximum interfaces processed at once per region
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long)]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Lifecycle phase the hook runs at (apply, destroy)
    #[arg(long, default_value = "destroy")]
    pub phase: HookPhase,

    /// Stop starting new interfaces after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Print the report as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

impl Args {
    /// Loads the configuration file (if any) and applies the flags on top.
    pub fn load_config(&self) -> anyhow::Result<CleanupConfig> {
        let mut config = match &self.config {
            Some(path) => CleanupConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => CleanupConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    /// Flags win over file values.
    pub fn apply_overrides(&self, config: &mut CleanupConfig) {
        if !self.regions.is_empty() {
            config.regions = self.regions.clone();
        }
        if self.dry_run {
            config.cleanup.dry_run = true;
        }
        if self.disassociate_only {
            config.cleanup.disassociate_only = true;
        }
        if let Some(group) = &self.security_group_id {
            config.cleanup.target_security_group_id = Some(group.clone());
        }
        if let Some(group) = &self.default_security_group_id {
            config.cleanup.default_security_group_id = Some(group.clone());
        }
        if let Some(limit) = self.concurrency {
            config.cleanup.concurrency_limit = limit;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["eni-cleanupd", "--region", "us-east-1"]);
        assert_eq!(args.phase, HookPhase::Destroy);
        assert_eq!(args.log_format, LogFormat::Text);
        assert!(args.timeout().is_none());

        let config = args.load_config().unwrap();
        assert_eq!(config.regions, vec!["us-east-1"]);
        assert_eq!(config.cleanup.concurrency_limit, 4);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
regions = ["eu-west-1"]
log_level = "warn"

[cleanup]
concurrency_limit = 8
"#
        )
        .unwrap();

        let path = file.path().to_string_lossy().to_string();
        let args = Args::parse_from([
            "eni-cleanupd",
            "--config",
            path.as_str(),
            "-r",
            "us-east-1",
            "-r",
            "us-west-2",
            "--concurrency",
            "2",
            "--security-group-id",
            "sg-123",
            "--dry-run",
            "--phase",
            "apply",
            "--timeout-secs",
            "30",
        ]);
        let config = args.load_config().unwrap();

        assert_eq!(config.regions, vec!["us-east-1", "us-west-2"]);
        assert_eq!(config.cleanup.concurrency_limit, 2);
        assert_eq!(config.cleanup.target_security_group(), Some("sg-123"));
        assert!(config.cleanup.dry_run);
        assert_eq!(config.log_level, "warn");
        assert_eq!(args.phase, HookPhase::Apply);
        assert_eq!(args.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_bad_phase_rejected() {
        let result = Args::try_parse_from(["eni-cleanupd", "--phase", "create"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let args = Args::parse_from(["eni-cleanupd", "--config", "/nonexistent/eni.toml"]);
        assert!(args.load_config().is_err());
    }
}
