//! Orphaned network-interface detection and fallback cleanup.
//!
//! The crate splits cleanly into "decide" and "act":
//!
//! - [`detect`]: the pure [`is_orphan_candidate`] classifier and the
//!   multi-region [`Detector`]
//! - [`cleanup`]: the [`CleanupOrch`] that drives each candidate through
//!   detach, delete, security-group fallback and manual-review tagging
//! - [`aggregator`]: one-slot-per-candidate result collection
//! - [`hook`]: the [`EniCleanupHook`] facade a destroy-time hook calls
//!
//! All provider access goes through the [`NetworkInterfaceGateway`] trait,
//! so the core runs unchanged against a real cloud or an in-memory fake.
//!
//! # Example
//!
//! ```ignore
//! let config = CleanupConfig::load("eni-cleanup.toml")?;
//! let hook = EniCleanupHook::new(config, factory)?;
//! let report = hook.run(HookPhase::Destroy, &CancellationToken::new()).await;
//! println!("{}", report.render_text());
//! ```

pub mod aggregator;
pub mod cleanup;
pub mod config;
pub mod detect;
pub mod error;
pub mod gateway;
pub mod hook;
pub mod report;

pub use aggregator::ResultAggregator;
pub use cleanup::CleanupOrch;
pub use config::{CleanupConfig, CleanupOptions, FilterConfig, DEFAULT_RESERVED_DESCRIPTIONS};
pub use detect::{is_orphan_candidate, Candidate, DetectionReport, Detector, Reason, Verdict};
pub use error::{ConfigError, ConfigResult, GatewayError, GatewayResult};
pub use gateway::{
    GatewayFactory, ListFilter, NetworkInterfaceGateway, ATTEMPTED_CLEANUP_TIME_TAG,
    DELETION_ERROR_TAG, MANUAL_CLEANUP_TAG,
};
pub use hook::{EniCleanupHook, HookPhase};
pub use report::CleanupReport;

pub use eni_types;
pub use tokio_util::sync::CancellationToken;
