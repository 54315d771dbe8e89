//! Provider gateway contract.
//!
//! The gateway is the only way the core touches the cloud provider. One
//! gateway serves one region and is shared by every worker in that region,
//! so implementations must be safe for concurrent use.

use crate::error::GatewayResult;
use async_trait::async_trait;
use eni_types::NetworkInterfaceRecord;
use std::sync::Arc;

/// Tag marking an interface the automated flow could not resolve.
pub const MANUAL_CLEANUP_TAG: &str = "NeedsManualCleanup";

/// Tag holding the RFC 3339 UTC time of the failed attempt.
pub const ATTEMPTED_CLEANUP_TIME_TAG: &str = "AttemptedCleanupTime";

/// Tag holding an excerpt of the last provider error.
pub const DELETION_ERROR_TAG: &str = "DeletionError";

/// Server-side filter for a listing call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Only interfaces associated with this security group.
    pub security_group_id: Option<String>,
}

impl ListFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_security_group(group_id: impl Into<String>) -> Self {
        Self {
            security_group_id: Some(group_id.into()),
        }
    }
}

/// Query and mutation surface over one region's network interfaces.
#[async_trait]
pub trait NetworkInterfaceGateway: Send + Sync {
    /// Lists every interface matching the filter, in provider order.
    async fn list_interfaces(&self, filter: &ListFilter) -> GatewayResult<Vec<NetworkInterfaceRecord>>;

    /// Reads one interface. `Ok(None)` means it no longer exists.
    async fn describe_interface(&self, id: &str) -> GatewayResult<Option<NetworkInterfaceRecord>>;

    /// Replaces the interface's security groups with `groups`.
    async fn modify_security_groups(&self, id: &str, groups: &[String]) -> GatewayResult<()>;

    /// Requests a detach. Completes before the provider finishes detaching.
    async fn detach(&self, attachment_id: &str, force: bool) -> GatewayResult<()>;

    /// Deletes the interface.
    async fn delete_interface(&self, id: &str) -> GatewayResult<()>;

    /// Writes (or overwrites) tags on the interface.
    async fn create_tags(&self, id: &str, tags: &[(String, String)]) -> GatewayResult<()>;
}

/// Builds the per-region gateway.
#[async_trait]
pub trait GatewayFactory: Send + Sync {
    async fn gateway(&self, region: &str) -> GatewayResult<Arc<dyn NetworkInterfaceGateway>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_filter() {
        assert_eq!(ListFilter::all().security_group_id, None);
        assert_eq!(
            ListFilter::by_security_group("sg-1").security_group_id.as_deref(),
            Some("sg-1")
        );
    }
}
