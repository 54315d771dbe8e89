//! EC2-backed gateway.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ec2 as ec2;
use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_types::region::Region;
use chrono::Utc;
use eni_cleanup::{GatewayError, GatewayFactory, GatewayResult, ListFilter, NetworkInterfaceGateway};
use eni_types::{Attachment, AttachmentState, InterfaceStatus, NetworkInterfaceRecord};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

const NOT_FOUND_CODES: &[&str] = &[
    "InvalidNetworkInterfaceID.NotFound",
    "InvalidAttachmentID.NotFound",
];

/// Maps an SDK failure, turning "does not exist" codes into `NotFound`.
fn map_sdk_error<E>(operation: &str, id: &str, err: SdkError<E>) -> GatewayError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    match err.code() {
        Some(code) if NOT_FOUND_CODES.contains(&code) => GatewayError::not_found(id),
        Some(code) => {
            let code = code.to_string();
            GatewayError::api_with_code(operation, code, DisplayErrorContext(&err).to_string())
        }
        None => GatewayError::api(operation, DisplayErrorContext(&err).to_string()),
    }
}

/// Gateway over one region's EC2 API.
pub struct Ec2Gateway {
    region: String,
    client: ec2::Client,
}

impl Ec2Gateway {
    pub fn new(region: impl Into<String>, client: ec2::Client) -> Self {
        Self {
            region: region.into(),
            client,
        }
    }
}

/// Converts one API item. Items without an id are dropped.
fn to_record(region: &str, eni: &ec2::types::NetworkInterface) -> Option<NetworkInterfaceRecord> {
    let id = eni.network_interface_id()?;

    let raw_status = eni.status().map(|s| s.as_str()).unwrap_or_default();
    let status = raw_status.parse::<InterfaceStatus>().unwrap_or_else(|_| {
        // Unknown states are never reclaimed
        warn!(eni = %id, status = %raw_status, "Unknown interface status, treating as in-use");
        InterfaceStatus::InUse
    });

    let mut record = NetworkInterfaceRecord::new(id, region, status)
        .with_observed_at(Utc::now())
        .with_security_groups(eni.groups().iter().filter_map(|g| g.group_id()));

    if let Some(description) = eni.description().filter(|d| !d.is_empty()) {
        record = record.with_description(description);
    }
    if let Some(vpc) = eni.vpc_id() {
        record = record.with_vpc(vpc);
    }
    if let Some(subnet) = eni.subnet_id() {
        record = record.with_subnet(subnet);
    }
    if let Some(az) = eni.availability_zone() {
        record = record.with_availability_zone(az);
    }
    if let Some(attachment) = eni.attachment() {
        let state = attachment
            .status()
            .and_then(|s| s.as_str().parse::<AttachmentState>().ok());
        record = record.with_attachment(Attachment::new(
            attachment.attachment_id().unwrap_or_default(),
            state,
        ));
    }
    for tag in eni.tag_set() {
        if let (Some(key), Some(value)) = (tag.key(), tag.value()) {
            record = record.with_tag(key, value);
        }
    }
    Some(record)
}

#[async_trait]
impl NetworkInterfaceGateway for Ec2Gateway {
    async fn list_interfaces(&self, filter: &ListFilter) -> GatewayResult<Vec<NetworkInterfaceRecord>> {
        let mut records = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let mut req = self.client.describe_network_interfaces();
            if let Some(group) = filter.security_group_id.as_deref() {
                req = req.filters(ec2::types::Filter::builder().name("group-id").values(group).build());
            }
            if let Some(t) = token.as_deref() {
                req = req.next_token(t);
            }
            let resp = req
                .send()
                .await
                .map_err(|e| map_sdk_error("DescribeNetworkInterfaces", &self.region, e))?;

            records.extend(resp.network_interfaces().iter().filter_map(|eni| to_record(&self.region, eni)));

            token = resp.next_token().map(str::to_string);
            if token.is_none() {
                break;
            }
        }
        debug!(region = %self.region, count = records.len(), "Listed network interfaces");
        Ok(records)
    }

    async fn describe_interface(&self, id: &str) -> GatewayResult<Option<NetworkInterfaceRecord>> {
        let result = self
            .client
            .describe_network_interfaces()
            .network_interface_ids(id)
            .send()
            .await;
        match result {
            Ok(resp) => Ok(resp
                .network_interfaces()
                .first()
                .and_then(|eni| to_record(&self.region, eni))),
            Err(e) => match map_sdk_error("DescribeNetworkInterfaces", id, e) {
                GatewayError::NotFound { .. } => Ok(None),
                other => Err(other),
            },
        }
    }

    async fn modify_security_groups(&self, id: &str, groups: &[String]) -> GatewayResult<()> {
        self.client
            .modify_network_interface_attribute()
            .network_interface_id(id)
            .set_groups(Some(groups.to_vec()))
            .send()
            .await
            .map_err(|e| map_sdk_error("ModifyNetworkInterfaceAttribute", id, e))?;
        Ok(())
    }

    async fn detach(&self, attachment_id: &str, force: bool) -> GatewayResult<()> {
        self.client
            .detach_network_interface()
            .attachment_id(attachment_id)
            .force(force)
            .send()
            .await
            .map_err(|e| map_sdk_error("DetachNetworkInterface", attachment_id, e))?;
        Ok(())
    }

    async fn delete_interface(&self, id: &str) -> GatewayResult<()> {
        self.client
            .delete_network_interface()
            .network_interface_id(id)
            .send()
            .await
            .map_err(|e| map_sdk_error("DeleteNetworkInterface", id, e))?;
        Ok(())
    }

    async fn create_tags(&self, id: &str, tags: &[(String, String)]) -> GatewayResult<()> {
        let tags = tags
            .iter()
            .map(|(key, value)| ec2::types::Tag::builder().key(key).value(value).build())
            .collect();
        self.client
            .create_tags()
            .resources(id)
            .set_tags(Some(tags))
            .send()
            .await
            .map_err(|e| map_sdk_error("CreateTags", id, e))?;
        Ok(())
    }
}

/// Builds one EC2 client per region from the default credential chain and
/// reuses it for the rest of the run.
#[derive(Default)]
pub struct Ec2GatewayFactory {
    gateways: Mutex<HashMap<String, Arc<Ec2Gateway>>>,
}

impl Ec2GatewayFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GatewayFactory for Ec2GatewayFactory {
    async fn gateway(&self, region: &str) -> GatewayResult<Arc<dyn NetworkInterfaceGateway>> {
        let cached = self.gateways.lock().get(region).cloned();
        if let Some(gateway) = cached {
            return Ok(gateway as Arc<dyn NetworkInterfaceGateway>);
        }

        let conf = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        if conf.credentials_provider().is_none() {
            return Err(GatewayError::client(region, "no credentials provider configured"));
        }

        let gateway = Arc::new(Ec2Gateway::new(region, ec2::Client::new(&conf)));
        self.gateways
            .lock()
            .entry(region.to_string())
            .or_insert_with(|| Arc::clone(&gateway));
        Ok(gateway as Arc<dyn NetworkInterfaceGateway>)
    }
}
