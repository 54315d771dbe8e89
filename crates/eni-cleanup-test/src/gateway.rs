//! In-memory provider gateway
//!
//! Holds one region's interfaces in provider order and applies every call
//! to them, so repeated runs see the effects of earlier ones. Faults can be
//! scripted per operation and per interface, and every call is journaled.

use async_trait::async_trait;
use eni_cleanup::{
    GatewayError, GatewayFactory, GatewayResult, ListFilter, NetworkInterfaceGateway,
};
use eni_types::{AttachmentState, InterfaceStatus, NetworkInterfaceRecord};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

/// Gateway operation, for fault scripting and the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Describe,
    ModifyGroups,
    Detach,
    Delete,
    CreateTags,
}

impl Operation {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Operation::ModifyGroups | Operation::Detach | Operation::Delete | Operation::CreateTags
        )
    }
}

/// One journaled call. `target` is the interface id (the region for
/// listings).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub op: Operation,
    pub target: String,
}

#[derive(Debug, Clone)]
struct Fault {
    error: GatewayError,
    /// `None` fails forever.
    remaining: Option<usize>,
}

#[derive(Debug, Default)]
struct State {
    interfaces: Vec<NetworkInterfaceRecord>,
    faults: HashMap<(Operation, Option<String>), Fault>,
    journal: Vec<Call>,
    in_flight: usize,
    max_in_flight: usize,
}

impl State {
    fn position(&self, id: &str) -> Option<usize> {
        self.interfaces.iter().position(|r| r.id == id)
    }

    fn owner_of_attachment(&self, attachment_id: &str) -> Option<usize> {
        self.interfaces.iter().position(|r| {
            r.attachment
                .as_ref()
                .is_some_and(|a| a.attachment_id == attachment_id)
        })
    }

    /// Pops the fault for `op` on `target`, falling back to a fault on the
    /// operation as a whole.
    fn take_fault(&mut self, op: Operation, target: &str) -> Option<GatewayError> {
        let key = [(op, Some(target.to_string())), (op, None)]
            .into_iter()
            .find(|k| self.faults.contains_key(k))?;
        let fault = self.faults.get_mut(&key)?;
        let error = fault.error.clone();
        let exhausted = match fault.remaining.as_mut() {
            Some(n) => {
                *n = n.saturating_sub(1);
                *n == 0
            }
            None => false,
        };
        if exhausted {
            self.faults.remove(&key);
        }
        Some(error)
    }
}

/// Scriptable single-region gateway.
pub struct InMemoryGateway {
    region: String,
    state: Mutex<State>,
    latency: Duration,
    detach_settles: bool,
}

impl InMemoryGateway {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            state: Mutex::new(State::default()),
            latency: Duration::ZERO,
            detach_settles: true,
        }
    }

    /// Adds interfaces in provider order.
    pub fn with_interfaces<I>(self, records: I) -> Self
    where
        I: IntoIterator<Item = NetworkInterfaceRecord>,
    {
        self.state.lock().interfaces.extend(records);
        self
    }

    /// Every call sleeps this long before applying.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// When false, detach requests are accepted but the attachment never
    /// goes away.
    pub fn with_detach_settles(mut self, settles: bool) -> Self {
        self.detach_settles = settles;
        self
    }

    /// Fails `op` on `id` forever (every id when `id` is `None`).
    pub fn fail(&self, op: Operation, id: Option<&str>, error: GatewayError) {
        self.insert_fault(op, id, error, None);
    }

    /// Fails `op` on `id` for the next `times` calls.
    pub fn fail_times(&self, op: Operation, id: Option<&str>, times: usize, error: GatewayError) {
        if times > 0 {
            self.insert_fault(op, id, error, Some(times));
        }
    }

    fn insert_fault(&self, op: Operation, id: Option<&str>, error: GatewayError, remaining: Option<usize>) {
        self.state
            .lock()
            .faults
            .insert((op, id.map(str::to_string)), Fault { error, remaining });
    }

    /// Removes every scripted fault.
    pub fn clear_faults(&self) {
        self.state.lock().faults.clear();
    }

    /// Drops the interface's attachment as if the provider finished a
    /// detach on its own.
    pub fn settle_detach(&self, id: &str) {
        let mut state = self.state.lock();
        if let Some(index) = state.position(id) {
            let record = &mut state.interfaces[index];
            record.attachment = None;
            record.status = InterfaceStatus::Available;
        }
    }

    /// Current snapshot of one interface.
    pub fn interface(&self, id: &str) -> Option<NetworkInterfaceRecord> {
        let state = self.state.lock();
        state.position(id).map(|i| state.interfaces[i].clone())
    }

    pub fn interfaces(&self) -> Vec<NetworkInterfaceRecord> {
        self.state.lock().interfaces.clone()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.interface(id).is_some()
    }

    /// Tags currently on an interface (empty if it is gone).
    pub fn tags(&self, id: &str) -> BTreeMap<String, String> {
        self.interface(id).map(|r| r.tags).unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().journal.clone()
    }

    /// Journaled calls of one operation, in order.
    pub fn calls_of(&self, op: Operation) -> Vec<String> {
        self.state
            .lock()
            .journal
            .iter()
            .filter(|c| c.op == op)
            .map(|c| c.target.clone())
            .collect()
    }

    pub fn mutation_count(&self) -> usize {
        self.state
            .lock()
            .journal
            .iter()
            .filter(|c| c.op.is_mutation())
            .count()
    }

    /// Most calls that were ever in progress at once.
    pub fn max_in_flight(&self) -> usize {
        self.state.lock().max_in_flight
    }

    /// Journals the call, waits the configured latency and returns the
    /// scripted fault, if any.
    async fn enter(&self, op: Operation, target: &str) -> Option<GatewayError> {
        {
            let mut state = self.state.lock();
            state.journal.push(Call {
                op,
                target: target.to_string(),
            });
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let mut state = self.state.lock();
        state.in_flight -= 1;
        state.take_fault(op, target)
    }
}

#[async_trait]
impl NetworkInterfaceGateway for InMemoryGateway {
    async fn list_interfaces(&self, filter: &ListFilter) -> GatewayResult<Vec<NetworkInterfaceRecord>> {
        if let Some(err) = self.enter(Operation::List, &self.region).await {
            return Err(err);
        }
        let state = self.state.lock();
        Ok(state
            .interfaces
            .iter()
            .filter(|r| match filter.security_group_id.as_deref() {
                Some(group) => r.has_security_group(group),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn describe_interface(&self, id: &str) -> GatewayResult<Option<NetworkInterfaceRecord>> {
        if let Some(err) = self.enter(Operation::Describe, id).await {
            return Err(err);
        }
        Ok(self.interface(id))
    }

    async fn modify_security_groups(&self, id: &str, groups: &[String]) -> GatewayResult<()> {
        if let Some(err) = self.enter(Operation::ModifyGroups, id).await {
            return Err(err);
        }
        let mut state = self.state.lock();
        let index = state.position(id).ok_or_else(|| GatewayError::not_found(id))?;
        state.interfaces[index].security_group_ids = groups.to_vec();
        Ok(())
    }

    async fn detach(&self, attachment_id: &str, _force: bool) -> GatewayResult<()> {
        let owner = {
            let state = self.state.lock();
            state
                .owner_of_attachment(attachment_id)
                .map(|i| state.interfaces[i].id.clone())
        };
        let target = owner.as_deref().unwrap_or(attachment_id);
        if let Some(err) = self.enter(Operation::Detach, target).await {
            return Err(err);
        }

        let mut state = self.state.lock();
        let index = state
            .owner_of_attachment(attachment_id)
            .ok_or_else(|| GatewayError::not_found(attachment_id))?;
        let record = &mut state.interfaces[index];
        if self.detach_settles {
            record.attachment = None;
            record.status = InterfaceStatus::Available;
        } else if let Some(attachment) = record.attachment.as_mut() {
            attachment.status = Some(AttachmentState::Detaching);
        }
        Ok(())
    }

    async fn delete_interface(&self, id: &str) -> GatewayResult<()> {
        if let Some(err) = self.enter(Operation::Delete, id).await {
            return Err(err);
        }
        let mut state = self.state.lock();
        let index = state.position(id).ok_or_else(|| GatewayError::not_found(id))?;
        if state.interfaces[index].needs_detach() {
            return Err(GatewayError::api_with_code(
                "DeleteNetworkInterface",
                "InvalidNetworkInterface.InUse",
                format!("The interface {} is currently in use.", id),
            ));
        }
        state.interfaces.remove(index);
        Ok(())
    }

    async fn create_tags(&self, id: &str, tags: &[(String, String)]) -> GatewayResult<()> {
        if let Some(err) = self.enter(Operation::CreateTags, id).await {
            return Err(err);
        }
        let mut state = self.state.lock();
        let index = state.position(id).ok_or_else(|| GatewayError::not_found(id))?;
        let record = &mut state.interfaces[index];
        for (key, value) in tags {
            record.tags.insert(key.clone(), value.clone());
        }
        Ok(())
    }
}

/// Hands out [`InMemoryGateway`]s by region.
#[derive(Default)]
pub struct InMemoryGatewayFactory {
    gateways: HashMap<String, Arc<InMemoryGateway>>,
    unavailable: HashMap<String, String>,
}

impl InMemoryGatewayFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a gateway under its own region.
    pub fn with_gateway(mut self, gateway: Arc<InMemoryGateway>) -> Self {
        self.gateways.insert(gateway.region.clone(), gateway);
        self
    }

    /// Makes client construction fail for `region`.
    pub fn with_unavailable_region(mut self, region: impl Into<String>, message: impl Into<String>) -> Self {
        self.unavailable.insert(region.into(), message.into());
        self
    }
}

#[async_trait]
impl GatewayFactory for InMemoryGatewayFactory {
    async fn gateway(&self, region: &str) -> GatewayResult<Arc<dyn NetworkInterfaceGateway>> {
        if let Some(message) = self.unavailable.get(region) {
            return Err(GatewayError::client(region, message.clone()));
        }
        match self.gateways.get(region) {
            Some(gateway) => Ok(Arc::clone(gateway) as Arc<dyn NetworkInterfaceGateway>),
            None => Err(GatewayError::client(region, "no gateway registered")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{attached_eni, available_eni, eni_with_groups};

    #[tokio::test]
    async fn test_scripted_fault_expires() {
        let gateway = InMemoryGateway::new("us-east-1").with_interfaces([available_eni("eni-1")]);
        gateway.fail_times(
            Operation::Delete,
            Some("eni-1"),
            1,
            GatewayError::api("DeleteNetworkInterface", "throttled"),
        );

        assert!(gateway.delete_interface("eni-1").await.is_err());
        assert!(gateway.delete_interface("eni-1").await.is_ok());
        assert!(!gateway.contains("eni-1"));
        assert!(gateway.delete_interface("eni-1").await.unwrap_err().is_not_found());
        assert_eq!(gateway.calls_of(Operation::Delete).len(), 3);
    }

    #[tokio::test]
    async fn test_list_filter_by_group() {
        let gateway = InMemoryGateway::new("us-east-1").with_interfaces([
            eni_with_groups("eni-1", &["sg-a"]),
            eni_with_groups("eni-2", &["sg-b"]),
        ]);
        let listed = gateway
            .list_interfaces(&ListFilter::by_security_group("sg-b"))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "eni-2");
    }

    #[tokio::test]
    async fn test_attached_interface_cannot_be_deleted() {
        let gateway = InMemoryGateway::new("us-east-1").with_interfaces([attached_eni("eni-1", "attach-1")]);
        assert!(gateway.delete_interface("eni-1").await.is_err());

        gateway.detach("attach-1", true).await.unwrap();
        assert_eq!(gateway.calls_of(Operation::Detach), vec!["eni-1"]);
        assert!(gateway.delete_interface("eni-1").await.is_ok());
    }

    #[tokio::test]
    async fn test_factory_unavailable_region() {
        let factory = InMemoryGatewayFactory::new()
            .with_gateway(Arc::new(InMemoryGateway::new("us-east-1")))
            .with_unavailable_region("eu-west-1", "expired token");
        assert!(factory.gateway("us-east-1").await.is_ok());
        assert!(factory.gateway("eu-west-1").await.is_err());
        assert!(factory.gateway("ap-south-1").await.is_err());
    }
}
