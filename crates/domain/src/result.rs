use crate::address::{BalancerAddresses, EndpointAddress};
use crate::service_config::ServiceConfig;
use crate::status::Status;

/// The outcome of one resolution attempt, handed to the channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolverResult {
    /// `None` means the resolver has no opinion; `Some(Ok(vec![]))` is a real empty list.
    pub addresses: Option<Result<Vec<EndpointAddress>, Status>>,
    pub service_config: Option<Result<ServiceConfig, Status>>,
    pub balancer_addresses: Option<BalancerAddresses>,
    pub resolution_note: Option<String>,
}

impl ResolverResult {
    pub fn failure(status: Status) -> Self {
        Self {
            addresses: Some(Err(status.clone())),
            service_config: Some(Err(status)),
            balancer_addresses: None,
            resolution_note: None,
        }
    }

    /// True when the address list is present and not an error.
    pub fn is_success(&self) -> bool {
        matches!(self.addresses, Some(Ok(_)))
    }

    pub fn address_error(&self) -> Option<&Status> {
        match &self.addresses {
            Some(Err(status)) => Some(status),
            _ => None,
        }
    }

    pub fn address_count(&self) -> usize {
        match &self.addresses {
            Some(Ok(addresses)) => addresses.len(),
            _ => 0,
        }
    }

    pub fn set_balancer_addresses(&mut self, addresses: Vec<EndpointAddress>) {
        if addresses.is_empty() {
            self.balancer_addresses = None;
        } else {
            self.balancer_addresses = Some(BalancerAddresses(addresses));
        }
    }
}
