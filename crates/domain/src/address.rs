use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AddressAttributes {
    /// Authority to use when connecting, set for balancer addresses found via SRV.
    pub authority: Option<Arc<str>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointAddress {
    pub address: SocketAddr,
    pub attributes: AddressAttributes,
}

impl EndpointAddress {
    pub fn new(address: SocketAddr) -> Self {
        Self {
            address,
            attributes: AddressAttributes::default(),
        }
    }

    pub fn with_authority(address: SocketAddr, authority: impl Into<Arc<str>>) -> Self {
        Self {
            address,
            attributes: AddressAttributes {
                authority: Some(authority.into()),
            },
        }
    }
}

impl fmt::Display for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attributes.authority {
            Some(authority) => write!(f, "{} ({})", self.address, authority),
            None => write!(f, "{}", self.address),
        }
    }
}

/// Load-balancer addresses discovered through the SRV-then-hostname chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalancerAddresses(pub Vec<EndpointAddress>);

impl BalancerAddresses {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EndpointAddress> {
        self.0.iter()
    }
}

impl From<Vec<EndpointAddress>> for BalancerAddresses {
    fn from(addresses: Vec<EndpointAddress>) -> Self {
        Self(addresses)
    }
}
