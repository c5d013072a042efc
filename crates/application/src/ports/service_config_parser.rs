use rpcdns_domain::{DomainError, ServiceConfig};

pub trait ServiceConfigParser: Send + Sync {
    /// `Ok(None)` means the payload is valid but holds nothing for this client.
    fn parse(&self, payload: &str) -> Result<Option<ServiceConfig>, DomainError>;
}
