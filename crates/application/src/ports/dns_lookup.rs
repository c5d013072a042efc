use async_trait::async_trait;
use rpcdns_domain::{DomainError, SrvRecord};
use std::net::SocketAddr;

/// Primitive DNS queries. Each call completes exactly once; dropping the
/// future abandons the query.
#[async_trait]
pub trait DnsLookup: Send + Sync {
    async fn lookup_hostname(
        &self,
        name: &str,
        default_port: u16,
    ) -> Result<Vec<SocketAddr>, DomainError>;

    async fn lookup_srv(&self, name: &str) -> Result<Vec<SrvRecord>, DomainError>;

    /// One string per TXT record, with multi-chunk records already joined.
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DomainError>;
}
