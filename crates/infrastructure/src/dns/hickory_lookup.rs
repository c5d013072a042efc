use async_trait::async_trait;
use hickory_resolver::config::{
    LookupIpStrategy, NameServerConfigGroup, ResolverConfig as HickoryConfig,
};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::{ResolveError, TokioResolver};
use rpcdns_application::ports::DnsLookup;
use rpcdns_domain::{DomainError, SrvRecord};
use std::net::SocketAddr;
use tracing::{debug, info};

/// [`DnsLookup`] backed by hickory's tokio resolver.
pub struct HickoryDnsLookup {
    resolver: TokioResolver,
}

impl HickoryDnsLookup {
    /// Uses the system resolver configuration (`/etc/resolv.conf`).
    pub fn from_system_config() -> Result<Self, DomainError> {
        let mut builder = TokioResolver::builder_tokio().map_err(|e| {
            DomainError::LookupFailed(format!("failed to read system DNS config: {}", e))
        })?;
        apply_options(builder.options_mut());

        info!("Using system DNS configuration");
        Ok(Self {
            resolver: builder.build(),
        })
    }

    /// Sends every query to `server` over plain UDP/TCP.
    pub fn with_server(server: SocketAddr) -> Self {
        let group = NameServerConfigGroup::from_ips_clear(&[server.ip()], server.port(), true);
        let config = HickoryConfig::from_parts(None, vec![], group);
        let mut builder =
            TokioResolver::builder_with_config(config, TokioConnectionProvider::default());
        apply_options(builder.options_mut());

        info!(server = %server, "Using explicit DNS server");
        Self {
            resolver: builder.build(),
        }
    }

    /// Picks the explicit server when one is configured.
    pub fn for_authority(server: Option<SocketAddr>) -> Result<Self, DomainError> {
        match server {
            Some(server) => Ok(Self::with_server(server)),
            None => Self::from_system_config(),
        }
    }
}

fn apply_options(opts: &mut hickory_resolver::config::ResolverOpts) {
    opts.ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
    // Re-resolution must observe record changes.
    opts.cache_size = 0;
}

fn map_error(name: &str, e: ResolveError) -> DomainError {
    if e.is_nx_domain() {
        DomainError::NxDomain
    } else if e.is_no_records_found() {
        DomainError::NoRecords(name.to_string())
    } else {
        DomainError::LookupFailed(e.to_string())
    }
}

fn strip_root(name: String) -> String {
    match name.strip_suffix('.') {
        Some(stripped) => stripped.to_string(),
        None => name,
    }
}

#[async_trait]
impl DnsLookup for HickoryDnsLookup {
    async fn lookup_hostname(
        &self,
        name: &str,
        default_port: u16,
    ) -> Result<Vec<SocketAddr>, DomainError> {
        debug!(name = %name, port = default_port, "Hostname lookup");
        let lookup = self.resolver.lookup_ip(name).await.map_err(|e| map_error(name, e))?;
        Ok(lookup
            .iter()
            .map(|ip| SocketAddr::new(ip, default_port))
            .collect())
    }

    async fn lookup_srv(&self, name: &str) -> Result<Vec<SrvRecord>, DomainError> {
        debug!(name = %name, "SRV lookup");
        let lookup = self.resolver.srv_lookup(name).await.map_err(|e| map_error(name, e))?;
        Ok(lookup
            .iter()
            .map(|srv| SrvRecord {
                host: strip_root(srv.target().to_utf8()),
                port: srv.port(),
                priority: srv.priority(),
                weight: srv.weight(),
            })
            .collect())
    }

    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DomainError> {
        debug!(name = %name, "TXT lookup");
        let lookup = self.resolver.txt_lookup(name).await.map_err(|e| map_error(name, e))?;
        Ok(lookup
            .iter()
            .map(|txt| {
                txt.txt_data()
                    .iter()
                    .map(|chunk| String::from_utf8_lossy(chunk))
                    .collect::<String>()
            })
            .collect())
    }
}
