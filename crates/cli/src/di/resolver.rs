use rpcdns_application::ports::{DnsLookup, ServiceConfigParser};
use rpcdns_application::use_cases::AttemptContext;
use rpcdns_domain::{Config, ResolverTarget};
use rpcdns_infrastructure::{HickoryDnsLookup, JsonServiceConfigParser};
use std::sync::Arc;
use tracing::info;

pub struct ResolverServices {
    pub target: Arc<ResolverTarget>,
    pub lookup: Arc<dyn DnsLookup>,
    pub service_config_parser: Arc<dyn ServiceConfigParser>,
}

impl ResolverServices {
    pub fn new(config: &Config, target_name: &str) -> anyhow::Result<Self> {
        let mut target = ResolverTarget::parse(target_name)?;
        if let Some(server) = config.resolver.dns_server.as_deref() {
            target = target.with_authority(server)?;
        }

        info!(
            target_name = %target,
            host = target.host(),
            port = target.port_or_default(),
            dns_server = ?target.dns_server(),
            "Resolver target configured"
        );

        let lookup = HickoryDnsLookup::for_authority(target.dns_server())?;

        Ok(Self {
            target: Arc::new(target),
            lookup: Arc::new(lookup),
            service_config_parser: Arc::new(JsonServiceConfigParser::new()),
        })
    }

    pub fn attempt_context(&self, config: &Config) -> AttemptContext {
        AttemptContext::new(
            Arc::clone(&self.target),
            Arc::clone(&self.lookup),
            Arc::clone(&self.service_config_parser),
            &config.resolver,
        )
    }
}
