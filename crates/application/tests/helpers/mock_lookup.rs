#![allow(dead_code)]

use async_trait::async_trait;
use rpcdns_application::ports::{DnsLookup, ServiceConfigParser};
use rpcdns_application::use_cases::AttemptContext;
use rpcdns_domain::{DomainError, ResolverConfig, ResolverTarget, ServiceConfig, SrvRecord};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How a scripted lookup settles.
#[derive(Clone)]
enum Reply<T> {
    After(Duration, Result<T, DomainError>),
    Never,
}

impl<T> Reply<T> {
    async fn settle(self) -> Result<T, DomainError> {
        match self {
            Reply::After(delay, result) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                result
            }
            Reply::Never => std::future::pending().await,
        }
    }
}

/// Scripted [`DnsLookup`]. Names without a script answer `NXDOMAIN`.
#[derive(Clone, Default)]
pub struct MockDnsLookup {
    hosts: Arc<Mutex<HashMap<String, Reply<Vec<IpAddr>>>>>,
    srv: Arc<Mutex<HashMap<String, Reply<Vec<SrvRecord>>>>>,
    txt: Arc<Mutex<HashMap<String, Reply<Vec<String>>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockDnsLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_host(&self, name: &str, ips: &[&str]) {
        self.set_host_delayed(name, ips, Duration::ZERO);
    }

    pub fn set_host_delayed(&self, name: &str, ips: &[&str], delay: Duration) {
        let ips = ips.iter().map(|ip| ip.parse().unwrap()).collect();
        self.hosts
            .lock()
            .unwrap()
            .insert(name.to_string(), Reply::After(delay, Ok(ips)));
    }

    pub fn set_host_error(&self, name: &str, error: DomainError) {
        self.hosts
            .lock()
            .unwrap()
            .insert(name.to_string(), Reply::After(Duration::ZERO, Err(error)));
    }

    pub fn set_host_hanging(&self, name: &str) {
        self.hosts
            .lock()
            .unwrap()
            .insert(name.to_string(), Reply::Never);
    }

    pub fn set_srv(&self, name: &str, records: Vec<SrvRecord>) {
        self.srv
            .lock()
            .unwrap()
            .insert(name.to_string(), Reply::After(Duration::ZERO, Ok(records)));
    }

    pub fn set_srv_delayed(&self, name: &str, records: Vec<SrvRecord>, delay: Duration) {
        self.srv
            .lock()
            .unwrap()
            .insert(name.to_string(), Reply::After(delay, Ok(records)));
    }

    pub fn set_srv_hanging(&self, name: &str) {
        self.srv.lock().unwrap().insert(name.to_string(), Reply::Never);
    }

    pub fn set_txt(&self, name: &str, records: &[&str]) {
        let records = records.iter().map(|r| r.to_string()).collect();
        self.txt
            .lock()
            .unwrap()
            .insert(name.to_string(), Reply::After(Duration::ZERO, Ok(records)));
    }

    pub fn set_txt_delayed(&self, name: &str, records: &[&str], delay: Duration) {
        let records = records.iter().map(|r| r.to_string()).collect();
        self.txt
            .lock()
            .unwrap()
            .insert(name.to_string(), Reply::After(delay, Ok(records)));
    }

    pub fn set_txt_error(&self, name: &str, error: DomainError) {
        self.txt
            .lock()
            .unwrap()
            .insert(name.to_string(), Reply::After(Duration::ZERO, Err(error)));
    }

    /// Every lookup issued so far, as `kind:name[:port]`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DnsLookup for MockDnsLookup {
    async fn lookup_hostname(
        &self,
        name: &str,
        default_port: u16,
    ) -> Result<Vec<SocketAddr>, DomainError> {
        self.record(format!("host:{}:{}", name, default_port));
        let reply = self.hosts.lock().unwrap().get(name).cloned();
        match reply {
            Some(reply) => reply.settle().await.map(|ips| {
                ips.into_iter()
                    .map(|ip| SocketAddr::new(ip, default_port))
                    .collect()
            }),
            None => Err(DomainError::NxDomain),
        }
    }

    async fn lookup_srv(&self, name: &str) -> Result<Vec<SrvRecord>, DomainError> {
        self.record(format!("srv:{}", name));
        let reply = self.srv.lock().unwrap().get(name).cloned();
        match reply {
            Some(reply) => reply.settle().await,
            None => Err(DomainError::NxDomain),
        }
    }

    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DomainError> {
        self.record(format!("txt:{}", name));
        let reply = self.txt.lock().unwrap().get(name).cloned();
        match reply {
            Some(reply) => reply.settle().await,
            None => Err(DomainError::NxDomain),
        }
    }
}

/// Accepts a bare JSON object as the service config.
#[derive(Default)]
pub struct MockServiceConfigParser;

impl ServiceConfigParser for MockServiceConfigParser {
    fn parse(&self, payload: &str) -> Result<Option<ServiceConfig>, DomainError> {
        match serde_json::from_str::<serde_json::Value>(payload) {
            Ok(serde_json::Value::Object(object)) => Ok(Some(ServiceConfig::from_object(object))),
            Ok(serde_json::Value::Null) => Ok(None),
            Ok(_) => Err(DomainError::InvalidServiceConfig(
                "expected a JSON object".to_string(),
            )),
            Err(e) => Err(DomainError::InvalidServiceConfig(e.to_string())),
        }
    }
}

pub fn make_context(name: &str, lookup: &MockDnsLookup, config: &ResolverConfig) -> AttemptContext {
    AttemptContext::new(
        Arc::new(ResolverTarget::parse(name).unwrap()),
        Arc::new(lookup.clone()),
        Arc::new(MockServiceConfigParser),
        config,
    )
}
