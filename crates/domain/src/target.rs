use crate::errors::DomainError;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

/// Port used for hostname lookups when the target does not name one.
pub const DEFAULT_PORT: u16 = 443;

const DEFAULT_DNS_PORT: u16 = 53;
const SRV_PREFIX: &str = "_grpclb._tcp.";
const TXT_PREFIX: &str = "_grpc_config.";

/// A logical name to resolve, fixed for the lifetime of a driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverTarget {
    name: Arc<str>,
    host: Arc<str>,
    port: Option<u16>,
    dns_server: Option<SocketAddr>,
}

impl ResolverTarget {
    /// Parses `host`, `host:port`, `[v6]:port` or a bare IPv6 literal.
    pub fn parse(name: &str) -> Result<Self, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::InvalidTarget("target name is empty".to_string()));
        }

        let (host, port) = split_host_port(name)?;
        if host.is_empty() {
            return Err(DomainError::InvalidTarget(format!("no host in target '{}'", name)));
        }

        Ok(Self {
            name: Arc::from(name),
            host: Arc::from(host),
            port,
            dns_server: None,
        })
    }

    /// Sets the DNS server to query instead of the system default (`ip[:port]`).
    pub fn with_authority(mut self, authority: &str) -> Result<Self, DomainError> {
        let authority = authority.trim();
        if authority.is_empty() {
            self.dns_server = None;
            return Ok(self);
        }
        let server = match authority.parse::<SocketAddr>() {
            Ok(addr) => addr,
            Err(_) => {
                let ip: IpAddr = authority
                    .trim_start_matches('[')
                    .trim_end_matches(']')
                    .parse()
                    .map_err(|_| {
                        DomainError::InvalidTarget(format!(
                            "invalid DNS server authority '{}'",
                            authority
                        ))
                    })?;
                SocketAddr::new(ip, DEFAULT_DNS_PORT)
            }
        };
        self.dns_server = Some(server);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn dns_server(&self) -> Option<SocketAddr> {
        self.dns_server
    }

    /// `localhost` has no SRV or TXT records worth asking for.
    pub fn is_localhost(&self) -> bool {
        self.host.eq_ignore_ascii_case("localhost")
    }

    pub fn srv_query_name(&self) -> String {
        format!("{}{}", SRV_PREFIX, self.host)
    }

    pub fn txt_query_name(&self) -> String {
        format!("{}{}", TXT_PREFIX, self.host)
    }
}

impl fmt::Display for ResolverTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

fn split_host_port(name: &str) -> Result<(&str, Option<u16>), DomainError> {
    if let Some(rest) = name.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or_else(|| {
            DomainError::InvalidTarget(format!("unterminated '[' in target '{}'", name))
        })?;
        return match tail {
            "" => Ok((host, None)),
            _ => match tail.strip_prefix(':') {
                Some(port) => Ok((host, parse_port(name, port)?)),
                None => Err(DomainError::InvalidTarget(format!(
                    "unexpected characters after ']' in target '{}'",
                    name
                ))),
            },
        };
    }

    // More than one colon without brackets can only be an IPv6 literal.
    if name.matches(':').count() > 1 {
        return Ok((name, None));
    }

    match name.split_once(':') {
        Some((host, port)) => Ok((host, parse_port(name, port)?)),
        None => Ok((name, None)),
    }
}

fn parse_port(name: &str, port: &str) -> Result<Option<u16>, DomainError> {
    if port.is_empty() {
        return Ok(None);
    }
    port.parse::<u16>()
        .map(Some)
        .map_err(|_| DomainError::InvalidTarget(format!("invalid port '{}' in target '{}'", port, name)))
}
