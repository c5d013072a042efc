use rpcdns_domain::{DomainError, ResolverTarget, DEFAULT_PORT};
use std::net::SocketAddr;

#[test]
fn test_parse_host_only_uses_default_port() {
    let target = ResolverTarget::parse("svc.example.com").unwrap();

    assert_eq!(target.name(), "svc.example.com");
    assert_eq!(target.host(), "svc.example.com");
    assert_eq!(target.port(), None);
    assert_eq!(target.port_or_default(), DEFAULT_PORT);
}

#[test]
fn test_parse_host_and_port() {
    let target = ResolverTarget::parse("svc.example.com:8443").unwrap();

    assert_eq!(target.host(), "svc.example.com");
    assert_eq!(target.port(), Some(8443));
    assert_eq!(target.to_string(), "svc.example.com:8443");
}

#[test]
fn test_parse_bracketed_ipv6_with_port() {
    let target = ResolverTarget::parse("[2001:db8::1]:50051").unwrap();

    assert_eq!(target.host(), "2001:db8::1");
    assert_eq!(target.port(), Some(50051));
}

#[test]
fn test_parse_bare_ipv6() {
    let target = ResolverTarget::parse("2001:db8::1").unwrap();

    assert_eq!(target.host(), "2001:db8::1");
    assert_eq!(target.port(), None);
}

#[test]
fn test_parse_trailing_colon_means_default_port() {
    let target = ResolverTarget::parse("svc.example.com:").unwrap();

    assert_eq!(target.port_or_default(), 443);
}

#[test]
fn test_parse_rejects_bad_input() {
    for name in ["", "   ", ":443", "svc:http", "svc:70000", "[::1", "[::1]x"] {
        assert!(
            matches!(ResolverTarget::parse(name), Err(DomainError::InvalidTarget(_))),
            "{:?} should be rejected",
            name
        );
    }
}

#[test]
fn test_query_names_use_host() {
    let target = ResolverTarget::parse("svc.example.com:8443").unwrap();

    assert_eq!(target.srv_query_name(), "_grpclb._tcp.svc.example.com");
    assert_eq!(target.txt_query_name(), "_grpc_config.svc.example.com");
}

#[test]
fn test_authority_with_and_without_port() {
    let target = ResolverTarget::parse("svc").unwrap();

    let with_port = target.clone().with_authority("8.8.8.8:5353").unwrap();
    assert_eq!(
        with_port.dns_server(),
        Some("8.8.8.8:5353".parse::<SocketAddr>().unwrap())
    );

    let default_port = target.clone().with_authority("8.8.4.4").unwrap();
    assert_eq!(
        default_port.dns_server(),
        Some("8.8.4.4:53".parse::<SocketAddr>().unwrap())
    );

    let v6 = target.clone().with_authority("[2001:db8::53]").unwrap();
    assert_eq!(
        v6.dns_server(),
        Some("[2001:db8::53]:53".parse::<SocketAddr>().unwrap())
    );

    let cleared = with_port.with_authority("").unwrap();
    assert!(cleared.dns_server().is_none());
}

#[test]
fn test_authority_rejects_hostname() {
    let target = ResolverTarget::parse("svc").unwrap();

    assert!(target.with_authority("dns.example.com").is_err());
}

#[test]
fn test_localhost_matches_ignoring_case() {
    assert!(ResolverTarget::parse("localhost:50051").unwrap().is_localhost());
    assert!(ResolverTarget::parse("LocalHost").unwrap().is_localhost());
    assert!(!ResolverTarget::parse("localhost.example.com").unwrap().is_localhost());
    assert!(!ResolverTarget::parse("127.0.0.1").unwrap().is_localhost());
}
