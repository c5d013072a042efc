use rpcdns_application::ports::DnsLookup;
use rpcdns_infrastructure::HickoryDnsLookup;
use std::net::SocketAddr;

fn unreachable_server() -> SocketAddr {
    "127.0.0.1:1".parse().unwrap()
}

#[tokio::test]
async fn test_ipv4_literal_resolves_without_network() {
    let lookup = HickoryDnsLookup::with_server(unreachable_server());

    let addresses = lookup.lookup_hostname("192.0.2.10", 8443).await.unwrap();

    assert_eq!(addresses, vec!["192.0.2.10:8443".parse::<SocketAddr>().unwrap()]);
}

#[tokio::test]
async fn test_ipv6_literal_resolves_without_network() {
    let lookup = HickoryDnsLookup::with_server(unreachable_server());

    let addresses = lookup.lookup_hostname("2001:db8::1", 443).await.unwrap();

    assert_eq!(addresses, vec!["[2001:db8::1]:443".parse::<SocketAddr>().unwrap()]);
}

#[tokio::test]
async fn test_for_authority_prefers_explicit_server() {
    let lookup = HickoryDnsLookup::for_authority(Some(unreachable_server())).unwrap();

    let addresses = lookup.lookup_hostname("10.1.2.3", 50051).await.unwrap();

    assert_eq!(addresses.len(), 1);
    assert_eq!(addresses[0].port(), 50051);
}
