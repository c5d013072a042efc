//! Destination address ordering after RFC 6724 section 6.
//!
//! Only the rules that depend on the destination alone are applied: higher
//! precedence first (rule 6), then smaller scope (rule 8). Ties keep the
//! order the lookups produced them in (rule 10). IPv4 destinations are
//! ranked as their IPv4-mapped IPv6 form.

use rpcdns_domain::EndpointAddress;
use std::cmp::Reverse;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

const SCOPE_LINK_LOCAL: u8 = 0x2;
const SCOPE_SITE_LOCAL: u8 = 0x5;
const SCOPE_GLOBAL: u8 = 0xe;

const PRECEDENCE_LOOPBACK: u8 = 50;
const PRECEDENCE_DEFAULT: u8 = 40;
const PRECEDENCE_V4_MAPPED: u8 = 35;

/// Default policy table, most specific prefix first. `::/0` is the fallback.
const POLICY_TABLE: &[(u128, u32, u8)] = &[
    (0x0000_0000_0000_0000_0000_0000_0000_0001, 128, PRECEDENCE_LOOPBACK),
    (0x0000_0000_0000_0000_0000_ffff_0000_0000, 96, PRECEDENCE_V4_MAPPED),
    (0x0000_0000_0000_0000_0000_0000_0000_0000, 96, 1),
    (0x2001_0000_0000_0000_0000_0000_0000_0000, 32, 5),
    (0x2002_0000_0000_0000_0000_0000_0000_0000, 16, 30),
    (0x3ffe_0000_0000_0000_0000_0000_0000_0000, 16, 1),
    (0xfec0_0000_0000_0000_0000_0000_0000_0000, 10, 1),
    (0xfc00_0000_0000_0000_0000_0000_0000_0000, 7, 3),
];

/// Stable in-place sort of `addresses` into preferred connection order.
pub fn sort_addresses(addresses: &mut [EndpointAddress]) {
    addresses.sort_by_key(|endpoint| {
        let ip = endpoint.address.ip();
        (Reverse(precedence(ip)), scope(ip))
    });
}

pub fn precedence(ip: IpAddr) -> u8 {
    let v6 = match ip {
        IpAddr::V4(v4) => v4.to_ipv6_mapped(),
        IpAddr::V6(v6) => v6,
    };
    let bits = u128::from(v6);
    POLICY_TABLE
        .iter()
        .find(|(prefix, len, _)| matches_prefix(bits, *prefix, *len))
        .map_or(PRECEDENCE_DEFAULT, |(_, _, precedence)| *precedence)
}

fn matches_prefix(bits: u128, prefix: u128, len: u32) -> bool {
    let mask = u128::MAX.checked_shl(128 - len).unwrap_or(0);
    bits & mask == prefix & mask
}

/// Scope value; lower means narrower.
pub fn scope(ip: IpAddr) -> u8 {
    match ip {
        IpAddr::V4(v4) => scope_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => scope_v4(v4),
            None => scope_v6(v6),
        },
    }
}

fn scope_v4(ip: Ipv4Addr) -> u8 {
    if ip.is_loopback() || ip.is_link_local() {
        SCOPE_LINK_LOCAL
    } else {
        SCOPE_GLOBAL
    }
}

fn scope_v6(ip: Ipv6Addr) -> u8 {
    let first = ip.segments()[0];
    if ip.is_multicast() {
        (first & 0x000f) as u8
    } else if ip.is_loopback() || first & 0xffc0 == 0xfe80 {
        SCOPE_LINK_LOCAL
    } else if first & 0xffc0 == 0xfec0 {
        SCOPE_SITE_LOCAL
    } else {
        SCOPE_GLOBAL
    }
}
