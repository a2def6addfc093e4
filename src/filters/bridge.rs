//! Conversions between wire scalars and storage-typed nullable values
//!
//! Every conversion here is lenient: malformed input becomes `None` and is logged
//! at debug level instead of producing an error. For read filters a `None` means
//! "filter not applied", for payload fields it means "field not set".

use chrono::{DateTime, Utc};
use ipnet::IpNet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::net::IpAddr;
use std::str::FromStr;
use tracing::debug;

/// Parse `input` with `parse`, returning `None` on empty or malformed input.
///
/// All lenient conversions in this module go through here so the policy lives in
/// one place.
pub fn try_parse_or_default<T, E, F>(kind: &str, input: &str, parse: F) -> Option<T>
where
    F: FnOnce(&str) -> Result<T, E>,
    E: Display,
{
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    match parse(trimmed) {
        Ok(v) => Some(v),
        Err(e) => {
            debug!("ignoring malformed {} value '{}': {}", kind, trimmed, e);
            None
        }
    }
}

// =============================================================================
// IP networks
// =============================================================================

/// Parse an address or network, adding a host-route suffix when none is given.
///
/// `10.0.0.1` becomes `10.0.0.1/32`, `2001:db8::1` becomes `2001:db8::1/128`.
pub fn parse_inet(input: &str) -> Option<IpNet> {
    try_parse_or_default("network", input, |s| {
        if s.contains('/') {
            IpNet::from_str(s)
        } else if s.contains(':') {
            IpNet::from_str(&format!("{}/128", s))
        } else {
            IpNet::from_str(&format!("{}/32", s))
        }
    })
}

pub fn inet_to_string(net: Option<&IpNet>) -> Option<String> {
    net.map(|n| n.to_string())
}

/// Parse an IPv4 address or network; other families are treated as not set.
pub fn parse_inet4(input: &str) -> Option<IpNet> {
    parse_inet(input).filter(|net| expect_family(input, matches!(net, IpNet::V4(_))))
}

/// Parse an IPv6 address or network; other families are treated as not set.
pub fn parse_inet6(input: &str) -> Option<IpNet> {
    parse_inet(input).filter(|net| expect_family(input, matches!(net, IpNet::V6(_))))
}

fn expect_family(input: &str, ok: bool) -> bool {
    if !ok {
        debug!("ignoring address '{}' of the wrong family", input.trim());
    }
    ok
}

/// Family tags leading every encoded address
const FAMILY_V4: u8 = 4;
const FAMILY_V6: u8 = 6;

/// Encode an address as a family tag followed by its octets.
///
/// Encoded values of one family compare in address order, and every IPv4
/// value sorts below every IPv6 value, so a range of one family never spans
/// addresses of the other.
pub fn ip_to_bytes(ip: IpAddr) -> Vec<u8> {
    let mut out = Vec::with_capacity(17);
    match ip {
        IpAddr::V4(v4) => {
            out.push(FAMILY_V4);
            out.extend_from_slice(&v4.octets());
        }
        IpAddr::V6(v6) => {
            out.push(FAMILY_V6);
            out.extend_from_slice(&v6.octets());
        }
    }
    out
}

/// First and last address of a network in the [`ip_to_bytes`] encoding.
pub fn network_range(net: &IpNet) -> (Vec<u8>, Vec<u8>) {
    (ip_to_bytes(net.network()), ip_to_bytes(net.broadcast()))
}

// =============================================================================
// MAC addresses
// =============================================================================

/// A hardware address of 6 (EUI-48) or 8 (EUI-64) octets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacAddr {
    Eui48([u8; 6]),
    Eui64([u8; 8]),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid MAC address")]
pub struct MacParseError;

impl MacAddr {
    pub fn octets(&self) -> &[u8] {
        match self {
            MacAddr::Eui48(o) => o,
            MacAddr::Eui64(o) => o,
        }
    }

    fn from_octets(octets: Vec<u8>) -> Result<Self, MacParseError> {
        match octets.len() {
            6 => {
                let mut o = [0u8; 6];
                o.copy_from_slice(&octets);
                Ok(MacAddr::Eui48(o))
            }
            8 => {
                let mut o = [0u8; 8];
                o.copy_from_slice(&octets);
                Ok(MacAddr::Eui64(o))
            }
            _ => Err(MacParseError),
        }
    }
}

impl FromStr for MacAddr {
    type Err = MacParseError;

    /// Accepts `00:00:5e:00:53:01`, `00-00-5e-00-53-01` and `0000.5e00.5301`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_pair = |p: &str| {
            if p.len() == 2 {
                u8::from_str_radix(p, 16).map_err(|_| MacParseError)
            } else {
                Err(MacParseError)
            }
        };

        let octets = if s.contains(':') {
            s.split(':').map(hex_pair).collect::<Result<Vec<_>, _>>()?
        } else if s.contains('-') {
            s.split('-').map(hex_pair).collect::<Result<Vec<_>, _>>()?
        } else if s.contains('.') {
            let mut octets = Vec::new();
            for group in s.split('.') {
                if group.len() != 4 || !group.is_ascii() {
                    return Err(MacParseError);
                }
                octets.push(hex_pair(&group[..2])?);
                octets.push(hex_pair(&group[2..])?);
            }
            octets
        } else {
            return Err(MacParseError);
        };

        MacAddr::from_octets(octets)
    }
}

impl Display for MacAddr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let text = self
            .octets()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(":");
        f.write_str(&text)
    }
}

impl Serialize for MacAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        MacAddr::from_str(&s).map_err(serde::de::Error::custom)
    }
}

pub fn parse_mac(input: &str) -> Option<MacAddr> {
    try_parse_or_default("MAC address", input, MacAddr::from_str)
}

pub fn mac_to_string(mac: Option<&MacAddr>) -> Option<String> {
    mac.map(|m| m.to_string())
}

// =============================================================================
// Plain scalars
// =============================================================================

/// Pointer semantics: absent stays absent, an empty string stays an empty string.
pub fn nullable_string(value: Option<String>) -> Option<String> {
    value
}

/// For call sites that treat an empty string as "not set".
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

pub fn nullable_int(value: Option<i64>) -> Option<i64> {
    value
}

/// For call sites that treat zero as "not set".
pub fn non_zero(value: Option<i64>) -> Option<i64> {
    value.filter(|v| *v != 0)
}

pub fn parse_int(input: &str) -> Option<i64> {
    try_parse_or_default("integer", input, i64::from_str)
}

/// Milliseconds since the Unix epoch, base 10.
pub fn parse_millis(input: &str) -> Option<DateTime<Utc>> {
    let millis = try_parse_or_default("timestamp", input, i64::from_str)?;
    let ts = DateTime::from_timestamp_millis(millis);
    if ts.is_none() {
        debug!("ignoring out-of-range timestamp '{}'", input);
    }
    ts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inet_adds_host_suffix() {
        assert_eq!(
            parse_inet("10.0.0.1"),
            Some(IpNet::from_str("10.0.0.1/32").unwrap())
        );
        assert_eq!(
            parse_inet("2001:db8::1"),
            Some(IpNet::from_str("2001:db8::1/128").unwrap())
        );
    }

    #[test]
    fn test_parse_inet_keeps_prefix() {
        let net = parse_inet("10.0.0.0/24").unwrap();
        assert_eq!(net.to_string(), "10.0.0.0/24");
        assert_eq!(net.prefix_len(), 24);
    }

    #[test]
    fn test_parse_inet_lenient() {
        assert_eq!(parse_inet("not-an-ip"), None);
        assert_eq!(parse_inet(""), None);
        assert_eq!(parse_inet("   "), None);
        assert_eq!(parse_inet("10.0.0.0/33"), None);
    }

    #[test]
    fn test_network_range() {
        let net = parse_inet("10.0.0.0/24").unwrap();
        let (start, end) = network_range(&net);
        assert!(start < end);

        let host = parse_inet("10.0.0.7").unwrap();
        let (h_start, h_end) = network_range(&host);
        assert_eq!(h_start, h_end);
        assert!(h_start >= start && h_end <= end);

        let other = parse_inet("10.0.1.7").unwrap();
        let (o_start, _) = network_range(&other);
        assert!(o_start > end);
    }

    #[test]
    fn test_network_range_keeps_families_apart() {
        let (v4, _) = network_range(&parse_inet("10.0.0.1").unwrap());

        let (all_start, all_end) = network_range(&parse_inet("::/0").unwrap());
        assert!(v4 < all_start);
        assert!(all_start < all_end);

        let mapped = parse_inet("::ffff:10.0.0.0/120").unwrap();
        let (m_start, m_end) = network_range(&mapped);
        assert!(!(v4 >= m_start && v4 <= m_end));

        let (v4_all_start, v4_all_end) = network_range(&parse_inet("0.0.0.0/0").unwrap());
        assert!(v4 >= v4_all_start && v4 <= v4_all_end);
        assert!(v4_all_end < all_start);
    }

    #[test]
    fn test_parse_inet_by_family() {
        assert_eq!(
            parse_inet4("192.0.2.1").map(|n| n.to_string()).as_deref(),
            Some("192.0.2.1/32")
        );
        assert_eq!(parse_inet4("2001:db8::1"), None);
        assert_eq!(
            parse_inet6("2001:db8::/64").map(|n| n.to_string()).as_deref(),
            Some("2001:db8::/64")
        );
        assert_eq!(parse_inet6("192.0.2.1"), None);
        assert_eq!(parse_inet6("garbage"), None);
    }

    #[test]
    fn test_parse_mac_formats() {
        let expected = "00:00:5e:00:53:01";
        assert_eq!(parse_mac("00:00:5e:00:53:01").unwrap().to_string(), expected);
        assert_eq!(parse_mac("00-00-5E-00-53-01").unwrap().to_string(), expected);
        assert_eq!(parse_mac("0000.5e00.5301").unwrap().to_string(), expected);
        assert_eq!(
            parse_mac("02:00:5e:10:00:00:00:01").unwrap().to_string(),
            "02:00:5e:10:00:00:00:01"
        );
    }

    #[test]
    fn test_parse_mac_lenient() {
        assert_eq!(parse_mac(""), None);
        assert_eq!(parse_mac("00:00:5e:00:53"), None);
        assert_eq!(parse_mac("00:00:5e:00:53:zz"), None);
        assert_eq!(parse_mac("0:0:5e:0:53:1"), None);
        assert_eq!(parse_mac("00005e005301"), None);
    }

    #[test]
    fn test_mac_serde() {
        let mac = parse_mac("00-00-5e-00-53-01").unwrap();
        let json = serde_json::to_string(&mac).unwrap();
        assert_eq!(json, "\"00:00:5e:00:53:01\"");
        let back: MacAddr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mac);
    }

    #[test]
    fn test_scalar_pointer_semantics() {
        assert_eq!(nullable_string(None), None);
        assert_eq!(nullable_string(Some(String::new())), Some(String::new()));
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(Some("x".to_string())), Some("x".to_string()));
        assert_eq!(nullable_int(Some(0)), Some(0));
        assert_eq!(non_zero(Some(0)), None);
    }

    #[test]
    fn test_parse_millis() {
        let ts = parse_millis("1700000000000").unwrap();
        assert_eq!(ts.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(ts.timestamp(), 1_700_000_000);

        assert_eq!(parse_millis("yesterday"), None);
        assert_eq!(parse_millis("1.5"), None);
        assert_eq!(parse_millis(""), None);
        assert_eq!(parse_millis(&i64::MAX.to_string()), None);
    }
}
