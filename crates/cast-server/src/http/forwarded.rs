//! Client identity behind reverse proxies
//!
//! The pairing flow needs the address of the device that scanned the code,
//! not the proxy's and never this server's own interface address. When
//! forwarding headers are trusted they are consulted in this order:
//!
//! 1. `Forwarded` (RFC 7239), first element
//! 2. `X-Forwarded-For`, first entry
//! 3. `X-Real-IP`
//!
//! and the TCP peer address is used when none yields an IP.

use std::net::{IpAddr, SocketAddr};

use axum::http::{header, HeaderMap};
use reqwest::Url;

/// First `key=value` parameter of the first `Forwarded` element
fn forwarded_param(headers: &HeaderMap, key: &str) -> Option<String> {
    let value = headers.get(header::FORWARDED)?.to_str().ok()?;
    let first = value.split(',').next()?;
    first.split(';').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        if k.trim().eq_ignore_ascii_case(key) {
            Some(v.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}

/// First comma-separated entry of a header
fn first_entry(headers: &HeaderMap, name: &str) -> Option<String> {
    let value = headers.get(name)?.to_str().ok()?;
    let first = value.split(',').next()?.trim();
    (!first.is_empty()).then(|| first.to_string())
}

/// Parse a node as found in forwarding headers: `1.2.3.4`, `1.2.3.4:80`,
/// `[2001:db8::1]`, `[2001:db8::1]:443` or a bare IPv6 address
fn parse_node(node: &str) -> Option<IpAddr> {
    let node = node.trim().trim_matches('"');

    if let Some(rest) = node.strip_prefix('[') {
        let (ip, _) = rest.split_once(']')?;
        return ip.parse().ok();
    }

    node.parse::<IpAddr>()
        .ok()
        .or_else(|| node.parse::<SocketAddr>().ok().map(|s| s.ip()))
}

/// Address of the client that sent the request
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr, trust_forwarded: bool) -> IpAddr {
    let forwarded = trust_forwarded
        .then(|| {
            forwarded_param(headers, "for")
                .and_then(|n| parse_node(&n))
                .or_else(|| first_entry(headers, "x-forwarded-for").and_then(|n| parse_node(&n)))
                .or_else(|| first_entry(headers, "x-real-ip").and_then(|n| parse_node(&n)))
        })
        .flatten();

    forwarded.unwrap_or_else(|| peer.ip()).to_canonical()
}

/// Origin (`scheme://host[:port]/`) the client used to reach this server
///
/// Returns `None` when no host is known, e.g. an HTTP/1.0 request without
/// a `Host` header.
pub fn request_origin(headers: &HeaderMap, trust_forwarded: bool) -> Option<Url> {
    let (proto, host) = if trust_forwarded {
        (
            forwarded_param(headers, "proto").or_else(|| first_entry(headers, "x-forwarded-proto")),
            forwarded_param(headers, "host").or_else(|| first_entry(headers, "x-forwarded-host")),
        )
    } else {
        (None, None)
    };

    let scheme = match proto.as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("https") => "https",
        _ => "http",
    };

    let host = host.or_else(|| {
        headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .map(|h| h.trim().to_string())
    })?;
    if host.is_empty() || host.contains(['/', '?', '#', '@']) {
        return None;
    }

    Url::parse(&format!("{}://{}/", scheme, host)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_static(value));
        }
        map
    }

    fn peer() -> SocketAddr {
        "192.168.1.50:51000".parse().unwrap()
    }

    #[test]
    fn test_peer_without_headers() {
        assert_eq!(
            client_ip(&HeaderMap::new(), peer(), true),
            "192.168.1.50".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_x_forwarded_for_first_entry() {
        let h = headers(&[("x-forwarded-for", "192.168.1.77, 10.0.0.1")]);
        assert_eq!(client_ip(&h, peer(), true), "192.168.1.77".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_forwarded_takes_precedence() {
        let h = headers(&[
            ("forwarded", "for=\"[2001:db8:cafe::17]:4711\";proto=https, for=10.0.0.1"),
            ("x-forwarded-for", "192.168.1.77"),
        ]);
        assert_eq!(
            client_ip(&h, peer(), true),
            "2001:db8:cafe::17".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_obfuscated_forwarded_falls_through() {
        let h = headers(&[("forwarded", "for=_hidden"), ("x-real-ip", "192.168.1.88")]);
        assert_eq!(client_ip(&h, peer(), true), "192.168.1.88".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_headers_ignored_when_untrusted() {
        let h = headers(&[("x-forwarded-for", "192.168.1.77")]);
        assert_eq!(client_ip(&h, peer(), false), "192.168.1.50".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_ipv4_mapped_peer_is_canonical() {
        let mapped: SocketAddr = "[::ffff:192.168.1.9]:4000".parse().unwrap();
        assert_eq!(
            client_ip(&HeaderMap::new(), mapped, true),
            "192.168.1.9".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_origin_from_host() {
        let h = headers(&[("host", "192.168.1.10:8080")]);
        assert_eq!(
            request_origin(&h, true).unwrap().as_str(),
            "http://192.168.1.10:8080/"
        );
    }

    #[test]
    fn test_origin_from_proxy_headers_drops_default_port() {
        let h = headers(&[
            ("host", "127.0.0.1:8080"),
            ("x-forwarded-proto", "https"),
            ("x-forwarded-host", "cast.example.org:443"),
        ]);
        assert_eq!(
            request_origin(&h, true).unwrap().as_str(),
            "https://cast.example.org/"
        );
        assert_eq!(
            request_origin(&h, false).unwrap().as_str(),
            "http://127.0.0.1:8080/"
        );
    }

    #[test]
    fn test_origin_requires_sane_host() {
        assert!(request_origin(&HeaderMap::new(), true).is_none());
        assert!(request_origin(&headers(&[("host", "evil.com/path")]), true).is_none());
    }
}
