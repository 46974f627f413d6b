//! Client IP extraction from forwarding headers

use axum::http::HeaderMap;
use std::net::IpAddr;

/// Extract the client IP for a request.
///
/// Checks the RFC 7239 `Forwarded` header first, then `X-Forwarded-For`
/// (leftmost entry, the originating client), falling back to the socket
/// remote address when neither header carries a parsable IP.
pub fn client_ip(headers: &HeaderMap, socket_addr: IpAddr) -> IpAddr {
    from_forwarded(headers)
        .or_else(|| from_x_forwarded_for(headers))
        .unwrap_or(socket_addr)
}

fn from_forwarded(headers: &HeaderMap) -> Option<IpAddr> {
    let forwarded = headers.get("forwarded")?.to_str().ok()?;

    // Forwarded: for=192.0.2.60;proto=http;by=203.0.113.43
    for element in forwarded.split(',') {
        for param in element.split(';') {
            if let Some(value) = param.trim().strip_prefix("for=") {
                if let Some(ip) = parse_forwarded_ip(value) {
                    return Some(ip);
                }
            }
        }
    }

    None
}

/// Parse a `for=` value: optionally quoted, IPv6 in brackets, port allowed.
fn parse_forwarded_ip(value: &str) -> Option<IpAddr> {
    let value = value.trim_matches('"');
    if let Some(rest) = value.strip_prefix('[') {
        return rest.split(']').next()?.parse().ok();
    }
    value.split(':').next()?.parse().ok()
}

fn from_x_forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    let xff = headers.get("x-forwarded-for")?.to_str().ok()?;
    xff.split(',').find_map(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SOCKET: &str = "192.168.1.1";

    fn socket() -> IpAddr {
        SOCKET.parse().unwrap()
    }

    #[test]
    fn falls_back_to_socket_address() {
        let headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, socket()), socket());
    }

    #[test]
    fn x_forwarded_for_takes_leftmost_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 198.51.100.1"),
        );
        assert_eq!(
            client_ip(&headers, socket()),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn forwarded_header_wins_over_x_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "forwarded",
            HeaderValue::from_static("for=203.0.113.60;proto=http"),
        );
        headers.insert("x-forwarded-for", HeaderValue::from_static("198.51.100.1"));
        assert_eq!(
            client_ip(&headers, socket()),
            "203.0.113.60".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn forwarded_header_ipv6_in_brackets() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "forwarded",
            HeaderValue::from_static("for=\"[2001:db8::1]:4711\""),
        );
        assert_eq!(
            client_ip(&headers, socket()),
            "2001:db8::1".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn garbage_headers_fall_back_to_socket() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));
        assert_eq!(client_ip(&headers, socket()), socket());
    }
}
