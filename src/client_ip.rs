use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
};

/// The requester's network address: the first `x-forwarded-for` entry when a
/// proxy added one, otherwise the peer address of the connection.
#[derive(Clone, Debug)]
pub struct ClientIp(pub String);

pub fn resolve(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    match peer {
        Some(addr) => addr.ip().to_string(),
        None => "unknown".to_string(),
    }
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts.extensions.get::<ConnectInfo<SocketAddr>>().map(|info| info.0);
        Ok(ClientIp(resolve(&parts.headers, peer)))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn peer() -> SocketAddr {
        "10.0.0.9:50000".parse().unwrap()
    }

    #[test]
    fn prefers_the_first_forwarded_entry() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("1.2.3.4, 5.6.7.8"));
        assert_eq!(resolve(&headers, Some(peer())), "1.2.3.4");
    }

    #[test]
    fn trims_whitespace_around_forwarded_entries() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("  1.2.3.4 ,5.6.7.8"));
        assert_eq!(resolve(&headers, Some(peer())), "1.2.3.4");
    }

    #[test]
    fn falls_back_to_the_peer_address() {
        assert_eq!(resolve(&HeaderMap::new(), Some(peer())), "10.0.0.9");
    }

    #[test]
    fn empty_forwarded_header_falls_back_to_the_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(""));
        assert_eq!(resolve(&headers, Some(peer())), "10.0.0.9");
    }
}
