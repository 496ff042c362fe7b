use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;

/// Best-effort client address: first `X-Forwarded-For` hop, then the socket peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|s| !s.is_empty());

        if let Some(ip) = forwarded {
            return Ok(ClientIp(ip.to_string()));
        }

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Ok(ClientIp(peer.unwrap_or_else(|| "unknown".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(req: Request<()>) -> String {
        let (mut parts, _) = req.into_parts();
        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts, &()).await.unwrap();
        ip
    }

    #[tokio::test]
    async fn uses_first_forwarded_hop() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(())
            .unwrap();
        assert_eq!(extract(req).await, "203.0.113.7");
    }

    #[tokio::test]
    async fn falls_back_to_peer_then_unknown() {
        let mut req = Request::builder().body(()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([198, 51, 100, 2], 4000))));
        assert_eq!(extract(req).await, "198.51.100.2");

        assert_eq!(extract(Request::builder().body(()).unwrap()).await, "unknown");
    }
}
