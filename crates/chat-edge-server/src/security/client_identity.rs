use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use tracing::debug;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Best-effort client address: first `X-Forwarded-For` entry, then the socket peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub Option<IpAddr>);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ip) = forwarded_for(&parts.headers) {
            return Ok(Self(Some(ip)));
        }

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        if peer.is_none() {
            debug!("No client address available for request");
        }

        Ok(Self(peer))
    }
}

fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get(X_FORWARDED_FOR)?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}

/// Rate-limit key for a caller: `user:{id}`, else `ip:{addr}`, else `anonymous`.
pub fn rate_limit_identifier(user_id: Option<&str>, client_ip: ClientIp) -> String {
    match (user_id.map(str::trim).filter(|id| !id.is_empty()), client_ip.0) {
        (Some(user_id), _) => format!("user:{}", user_id),
        (None, Some(ip)) => format!("ip:{}", ip),
        (None, None) => "anonymous".to_string(),
    }
}
