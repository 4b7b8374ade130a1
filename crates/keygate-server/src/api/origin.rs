//! Origin address of a request.
//!
//! Devices are identified by the address they connect from. Behind a reverse
//! proxy the socket peer is the proxy itself, so the first `X-Forwarded-For`
//! entry is used instead, but only when the peer is a configured trusted
//! proxy. Forwarded headers from anyone else are ignored.

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use keygate_core::canonical_ip;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use super::ApiError;
use crate::state::AppState;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Canonical address of the requesting device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OriginAddress(pub IpAddr);

impl FromRequestParts<Arc<AppState>> for OriginAddress {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let ConnectInfo(peer) = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .copied()
            .ok_or_else(|| ApiError::internal("peer address unavailable"))?;

        let forwarded = parts
            .headers
            .get(FORWARDED_FOR)
            .and_then(|v| v.to_str().ok());

        Ok(Self(resolve_origin(
            peer.ip(),
            forwarded,
            &state.trusted_proxies,
        )))
    }
}

/// Pick the device address from the peer and an optional forwarded header.
pub fn resolve_origin(peer: IpAddr, forwarded_for: Option<&str>, trusted: &[IpAddr]) -> IpAddr {
    let peer = canonical_ip(peer);

    if !trusted.iter().any(|p| canonical_ip(*p) == peer) {
        return peer;
    }

    forwarded_for
        .and_then(|header| header.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok())
        .map(canonical_ip)
        .unwrap_or(peer)
}
