//! Resolution of the client network address recorded in the audit trail.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use super::AppState;

/// Address of the client behind the current request, when it can be told.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientAddress(pub Option<String>);

#[must_use]
pub fn parse_trusted_proxies(entries: &[String]) -> Vec<IpAddr> {
    entries
        .iter()
        .filter_map(|entry| match entry.trim().parse::<IpAddr>() {
            Ok(ip) => Some(ip),
            Err(_) => {
                tracing::warn!(entry = %entry, "Ignoring invalid trusted proxy address");
                None
            }
        })
        .collect()
}

/// Picks the client address.
///
/// The first `X-Forwarded-For` hop is used only when the peer is a trusted
/// proxy, or when there is no socket peer at all (in-process callers).
#[must_use]
pub fn resolve(
    peer: Option<IpAddr>,
    forwarded_for: Option<&str>,
    trusted_proxies: &[IpAddr],
) -> Option<String> {
    let forwarded = forwarded_for
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .map(str::to_string);

    match peer {
        Some(peer) if trusted_proxies.contains(&peer) => {
            forwarded.or_else(|| Some(peer.to_string()))
        }
        Some(peer) => Some(peer.to_string()),
        None => forwarded,
    }
}

pub async fn client_address_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());
    let forwarded_for = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok());

    let address = resolve(peer, forwarded_for, &state.trusted_proxies);
    request.extensions_mut().insert(ClientAddress(address));

    next.run(request).await
}
