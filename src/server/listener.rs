use std::net::{SocketAddr, ToSocketAddrs};

use anyhow::Context;
use mio::net::TcpListener;

/// Binds a non-blocking listener to the first address `addr` resolves to
/// that accepts a bind.
pub fn bind(addr: &str) -> anyhow::Result<TcpListener> {
    let candidates: Vec<SocketAddr> = addr
        .to_socket_addrs()
        .with_context(|| format!("failed to resolve listen address {addr}"))?
        .collect();

    let mut last_err = None;
    for candidate in candidates {
        match TcpListener::bind(candidate) {
            Ok(listener) => return Ok(listener),
            Err(e) => {
                tracing::debug!(addr = %candidate, error = %e, "bind() failed");
                last_err = Some(e);
            }
        }
    }

    match last_err {
        Some(e) => Err(e).with_context(|| format!("failed to bind {addr}")),
        None => anyhow::bail!("listen address {addr} resolved to nothing"),
    }
}
