//! Binding and shutdown registration.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::{Result, anyhow};
use tiny_http::Server;

use crate::core::register_server;
use crate::log;

/// Ports tried after the configured one is taken.
const MAX_PORT_RETRIES: u16 = 10;

/// Bind `interface:base_port`, moving up one port at a time while in use.
pub fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Arc<Server>, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                let addr = server.server_addr().to_ip().unwrap_or(addr);
                let server = Arc::new(server);
                register_server(Arc::clone(&server));
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow!(
        "failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map_or_else(|| "no attempt made".to_string(), |e| e.to_string())
    ))
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    #[test]
    fn test_bind_skips_taken_port() {
        let localhost = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let (first, first_addr) = bind_with_retry(localhost, 0).unwrap();
        let (_second, second_addr) = bind_with_retry(localhost, first_addr.port()).unwrap();
        assert_ne!(first_addr.port(), 0);
        assert_ne!(first_addr.port(), second_addr.port());
        drop(first);
    }
}
