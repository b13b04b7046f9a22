//! Network infrastructure: implements `NetworkProbe` using `spawn_blocking`.

use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use anyhow::Result;

use crate::application::ports::NetworkProbe;

/// Production implementation that performs real network checks.
pub struct TokioNetworkProbe;

impl NetworkProbe for TokioNetworkProbe {
    async fn check_tcp_connectivity(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<bool> {
        let addr = format!("{host}:{port}");
        let result = tokio::task::spawn_blocking(move || {
            // Name resolution failure means unreachable, not an error.
            let Ok(candidates) = addr.to_socket_addrs() else {
                return false;
            };
            candidates
                .into_iter()
                .any(|sock| TcpStream::connect_timeout(&sock, timeout).is_ok())
        })
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking panicked: {e}"))?;
        tracing::debug!(host, port, reachable = result, "tcp probe");
        Ok(result)
    }
}
