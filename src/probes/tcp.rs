//! TCP connect probe.

use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::net::TcpStream;

use crate::error::ProbeError;

use super::HealthProbe;

/// Probe that succeeds when a TCP connection to the target can be opened.
///
/// Suits dependencies without an HTTP readiness surface (database, cache,
/// broker); the stream is dropped immediately after the handshake.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    addr: SocketAddr,
}

impl TcpProbe {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }
}

#[async_trait]
impl HealthProbe for TcpProbe {
    async fn probe(&self) -> Result<(), ProbeError> {
        match TcpStream::connect(self.addr).await {
            Ok(_) => Ok(()),
            Err(e) => Err(ProbeError::Failed(e.to_string())),
        }
    }
}
