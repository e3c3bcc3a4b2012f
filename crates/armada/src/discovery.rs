//! LAN discovery: a small UDP responder that tells clients where the
//! game server listens.
//!
//! Clients broadcast the probe [`DISCOVERY_PROBE`] on the discovery
//! port; the server answers `SERVER:<address>:<port>` straight back to
//! the probe's source. No state is kept across the exchange.

use std::net::{IpAddr, SocketAddr};

use armada_transport::TransportError;
use tokio::net::UdpSocket;

use crate::ArmadaError;

/// The exact probe payload a client must send.
pub const DISCOVERY_PROBE: &[u8] = b"ARMADA?";

/// Answers discovery probes with the game server's address and port.
pub struct DiscoveryResponder {
    socket: UdpSocket,
    game_port: u16,
}

impl DiscoveryResponder {
    /// Binds the responder on `port`, advertising `game_port`.
    pub(crate) async fn bind(port: u16, game_port: u16) -> Result<Self, ArmadaError> {
        let socket = UdpSocket::bind(("0.0.0.0", port))
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(port, game_port, "discovery responder listening");
        Ok(Self { socket, game_port })
    }

    #[cfg(test)]
    pub(crate) fn port(&self) -> u16 {
        self.socket.local_addr().map(|a| a.port()).unwrap_or(0)
    }

    /// Answers probes until the task is dropped. Malformed datagrams are
    /// ignored.
    pub async fn run(self) {
        let mut buf = [0u8; 64];
        loop {
            let (len, peer) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) => {
                    tracing::warn!(error = %e, "discovery recv failed");
                    continue;
                }
            };

            if &buf[..len] != DISCOVERY_PROBE {
                tracing::trace!(%peer, "ignoring non-probe datagram");
                continue;
            }

            let reply = match local_ip_towards(peer).await {
                Some(ip) => format!("SERVER:{ip}:{}", self.game_port),
                None => {
                    tracing::debug!(%peer, "could not determine local address for reply");
                    continue;
                }
            };

            if let Err(e) = self.socket.send_to(reply.as_bytes(), peer).await {
                tracing::debug!(%peer, error = %e, "discovery reply failed");
            } else {
                tracing::debug!(%peer, reply, "answered discovery probe");
            }
        }
    }
}

/// The local address the OS routes towards `peer` — the one the client
/// can actually reach us on. Connecting a throwaway UDP socket performs
/// the route lookup without sending anything.
async fn local_ip_towards(peer: SocketAddr) -> Option<IpAddr> {
    let probe = UdpSocket::bind(("0.0.0.0", 0)).await.ok()?;
    probe.connect(peer).await.ok()?;
    probe.local_addr().ok().map(|addr| addr.ip())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_probe_gets_server_address_back() {
        let responder = DiscoveryResponder::bind(0, 8080).await.unwrap();
        let port = responder.port();
        tokio::spawn(responder.run());

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client
            .send_to(DISCOVERY_PROBE, ("127.0.0.1", port))
            .await
            .unwrap();

        let mut buf = [0u8; 64];
        let (len, _) = client.recv_from(&mut buf).await.unwrap();
        let reply = std::str::from_utf8(&buf[..len]).unwrap();
        assert_eq!(reply, "SERVER:127.0.0.1:8080");
    }

    #[tokio::test]
    async fn test_non_probe_datagrams_are_ignored() {
        let responder = DiscoveryResponder::bind(0, 9090).await.unwrap();
        let port = responder.port();
        tokio::spawn(responder.run());

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client
            .send_to(b"garbage", ("127.0.0.1", port))
            .await
            .unwrap();
        client
            .send_to(DISCOVERY_PROBE, ("127.0.0.1", port))
            .await
            .unwrap();

        // Only the real probe is answered.
        let mut buf = [0u8; 64];
        let (len, _) = client.recv_from(&mut buf).await.unwrap();
        assert!(std::str::from_utf8(&buf[..len]).unwrap().ends_with(":9090"));
    }
}
