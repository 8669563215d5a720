//! Offer-role orchestrator: forward one accepted local TCP connection to
//! the service exposed by the remote peer.
//!
//! States: awaiting the local connection, negotiating the offer, relaying.

use tokio::net::TcpListener;
use wicket_rtc::{Peer, PeerConfig};

use crate::{TunnelError, relay, signal};

/// Accept exactly one local connection, negotiate the session, then relay
/// until a fatal error tears the process down.
pub async fn run(signal_addr: &str, listen_addr: &str) -> Result<(), TunnelError> {
    println!("offer (client) mode");
    println!("Listen on {listen_addr}");

    let listener = TcpListener::bind(listen_addr)
        .await
        .map_err(|source| TunnelError::Setup { source })?;
    let (tcp, remote) = listener
        .accept()
        .await
        .map_err(|source| TunnelError::Setup { source })?;
    tracing::info!("accepted local connection from {remote}");

    let peer = Peer::new(PeerConfig::default()).await?;
    let mut channel = peer.open_channel("data").await?;

    let offer = peer.offer().await?;
    let answer = signal::exchange(signal_addr, &offer).await?;
    peer.apply_remote(answer).await?;

    channel.ready().await?;
    let (sender, inbound) = channel.split();

    relay::run(tcp, sender, inbound).await?;
    Ok(())
}
