//! Answer-role orchestrator: expose a local TCP service to the remote
//! peer.
//!
//! States: waiting for the offer, negotiating the answer, relaying.

use tokio::net::TcpStream;
use wicket_rtc::{Peer, PeerConfig};

use crate::{TunnelError, relay, signal::SignalServer};

/// Dial the exposed service, answer the remote offer, then relay until a
/// fatal error tears the process down.
pub async fn run(signal_addr: &str, expose_addr: &str) -> Result<(), TunnelError> {
    println!("answer (server) mode");

    let tcp = TcpStream::connect(expose_addr)
        .await
        .map_err(|source| TunnelError::Setup { source })?;
    tracing::info!("connected to exposed service at {expose_addr}");

    let peer = Peer::new(PeerConfig::default()).await?;
    // Registered before signaling so the channel announcement can never
    // race past us.
    let incoming = peer.incoming_channel();

    let signal = SignalServer::bind(signal_addr).await?;
    let (offer, answer_slot) = signal.recv_offer().await?;

    peer.apply_remote(offer).await?;
    let answer = peer.answer().await?;
    answer_slot.send(answer)?;

    let mut channel = incoming.wait().await?;
    channel.ready().await?;
    let (sender, inbound) = channel.split();

    relay::run(tcp, sender, inbound).await?;
    Ok(())
}
