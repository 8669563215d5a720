//! Peer connection lifecycle: created, descriptions applied, connected.

use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;

use crate::{ByteChannel, PeerConfig, PeerError, SessionDescription};

/// One negotiated peer session. Owns the underlying connection for the
/// lifetime of the process; there is no explicit teardown.
pub struct Peer {
    pc: Arc<RTCPeerConnection>,
}

impl Peer {
    /// Build the webrtc API and create the connection. ICE connection
    /// state transitions are logged as they happen.
    pub async fn new(config: PeerConfig) -> Result<Self, PeerError> {
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(|source| PeerError::Build { source })?;

        let registry = register_default_interceptors(Default::default(), &mut media_engine)
            .map_err(|source| PeerError::Build { source })?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let ice_servers = if config.ice_servers.is_empty() {
            Vec::new()
        } else {
            vec![RTCIceServer {
                urls: config.ice_servers,
                ..Default::default()
            }]
        };

        let pc = api
            .new_peer_connection(RTCConfiguration {
                ice_servers,
                ..Default::default()
            })
            .await
            .map_err(|source| PeerError::Build { source })?;
        let pc = Arc::new(pc);

        pc.on_ice_connection_state_change(Box::new(|state: RTCIceConnectionState| {
            tracing::info!("ICE connection state changed: {state}");
            Box::pin(async {})
        }));

        Ok(Self { pc })
    }

    /// Create an offer and install it as the local description.
    pub async fn offer(&self) -> Result<SessionDescription, PeerError> {
        let offer = self
            .pc
            .create_offer(None)
            .await
            .map_err(|source| PeerError::Negotiation { source })?;
        self.finish_local(offer).await
    }

    /// Create an answer to the previously applied remote offer and install
    /// it as the local description.
    pub async fn answer(&self) -> Result<SessionDescription, PeerError> {
        let answer = self
            .pc
            .create_answer(None)
            .await
            .map_err(|source| PeerError::Negotiation { source })?;
        self.finish_local(answer).await
    }

    // The rendezvous is single-shot with no trickle path, so the local
    // description is only taken after candidate gathering completes and
    // the document is self-contained.
    async fn finish_local(
        &self,
        desc: SessionDescription,
    ) -> Result<SessionDescription, PeerError> {
        let mut gathered = self.pc.gathering_complete_promise().await;
        self.pc
            .set_local_description(desc)
            .await
            .map_err(|source| PeerError::Negotiation { source })?;
        let _ = gathered.recv().await;

        self.pc
            .local_description()
            .await
            .ok_or(PeerError::MissingLocalDescription)
    }

    /// Apply the remote peer's description. Malformed or incompatible
    /// input fails here.
    pub async fn apply_remote(&self, desc: SessionDescription) -> Result<(), PeerError> {
        self.pc
            .set_remote_description(desc)
            .await
            .map_err(|source| PeerError::Negotiation { source })
    }

    /// Offer role: create the message channel. Must happen before
    /// [`offer`](Self::offer) so the channel is part of the negotiated
    /// session.
    pub async fn open_channel(&self, label: &str) -> Result<ByteChannel, PeerError> {
        let dc = self
            .pc
            .create_data_channel(label, None)
            .await
            .map_err(|source| PeerError::Channel { source })?;
        Ok(ByteChannel::bind(dc))
    }

    /// Answer role: resolves with the first channel the remote announces.
    /// Exactly one channel participates in a run; any later announcement
    /// is logged and dropped.
    pub fn incoming_channel(&self) -> IncomingChannel {
        let (handoff, rx) = Handoff::new();
        self.pc.on_data_channel(Box::new(move |dc| {
            let handoff = handoff.clone();
            Box::pin(async move {
                tracing::info!("new data channel '{}' {}", dc.label(), dc.id());
                if !handoff.deliver(ByteChannel::bind(dc)) {
                    tracing::warn!("ignoring extra data channel; one channel per session");
                }
            })
        }));
        IncomingChannel(rx)
    }
}

/// Pending handoff of the remote-announced channel.
pub struct IncomingChannel(oneshot::Receiver<ByteChannel>);

impl IncomingChannel {
    pub async fn wait(self) -> Result<ByteChannel, PeerError> {
        self.0.await.map_err(|_| PeerError::ChannelGone)
    }
}

/// Single-use slot between the channel announcement callback and the
/// orchestrator. The first delivery wins; the slot is then spent.
struct Handoff<T> {
    slot: Arc<Mutex<Option<oneshot::Sender<T>>>>,
}

impl<T> Clone for Handoff<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Handoff<T> {
    fn new() -> (Self, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                slot: Arc::new(Mutex::new(Some(tx))),
            },
            rx,
        )
    }

    /// Returns false when the slot was already spent or the receiver is
    /// gone.
    fn deliver(&self, value: T) -> bool {
        match self.slot.lock().ok().and_then(|mut slot| slot.take()) {
            Some(tx) => tx.send(value).is_ok(),
            None => false,
        }
    }
}
