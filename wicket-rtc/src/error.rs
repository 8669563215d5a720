/// Errors from peer-connection setup and offer/answer negotiation.
///
/// None of these are recoverable by the tunnel: the orchestrator surfaces
/// them and the process exits.
#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    #[error("failed to build peer connection: {source}")]
    Build { source: webrtc::Error },

    #[error("session description rejected: {source}")]
    Negotiation { source: webrtc::Error },

    #[error("no local description available after ICE gathering")]
    MissingLocalDescription,

    #[error("data channel operation failed: {source}")]
    Channel { source: webrtc::Error },

    #[error("peer connection went away before the data channel was usable")]
    ChannelGone,
}
