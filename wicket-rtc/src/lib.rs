//! WebRTC peer-connection capability for wicket.
//!
//! This crate wraps webrtc-rs behind the small surface the tunnel needs:
//! create a peer connection, produce and apply session descriptions, and
//! expose the negotiated data channel as tokio-friendly byte primitives.
//! ICE candidate gathering, DTLS, and SCTP stay inside the `webrtc` crate;
//! substituting another implementation only requires keeping this surface.

mod channel;
mod config;
mod error;
mod peer;

pub use channel::{ByteChannel, ChannelSender};
pub use config::PeerConfig;
pub use error::PeerError;
pub use peer::{IncomingChannel, Peer};

/// An opaque negotiation document (offer or answer). Serialized on the
/// rendezvous wire as `{"type": "offer"|"answer", "sdp": "..."}`, which is
/// exactly its serde representation.
pub use webrtc::peer_connection::sdp::session_description::RTCSessionDescription as SessionDescription;
