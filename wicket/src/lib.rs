//! wicket: point-to-point TCP tunneling over a WebRTC data channel.
//!
//! One side (answer role) exposes a local TCP service, the other (offer
//! role) listens for a single local TCP connection and relays its bytes
//! through the negotiated peer channel. The offer/answer documents are
//! exchanged out of band over a minimal HTTP rendezvous.
//!
//! The design is deliberately single-session: one peer connection, one
//! data channel, one TCP endpoint, one rendezvous exchange per process
//! run. Every failure is fatal; there is no retry or reconnect.

pub mod client;
pub mod error;
pub mod relay;
pub mod server;
pub mod signal;

pub use error::TunnelError;
