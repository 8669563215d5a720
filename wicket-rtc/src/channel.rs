//! Byte-channel view of a negotiated data channel.
//!
//! webrtc-rs is callback-driven; the relay wants to own plain async
//! handles. [`ByteChannel`] registers the `on_open`/`on_message` callbacks
//! at construction time, before the channel can transition to open, and
//! adapts them to a oneshot and a bounded mpsc stream.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use webrtc::data_channel::RTCDataChannel;

use crate::PeerError;

/// Frames buffered between the webrtc message callback and the consumer.
/// The callback awaits the send, so a slow consumer back-pressures the
/// channel's receive path instead of growing an unbounded queue.
const INBOUND_BUFFER: usize = 32;

/// One negotiated message channel. Created exactly once per process run,
/// either by [`Peer::open_channel`](crate::Peer::open_channel) (offer role)
/// or from the remote's channel announcement (answer role).
pub struct ByteChannel {
    dc: Arc<RTCDataChannel>,
    open: oneshot::Receiver<()>,
    inbound: mpsc::Receiver<Bytes>,
}

impl ByteChannel {
    pub(crate) fn bind(dc: Arc<RTCDataChannel>) -> Self {
        let (open_tx, open_rx) = oneshot::channel();
        let (frame_tx, frame_rx) = mpsc::channel(INBOUND_BUFFER);

        let label = dc.label().to_string();
        let id = dc.id();
        dc.on_open(Box::new(move || {
            Box::pin(async move {
                tracing::info!("data channel '{label}'-{id} open");
                let _ = open_tx.send(());
            })
        }));

        dc.on_message(Box::new(move |msg| {
            let frame_tx = frame_tx.clone();
            Box::pin(async move {
                // A dropped receiver means the relay is gone; the frame
                // has nowhere to go.
                let _ = frame_tx.send(msg.data).await;
            })
        }));

        Self {
            dc,
            open: open_rx,
            inbound: frame_rx,
        }
    }

    /// Resolves once the channel reaches its open state. Relaying must not
    /// start before this.
    pub async fn ready(&mut self) -> Result<(), PeerError> {
        (&mut self.open).await.map_err(|_| PeerError::ChannelGone)
    }

    /// Split into the send handle and the inbound frame stream, so the two
    /// relay directions own disjoint halves.
    pub fn split(self) -> (ChannelSender, mpsc::Receiver<Bytes>) {
        (ChannelSender { dc: self.dc }, self.inbound)
    }
}

/// Send half of a [`ByteChannel`].
#[derive(Clone)]
pub struct ChannelSender {
    dc: Arc<RTCDataChannel>,
}

impl ChannelSender {
    /// Send one frame as a single channel message.
    pub async fn send(&self, frame: Bytes) -> Result<(), PeerError> {
        self.dc
            .send(&frame)
            .await
            .map(|_| ())
            .map_err(|source| PeerError::Channel { source })
    }
}
