//! The relay engine: pumps bytes between one TCP endpoint and one message
//! channel, in both directions, until either side fails.
//!
//! Each TCP read becomes exactly one channel message before the next read
//! begins, so byte order within a direction mirrors read order. The two
//! directions run concurrently and are otherwise independent.

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;

/// Upper bound on a single outbound message.
pub const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Send half of the peer message channel, as the relay sees it. The real
/// implementation is [`wicket_rtc::ChannelSender`]; tests bridge relays
/// with plain mpsc senders.
#[async_trait::async_trait]
pub trait ChannelSink: Send + Sync {
    async fn send(&self, frame: Bytes) -> eyre::Result<()>;
}

#[async_trait::async_trait]
impl ChannelSink for wicket_rtc::ChannelSender {
    async fn send(&self, frame: Bytes) -> eyre::Result<()> {
        wicket_rtc::ChannelSender::send(self, frame).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ChannelSink for mpsc::Sender<Bytes> {
    async fn send(&self, frame: Bytes) -> eyre::Result<()> {
        mpsc::Sender::send(self, frame)
            .await
            .map_err(|_| eyre::eyre!("in-memory channel closed"))
    }
}

/// Errors that tear the relay down. All of them are fatal to the process;
/// there is no partial-failure recovery (known limitation).
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("tcp read failed: {source}")]
    Read { source: std::io::Error },

    #[error("tcp write failed: {source}")]
    Write { source: std::io::Error },

    #[error("local endpoint closed the stream")]
    EndOfStream,

    #[error("channel send failed: {source}")]
    ChannelSend { source: eyre::Error },

    #[error("peer channel closed")]
    ChannelClosed,
}

/// Pump bytes between `tcp` and the peer channel until one side fails.
///
/// Never returns `Ok`: the tunnel has no teardown protocol, so the only
/// exits are the error paths, which the caller treats as fatal. Must be
/// called only after the channel's open transition; the inbound receiver
/// buffers anything that arrived in between.
pub async fn run<S: ChannelSink>(
    tcp: TcpStream,
    sink: S,
    mut inbound: mpsc::Receiver<Bytes>,
) -> Result<(), RelayError> {
    let (mut rd, mut wr) = tcp.into_split();

    tokio::select! {
        res = pump_outbound(&mut rd, &sink) => res,
        res = pump_inbound(&mut inbound, &mut wr) => res,
    }
}

/// Direction A: TCP reads become channel messages.
async fn pump_outbound<S: ChannelSink>(
    rd: &mut OwnedReadHalf,
    sink: &S,
) -> Result<(), RelayError> {
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let n = rd
            .read(&mut buf)
            .await
            .map_err(|source| RelayError::Read { source })?;
        if n == 0 {
            return Err(RelayError::EndOfStream);
        }
        tracing::debug!("tcp -> channel: {n} bytes");
        sink.send(Bytes::copy_from_slice(&buf[..n]))
            .await
            .map_err(|source| RelayError::ChannelSend { source })?;
    }
}

/// Direction B: channel messages are written through in full. A write
/// error closes the endpoint and terminates the relay, it is never
/// swallowed.
async fn pump_inbound(
    inbound: &mut mpsc::Receiver<Bytes>,
    wr: &mut OwnedWriteHalf,
) -> Result<(), RelayError> {
    while let Some(frame) = inbound.recv().await {
        tracing::debug!("channel -> tcp: {} bytes", frame.len());
        wr.write_all(&frame)
            .await
            .map_err(|source| RelayError::Write { source })?;
    }
    Err(RelayError::ChannelClosed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn tcp_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (connected, accepted) = tokio::join!(TcpStream::connect(addr), listener.accept());
        (connected.unwrap(), accepted.unwrap().0)
    }

    #[tokio::test]
    async fn peer_close_terminates_relay_exactly_once() {
        let (local, remote) = tcp_pair().await;
        let (sink_tx, _sink_rx) = mpsc::channel::<Bytes>(8);
        let (inbound_tx, inbound_rx) = mpsc::channel::<Bytes>(8);

        let relay = tokio::spawn(run(local, sink_tx, inbound_rx));
        drop(remote);

        let err = relay.await.unwrap().unwrap_err();
        assert!(matches!(err, RelayError::EndOfStream));

        // The relay future has resolved; nothing is left to retry.
        drop(inbound_tx);
    }

    #[tokio::test]
    async fn outbound_preserves_read_order() {
        let (local, mut remote) = tcp_pair().await;
        let (mut rd, _wr) = local.into_split();
        let (sink_tx, mut sink_rx) = mpsc::channel::<Bytes>(8);

        remote.write_all(b"hello ").await.unwrap();
        remote.write_all(b"world").await.unwrap();
        remote.shutdown().await.unwrap();

        let result = pump_outbound(&mut rd, &sink_tx).await;
        assert!(matches!(result, Err(RelayError::EndOfStream)));
        drop(sink_tx);

        let mut received = Vec::new();
        while let Some(frame) = sink_rx.recv().await {
            received.extend_from_slice(&frame);
        }
        assert_eq!(received, b"hello world");
    }

    #[tokio::test]
    async fn inbound_write_error_is_surfaced() {
        let (local, remote) = tcp_pair().await;
        let (_rd, mut wr) = local.into_split();

        // Reset the connection so the next writes fail instead of
        // buffering.
        remote.set_linger(Some(std::time::Duration::ZERO)).unwrap();
        drop(remote);
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let (inbound_tx, mut inbound_rx) = mpsc::channel::<Bytes>(32);
        for _ in 0..16 {
            inbound_tx
                .send(Bytes::from_static(&[0u8; 4096]))
                .await
                .unwrap();
        }
        drop(inbound_tx);

        let err = pump_inbound(&mut inbound_rx, &mut wr).await.unwrap_err();
        assert!(matches!(err, RelayError::Write { .. }));
    }

    #[tokio::test]
    async fn closed_channel_terminates_inbound() {
        let (local, _remote) = tcp_pair().await;
        let (_rd, mut wr) = local.into_split();

        let (inbound_tx, mut inbound_rx) = mpsc::channel::<Bytes>(8);
        inbound_tx.send(Bytes::from_static(b"bye")).await.unwrap();
        drop(inbound_tx);

        let err = pump_inbound(&mut inbound_rx, &mut wr).await.unwrap_err();
        assert!(matches!(err, RelayError::ChannelClosed));
    }
}
