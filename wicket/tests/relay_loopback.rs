//! Loopback relay tests: two relay engines bridged by in-memory channel
//! pairs stand in for the negotiated peer channel.

use bytes::Bytes;
use rand::RngCore;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use wicket::relay;

async fn tcp_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (connected, accepted) = tokio::join!(TcpStream::connect(addr), listener.accept());
    (connected.unwrap(), accepted.unwrap().0)
}

/// app <-> relay A <-> (mpsc pair) <-> relay B <-> service
async fn bridge() -> (TcpStream, TcpStream) {
    let (app, a_side) = tcp_pair().await;
    let (service, b_side) = tcp_pair().await;

    let (a_to_b_tx, a_to_b_rx) = mpsc::channel::<Bytes>(32);
    let (b_to_a_tx, b_to_a_rx) = mpsc::channel::<Bytes>(32);

    tokio::spawn(relay::run(a_side, a_to_b_tx, b_to_a_rx));
    tokio::spawn(relay::run(b_side, b_to_a_tx, a_to_b_rx));

    (app, service)
}

#[tokio::test(flavor = "multi_thread")]
async fn round_trip_byte_fidelity() {
    let (mut app, mut service) = bridge().await;

    let mut payload = vec![0u8; 100 * 1024];
    rand::thread_rng().fill_bytes(&mut payload);
    let expected = payload.clone();

    let writer = tokio::spawn(async move {
        app.write_all(&payload).await.unwrap();
        app
    });

    let mut received = vec![0u8; expected.len()];
    service.read_exact(&mut received).await.unwrap();
    assert_eq!(received, expected);

    writer.await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn direction_independence() {
    let (app, service) = bridge().await;
    let (mut app_rd, mut app_wr) = app.into_split();
    let (mut service_rd, mut service_wr) = service.into_split();

    let forward: Vec<u8> = (0..64 * 1024).map(|i| (i % 251) as u8).collect();
    let backward: Vec<u8> = (0..64 * 1024).map(|i| (i % 241) as u8).collect();

    let forward_copy = forward.clone();
    let backward_copy = backward.clone();
    let send_forward = tokio::spawn(async move {
        app_wr.write_all(&forward_copy).await.unwrap();
    });
    let send_backward = tokio::spawn(async move {
        service_wr.write_all(&backward_copy).await.unwrap();
    });

    let mut got_forward = vec![0u8; forward.len()];
    let mut got_backward = vec![0u8; backward.len()];
    tokio::join!(
        async {
            service_rd.read_exact(&mut got_forward).await.unwrap();
        },
        async {
            app_rd.read_exact(&mut got_backward).await.unwrap();
        }
    );

    send_forward.await.unwrap();
    send_backward.await.unwrap();

    assert_eq!(got_forward, forward);
    assert_eq!(got_backward, backward);
}
