//! Out-of-band rendezvous: a single-shot HTTP exchange of one session
//! description for another.
//!
//! The answer side binds a listener and receives the offer as a `POST /`
//! JSON body; the offer side posts its description and reads the answer
//! from the response. Exactly one exchange is supported per listener
//! instance; later requests are refused with 409. This mirrors the
//! one-session lifetime of the tunnel and is a documented limitation, not
//! something to generalize.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use wicket_rtc::SessionDescription;

/// Rendezvous failures. All fatal.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("failed to bind signaling listener on {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("signaling request failed: {source}")]
    Request {
        #[from]
        source: reqwest::Error,
    },

    #[error("could not decode session description: {source}")]
    Decode {
        #[from]
        source: serde_json::Error,
    },

    #[error("signaling exchange already spent")]
    Spent,
}

type ExchangeSlot =
    Arc<Mutex<Option<oneshot::Sender<Result<(SessionDescription, AnswerSlot), SignalError>>>>>;

/// Completes the pending exchange: the HTTP handler is parked on this and
/// writes the answer as the response body.
#[derive(Debug)]
pub struct AnswerSlot {
    tx: oneshot::Sender<SessionDescription>,
}

impl AnswerSlot {
    pub fn send(self, answer: SessionDescription) -> Result<(), SignalError> {
        self.tx.send(answer).map_err(|_| SignalError::Spent)
    }
}

/// Answer-side rendezvous listener. Serves for the process lifetime but
/// hands over exactly one offer.
pub struct SignalServer {
    local_addr: SocketAddr,
    exchange_rx: oneshot::Receiver<Result<(SessionDescription, AnswerSlot), SignalError>>,
}

impl SignalServer {
    pub async fn bind(addr: &str) -> Result<Self, SignalError> {
        let listener = TcpListener::bind(addr).await.map_err(|source| SignalError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        let local_addr = listener.local_addr().map_err(|source| SignalError::Bind {
            addr: addr.to_string(),
            source,
        })?;

        println!("Listening on {local_addr}");
        tracing::info!("signaling listener bound on {local_addr}");

        let (exchange_tx, exchange_rx) = oneshot::channel();
        let slot: ExchangeSlot = Arc::new(Mutex::new(Some(exchange_tx)));
        tokio::spawn(accept_loop(listener, slot));

        Ok(Self {
            local_addr,
            exchange_rx,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Block until the remote posts its offer. A malformed body surfaces
    /// here as [`SignalError::Decode`] and is fatal for the orchestrator,
    /// not just for the rejected request.
    pub async fn recv_offer(self) -> Result<(SessionDescription, AnswerSlot), SignalError> {
        match self.exchange_rx.await {
            Ok(result) => result,
            Err(_) => Err(SignalError::Spent),
        }
    }
}

/// Offer side: post our description to the remote rendezvous and decode
/// the answer from the response.
pub async fn exchange(
    addr: &str,
    offer: &SessionDescription,
) -> Result<SessionDescription, SignalError> {
    let url = format!("http://{addr}/");
    tracing::info!("posting offer to {url}");

    let response = reqwest::Client::new()
        .post(&url)
        .json(offer)
        .send()
        .await?
        .error_for_status()?;

    let body = response.bytes().await?;
    let answer: SessionDescription = serde_json::from_slice(&body)?;
    Ok(answer)
}

async fn accept_loop(listener: TcpListener, slot: ExchangeSlot) {
    loop {
        let (stream, remote) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::error!("signaling accept failed: {e}");
                continue;
            }
        };
        tracing::debug!("signaling connection from {remote}");

        let slot = Arc::clone(&slot);
        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(move |req| handle_request(req, Arc::clone(&slot)));
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                tracing::warn!("signaling connection error: {e}");
            }
        });
    }
}

async fn handle_request(
    req: hyper::Request<hyper::body::Incoming>,
    slot: ExchangeSlot,
) -> Result<hyper::Response<Full<Bytes>>, std::convert::Infallible> {
    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            tracing::warn!("failed to read signaling request body: {e}");
            return Ok(plain_response(
                hyper::StatusCode::BAD_REQUEST,
                "unreadable body",
            ));
        }
    };

    let Some(sender) = slot.lock().ok().and_then(|mut slot| slot.take()) else {
        return Ok(plain_response(
            hyper::StatusCode::CONFLICT,
            "signaling exchange already in progress or completed",
        ));
    };

    let offer: SessionDescription = match serde_json::from_slice(&body) {
        Ok(desc) => desc,
        Err(e) => {
            tracing::error!("invalid session description in signaling request: {e}");
            // The waiting orchestrator fails too; the exchange is
            // single-shot.
            let _ = sender.send(Err(SignalError::Decode { source: e }));
            return Ok(plain_response(
                hyper::StatusCode::BAD_REQUEST,
                "invalid session description",
            ));
        }
    };

    let (answer_tx, answer_rx) = oneshot::channel();
    if sender
        .send(Ok((offer, AnswerSlot { tx: answer_tx })))
        .is_err()
    {
        return Ok(plain_response(
            hyper::StatusCode::SERVICE_UNAVAILABLE,
            "no exchange pending",
        ));
    }

    let answer = match answer_rx.await {
        Ok(answer) => answer,
        Err(_) => {
            return Ok(plain_response(
                hyper::StatusCode::SERVICE_UNAVAILABLE,
                "negotiation aborted",
            ));
        }
    };

    match serde_json::to_vec(&answer) {
        Ok(body) => Ok(json_response(body)),
        Err(e) => {
            tracing::error!("failed to encode answer description: {e}");
            Ok(plain_response(
                hyper::StatusCode::INTERNAL_SERVER_ERROR,
                "answer encoding failed",
            ))
        }
    }
}

fn plain_response(status: hyper::StatusCode, msg: &'static str) -> hyper::Response<Full<Bytes>> {
    let mut res = hyper::Response::new(Full::new(Bytes::from_static(msg.as_bytes())));
    *res.status_mut() = status;
    res
}

fn json_response(body: Vec<u8>) -> hyper::Response<Full<Bytes>> {
    let mut res = hyper::Response::new(Full::new(Bytes::from(body)));
    res.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json; charset=utf-8"),
    );
    res
}
