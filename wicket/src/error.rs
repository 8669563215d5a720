/// Top-level failure taxonomy. Every variant is fatal: the orchestrator
/// performs no retry and no rollback, the error is surfaced and the
/// process exits non-zero.
#[derive(Debug, thiserror::Error)]
pub enum TunnelError {
    /// Local TCP dial/listen/accept failure during setup.
    #[error("local tcp setup failed: {source}")]
    Setup { source: std::io::Error },

    /// Session description creation or application failure.
    #[error("negotiation failed: {source}")]
    Negotiation {
        #[from]
        source: wicket_rtc::PeerError,
    },

    /// Rendezvous exchange failure.
    #[error("signaling failed: {source}")]
    Transport {
        #[from]
        source: crate::signal::SignalError,
    },

    /// TCP or channel I/O failure after the relay started.
    #[error("relay failed: {source}")]
    Relay {
        #[from]
        source: crate::relay::RelayError,
    },
}
