use libp2p::PeerId;
use thiserror::Error;

/// A payload that could not be decoded into a progress message.
#[derive(Debug, Error)]
#[error("malformed progress payload: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

/// A destination string that could not be parsed.
#[derive(Debug, Error)]
pub enum AddressError {
    #[error("invalid destination multiaddr: {0}")]
    Invalid(#[from] libp2p::multiaddr::Error),
    /// The multiaddr is well-formed but does not end in `/p2p/<PeerId>`,
    /// so there is no peer to address.
    #[error("destination `{0}` is missing a /p2p/<PeerId> suffix")]
    MissingPeerId(String),
}

/// Failure of a single send attempt. One variant per phase; no phase is
/// retried.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("invalid destination: {0}")]
    Address(#[from] AddressError),
    #[error("identity key derivation failed: {0}")]
    Identity(#[from] libp2p::identity::DecodingError),
    #[error("transport setup failed: {0}")]
    Transport(#[from] libp2p::noise::Error),
    #[error("failed to encode progress update: {0}")]
    Encode(serde_json::Error),
    #[error("failed to connect to {peer}: {cause}")]
    Connect { peer: PeerId, cause: String },
    #[error("failed to open progress stream to {peer}: {cause}")]
    StreamOpen { peer: PeerId, cause: String },
    #[error("failed to write progress update: {0}")]
    Write(#[from] std::io::Error),
}

/// Failure to start the listener. All of these are fatal at startup;
/// per-stream receive failures are logged instead and never reach here.
#[derive(Debug, Error)]
pub enum ListenError {
    #[error("identity key derivation failed: {0}")]
    Identity(#[from] libp2p::identity::DecodingError),
    #[error("transport setup failed: {0}")]
    Transport(#[from] libp2p::noise::Error),
    #[error("progress protocol is already registered: {0}")]
    Protocol(#[from] libp2p_stream::AlreadyRegistered),
    #[error("failed to bind on port {port}: {cause}")]
    Bind { port: u16, cause: String },
}
