//! Error types for the connection layer.

use mpd_proto::{AckError, ProtoError};
use thiserror::Error;

/// Errors surfaced by connections, the pool and the command executor.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Socket-level failure while connecting, reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid client configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The server's first line was not an MPD greeting, or the password
    /// exchange produced something other than `OK` or an ACK.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// The greeting did not arrive within the configured deadline.
    #[error("handshake timed out")]
    HandshakeTimeout,

    /// The server rejected a command with an ACK failure line.
    #[error(transparent)]
    Ack(#[from] AckError),

    /// Protocol-level decode failure on the response stream.
    #[error(transparent)]
    Proto(#[from] ProtoError),

    /// The server closed the connection before sending any response line.
    #[error("connection closed by server before a response")]
    ClosedByServer,

    /// The server closed the connection in the middle of a response.
    #[error("connection interrupted mid-response")]
    Interrupted,

    /// The connection was already torn down when a command was issued.
    #[error("connection is no longer usable")]
    NotConnected,

    /// Pool acquisition or release failure.
    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// Errors specific to pool admission and hand-back.
#[derive(Debug, Error)]
pub enum PoolError {
    /// All slots are busy and the policy forbids waiting.
    #[error("connection pool exhausted")]
    Exhausted,

    /// Establishing a new pooled connection failed.
    #[error("failed to create pooled connection: {0}")]
    ConnectionFailed(#[source] Box<ClientError>),

    /// The released handle does not belong to this pool.
    #[error("released connection is not owned by this pool")]
    NotOwned,

    /// The released handle was already handed back.
    #[error("released connection was not busy")]
    NotBusy,
}

pub type Result<T> = std::result::Result<T, ClientError>;
