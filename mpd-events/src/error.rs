//! Error types for the event layer.

use mpd_client::ClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    /// `start` was called while the monitor task is already running.
    #[error("event monitor is already running")]
    AlreadyRunning,

    /// Connection-layer failure while starting the monitor.
    #[error(transparent)]
    Client(#[from] ClientError),
}

pub type Result<T> = std::result::Result<T, MonitorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MonitorError::AlreadyRunning;
        assert_eq!(err.to_string(), "event monitor is already running");

        let err = MonitorError::from(ClientError::HandshakeTimeout);
        assert_eq!(err.to_string(), "handshake timed out");
    }
}
