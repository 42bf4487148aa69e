//! Error types for the mpd-proto crate.

/// Errors that can occur while decoding protocol frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    /// A text-mode response line contained invalid UTF-8
    #[error("response line is not valid UTF-8")]
    InvalidUtf8,

    /// Bytes were fed to a decoder that already saw its terminal line
    #[error("decoder already observed a terminal OK/ACK line")]
    DecoderFinished,
}

/// Convenience type alias for Results using ProtoError.
pub type Result<T> = std::result::Result<T, ProtoError>;
