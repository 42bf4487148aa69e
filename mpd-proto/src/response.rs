//! The per-line response record emitted by the frame decoder.

use bytes::Bytes;

/// One line of an MPD response.
///
/// Most lines are plain `key: value` text. When the server announces an
/// inline payload with a `binary: <n>` header, the decoder attaches the raw
/// payload bytes to the header line instead of emitting them as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseLine {
    /// The raw text of the line, without the trailing newline
    pub raw: String,
    /// Binary payload spliced out of the stream, present only on
    /// `binary: <n>` header lines
    pub binary: Option<Bytes>,
}

impl ResponseLine {
    /// Create a plain text line with no binary payload.
    pub fn text(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            binary: None,
        }
    }

    /// Create a binary header line carrying its payload.
    pub fn with_binary(raw: impl Into<String>, payload: Bytes) -> Self {
        Self {
            raw: raw.into(),
            binary: Some(payload),
        }
    }

    /// Split the line into `(key, value)` at the first `": "` separator.
    ///
    /// Returns `None` for lines that do not follow the key/value shape, so
    /// callers can classify malformed lines (skip vs. abort) without
    /// control-flow errors.
    pub fn split_field(&self) -> Option<(&str, &str)> {
        let idx = self.raw.find(": ")?;
        Some((&self.raw[..idx], &self.raw[idx + 2..]))
    }
}
