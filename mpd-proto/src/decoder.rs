//! Incremental frame decoder: raw byte chunks in, response records out.
//!
//! The decoder is a small state machine with two modes. In text mode it
//! buffers bytes until a newline and classifies each complete line; a
//! `binary: <n>` header switches it into binary mode, where exactly `n`
//! bytes are consumed verbatim (never UTF-8 decoded) and attached to the
//! header line. Chunk boundaries are arbitrary: a multi-byte UTF-8 sequence
//! or a binary payload may be split anywhere, and a single chunk may carry
//! the binary tail plus the start of the next text line.

use bytes::{Bytes, BytesMut};

use crate::ack::AckError;
use crate::error::{ProtoError, Result};
use crate::response::ResponseLine;

/// Semantic events produced by the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoderEvent {
    /// One response record, with binary payload attached when present
    Line(ResponseLine),
    /// The exact `OK` success sentinel; the response is complete
    Completed,
    /// An `ACK` failure line; the response is complete and failed
    Error(AckError),
}

enum DecodeState {
    /// Buffering text until a newline
    Text,
    /// Consuming a declared binary payload
    Binary {
        header: String,
        expected: usize,
        payload: BytesMut,
    },
    /// Payload complete; the protocol newline after it is still owed
    SkipNewline,
}

/// Incremental byte-to-record parser for one command's response.
///
/// Create one decoder per command execution, feed it every chunk read from
/// the socket, and stop once it reports [`DecoderEvent::Completed`] or
/// [`DecoderEvent::Error`]. Feeding a finished decoder is a usage error.
pub struct FrameDecoder {
    buffer: BytesMut,
    state: DecodeState,
    finished: bool,
    saw_line: bool,
}

impl FrameDecoder {
    /// Create a decoder in text mode with an empty buffer.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4 * 1024),
            state: DecodeState::Text,
            finished: false,
            saw_line: false,
        }
    }

    /// Whether a terminal `OK`/`ACK` line has been observed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether at least one complete line has been decoded.
    ///
    /// Lets the caller distinguish a connection closed before any response
    /// from one closed mid-stream.
    pub fn saw_line(&self) -> bool {
        self.saw_line
    }

    /// Feed a chunk of bytes and drain all events it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<DecoderEvent>> {
        if self.finished {
            return Err(ProtoError::DecoderFinished);
        }
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        loop {
            match &mut self.state {
                DecodeState::Text => {
                    let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') else {
                        break;
                    };
                    let line_bytes = self.buffer.split_to(pos + 1);
                    let raw = std::str::from_utf8(&line_bytes[..pos])
                        .map_err(|_| ProtoError::InvalidUtf8)?;
                    self.saw_line = true;

                    if raw == "OK" {
                        events.push(DecoderEvent::Completed);
                        self.finished = true;
                        self.buffer.clear();
                        break;
                    }
                    if raw.starts_with("ACK") {
                        events.push(DecoderEvent::Error(AckError::parse(raw)));
                        self.finished = true;
                        // A failed response has no trailing OK; anything
                        // still buffered is discarded.
                        self.buffer.clear();
                        break;
                    }
                    match parse_binary_header(raw) {
                        Some(0) => {
                            events.push(DecoderEvent::Line(ResponseLine::with_binary(
                                raw,
                                Bytes::new(),
                            )));
                            self.state = DecodeState::SkipNewline;
                        }
                        Some(expected) => {
                            self.state = DecodeState::Binary {
                                header: raw.to_string(),
                                expected,
                                payload: BytesMut::with_capacity(expected),
                            };
                        }
                        None => {
                            events.push(DecoderEvent::Line(ResponseLine::text(raw)));
                        }
                    }
                }
                DecodeState::Binary {
                    header,
                    expected,
                    payload,
                } => {
                    if self.buffer.is_empty() {
                        break;
                    }
                    let need = *expected - payload.len();
                    let take = need.min(self.buffer.len());
                    payload.extend_from_slice(&self.buffer.split_to(take));
                    if payload.len() < *expected {
                        break;
                    }
                    let raw = std::mem::take(header);
                    let data = std::mem::take(payload).freeze();
                    events.push(DecoderEvent::Line(ResponseLine::with_binary(raw, data)));
                    self.state = DecodeState::SkipNewline;
                }
                DecodeState::SkipNewline => {
                    if self.buffer.is_empty() {
                        break;
                    }
                    if self.buffer[0] == b'\n' {
                        let _ = self.buffer.split_to(1);
                    }
                    self.state = DecodeState::Text;
                }
            }
        }
        Ok(events)
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Match `binary:\s*(\d+)` and return the declared payload length.
fn parse_binary_header(line: &str) -> Option<usize> {
    let rest = line.strip_prefix("binary:")?.trim_start();
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ack::AckCode;

    fn feed_all(decoder: &mut FrameDecoder, input: &[u8]) -> Vec<DecoderEvent> {
        decoder.feed(input).expect("decode failed")
    }

    fn line(raw: &str) -> DecoderEvent {
        DecoderEvent::Line(ResponseLine::text(raw))
    }

    #[test]
    fn test_plain_response() {
        let mut dec = FrameDecoder::new();
        let events = feed_all(&mut dec, b"volume: 50\nrepeat: 0\nOK\n");
        assert_eq!(
            events,
            vec![line("volume: 50"), line("repeat: 0"), DecoderEvent::Completed]
        );
        assert!(dec.is_finished());
        assert!(dec.saw_line());
    }

    #[test]
    fn test_line_split_across_chunks() {
        let mut dec = FrameDecoder::new();
        assert!(feed_all(&mut dec, b"vol").is_empty());
        assert!(feed_all(&mut dec, b"ume: 5").is_empty());
        let events = feed_all(&mut dec, b"0\nOK\n");
        assert_eq!(events, vec![line("volume: 50"), DecoderEvent::Completed]);
    }

    #[test]
    fn test_multibyte_utf8_split_across_chunks() {
        let mut dec = FrameDecoder::new();
        let full = "Title: Größe\n".as_bytes();
        // Split inside the two-byte "ö" sequence.
        let split = full.iter().position(|&b| b == 0xc3).unwrap() + 1;
        assert!(feed_all(&mut dec, &full[..split]).is_empty());
        let events = feed_all(&mut dec, &full[split..]);
        assert_eq!(events, vec![line("Title: Größe")]);
    }

    #[test]
    fn test_invalid_utf8_in_text_mode() {
        let mut dec = FrameDecoder::new();
        let err = dec.feed(b"Title: \xff\xfe\n").unwrap_err();
        assert!(matches!(err, ProtoError::InvalidUtf8));
    }

    #[test]
    fn test_ack_terminates_and_discards_rest() {
        let mut dec = FrameDecoder::new();
        let events = feed_all(&mut dec, b"ACK [2@0] {play} Integer expected\nleftover\n");
        assert_eq!(events.len(), 1);
        match &events[0] {
            DecoderEvent::Error(err) => {
                assert_eq!(err.code, AckCode::Arg);
                assert_eq!(err.message, "Integer expected");
            }
            other => panic!("expected Error event, got {:?}", other),
        }
        assert!(dec.is_finished());
    }

    #[test]
    fn test_feed_after_finish_is_error() {
        let mut dec = FrameDecoder::new();
        feed_all(&mut dec, b"OK\n");
        assert!(matches!(dec.feed(b"more"), Err(ProtoError::DecoderFinished)));
    }

    #[test]
    fn test_binary_payload_single_chunk() {
        let mut dec = FrameDecoder::new();
        let events = feed_all(&mut dec, b"size: 4\nbinary: 4\n\x00\x01\xffz\nOK\n");
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], line("size: 4"));
        match &events[1] {
            DecoderEvent::Line(l) => {
                assert_eq!(l.raw, "binary: 4");
                assert_eq!(l.binary.as_deref(), Some(&b"\x00\x01\xffz"[..]));
            }
            other => panic!("expected binary line, got {:?}", other),
        }
        assert_eq!(events[2], DecoderEvent::Completed);
    }

    #[test]
    fn test_binary_zero_length() {
        let mut dec = FrameDecoder::new();
        let events = feed_all(&mut dec, b"binary: 0\n\nOK\n");
        assert_eq!(events.len(), 2);
        match &events[0] {
            DecoderEvent::Line(l) => {
                assert_eq!(l.binary.as_deref(), Some(&b""[..]));
            }
            other => panic!("expected binary line, got {:?}", other),
        }
        assert_eq!(events[1], DecoderEvent::Completed);
    }

    #[test]
    fn test_binary_split_with_text_tail_in_same_chunk() {
        let mut dec = FrameDecoder::new();
        assert!(feed_all(&mut dec, b"binary: 6\n\xde\xad").is_empty());
        // Rest of the payload plus the newline plus the start of the next
        // text line arrive together; only payload bytes go to binary mode.
        let events = feed_all(&mut dec, b"\xbe\xef\x00\x01\nOK");
        assert_eq!(events.len(), 1);
        match &events[0] {
            DecoderEvent::Line(l) => {
                assert_eq!(l.binary.as_deref(), Some(&b"\xde\xad\xbe\xef\x00\x01"[..]));
            }
            other => panic!("expected binary line, got {:?}", other),
        }
        let events = feed_all(&mut dec, b"\n");
        assert_eq!(events, vec![DecoderEvent::Completed]);
    }

    #[test]
    fn test_binary_payload_containing_newlines_and_fake_ok() {
        let mut dec = FrameDecoder::new();
        // Payload bytes that would look like terminal lines in text mode.
        let events = feed_all(&mut dec, b"binary: 7\nOK\nACK\n\nOK\n");
        assert_eq!(events.len(), 2);
        match &events[0] {
            DecoderEvent::Line(l) => {
                assert_eq!(l.binary.as_deref(), Some(&b"OK\nACK\n\n"[..7]));
            }
            other => panic!("expected binary line, got {:?}", other),
        }
        assert_eq!(events[1], DecoderEvent::Completed);
    }

    #[test]
    fn test_binary_header_whitespace_variants() {
        assert_eq!(parse_binary_header("binary: 12"), Some(12));
        assert_eq!(parse_binary_header("binary:12"), Some(12));
        assert_eq!(parse_binary_header("binary:   0"), Some(0));
        assert_eq!(parse_binary_header("binary: "), None);
        assert_eq!(parse_binary_header("binary: 12x"), None);
        assert_eq!(parse_binary_header("binaries: 12"), None);
    }

    #[test]
    fn test_saw_line_starts_false() {
        let mut dec = FrameDecoder::new();
        assert!(!dec.saw_line());
        assert!(feed_all(&mut dec, b"partial without newline").is_empty());
        assert!(!dec.saw_line());
        feed_all(&mut dec, b"\n");
        assert!(dec.saw_line());
    }
}
