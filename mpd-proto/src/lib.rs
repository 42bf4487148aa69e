//! # mpd-proto
//!
//! Wire-protocol layer for mpd-sdk. The Music Player Daemon speaks a
//! line-oriented text protocol with occasional inline binary payloads; this
//! crate owns everything about that wire format and nothing about sockets:
//!
//! - [`FrameDecoder`] incrementally converts byte chunks into
//!   [`ResponseLine`] records, splicing out `binary: <n>` payloads.
//! - [`AckError`] classifies `ACK [..@..] {..} ..` failure lines.
//! - [`escape_argument`] quotes command arguments for the wire.
//! - [`group_flat`] / [`group_hierarchical`] regroup a flat line stream into
//!   structured [`Record`]s using caller-supplied delimiter keys.
//! - [`coerce_record`] applies typed parsing to well-known MPD fields.

mod ack;
mod coerce;
mod decoder;
mod error;
mod escape;
mod grouper;
mod response;

pub use ack::{AckCode, AckError};
pub use coerce::{coerce_record, coerce_value};
pub use decoder::{DecoderEvent, FrameDecoder};
pub use error::{ProtoError, Result};
pub use escape::{escape_argument, format_command};
pub use grouper::{
    group_flat, group_hierarchical, normalize_key, GrouperConfig, Record, Value, CHILDREN_KEY,
};
pub use response::ResponseLine;
