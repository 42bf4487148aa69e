//! Classification of MPD `ACK` failure lines.
//!
//! A compliant failure response terminates with a single line of the shape
//! `ACK [<errno>@<index>] {<command>} <message>`. The parser here never
//! fails: anything that does not match that shape degrades to an error
//! carrying the raw line, per the protocol's loose historical behavior.

use std::fmt;

/// Symbolic error codes from MPD's fixed errno table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AckCode {
    /// 1: list command used outside a command list
    NotList,
    /// 2: bad command argument
    Arg,
    /// 3: wrong password
    Password,
    /// 4: insufficient permission
    Permission,
    /// 5: unknown command
    UnknownCmd,
    /// 50: requested object does not exist
    NoExist,
    /// 51: playlist is at maximum size
    PlaylistMax,
    /// 52: system error
    System,
    /// 53: playlist could not be loaded
    PlaylistLoad,
    /// 54: database update already running
    UpdateAlready,
    /// 55: player state does not allow the operation
    PlayerSync,
    /// 56: requested object already exists
    Exist,
    /// Sentinel for errno values outside the table
    Unknown,
}

impl AckCode {
    /// Map a numeric errno to its symbolic code.
    ///
    /// Numbers outside the fixed table map to [`AckCode::Unknown`].
    pub fn from_errno(errno: u32) -> Self {
        match errno {
            1 => AckCode::NotList,
            2 => AckCode::Arg,
            3 => AckCode::Password,
            4 => AckCode::Permission,
            5 => AckCode::UnknownCmd,
            50 => AckCode::NoExist,
            51 => AckCode::PlaylistMax,
            52 => AckCode::System,
            53 => AckCode::PlaylistLoad,
            54 => AckCode::UpdateAlready,
            55 => AckCode::PlayerSync,
            56 => AckCode::Exist,
            _ => AckCode::Unknown,
        }
    }

    /// The protocol-level name of this code.
    pub fn name(&self) -> &'static str {
        match self {
            AckCode::NotList => "NOT_LIST",
            AckCode::Arg => "ARG",
            AckCode::Password => "PASSWORD",
            AckCode::Permission => "PERMISSION",
            AckCode::UnknownCmd => "UNKNOWN",
            AckCode::NoExist => "NO_EXIST",
            AckCode::PlaylistMax => "PLAYLIST_MAX",
            AckCode::System => "SYSTEM",
            AckCode::PlaylistLoad => "PLAYLIST_LOAD",
            AckCode::UpdateAlready => "UPDATE_ALREADY",
            AckCode::PlayerSync => "PLAYER_SYNC",
            AckCode::Exist => "EXIST",
            AckCode::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AckCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed MPD failure parsed from an `ACK` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckError {
    /// Symbolic code from the errno table
    pub code: AckCode,
    /// Numeric errno as sent by the server
    pub errno: u32,
    /// Zero-based index of the failing command within a command list
    /// (0 for a single command)
    pub command_index: usize,
    /// Text of the failing command
    pub command: String,
    /// Trimmed human-readable message
    pub message: String,
}

impl AckError {
    /// Parse an `ACK` line into a typed error.
    ///
    /// A line that does not match the expected shape still yields an error
    /// object: [`AckCode::Unknown`] with the raw line as the message. This
    /// function never fails.
    pub fn parse(line: &str) -> Self {
        Self::parse_strict(line).unwrap_or_else(|| AckError {
            code: AckCode::Unknown,
            errno: 0,
            command_index: 0,
            command: String::new(),
            message: line.to_string(),
        })
    }

    fn parse_strict(line: &str) -> Option<Self> {
        let rest = line.strip_prefix("ACK")?.trim_start();
        let rest = rest.strip_prefix('[')?;
        let (bracket, rest) = rest.split_once(']')?;
        let (errno, index) = bracket.split_once('@')?;
        let errno: u32 = errno.trim().parse().ok()?;
        let command_index: usize = index.trim().parse().ok()?;
        let rest = rest.trim_start().strip_prefix('{')?;
        let (command, message) = rest.split_once('}')?;
        Some(AckError {
            code: AckCode::from_errno(errno),
            errno,
            command_index,
            command: command.to_string(),
            message: message.trim().to_string(),
        })
    }

    /// Whether this error came from a line that failed strict parsing.
    pub fn is_degenerate(&self) -> bool {
        self.code == AckCode::Unknown && self.errno == 0 && self.command.is_empty()
    }
}

impl fmt::Display for AckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_degenerate() {
            // Raw line serves as both code and message for unparseable ACKs.
            write!(f, "server error: {}", self.message)
        } else {
            write!(
                f,
                "{} ({}@{}) in \"{}\": {}",
                self.code, self.errno, self.command_index, self.command, self.message
            )
        }
    }
}

impl std::error::Error for AckError {}
