//! MPD subsystems reported by the `idle` command.

use std::fmt;

/// A server subsystem named in a `changed:` line.
///
/// Unknown names are preserved verbatim in [`Subsystem::Other`] so new
/// server-side subsystems pass through without a client upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subsystem {
    Database,
    Update,
    StoredPlaylist,
    Playlist,
    Player,
    Mixer,
    Output,
    Options,
    Partition,
    Sticker,
    Subscription,
    Message,
    Neighbor,
    Mount,
    Other(String),
}

impl Subsystem {
    pub fn from_name(name: &str) -> Self {
        match name {
            "database" => Self::Database,
            "update" => Self::Update,
            "stored_playlist" => Self::StoredPlaylist,
            "playlist" => Self::Playlist,
            "player" => Self::Player,
            "mixer" => Self::Mixer,
            "output" => Self::Output,
            "options" => Self::Options,
            "partition" => Self::Partition,
            "sticker" => Self::Sticker,
            "subscription" => Self::Subscription,
            "message" => Self::Message,
            "neighbor" => Self::Neighbor,
            "mount" => Self::Mount,
            other => Self::Other(other.to_string()),
        }
    }

    /// The wire name, as used in `idle` arguments and `changed:` lines.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Database => "database",
            Self::Update => "update",
            Self::StoredPlaylist => "stored_playlist",
            Self::Playlist => "playlist",
            Self::Player => "player",
            Self::Mixer => "mixer",
            Self::Output => "output",
            Self::Options => "options",
            Self::Partition => "partition",
            Self::Sticker => "sticker",
            Self::Subscription => "subscription",
            Self::Message => "message",
            Self::Neighbor => "neighbor",
            Self::Mount => "mount",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
