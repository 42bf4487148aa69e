//! Notifications delivered by the event monitor.

use mpd_client::ClientError;
use mpd_proto::AckError;

use crate::subsystem::Subsystem;

/// One event on the monitor's notification stream.
#[derive(Debug)]
pub enum Notification {
    /// A subsystem changed while the connection was idling.
    Changed(Subsystem),
    /// The server rejected an `idle` command; the monitor stays up.
    IdleError(AckError),
    /// The monitor gave up after exhausting its reconnect attempts.
    /// No further notifications follow.
    Closed { cause: Option<ClientError> },
}
