//! Event layer for mpd-sdk.
//!
//! [`EventMonitor`] parks a dedicated connection in the server's `idle`
//! mode and turns `changed:` lines into [`Notification`]s on a channel.
//! Connection loss is handled with bounded reconnect attempts; the
//! receiver stays valid across reconnects.
//!
//! ```no_run
//! use mpd_client::{ConnectionPool, MpdConfig};
//! use mpd_events::{EventMonitor, Notification};
//!
//! # async fn demo() -> mpd_events::Result<()> {
//! let pool = ConnectionPool::new(MpdConfig::new());
//! let mut monitor = EventMonitor::new(pool);
//! let mut events = monitor.notifications().expect("first take");
//! monitor.start().await?;
//! while let Some(notification) = events.recv().await {
//!     match notification {
//!         Notification::Changed(subsystem) => println!("changed: {subsystem}"),
//!         Notification::IdleError(ack) => eprintln!("idle rejected: {ack}"),
//!         Notification::Closed { cause } => {
//!             eprintln!("monitor closed: {cause:?}");
//!             break;
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod monitor;
mod notification;
mod subsystem;

pub use error::{MonitorError, Result};
pub use monitor::EventMonitor;
pub use notification::Notification;
pub use subsystem::Subsystem;
