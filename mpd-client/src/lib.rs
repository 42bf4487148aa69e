//! Connection layer for mpd-sdk.
//!
//! This crate owns everything between a [`MpdConfig`] and raw response
//! lines: the TCP handshake ([`Connection`]), the bounded fair pool
//! ([`ConnectionPool`]), the acquire/execute/release bracketing
//! ([`CommandExecutor`]) and the [`MpdClient`] facade tying them together.
//!
//! ```no_run
//! use mpd_client::{MpdClient, MpdConfig};
//!
//! # async fn demo() -> mpd_client::Result<()> {
//! let client = MpdClient::connect(MpdConfig::new().with_host("localhost")).await?;
//! let lines = client.call("status").await?;
//! for line in &lines {
//!     println!("{}", line.raw);
//! }
//! client.disconnect().await;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod connection;
mod error;
mod executor;
mod pool;

pub use client::MpdClient;
pub use config::{ExhaustionPolicy, MpdConfig};
pub use connection::Connection;
pub use error::{ClientError, PoolError, Result};
pub use executor::CommandExecutor;
pub use pool::{ConnectionPool, PooledConnection};
