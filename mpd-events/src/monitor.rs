//! Dedicated `idle` connection with bounded reconnect.

use std::time::Duration;

use mpd_client::{ClientError, Connection, ConnectionPool};
use mpd_proto::AckError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::error::{MonitorError, Result};
use crate::notification::Notification;
use crate::subsystem::Subsystem;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
const NOIDLE_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Streams subsystem change events over a dedicated idle connection.
///
/// The monitor holds one connection outside the pool's slot accounting and
/// keeps it parked in `idle`. When the connection drops, it reconnects with
/// a fixed delay between attempts; after `max_retries` consecutive failures
/// it emits [`Notification::Closed`] and stops. A successful reconnect
/// resets the attempt counter, and the notification stream stays continuous
/// across reconnects.
pub struct EventMonitor {
    pool: ConnectionPool,
    notifications_tx: mpsc::UnboundedSender<Notification>,
    notifications_rx: Option<mpsc::UnboundedReceiver<Notification>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl EventMonitor {
    pub fn new(pool: ConnectionPool) -> Self {
        let (notifications_tx, notifications_rx) = mpsc::unbounded_channel();
        Self {
            pool,
            notifications_tx,
            notifications_rx: Some(notifications_rx),
            shutdown_tx: None,
            task: None,
        }
    }

    /// Take the notification receiver. Yields `Some` exactly once.
    pub fn notifications(&mut self) -> Option<mpsc::UnboundedReceiver<Notification>> {
        self.notifications_rx.take()
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Open the dedicated connection, enter idle mode and spawn the
    /// monitor task. Returns the server's protocol version.
    pub async fn start(&mut self) -> Result<String> {
        if self.task.is_some() {
            return Err(MonitorError::AlreadyRunning);
        }

        let mut conn = self.pool.create_dedicated().await?;
        let version = conn.version().to_string();
        conn.send_line("idle").await?;

        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        self.shutdown_tx = Some(shutdown_tx);

        let pool = self.pool.clone();
        let tx = self.notifications_tx.clone();
        self.task = Some(tokio::spawn(async move {
            run_loop(conn, pool, tx, shutdown_rx).await;
        }));

        info!(%version, "event monitor started");
        Ok(version)
    }

    /// Stop the monitor, leaving idle mode gracefully. Safe to call when
    /// not running.
    pub async fn stop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(()).await;
        }
        if let Some(mut task) = self.task.take() {
            if timeout(SHUTDOWN_TIMEOUT, &mut task).await.is_err() {
                warn!("event monitor did not stop in time, aborting");
                task.abort();
            }
            info!("event monitor stopped");
        }
    }
}

async fn run_loop(
    mut conn: Connection,
    pool: ConnectionPool,
    tx: mpsc::UnboundedSender<Notification>,
    mut shutdown_rx: mpsc::Receiver<()>,
) {
    loop {
        // Serve the current connection until shutdown or loss.
        let cause = loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    graceful_close(conn).await;
                    return;
                }
                line = conn.read_line() => match line {
                    Ok(Some(line)) => {
                        if handle_line(&mut conn, &tx, &line).await.is_err() {
                            break None;
                        }
                    }
                    Ok(None) => break None,
                    Err(err) => break Some(err),
                }
            }
        };
        warn!(?cause, "idle connection lost");

        match reconnect(&pool, &tx, &mut shutdown_rx).await {
            Some(fresh) => conn = fresh,
            None => return,
        }
    }
}

/// Process one line from the idle stream. An error means the connection is
/// no longer usable.
async fn handle_line(
    conn: &mut Connection,
    tx: &mpsc::UnboundedSender<Notification>,
    line: &str,
) -> std::result::Result<(), ClientError> {
    if let Some(name) = line.strip_prefix("changed: ") {
        let subsystem = Subsystem::from_name(name.trim());
        debug!(%subsystem, "subsystem changed");
        let _ = tx.send(Notification::Changed(subsystem));
        Ok(())
    } else if line == "OK" {
        // End of one idle round; park again.
        conn.send_line("idle").await
    } else if line.starts_with("ACK") {
        let ack = AckError::parse(line);
        warn!(%ack, "idle command rejected");
        let _ = tx.send(Notification::IdleError(ack));
        conn.send_line("idle").await
    } else {
        warn!(line, "unexpected line on idle connection");
        Ok(())
    }
}

/// Reconnect with a fixed delay between attempts.
///
/// Returns a fresh idling connection, or `None` when shut down or out of
/// attempts. On exhaustion a terminal [`Notification::Closed`] is emitted.
async fn reconnect(
    pool: &ConnectionPool,
    tx: &mpsc::UnboundedSender<Notification>,
    shutdown_rx: &mut mpsc::Receiver<()>,
) -> Option<Connection> {
    let delay = pool.config().reconnect_delay;
    let max_retries = pool.config().max_retries;
    let mut attempts = 0u32;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => return None,
            _ = sleep(delay) => {}
        }

        attempts += 1;
        let failure = match pool.create_dedicated().await {
            Ok(mut fresh) => match fresh.send_line("idle").await {
                Ok(()) => {
                    info!(attempts, "idle connection re-established");
                    return Some(fresh);
                }
                Err(err) => err,
            },
            Err(err) => err,
        };
        error!(attempt = attempts, max_retries, %failure, "reconnect attempt failed");

        if attempts >= max_retries {
            let _ = tx.send(Notification::Closed {
                cause: Some(failure),
            });
            return None;
        }
    }
}

/// Leave idle mode and close the connection.
async fn graceful_close(mut conn: Connection) {
    if conn.send_line("noidle").await.is_ok() {
        let drain = async {
            while let Ok(Some(line)) = conn.read_line().await {
                if line == "OK" {
                    break;
                }
            }
        };
        let _ = timeout(NOIDLE_DRAIN_TIMEOUT, drain).await;
    }
    let _ = conn.disconnect().await;
}
