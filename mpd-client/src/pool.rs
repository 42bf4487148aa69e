//! Bounded connection pool with fair acquisition.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error, trace, warn};

use crate::config::{ExhaustionPolicy, MpdConfig};
use crate::connection::Connection;
use crate::error::{PoolError, Result};

/// A handle to a connection loaned out by [`ConnectionPool::acquire`].
///
/// The handle must be given back with [`ConnectionPool::release`] once the
/// caller is done with it; dropping it without releasing leaks a pool slot.
#[derive(Debug)]
pub struct PooledConnection {
    id: u64,
    conn: Arc<Mutex<Connection>>,
}

impl PooledConnection {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn connection(&self) -> &Arc<Mutex<Connection>> {
        &self.conn
    }
}

#[derive(Debug)]
struct PoolEntry {
    conn: Arc<Mutex<Connection>>,
    /// Held while the connection is loaned out; dropping it frees the slot.
    permit: Option<OwnedSemaphorePermit>,
}

#[derive(Debug)]
struct PoolState {
    entries: HashMap<u64, PoolEntry>,
    next_id: u64,
}

#[derive(Debug)]
struct PoolInner {
    config: MpdConfig,
    permits: Arc<Semaphore>,
    state: Mutex<PoolState>,
}

/// Bounded pool of MPD connections.
///
/// Connections are created lazily up to `pool_size`. Admission goes through
/// a semaphore whose waiters are served in arrival order, so a saturated
/// pool hands out slots fairly. Destroyed connections are purged on the next
/// acquisition.
#[derive(Debug, Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

impl ConnectionPool {
    pub fn new(config: MpdConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.pool_size));
        Self {
            inner: Arc::new(PoolInner {
                config,
                permits,
                state: Mutex::new(PoolState {
                    entries: HashMap::new(),
                    next_id: 0,
                }),
            }),
        }
    }

    pub fn config(&self) -> &MpdConfig {
        &self.inner.config
    }

    /// Acquire a connection, reusing an idle one or creating a new one.
    ///
    /// When all slots are busy the behavior follows the configured
    /// [`ExhaustionPolicy`]: suspend until a slot frees up, or fail with
    /// [`PoolError::Exhausted`].
    pub async fn acquire(&self) -> Result<PooledConnection> {
        let permit = match self.inner.config.exhaustion_policy {
            ExhaustionPolicy::Wait => self
                .inner
                .permits
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| PoolError::Exhausted)?,
            ExhaustionPolicy::FailFast => self
                .inner
                .permits
                .clone()
                .try_acquire_owned()
                .map_err(|_| PoolError::Exhausted)?,
        };

        // Held in an Option so it moves exactly once, into whichever entry
        // ends up loaned out.
        let mut permit = Some(permit);
        let id = {
            let mut state = self.inner.state.lock().await;
            Self::purge(&mut state);
            if let Some((&id, entry)) = state
                .entries
                .iter_mut()
                .find(|(_, entry)| entry.permit.is_none())
            {
                entry.permit = permit.take();
                trace!(id, "reusing pooled connection");
                return Ok(PooledConnection {
                    id,
                    conn: entry.conn.clone(),
                });
            }
            state.next_id += 1;
            state.next_id
        };

        // Create outside the state lock; the permit we hold bounds the
        // number of concurrent creations.
        match Connection::connect(&self.inner.config, id).await {
            Ok(conn) => {
                debug!(id, "created pooled connection");
                let conn = Arc::new(Mutex::new(conn));
                let mut state = self.inner.state.lock().await;
                state.entries.insert(
                    id,
                    PoolEntry {
                        conn: conn.clone(),
                        permit: permit.take(),
                    },
                );
                Ok(PooledConnection { id, conn })
            }
            // The permit drops here, so a later caller can retry the slot.
            Err(err) => Err(PoolError::ConnectionFailed(Box::new(err)).into()),
        }
    }

    /// Drop idle entries whose connection is already destroyed.
    fn purge(state: &mut PoolState) {
        state.entries.retain(|id, entry| {
            if entry.permit.is_some() {
                return true;
            }
            match entry.conn.try_lock() {
                Ok(conn) if conn.is_destroyed() => {
                    debug!(id, "purging dead pooled connection");
                    false
                }
                _ => true,
            }
        });
    }

    /// Hand a connection back to the pool.
    ///
    /// Misuse is reported loudly instead of being absorbed: releasing a
    /// handle this pool never issued fails with [`PoolError::NotOwned`], and
    /// releasing the same handle twice fails with [`PoolError::NotBusy`].
    /// A connection that is destroyed, or whose command was abandoned
    /// mid-flight, is discarded rather than returned to the idle set.
    pub async fn release(&self, handle: &PooledConnection) -> std::result::Result<(), PoolError> {
        let mut state = self.inner.state.lock().await;

        let entry = match state.entries.get_mut(&handle.id) {
            Some(entry) if Arc::ptr_eq(&entry.conn, &handle.conn) => entry,
            _ => {
                error!(id = handle.id, "released a connection this pool does not own");
                return Err(PoolError::NotOwned);
            }
        };
        if entry.permit.is_none() {
            error!(id = handle.id, "connection released twice");
            return Err(PoolError::NotBusy);
        }

        // A held connection lock means some task is still using it, likely
        // after its execute future was dropped mid-response.
        let discard = match entry.conn.try_lock() {
            Ok(conn) => conn.is_destroyed() || conn.is_executing(),
            Err(_) => true,
        };
        if discard {
            debug!(id = handle.id, "discarding connection on release");
            state.entries.remove(&handle.id);
        } else {
            entry.permit = None;
            trace!(id = handle.id, "connection returned to pool");
        }
        Ok(())
    }

    /// Open a connection outside the pool's slot accounting.
    ///
    /// Used for long-lived streams such as the idle event monitor, which
    /// must not occupy a command slot.
    pub async fn create_dedicated(&self) -> Result<Connection> {
        let id = {
            let mut state = self.inner.state.lock().await;
            state.next_id += 1;
            state.next_id
        };
        let conn = Connection::connect(&self.inner.config, id).await?;
        debug!(id, "created dedicated connection");
        Ok(conn)
    }

    /// Close every pooled connection, busy ones included.
    ///
    /// Individual close failures are logged and do not abort the teardown.
    pub async fn disconnect_all(&self) {
        let entries: Vec<PoolEntry> = {
            let mut state = self.inner.state.lock().await;
            state.entries.drain().map(|(_, entry)| entry).collect()
        };
        let closes = entries.iter().map(|entry| async {
            let mut conn = entry.conn.lock().await;
            conn.disconnect().await
        });
        let failures = join_all(closes)
            .await
            .into_iter()
            .filter(|result| result.is_err())
            .count();
        if failures > 0 {
            warn!(failures, "some connections failed to close cleanly");
        }
        // Permits held by busy entries drop with the entries here.
    }
}
