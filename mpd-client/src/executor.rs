//! Command execution over pooled connections.

use mpd_proto::ResponseLine;
use tracing::error;

use crate::error::Result;
use crate::pool::{ConnectionPool, PooledConnection};

/// Runs commands through the pool with acquire/execute/release bracketing.
///
/// The connection is released back to the pool no matter how the command
/// ends; only a failed acquisition skips the release.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    pool: ConnectionPool,
}

impl CommandExecutor {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Execute a single command on a pooled connection.
    pub async fn execute(&self, command: &str) -> Result<Vec<ResponseLine>> {
        let handle = self.pool.acquire().await?;
        let result = {
            let mut conn = handle.connection().lock().await;
            conn.execute(command).await
        };
        self.finish(handle, result).await
    }

    /// Execute a command list on a pooled connection.
    pub async fn execute_list(&self, commands: &[String]) -> Result<Vec<ResponseLine>> {
        let handle = self.pool.acquire().await?;
        let result = {
            let mut conn = handle.connection().lock().await;
            conn.execute_list(commands).await
        };
        self.finish(handle, result).await
    }

    async fn finish(
        &self,
        handle: PooledConnection,
        result: Result<Vec<ResponseLine>>,
    ) -> Result<Vec<ResponseLine>> {
        match self.pool.release(&handle).await {
            Ok(()) => result,
            Err(release_err) => {
                error!(id = handle.id(), %release_err, "failed to release connection");
                // A command error takes precedence over the release error.
                result.and(Err(release_err.into()))
            }
        }
    }
}
