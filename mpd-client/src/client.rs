//! High-level client facade.

use mpd_proto::ResponseLine;
use tracing::info;

use crate::config::MpdConfig;
use crate::error::Result;
use crate::executor::CommandExecutor;
use crate::pool::ConnectionPool;

/// Pooled MPD client.
///
/// `connect` validates the configuration and eagerly opens one connection to
/// verify the target and capture the server's protocol version; further
/// connections are created on demand up to the pool size.
#[derive(Debug)]
pub struct MpdClient {
    pool: ConnectionPool,
    executor: CommandExecutor,
    version: String,
}

impl MpdClient {
    pub async fn connect(config: MpdConfig) -> Result<Self> {
        config.validate()?;
        let pool = ConnectionPool::new(config);

        let handle = pool.acquire().await?;
        let version = handle.connection().lock().await.version().to_string();
        pool.release(&handle).await?;
        info!(%version, "mpd client connected");

        Ok(Self {
            executor: CommandExecutor::new(pool.clone()),
            pool,
            version,
        })
    }

    /// Protocol version from the server greeting.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Run a single command and return its raw response lines.
    pub async fn call(&self, command: &str) -> Result<Vec<ResponseLine>> {
        self.executor.execute(command).await
    }

    /// Run several commands atomically as a command list.
    pub async fn call_list(&self, commands: &[String]) -> Result<Vec<ResponseLine>> {
        self.executor.execute_list(commands).await
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub fn executor(&self) -> &CommandExecutor {
        &self.executor
    }

    /// Close all pooled connections.
    pub async fn disconnect(&self) {
        self.pool.disconnect_all().await;
    }
}
