//! Client configuration.

use std::time::Duration;

use crate::error::{ClientError, Result};

/// What `acquire` does when every pool slot is busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExhaustionPolicy {
    /// Suspend the caller until a slot frees up, in arrival order.
    #[default]
    Wait,
    /// Fail immediately with [`crate::PoolError::Exhausted`].
    FailFast,
}

/// Configuration for connecting to a Music Player Daemon instance.
#[derive(Debug, Clone)]
pub struct MpdConfig {
    /// Server hostname or address.
    pub host: String,
    /// Server port. MPD listens on 6600 by default.
    pub port: u16,
    /// Optional password sent immediately after the greeting.
    pub password: Option<String>,
    /// Deadline for the TCP connect plus greeting exchange.
    pub handshake_timeout: Duration,
    /// Upper bound on concurrently open pooled connections.
    pub pool_size: usize,
    /// Delay between event monitor reconnect attempts.
    pub reconnect_delay: Duration,
    /// Consecutive failed reconnect attempts before the monitor gives up.
    pub max_retries: u32,
    /// Behavior when the pool is exhausted.
    pub exhaustion_policy: ExhaustionPolicy,
}

impl Default for MpdConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6600,
            password: None,
            handshake_timeout: Duration::from_secs(5),
            pool_size: 3,
            reconnect_delay: Duration::from_secs(5),
            max_retries: 3,
            exhaustion_policy: ExhaustionPolicy::default(),
        }
    }
}

impl MpdConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_exhaustion_policy(mut self, policy: ExhaustionPolicy) -> Self {
        self.exhaustion_policy = policy;
        self
    }

    /// Validate the configuration before any connection is attempted.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(ClientError::Configuration("host cannot be empty".to_string()));
        }
        if self.pool_size == 0 {
            return Err(ClientError::Configuration(
                "pool size must be at least 1".to_string(),
            ));
        }
        if self.handshake_timeout.is_zero() {
            return Err(ClientError::Configuration(
                "handshake timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
