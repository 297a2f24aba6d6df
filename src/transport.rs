//! Transport seam over the raw client.
//!
//! The manager only ever sees `connect` succeeding with an opaque handle or
//! failing with a classified [`ConnectFailure`]; tests drive it with a
//! scripted double, production uses [`RedisTransport`].

use std::fmt;

use async_trait::async_trait;

use crate::config::CacheConfig;
use crate::retry::{classify, ConnectError, FailureKind};

/// One failed connection attempt, already classified for the policy.
#[derive(Debug, Clone)]
pub struct ConnectFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl fmt::Display for ConnectFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// A transport the connection manager can (re)connect through.
#[async_trait]
pub trait Transport: Send {
    /// Opaque handle to an established connection.
    type Handle: Send;

    async fn connect(&mut self) -> Result<Self::Handle, ConnectFailure>;
}

/// Production transport over the redis client.
pub struct RedisTransport {
    client: redis::Client,
}

impl RedisTransport {
    pub fn new(config: &CacheConfig) -> Result<Self, ConnectError> {
        let client = redis::Client::open(config.connection_url())
            .map_err(|e| ConnectError::Config(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for RedisTransport {
    type Handle = redis::aio::MultiplexedConnection;

    async fn connect(&mut self) -> Result<Self::Handle, ConnectFailure> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| ConnectFailure {
                kind: classify(&e),
                message: e.to_string(),
            })
    }
}
