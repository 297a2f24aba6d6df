//! Thin cache facade: get/set/delete/incr/decr/ping over one managed
//! connection, values stored as JSON text, keys namespaced by the
//! configured prefix.

use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::config::CacheConfig;
use crate::event::CacheEvent;
use crate::manager::ConnectionManager;
use crate::retry::{ConnectError, ReconnectPolicy};
use crate::transport::RedisTransport;

/// Error surfaced by cache operations that return one.
///
/// `get` and `delete` never return these: a cache failure there degrades to
/// a miss, on the principle that the cache must never fail the caller's
/// primary operation.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error(transparent)]
    Connect(#[from] ConnectError),
    #[error("cache command failed: {0}")]
    Command(#[from] redis::RedisError),
    #[error("value encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

/// Client facade over one managed connection.
///
/// Single logical connection, single mutator: methods take `&mut self` and
/// there is no internal parallelism.
pub struct CacheClient {
    conn: MultiplexedConnection,
    manager: ConnectionManager<RedisTransport>,
    config: CacheConfig,
}

impl CacheClient {
    /// Establish a connection under the configured retry policy.
    pub async fn connect(config: CacheConfig) -> Result<Self, ConnectError> {
        let transport = RedisTransport::new(&config)?;
        let policy = ReconnectPolicy {
            enabled: config.retry,
        };
        let mut manager = ConnectionManager::new(transport, policy);
        let conn = manager.connect().await?;
        Ok(Self {
            conn,
            manager,
            config,
        })
    }

    /// Fetch and JSON-decode a value. Misses, transport errors, and decode
    /// failures all come back as `None`; errors are logged, never raised.
    pub async fn get<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let full = self.config.prefixed_key(key);
        let raw: Option<String> = match self.conn.get(&full).await {
            Ok(v) => v,
            Err(e) => {
                self.note_command_error(key, &e);
                return None;
            }
        };
        let text = raw?;
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                CacheEvent::info(e.to_string(), json!({ "key": key })).emit();
                None
            }
        }
    }

    /// JSON-encode and store a value, optionally with a TTL in seconds.
    pub async fn set<T: Serialize>(
        &mut self,
        key: &str,
        value: &T,
        ttl_secs: Option<u64>,
    ) -> Result<(), CacheError> {
        let full = self.config.prefixed_key(key);
        let payload = serde_json::to_string(value)?;
        let result: Result<(), redis::RedisError> = match ttl_secs {
            Some(exp) => self.conn.set_ex(&full, payload, exp).await,
            None => self.conn.set(&full, payload).await,
        };
        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                self.note_command_error(key, &e);
                Err(CacheError::Command(e))
            }
        }
    }

    /// Remove a key. Fire-and-forget: failures are logged, not returned.
    pub async fn delete(&mut self, key: &str) {
        let full = self.config.prefixed_key(key);
        if let Err(e) = self.conn.del::<_, i64>(&full).await {
            CacheEvent::info(e.to_string(), json!({ "key": key })).emit();
        }
    }

    /// Increment the integer value of a key by one.
    pub async fn incr(&mut self, key: &str) -> Result<i64, CacheError> {
        let full = self.config.prefixed_key(key);
        match self.conn.incr(&full, 1i64).await {
            Ok(n) => Ok(n),
            Err(e) => {
                self.note_command_error(key, &e);
                Err(CacheError::Command(e))
            }
        }
    }

    /// Decrement the integer value of a key by one.
    pub async fn decr(&mut self, key: &str) -> Result<i64, CacheError> {
        let full = self.config.prefixed_key(key);
        match self.conn.decr(&full, 1i64).await {
            Ok(n) => Ok(n),
            Err(e) => {
                self.note_command_error(key, &e);
                Err(CacheError::Command(e))
            }
        }
    }

    /// Health probe. Surfaces the most recent recorded transport error if
    /// one exists, otherwise round-trips a PING.
    pub async fn ping(&mut self) -> Result<String, CacheError> {
        if let Some(err) = self.manager.last_error() {
            return Err(CacheError::Unavailable(err.to_string()));
        }
        match redis::cmd("PING").query_async::<String>(&mut self.conn).await {
            Ok(pong) => Ok(pong),
            Err(e) => {
                let msg = e.to_string();
                self.note_command_error("PING", &e);
                Err(CacheError::Unavailable(msg))
            }
        }
    }

    /// Re-run the connect loop after an unexpected drop. Keeps the same
    /// manager, so the retry policy and its episode bookkeeping apply.
    pub async fn reconnect(&mut self) -> Result<(), CacheError> {
        self.manager.mark_disconnected();
        self.conn = self.manager.connect().await?;
        Ok(())
    }

    /// Graceful shutdown: cancel any pending retry and drop the connection.
    pub fn quit(mut self) {
        self.manager.quit();
    }

    /// Forced shutdown. The underlying client discards in-flight commands
    /// on drop, so `flush` only affects what gets logged.
    pub fn close(mut self, flush: bool) {
        tracing::debug!("cache connection closed (flush={flush})");
        self.manager.quit();
    }

    /// Access to the raw connection handle for commands the facade does not
    /// wrap (transactions, pipelines).
    pub fn raw_connection(&mut self) -> &mut MultiplexedConnection {
        &mut self.conn
    }

    fn note_command_error(&mut self, key: &str, e: &redis::RedisError) {
        self.manager.note_error(&e.to_string(), "");
        tracing::debug!("cache command on {key:?} failed: {e}");
    }
}
