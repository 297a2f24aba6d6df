//! recache: a resilient facade over a remote Redis cache.
//!
//! The crate owns one logical connection per [`CacheClient`], decides after
//! every connection failure whether to retry (and how long to wait) or give
//! up, and emits structured lifecycle events for downstream log consumers.
//! Values are stored as JSON text; cache failures degrade to misses rather
//! than surfacing to the caller's primary operation.

pub mod client;
pub mod config;
pub mod event;
pub mod logging;
pub mod manager;
pub mod retry;
pub mod transport;

pub use client::{CacheClient, CacheError};
pub use config::CacheConfig;
pub use manager::{ConnectionManager, ConnectionState, QuitHandle};
pub use retry::{
    ConnectError, FailureContext, FailureKind, ReconnectPolicy, RetryDecision,
};
pub use transport::{ConnectFailure, RedisTransport, Transport};
