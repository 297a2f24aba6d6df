//! Reconnect policy and failure classification.
//!
//! This module decides, after every failed connection attempt, whether to
//! try again (and after how long) or to give up for good. The decision is a
//! pure function of the policy configuration and the failure context, so
//! the connection manager can consult it without side effects beyond the
//! lifecycle events it emits.

mod classify;
mod error;
mod policy;

pub use classify::classify;
pub use error::ConnectError;
pub use policy::{
    AbortReason, FailureContext, FailureKind, ReconnectPolicy, RetryDecision,
    BACKOFF_CAP, BACKOFF_STEP_MS, MAX_ATTEMPTS, MAX_RETRY_TIME, SLOW_PROBE_DELAY,
};
