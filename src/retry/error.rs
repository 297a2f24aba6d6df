//! Terminal connection outcomes a caller can observe.

/// Error returned when the connection manager gives up.
///
/// Transient failures never surface: they are retried internally. Whatever
/// reaches the caller means "cache unavailable"; callers are expected to
/// degrade, not crash.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    #[error("the server refused the connection")]
    Refused,
    #[error("retry time exhausted")]
    RetryTimeExhausted,
    #[error("reconnection disabled by configuration")]
    RetryDisabled,
    #[error("connection closed")]
    Closed,
    #[error("invalid cache configuration: {0}")]
    Config(String),
}

impl From<super::policy::AbortReason> for ConnectError {
    fn from(reason: super::policy::AbortReason) -> Self {
        use super::policy::AbortReason;
        match reason {
            AbortReason::Disabled => ConnectError::RetryDisabled,
            AbortReason::Refused => ConnectError::Refused,
            AbortReason::TimeExhausted => ConnectError::RetryTimeExhausted,
        }
    }
}
