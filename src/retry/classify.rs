//! Map low-level client errors to retry failure kinds.

use super::policy::FailureKind;

/// Classify a redis error for the reconnect policy.
///
/// Only refusal is terminal; timeouts and IO trouble are transient and
/// retried under the normal backoff rules.
pub fn classify(e: &redis::RedisError) -> FailureKind {
    if e.is_connection_refusal() {
        return FailureKind::Refused;
    }
    if e.is_timeout() {
        return FailureKind::Timeout;
    }
    if e.is_io_error() {
        return FailureKind::Io;
    }
    FailureKind::Other
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn from_io(kind: io::ErrorKind) -> redis::RedisError {
        redis::RedisError::from(io::Error::new(kind, "test"))
    }

    #[test]
    fn refused_is_terminal_kind() {
        assert_eq!(
            classify(&from_io(io::ErrorKind::ConnectionRefused)),
            FailureKind::Refused
        );
    }

    #[test]
    fn timeouts_and_io_are_transient_kinds() {
        assert_eq!(classify(&from_io(io::ErrorKind::TimedOut)), FailureKind::Timeout);
        assert_eq!(
            classify(&from_io(io::ErrorKind::ConnectionReset)),
            FailureKind::Io
        );
        assert_eq!(
            classify(&from_io(io::ErrorKind::BrokenPipe)),
            FailureKind::Io
        );
    }

    #[test]
    fn protocol_errors_are_other() {
        let e = redis::RedisError::from((redis::ErrorKind::TypeError, "unexpected type"));
        assert_eq!(classify(&e), FailureKind::Other);
    }
}
