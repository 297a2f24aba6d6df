use std::time::Duration;

use serde_json::json;

use crate::event::CacheEvent;

/// Total time allowed across one failure episode before giving up.
pub const MAX_RETRY_TIME: Duration = Duration::from_secs(60 * 60);
/// Attempt count beyond which the slow probe delay applies.
pub const MAX_ATTEMPTS: u32 = 10;
/// Fixed delay used once the attempt budget is spent: keep probing, slowly.
pub const SLOW_PROBE_DELAY: Duration = Duration::from_secs(30);
/// Linear backoff step per attempt.
pub const BACKOFF_STEP_MS: u64 = 100;
/// Upper bound on the linear backoff delay.
pub const BACKOFF_CAP: Duration = Duration::from_secs(3);

/// High-level classification of a connection failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The remote actively refused the connection. Retrying is pointless:
    /// nothing is listening.
    Refused,
    /// Connect or handshake timed out.
    Timeout,
    /// Network-level failure (reset, DNS, broken pipe, ...).
    Io,
    /// Anything else; treated as transient.
    Other,
}

/// Inputs to one retry decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureContext {
    pub kind: FailureKind,
    /// Ordinal of this attempt within the current failure episode.
    pub attempt: u32,
    /// Elapsed wall-clock time since the first failure of the episode.
    pub total_retry_time: Duration,
}

/// Why the policy gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// Reconnection is disabled by configuration (fail-fast mode).
    Disabled,
    /// The server refused the connection.
    Refused,
    /// The one-hour episode budget is spent.
    TimeExhausted,
}

/// Decision returned by the reconnect policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Stop retrying permanently; the connection is dead.
    Abort(AbortReason),
    /// Schedule a new connection attempt after the given delay.
    RetryAfter(Duration),
}

/// Reconnect policy: linear backoff with explicit give-up rules.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    /// When false, every failure is terminal.
    pub enabled: bool,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl ReconnectPolicy {
    /// Decide what to do about a failed connection attempt.
    ///
    /// Rules, first match wins:
    /// 1. retries disabled: abort.
    /// 2. connection refused: abort (warning event).
    /// 3. episode older than one hour: abort (critical event).
    /// 4. more than ten attempts: 30s slow probe (critical event). This
    ///    branch keeps retrying forever rather than aborting; the asymmetry
    ///    with rule 3 is intentional and load-bearing for callers that
    ///    expect the cache to come back eventually.
    /// 5. otherwise: linear backoff, attempt x 100ms capped at 3s.
    ///
    /// The returned decision depends only on `self` and `ctx`; calling twice
    /// with the same inputs yields the same decision.
    pub fn decide(&self, ctx: &FailureContext) -> RetryDecision {
        if !self.enabled {
            return RetryDecision::Abort(AbortReason::Disabled);
        }

        if ctx.kind == FailureKind::Refused {
            CacheEvent::warning("connection refused", Self::params(ctx)).emit();
            return RetryDecision::Abort(AbortReason::Refused);
        }

        if ctx.total_retry_time > MAX_RETRY_TIME {
            CacheEvent::critical("retry time exhausted", Self::params(ctx)).emit();
            return RetryDecision::Abort(AbortReason::TimeExhausted);
        }

        if ctx.attempt > MAX_ATTEMPTS {
            CacheEvent::critical("retry attempts exhausted", Self::params(ctx)).emit();
            return RetryDecision::RetryAfter(SLOW_PROBE_DELAY);
        }

        let backoff = Duration::from_millis(u64::from(ctx.attempt) * BACKOFF_STEP_MS);
        RetryDecision::RetryAfter(backoff.min(BACKOFF_CAP))
    }

    fn params(ctx: &FailureContext) -> serde_json::Value {
        json!({
            "attempt": ctx.attempt,
            "total_retry_ms": ctx.total_retry_time.as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transient(attempt: u32, total_ms: u64) -> FailureContext {
        FailureContext {
            kind: FailureKind::Io,
            attempt,
            total_retry_time: Duration::from_millis(total_ms),
        }
    }

    #[test]
    fn linear_backoff_within_budget() {
        let p = ReconnectPolicy::default();
        assert_eq!(
            p.decide(&transient(0, 0)),
            RetryDecision::RetryAfter(Duration::from_millis(0))
        );
        assert_eq!(
            p.decide(&transient(5, 1_000)),
            RetryDecision::RetryAfter(Duration::from_millis(500))
        );
        assert_eq!(
            p.decide(&transient(10, 5_000)),
            RetryDecision::RetryAfter(Duration::from_millis(1_000))
        );
    }

    #[test]
    fn attempts_exhausted_slow_probe_not_abort() {
        let p = ReconnectPolicy::default();
        assert_eq!(
            p.decide(&transient(11, 6_000)),
            RetryDecision::RetryAfter(SLOW_PROBE_DELAY)
        );
        // High attempt counts land here too; the 3s backoff cap is shadowed
        // by the attempt budget.
        assert_eq!(
            p.decide(&transient(40, 6_000)),
            RetryDecision::RetryAfter(Duration::from_millis(30_000))
        );
    }

    #[test]
    fn time_budget_exhausted_aborts() {
        let p = ReconnectPolicy::default();
        assert_eq!(
            p.decide(&transient(1, 3_600_001)),
            RetryDecision::Abort(AbortReason::TimeExhausted)
        );
        // Exactly at the budget is still within it.
        assert!(matches!(
            p.decide(&transient(1, 3_600_000)),
            RetryDecision::RetryAfter(_)
        ));
    }

    #[test]
    fn refused_aborts_regardless_of_bookkeeping() {
        let p = ReconnectPolicy::default();
        for (attempt, total_ms) in [(0, 0), (5, 1_000), (40, 9_999_999)] {
            let ctx = FailureContext {
                kind: FailureKind::Refused,
                attempt,
                total_retry_time: Duration::from_millis(total_ms),
            };
            assert_eq!(p.decide(&ctx), RetryDecision::Abort(AbortReason::Refused));
        }
    }

    #[test]
    fn disabled_wins_over_everything() {
        let p = ReconnectPolicy { enabled: false };
        assert_eq!(
            p.decide(&transient(0, 0)),
            RetryDecision::Abort(AbortReason::Disabled)
        );
        let refused = FailureContext {
            kind: FailureKind::Refused,
            attempt: 1,
            total_retry_time: Duration::ZERO,
        };
        assert_eq!(p.decide(&refused), RetryDecision::Abort(AbortReason::Disabled));
    }

    #[test]
    fn decide_is_idempotent() {
        let p = ReconnectPolicy::default();
        let ctx = transient(7, 12_345);
        assert_eq!(p.decide(&ctx), p.decide(&ctx));
    }
}
