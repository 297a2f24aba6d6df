//! Connection lifecycle: the reconnect loop and its state machine.
//!
//! One manager owns one logical connection. It drives connection attempts
//! through the transport, consults the reconnect policy after every failure,
//! and arms a cancellable timer between attempts. A quit request cancels any
//! pending timer and parks the manager in the terminal `Aborted` state.

use serde_json::json;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::event::CacheEvent;
use crate::retry::{ConnectError, FailureContext, ReconnectPolicy, RetryDecision};
use crate::transport::Transport;

/// Where the managed connection currently stands.
///
/// `Aborted` is terminal: a new manager must be built to resume service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Retrying,
    Aborted,
}

/// Per-episode retry bookkeeping. Reset whenever a connect succeeds.
#[derive(Debug, Default)]
struct RetryState {
    attempt: u32,
    episode_started: Option<Instant>,
    last_error: Option<String>,
}

impl RetryState {
    fn reset(&mut self) {
        self.attempt = 0;
        self.episode_started = None;
        self.last_error = None;
    }

    fn elapsed(&self) -> std::time::Duration {
        self.episode_started
            .map(|t| t.elapsed())
            .unwrap_or_default()
    }
}

/// Cloneable handle that cancels the manager's pending retry from outside.
#[derive(Debug, Clone)]
pub struct QuitHandle {
    tx: watch::Sender<bool>,
}

impl QuitHandle {
    /// Request shutdown. Any pending retry timer is cancelled; an in-flight
    /// connect loop returns [`ConnectError::Closed`].
    pub fn quit(&self) {
        let _ = self.tx.send(true);
    }
}

/// Owns one connection's lifecycle: transport, policy, state, bookkeeping.
///
/// All methods take `&mut self`; there is exactly one mutator and lifecycle
/// events are delivered serially, so no locking is needed.
pub struct ConnectionManager<T: Transport> {
    transport: T,
    policy: ReconnectPolicy,
    state: ConnectionState,
    retry: RetryState,
    quit_tx: watch::Sender<bool>,
    quit_rx: watch::Receiver<bool>,
}

impl<T: Transport> ConnectionManager<T> {
    pub fn new(transport: T, policy: ReconnectPolicy) -> Self {
        let (quit_tx, quit_rx) = watch::channel(false);
        Self {
            transport,
            policy,
            state: ConnectionState::Disconnected,
            retry: RetryState::default(),
            quit_tx,
            quit_rx,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Attempts made in the current failure episode.
    pub fn attempt(&self) -> u32 {
        self.retry.attempt
    }

    /// Most recent connection failure, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.retry.last_error.as_deref()
    }

    pub fn quit_handle(&self) -> QuitHandle {
        QuitHandle {
            tx: self.quit_tx.clone(),
        }
    }

    fn quit_requested(&self) -> bool {
        *self.quit_rx.borrow()
    }

    /// Run the connect loop until a connection is established, the policy
    /// aborts, or quit is requested.
    ///
    /// On success the retry bookkeeping resets to zero; the episode is over.
    pub async fn connect(&mut self) -> Result<T::Handle, ConnectError> {
        if self.state == ConnectionState::Aborted {
            return Err(ConnectError::Closed);
        }

        loop {
            if self.quit_requested() {
                return Err(self.abort_closed());
            }

            self.state = ConnectionState::Connecting;
            self.retry.attempt += 1;
            self.emit_connecting();

            match self.transport.connect().await {
                Ok(handle) => {
                    self.state = ConnectionState::Connected;
                    self.retry.reset();
                    tracing::info!("cache connection established");
                    return Ok(handle);
                }
                Err(failure) => {
                    self.retry.last_error = Some(failure.message.clone());
                    self.retry.episode_started.get_or_insert_with(Instant::now);
                    let ctx = FailureContext {
                        kind: failure.kind,
                        attempt: self.retry.attempt,
                        total_retry_time: self.retry.elapsed(),
                    };
                    match self.policy.decide(&ctx) {
                        RetryDecision::Abort(reason) => {
                            tracing::warn!(
                                "giving up on cache connection after {} attempt(s): {}",
                                ctx.attempt,
                                failure
                            );
                            self.abort();
                            return Err(reason.into());
                        }
                        RetryDecision::RetryAfter(delay) => {
                            self.state = ConnectionState::Retrying;
                            tracing::debug!(
                                "cache connect attempt {} failed ({}), next in {:?}",
                                ctx.attempt,
                                failure,
                                delay
                            );
                            if self.wait_or_quit(delay).await {
                                return Err(self.abort_closed());
                            }
                        }
                    }
                }
            }
        }
    }

    /// Sleep for `delay`, waking early on quit. Returns true when quit won.
    async fn wait_or_quit(&mut self, delay: std::time::Duration) -> bool {
        // The clone marks the current value as seen, so a quit that landed
        // before this point must be checked directly; `changed` only wakes
        // for sends that happen after.
        let mut rx = self.quit_rx.clone();
        if *rx.borrow() {
            return true;
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => *rx.borrow(),
            res = rx.changed() => {
                // A closed channel cannot happen while we hold a sender.
                res.is_ok() && *rx.borrow()
            }
        }
    }

    /// Record an unexpected drop of an established connection. The next
    /// `connect` call starts a fresh episode under the retry policy.
    ///
    /// The connection closed, even if nobody asked it to, so the critical
    /// `end` event fires here too.
    pub fn mark_disconnected(&mut self) {
        if self.state == ConnectionState::Connected {
            self.state = ConnectionState::Disconnected;
            CacheEvent::critical("end", json!({})).emit();
        }
    }

    /// Transport reported an error outside the connect path.
    pub fn note_error(&mut self, message: &str, stack: &str) {
        self.retry.last_error = Some(message.to_string());
        CacheEvent::critical(message, json!({}))
            .with_stack(stack)
            .emit();
    }

    /// Transport reported a non-fatal anomaly.
    pub fn note_warning(&mut self, message: &str) {
        CacheEvent::warning(message, json!({})).emit();
    }

    /// Deliberate shutdown: cancel any pending retry, emit the end event.
    pub fn quit(&mut self) {
        let _ = self.quit_tx.send(true);
        self.abort();
    }

    fn abort_closed(&mut self) -> ConnectError {
        self.abort();
        ConnectError::Closed
    }

    /// Park in the terminal state. The connection is closed for good, so
    /// this is where the critical `end` event fires, exactly once.
    fn abort(&mut self) {
        if self.state != ConnectionState::Aborted {
            self.state = ConnectionState::Aborted;
            CacheEvent::critical("end", json!({})).emit();
        }
    }

    fn emit_connecting(&self) {
        let params = json!({ "attempt": self.retry.attempt });
        if self.retry.attempt <= 1 {
            CacheEvent::info("connecting", params).emit();
        } else {
            CacheEvent::warning("reconnecting", params).emit();
        }
    }
}
