//! Circuit breaker for downstream dependency protection.
//!
//! # States
//! - Closed: normal operation, calls pass through, failures are counted
//! - Open: dependency assumed down, calls fail fast without being attempted
//! - Half-Open: probationary, calls are attempted as recovery trials
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive_failures >= threshold
//!                OR (window full AND failure rate >= percent threshold)
//! Open → Half-Open: cooldown elapsed since last failure, on the next call
//! Half-Open → Closed: trials_required consecutive successes
//! Half-Open → Open: any failure
//! ```
//!
//! # Concurrency
//! One breaker is shared by every in-flight request to its dependency. All
//! bookkeeping happens under a single mutex that is never held across the
//! awaited call, so outcomes land in the history in completion order.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::time::{self, Instant};

use crate::config::BreakerConfig;
use crate::observability::metrics;

/// Breaker state as exposed to callers and the metrics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        }
    }

    /// Numeric encoding used by the state gauge.
    pub fn as_gauge(&self) -> f64 {
        match self {
            CircuitState::Closed => 0.0,
            CircuitState::Open => 1.0,
            CircuitState::HalfOpen => 2.0,
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by [`CircuitBreaker::execute`].
#[derive(Debug)]
pub enum BreakerError<E> {
    /// The breaker rejected the call without attempting it.
    Open { name: String },
    /// The call did not finish within the configured call timeout.
    Timeout { name: String, after: Duration },
    /// The call itself failed.
    Downstream(E),
}

impl<E> BreakerError<E> {
    pub fn is_open(&self) -> bool {
        matches!(self, BreakerError::Open { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, BreakerError::Timeout { .. })
    }
}

impl<E: fmt::Display> fmt::Display for BreakerError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakerError::Open { name } => write!(f, "circuit '{}' is open", name),
            BreakerError::Timeout { name, after } => {
                write!(f, "call to '{}' timed out after {:?}", name, after)
            }
            BreakerError::Downstream(e) => write!(f, "downstream call failed: {}", e),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for BreakerError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BreakerError::Downstream(e) => Some(e),
            _ => None,
        }
    }
}

/// Fixed-capacity FIFO of call outcomes (`true` = success).
#[derive(Debug)]
struct OutcomeWindow {
    outcomes: VecDeque<bool>,
    capacity: usize,
}

impl OutcomeWindow {
    fn new(capacity: usize) -> Self {
        Self {
            outcomes: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, success: bool) {
        if self.outcomes.len() == self.capacity {
            self.outcomes.pop_front();
        }
        self.outcomes.push_back(success);
    }

    fn len(&self) -> usize {
        self.outcomes.len()
    }

    fn is_full(&self) -> bool {
        self.outcomes.len() >= self.capacity
    }

    fn failure_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        let failures = self.outcomes.iter().filter(|ok| !**ok).count();
        failures as f64 / self.outcomes.len() as f64 * 100.0
    }
}

/// Point-in-time view of a breaker, read under its lock.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakerStats {
    pub state: CircuitState,
    pub failure_rate_percent: f64,
    pub total_successes: u64,
    pub consecutive_failures: u32,
    pub history_len: usize,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    total_successes: u64,
    last_failure: Option<Instant>,
    trials_completed: u32,
    history: OutcomeWindow,
}

/// Circuit breaker guarding a single downstream dependency.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        let name = name.into();
        metrics::record_breaker_state(&name, CircuitState::Closed);
        Self {
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                total_successes: 0,
                last_failure: None,
                trials_completed: 0,
                history: OutcomeWindow::new(config.failure_rate_window),
            }),
            name,
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// Current state. Never performs the cooldown transition itself.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn stats(&self) -> BreakerStats {
        let inner = self.lock();
        BreakerStats {
            state: inner.state,
            failure_rate_percent: inner.history.failure_rate(),
            total_successes: inner.total_successes,
            consecutive_failures: inner.consecutive_failures,
            history_len: inner.history.len(),
        }
    }

    /// Run `call` through the breaker.
    ///
    /// The call is not invoked at all while the breaker is open and the
    /// cooldown has not elapsed. Otherwise it races a `call_timeout` deadline;
    /// when the deadline wins the call's future is dropped, which cancels it
    /// on our side but cannot undo anything the dependency already did.
    pub async fn execute<F, Fut, T, E>(&self, call: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.admit::<E>()?;

        let timeout = self.config.call_timeout();
        match time::timeout(timeout, call()).await {
            Ok(Ok(value)) => {
                self.on_success();
                Ok(value)
            }
            Ok(Err(e)) => {
                tracing::debug!(breaker = %self.name, error = %e, "Call failed");
                self.on_failure();
                Err(BreakerError::Downstream(e))
            }
            Err(_) => {
                tracing::debug!(breaker = %self.name, timeout = ?timeout, "Call timed out");
                self.on_failure();
                Err(BreakerError::Timeout {
                    name: self.name.clone(),
                    after: timeout,
                })
            }
        }
    }

    fn admit<E>(&self) -> Result<(), BreakerError<E>> {
        let mut inner = self.lock();
        if inner.state != CircuitState::Open {
            return Ok(());
        }

        let elapsed = inner
            .last_failure
            .map(|at| Instant::now().saturating_duration_since(at))
            .unwrap_or(Duration::MAX);

        if elapsed > self.config.open_cooldown() {
            inner.trials_completed = 0;
            self.transition(&mut inner, CircuitState::HalfOpen);
            Ok(())
        } else {
            metrics::record_breaker_rejection(&self.name);
            Err(BreakerError::Open {
                name: self.name.clone(),
            })
        }
    }

    fn on_success(&self) {
        let mut inner = self.lock();
        inner.history.push(true);
        inner.total_successes += 1;
        metrics::record_breaker_call(&self.name, "success");

        match inner.state {
            CircuitState::HalfOpen => {
                inner.trials_completed += 1;
                if inner.trials_completed >= self.config.half_open_trials_required {
                    inner.consecutive_failures = 0;
                    inner.trials_completed = 0;
                    self.transition(&mut inner, CircuitState::Closed);
                }
            }
            CircuitState::Closed => inner.consecutive_failures = 0,
            // Opened by a concurrent request while this call was in flight.
            CircuitState::Open => {}
        }
    }

    fn on_failure(&self) {
        let mut inner = self.lock();
        inner.history.push(false);
        inner.last_failure = Some(Instant::now());
        metrics::record_breaker_call(&self.name, "failure");

        match inner.state {
            CircuitState::HalfOpen => {
                inner.trials_completed = 0;
                self.transition(&mut inner, CircuitState::Open);
            }
            CircuitState::Closed => {
                inner.consecutive_failures += 1;
                let consecutive_breach =
                    inner.consecutive_failures >= self.config.consecutive_failure_threshold;
                let rate_breach = inner.history.is_full()
                    && inner.history.failure_rate() >= self.config.failure_rate_percent_threshold;

                if consecutive_breach || rate_breach {
                    tracing::warn!(
                        breaker = %self.name,
                        consecutive_failures = inner.consecutive_failures,
                        failure_rate = inner.history.failure_rate(),
                        "Failure threshold breached"
                    );
                    self.transition(&mut inner, CircuitState::Open);
                }
            }
            CircuitState::Open => {}
        }
    }

    fn transition(&self, inner: &mut BreakerInner, to: CircuitState) {
        let from = inner.state;
        inner.state = to;

        if to == CircuitState::Open {
            tracing::warn!(breaker = %self.name, from = %from, to = %to, "Circuit opened");
        } else {
            tracing::info!(breaker = %self.name, from = %from, to = %to, "Circuit state changed");
        }
        metrics::record_breaker_transition(&self.name, to);
    }

    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn config() -> BreakerConfig {
        BreakerConfig {
            call_timeout_ms: 100,
            consecutive_failure_threshold: 5,
            failure_rate_percent_threshold: 50.0,
            failure_rate_window: 10,
            open_cooldown_ms: 1_000,
            half_open_trials_required: 3,
        }
    }

    async fn succeed(breaker: &CircuitBreaker) -> Result<u32, BreakerError<&'static str>> {
        breaker.execute(|| async { Ok(1) }).await
    }

    async fn fail(breaker: &CircuitBreaker) -> Result<u32, BreakerError<&'static str>> {
        breaker.execute(|| async { Err("boom") }).await
    }

    async fn trip(breaker: &CircuitBreaker) {
        for _ in 0..breaker.config().consecutive_failure_threshold {
            let _ = fail(breaker).await;
        }
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[test]
    fn test_outcome_window_evicts_oldest() {
        let mut window = OutcomeWindow::new(3);
        window.push(false);
        window.push(true);
        window.push(true);
        assert!((window.failure_rate() - 100.0 / 3.0).abs() < 1e-9);

        window.push(true);
        assert_eq!(window.len(), 3);
        assert_eq!(window.failure_rate(), 0.0);
    }

    #[test]
    fn test_empty_window_has_zero_failure_rate() {
        let window = OutcomeWindow::new(10);
        assert_eq!(window.failure_rate(), 0.0);
        assert!(!window.is_full());
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_never_exceeds_window() {
        let mut cfg = config();
        cfg.consecutive_failure_threshold = 100;
        cfg.failure_rate_percent_threshold = 100.0;
        let breaker = CircuitBreaker::new("profile", cfg);

        for i in 0..25 {
            if i % 2 == 0 {
                let _ = succeed(&breaker).await;
            } else {
                let _ = fail(&breaker).await;
            }
            assert!(breaker.stats().history_len <= 10);
        }
        assert_eq!(breaker.stats().history_len, 10);
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_failures_open_circuit() {
        let breaker = CircuitBreaker::new("profile", config());

        for _ in 0..4 {
            assert!(matches!(fail(&breaker).await, Err(BreakerError::Downstream("boom"))));
        }
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.stats().consecutive_failures, 4);

        let _ = fail(&breaker).await;
        assert_eq!(breaker.state(), CircuitState::Open);
        assert_eq!(breaker.stats().history_len, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets_consecutive_failures() {
        let breaker = CircuitBreaker::new("profile", config());

        for _ in 0..4 {
            let _ = fail(&breaker).await;
        }
        assert_eq!(succeed(&breaker).await.unwrap(), 1);
        assert_eq!(breaker.stats().consecutive_failures, 0);
        assert_eq!(breaker.stats().total_successes, 1);

        let _ = fail(&breaker).await;
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_rate_opens_circuit_with_full_window() {
        let mut cfg = config();
        cfg.consecutive_failure_threshold = 100;
        let breaker = CircuitBreaker::new("catalog", cfg);

        // S F S F ... alternating, never two failures in a row.
        for i in 0..9 {
            if i % 2 == 0 {
                let _ = succeed(&breaker).await;
            } else {
                let _ = fail(&breaker).await;
            }
        }
        assert_eq!(breaker.state(), CircuitState::Closed);

        let _ = fail(&breaker).await;
        let stats = breaker.stats();
        assert_eq!(stats.history_len, 10);
        assert_eq!(stats.failure_rate_percent, 50.0);
        assert_eq!(stats.state, CircuitState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_rate_ignored_until_window_full() {
        let mut cfg = config();
        cfg.consecutive_failure_threshold = 100;
        let breaker = CircuitBreaker::new("catalog", cfg);

        let _ = succeed(&breaker).await;
        for _ in 0..3 {
            let _ = fail(&breaker).await;
        }
        assert!(breaker.stats().failure_rate_percent > 50.0);
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_circuit_rejects_without_calling() {
        let breaker = CircuitBreaker::new("profile", config());
        trip(&breaker).await;

        let counter = AtomicU32::new(0);
        let calls = &counter;
        for _ in 0..3 {
            let result: Result<u32, BreakerError<&'static str>> = breaker
                .execute(|| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(1)
                })
                .await;
            assert!(result.unwrap_err().is_open());
        }

        // Exactly at the cooldown boundary the circuit is still open.
        time::advance(Duration::from_millis(1_000)).await;
        let result: Result<u32, BreakerError<&'static str>> = breaker
            .execute(|| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(1)
            })
            .await;
        assert!(result.unwrap_err().is_open());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_admits_trial_call() {
        let breaker = CircuitBreaker::new("profile", config());
        trip(&breaker).await;

        time::advance(Duration::from_millis(1_001)).await;

        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<u32, BreakerError<&'static str>> = breaker
            .execute(|| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_closes_after_required_trials() {
        let breaker = CircuitBreaker::new("profile", config());
        trip(&breaker).await;
        assert_eq!(breaker.stats().consecutive_failures, 5);

        time::advance(Duration::from_millis(1_001)).await;
        let _ = succeed(&breaker).await;
        let _ = succeed(&breaker).await;
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        let _ = succeed(&breaker).await;
        let stats = breaker.stats();
        assert_eq!(stats.state, CircuitState::Closed);
        assert_eq!(stats.consecutive_failures, 0);
        assert_eq!(stats.total_successes, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_failure_reopens() {
        let breaker = CircuitBreaker::new("profile", config());
        trip(&breaker).await;

        time::advance(Duration::from_millis(1_001)).await;
        let _ = succeed(&breaker).await;
        let _ = succeed(&breaker).await;
        let _ = fail(&breaker).await;
        assert_eq!(breaker.state(), CircuitState::Open);

        // The failure restarted the cooldown.
        time::advance(Duration::from_millis(500)).await;
        assert!(succeed(&breaker).await.unwrap_err().is_open());

        // Trials start over after the next cooldown.
        time::advance(Duration::from_millis(501)).await;
        let _ = succeed(&breaker).await;
        let _ = succeed(&breaker).await;
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out_and_counts_as_failure() {
        let mut cfg = config();
        cfg.consecutive_failure_threshold = 2;
        let breaker = CircuitBreaker::new("catalog", cfg);

        for _ in 0..2 {
            let result: Result<u32, BreakerError<&'static str>> = breaker
                .execute(|| async {
                    time::sleep(Duration::from_secs(10)).await;
                    Ok(1)
                })
                .await;
            let err = result.unwrap_err();
            assert!(err.is_timeout());
            assert_eq!(err.to_string(), "call to 'catalog' timed out after 100ms");
        }
        assert_eq!(breaker.state(), CircuitState::Open);
        assert_eq!(breaker.stats().total_successes, 0);
    }

    #[test]
    fn test_state_serializes_screaming_snake_case() {
        assert_eq!(serde_json::to_string(&CircuitState::HalfOpen).unwrap(), "\"HALF_OPEN\"");
        assert_eq!(CircuitState::Open.to_string(), "OPEN");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_parallel_calls_keep_counters_consistent() {
        let breaker = Arc::new(CircuitBreaker::new("parallel", config()));

        let mut handles = Vec::new();
        for i in 0..400u32 {
            let breaker = breaker.clone();
            handles.push(tokio::spawn(async move {
                breaker
                    .execute(|| async move {
                        tokio::task::yield_now().await;
                        if i % 3 == 0 {
                            Err("boom")
                        } else {
                            Ok(i)
                        }
                    })
                    .await
                    .is_ok()
            }));
        }

        let mut succeeded = 0u64;
        for handle in handles {
            if handle.await.unwrap() {
                succeeded += 1;
            }
        }

        let stats = breaker.stats();
        assert!(stats.history_len <= breaker.config().failure_rate_window);
        assert_eq!(stats.total_successes, succeeded);
        assert!(succeeded > 0);
    }
}
