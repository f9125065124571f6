//! Condition polling with timeout.
//!
//! Every wait in Lookout is expressed the same way: evaluate a predicate
//! against the page under test, and if it is not yet truthy, sleep for a
//! fixed poll interval and try again until the time budget runs out.
//!
//! ```text
//!            evaluate ──► truthy? ──yes──► Satisfied
//!               ▲            │
//!               │            no
//!               │            ▼
//!             sleep ◄──no── elapsed >= timeout? ──yes──► TimedOut
//! ```
//!
//! A predicate that fails aborts the wait on that tick. The poller never
//! logs; reporting is up to the caller.

use crate::result::{LookoutError, LookoutResult};
use crate::truthy::Truthy;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (30 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Floor applied to the poll interval so a zero interval cannot spin
pub const MIN_POLL_INTERVAL_MS: u64 = 1;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration, never below [`MIN_POLL_INTERVAL_MS`]
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }
}

// =============================================================================
// WAIT CONDITION TRAIT
// =============================================================================

/// A predicate over external state, evaluated once per poll tick.
///
/// Any `FnMut() -> Result<V, E>` closure with a [`Truthy`] value is a
/// condition. Wrap it in [`FnCondition`] to attach a description.
pub trait WaitCondition {
    /// Value produced by one evaluation
    type Value: Truthy;
    /// Error raised when evaluation itself fails
    type Error;

    /// Evaluate the predicate against current state
    fn evaluate(&mut self) -> Result<Self::Value, Self::Error>;

    /// Get description for error messages
    fn description(&self) -> String {
        String::from("condition")
    }
}

impl<F, V, E> WaitCondition for F
where
    F: FnMut() -> Result<V, E>,
    V: Truthy,
{
    type Value = V;
    type Error = E;

    fn evaluate(&mut self) -> Result<V, E> {
        self()
    }
}

/// A function-based wait condition with a description
pub struct FnCondition<F> {
    func: F,
    description: String,
}

impl<F> std::fmt::Debug for FnCondition<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnCondition")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl<F> FnCondition<F> {
    /// Create a new function condition
    pub fn new(func: F, description: impl Into<String>) -> Self {
        Self {
            func,
            description: description.into(),
        }
    }
}

impl<F, V, E> WaitCondition for FnCondition<F>
where
    F: FnMut() -> Result<V, E>,
    V: Truthy,
{
    type Value = V;
    type Error = E;

    fn evaluate(&mut self) -> Result<V, E> {
        (self.func)()
    }

    fn description(&self) -> String {
        self.description.clone()
    }
}

// =============================================================================
// OUTCOMES
// =============================================================================

/// The predicate became truthy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Satisfied {
    /// Time from the start of the wait to the satisfying evaluation
    pub elapsed: Duration,
    /// Number of times the predicate was evaluated
    pub evaluations: u32,
}

/// The time budget ran out before the predicate became truthy
#[derive(Debug, Clone, PartialEq)]
pub struct TimedOut<V> {
    /// Time from the start of the wait to the final evaluation
    pub elapsed: Duration,
    /// Number of times the predicate was evaluated
    pub evaluations: u32,
    /// Value returned by the final evaluation
    pub last: V,
}

/// Terminal state of one wait operation
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<V> {
    /// Predicate evaluated truthy
    Satisfied(Satisfied),
    /// Time budget exhausted
    TimedOut(TimedOut<V>),
}

impl<V> PollOutcome<V> {
    /// Whether the predicate was satisfied
    #[must_use]
    pub const fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied(_))
    }

    /// Time spent waiting
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        match self {
            Self::Satisfied(s) => s.elapsed,
            Self::TimedOut(t) => t.elapsed,
        }
    }

    /// Number of predicate evaluations
    #[must_use]
    pub const fn evaluations(&self) -> u32 {
        match self {
            Self::Satisfied(s) => s.evaluations,
            Self::TimedOut(t) => t.evaluations,
        }
    }

    /// Convert to a `Result`, treating timeout as an error
    pub fn into_result<E>(self, waited_for: impl Into<String>) -> Result<Satisfied, WaitError<E>> {
        match self {
            Self::Satisfied(s) => Ok(s),
            Self::TimedOut(t) => Err(WaitError::Timeout {
                elapsed: t.elapsed,
                evaluations: t.evaluations,
                waited_for: waited_for.into(),
            }),
        }
    }
}

/// Why a wait did not succeed
#[derive(Debug, Error)]
pub enum WaitError<E> {
    /// Predicate never became truthy within the budget
    #[error("timed out after {}ms waiting for {waited_for} ({evaluations} evaluations)", .elapsed.as_millis())]
    Timeout {
        /// Time spent waiting
        elapsed: Duration,
        /// Number of predicate evaluations
        evaluations: u32,
        /// Description of the condition
        waited_for: String,
    },

    /// Predicate evaluation failed; the wait was abandoned on that tick
    #[error("predicate evaluation failed: {0}")]
    Predicate(E),
}

impl<E> WaitError<E> {
    /// Whether this is a timeout
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<WaitError<LookoutError>> for LookoutError {
    fn from(err: WaitError<LookoutError>) -> Self {
        match err {
            WaitError::Timeout {
                elapsed,
                waited_for,
                ..
            } => Self::Timeout {
                elapsed,
                waited_for,
            },
            WaitError::Predicate(e) => e,
        }
    }
}

// =============================================================================
// POLLER
// =============================================================================

/// Fixed-interval condition poller
#[derive(Debug, Clone, Copy, Default)]
pub struct Poller {
    options: WaitOptions,
}

impl Poller {
    /// Create a poller with the given options
    #[must_use]
    pub const fn new(options: WaitOptions) -> Self {
        Self { options }
    }

    /// Options in effect
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// Poll a condition, blocking the calling thread between ticks.
    ///
    /// Timeout is an `Ok` outcome; a predicate error is returned as-is.
    pub fn poll<C: WaitCondition>(
        &self,
        condition: &mut C,
    ) -> Result<PollOutcome<C::Value>, C::Error> {
        let start = Instant::now();
        let timeout = self.options.timeout();
        let interval = self.options.poll_interval();
        let mut evaluations = 0;

        loop {
            let value = condition.evaluate()?;
            evaluations += 1;
            let elapsed = start.elapsed();

            if value.is_truthy() {
                return Ok(PollOutcome::Satisfied(Satisfied {
                    elapsed,
                    evaluations,
                }));
            }
            if elapsed >= timeout {
                return Ok(PollOutcome::TimedOut(TimedOut {
                    elapsed,
                    evaluations,
                    last: value,
                }));
            }
            std::thread::sleep(interval.min(timeout - elapsed));
        }
    }

    /// Poll a condition, treating timeout as an error
    pub fn wait<C: WaitCondition>(&self, condition: &mut C) -> Result<Satisfied, WaitError<C::Error>> {
        let waited_for = condition.description();
        self.poll(condition)
            .map_err(WaitError::Predicate)?
            .into_result(waited_for)
    }

    /// Poll an async condition, suspending on the tokio timer between ticks.
    ///
    /// Dropping the returned future cancels the wait.
    pub async fn poll_async<F, Fut, V, E>(&self, mut condition: F) -> Result<PollOutcome<V>, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        V: Truthy,
    {
        let start = tokio::time::Instant::now();
        let timeout = self.options.timeout();
        let interval = self.options.poll_interval();
        let mut evaluations = 0;

        loop {
            let value = condition().await?;
            evaluations += 1;
            let elapsed = start.elapsed();

            if value.is_truthy() {
                return Ok(PollOutcome::Satisfied(Satisfied {
                    elapsed,
                    evaluations,
                }));
            }
            if elapsed >= timeout {
                return Ok(PollOutcome::TimedOut(TimedOut {
                    elapsed,
                    evaluations,
                    last: value,
                }));
            }
            tokio::time::sleep(interval.min(timeout - elapsed)).await;
        }
    }

    /// Poll an async condition, treating timeout as an error
    pub async fn wait_async<F, Fut, V, E>(
        &self,
        condition: F,
        waited_for: &str,
    ) -> Result<Satisfied, WaitError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        V: Truthy,
    {
        self.poll_async(condition)
            .await
            .map_err(WaitError::Predicate)?
            .into_result(waited_for)
    }
}

// =============================================================================
// CONVENIENCE FUNCTIONS
// =============================================================================

/// Wait for an infallible predicate, returning the elapsed time.
pub fn wait_until<F>(mut predicate: F, timeout_ms: u64, interval_ms: u64) -> LookoutResult<Duration>
where
    F: FnMut() -> bool,
{
    let poller = Poller::new(
        WaitOptions::new()
            .with_timeout(timeout_ms)
            .with_poll_interval(interval_ms),
    );
    let mut condition = FnCondition::new(move || Ok::<_, Infallible>(predicate()), "predicate");
    match poller.wait(&mut condition) {
        Ok(satisfied) => Ok(satisfied.elapsed),
        Err(WaitError::Timeout {
            elapsed,
            waited_for,
            ..
        }) => Err(LookoutError::Timeout {
            elapsed,
            waited_for,
        }),
        Err(WaitError::Predicate(never)) => match never {},
    }
}

// =============================================================================
// TESTS
// =============================================================================
