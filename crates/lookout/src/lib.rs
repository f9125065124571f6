//! Lookout: condition waits and page probes for debugging browser games
//!
//! Debugging a canvas game from the outside mostly means waiting: until the
//! page has loaded, until the game reaches a state, until the player lands.
//! Lookout replaces fixed sleeps with a polling wait that has a hard
//! timeout, and wraps the browser in a small session API.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐    ┌────────────┐    ┌──────────────┐
//! │ Scenario / │───►│  Poller    │───►│ PageSession  │
//! │ CLI        │    │ (wait.rs)  │    │ (Chromium or │
//! │            │    │            │    │  scripted)   │
//! └────────────┘    └────────────┘    └──────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use lookout::{Poller, PollOutcome, WaitOptions};
//!
//! let mut ticks = 0;
//! let poller = Poller::new(WaitOptions::new().with_timeout(1_000).with_poll_interval(1));
//! let outcome = poller
//!     .poll(&mut || -> Result<bool, std::convert::Infallible> {
//!         ticks += 1;
//!         Ok(ticks == 3)
//!     })
//!     .unwrap();
//! assert!(matches!(outcome, PollOutcome::Satisfied(s) if s.evaluations == 3));
//! ```

#![warn(missing_docs)]

mod browser;
mod keys;
mod probe;
mod result;
mod scenario;
mod session;
mod truthy;
mod wait;

pub use browser::{Browser, BrowserConfig, BrowserPage, CHROMIUM_PATH_ENV};
pub use keys::KeyDefinition;
pub use probe::{equals_expression, path_expression, ProbeSet, ProbeSpec};
pub use result::{LookoutError, LookoutResult};
pub use scenario::{Scenario, ScenarioReport, Step, StepReport, StepStatus, SCENARIO_VERSION};
pub use session::{scoped, wait_for_expression, PageSession, ScriptedSession};
pub use truthy::Truthy;
pub use wait::{
    wait_until, FnCondition, PollOutcome, Poller, Satisfied, TimedOut, WaitCondition, WaitError,
    WaitOptions, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS, MIN_POLL_INTERVAL_MS,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        scoped, wait_for_expression, Browser, BrowserConfig, LookoutError, LookoutResult,
        PageSession, PollOutcome, Poller, ProbeSet, Scenario, Truthy, WaitError, WaitOptions,
    };
}
