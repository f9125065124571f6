//! Page sessions: the capabilities Lookout consumes from a browser.
//!
//! [`PageSession`] is implemented by the CDP-backed
//! [`BrowserPage`](crate::BrowserPage) and by [`ScriptedSession`], an
//! in-memory stand-in whose evaluation results are scripted up front.

use crate::result::{LookoutError, LookoutResult};
use crate::wait::{PollOutcome, Poller, WaitOptions};
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Operations available on a page under test
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Navigate to a URL
    async fn navigate(&self, url: &str) -> LookoutResult<()>;

    /// Evaluate an expression in the page, returning its JSON value
    async fn evaluate(&self, expression: &str) -> LookoutResult<Value>;

    /// Press and release a key (see [`KeyDefinition`](crate::KeyDefinition))
    async fn press_key(&self, key: &str) -> LookoutResult<()>;

    /// Capture a PNG screenshot to `path`
    async fn screenshot(&self, path: &Path) -> LookoutResult<()>;

    /// Release the session
    async fn close(&self) -> LookoutResult<()>;
}

#[async_trait]
impl<S: PageSession + ?Sized> PageSession for Arc<S> {
    async fn navigate(&self, url: &str) -> LookoutResult<()> {
        (**self).navigate(url).await
    }

    async fn evaluate(&self, expression: &str) -> LookoutResult<Value> {
        (**self).evaluate(expression).await
    }

    async fn press_key(&self, key: &str) -> LookoutResult<()> {
        (**self).press_key(key).await
    }

    async fn screenshot(&self, path: &Path) -> LookoutResult<()> {
        (**self).screenshot(path).await
    }

    async fn close(&self) -> LookoutResult<()> {
        (**self).close().await
    }
}

/// Poll an in-page expression until it is truthy or the budget runs out.
///
/// Evaluation errors abort the wait immediately.
pub async fn wait_for_expression<S>(
    session: &S,
    expression: &str,
    options: &WaitOptions,
) -> LookoutResult<PollOutcome<Value>>
where
    S: PageSession + ?Sized,
{
    debug!(
        expression,
        timeout_ms = options.timeout_ms,
        poll_interval_ms = options.poll_interval_ms,
        "waiting for expression"
    );
    let outcome = Poller::new(*options)
        .poll_async(|| session.evaluate(expression))
        .await?;
    debug!(
        expression,
        satisfied = outcome.is_satisfied(),
        elapsed_ms = outcome.elapsed().as_millis() as u64,
        evaluations = outcome.evaluations(),
        "wait finished"
    );
    Ok(outcome)
}

/// Run `body` against `session`, then close it whether or not `body` failed.
///
/// An error from `body` takes precedence over an error from `close`.
pub async fn scoped<S, T, F>(session: S, body: F) -> LookoutResult<T>
where
    S: PageSession,
    F: for<'a> FnOnce(&'a S) -> BoxFuture<'a, LookoutResult<T>>,
{
    let result = body(&session).await;
    let closed = session.close().await;
    match (result, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) | (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            warn!(error = %close_err, "closing session failed after an earlier error");
            Err(e)
        }
    }
}

// ============================================================================
// Scripted session
// ============================================================================

#[derive(Debug, Clone)]
enum Scripted {
    Value(Value),
    Error(String),
}

#[derive(Debug, Default)]
struct ScriptState {
    responses: HashMap<String, VecDeque<Scripted>>,
    navigations: Vec<String>,
    keys: Vec<String>,
    screenshots: Vec<PathBuf>,
    screenshot_error: Option<String>,
    evaluations: usize,
    closed: bool,
}

impl ScriptState {
    fn ensure_open(&self) -> LookoutResult<()> {
        if self.closed {
            Err(LookoutError::page("session is closed"))
        } else {
            Ok(())
        }
    }
}

/// In-memory session with scripted evaluation results.
///
/// Each expression has a queue of responses. Responses are consumed in
/// order and the last one repeats. Unscripted expressions fail.
#[derive(Debug, Default)]
pub struct ScriptedSession {
    state: Mutex<ScriptState>,
}

impl ScriptedSession {
    /// Create a session with no scripted responses
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue values for an expression
    #[must_use]
    pub fn respond(
        mut self,
        expression: impl Into<String>,
        values: impl IntoIterator<Item = Value>,
    ) -> Self {
        self.state
            .get_mut()
            .responses
            .entry(expression.into())
            .or_default()
            .extend(values.into_iter().map(Scripted::Value));
        self
    }

    /// Queue an evaluation failure for an expression
    #[must_use]
    pub fn fail(mut self, expression: impl Into<String>, message: impl Into<String>) -> Self {
        self.state
            .get_mut()
            .responses
            .entry(expression.into())
            .or_default()
            .push_back(Scripted::Error(message.into()));
        self
    }

    /// Make every screenshot fail with `message`
    #[must_use]
    pub fn fail_screenshots(mut self, message: impl Into<String>) -> Self {
        self.state.get_mut().screenshot_error = Some(message.into());
        self
    }

    /// URLs navigated to, in order
    pub async fn navigations(&self) -> Vec<String> {
        self.state.lock().await.navigations.clone()
    }

    /// Keys pressed, in order
    pub async fn keys(&self) -> Vec<String> {
        self.state.lock().await.keys.clone()
    }

    /// Screenshot paths requested, in order
    pub async fn screenshots(&self) -> Vec<PathBuf> {
        self.state.lock().await.screenshots.clone()
    }

    /// Total number of evaluations
    pub async fn evaluations(&self) -> usize {
        self.state.lock().await.evaluations
    }

    /// Whether `close` has been called
    pub async fn is_closed(&self) -> bool {
        self.state.lock().await.closed
    }
}

#[async_trait]
impl PageSession for ScriptedSession {
    async fn navigate(&self, url: &str) -> LookoutResult<()> {
        let mut state = self.state.lock().await;
        state.ensure_open()?;
        state.navigations.push(url.to_string());
        Ok(())
    }

    async fn evaluate(&self, expression: &str) -> LookoutResult<Value> {
        let mut state = self.state.lock().await;
        state.ensure_open()?;
        state.evaluations += 1;

        let queue = state
            .responses
            .get_mut(expression)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| LookoutError::evaluation(expression, "no scripted response"))?;
        let next = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };

        match next {
            Some(Scripted::Value(value)) => Ok(value),
            Some(Scripted::Error(message)) => Err(LookoutError::evaluation(expression, message)),
            None => Err(LookoutError::evaluation(expression, "no scripted response")),
        }
    }

    async fn press_key(&self, key: &str) -> LookoutResult<()> {
        crate::keys::KeyDefinition::lookup(key)?;
        let mut state = self.state.lock().await;
        state.ensure_open()?;
        state.keys.push(key.to_string());
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> LookoutResult<()> {
        let mut state = self.state.lock().await;
        state.ensure_open()?;
        if let Some(ref message) = state.screenshot_error {
            return Err(LookoutError::ScreenshotError {
                message: message.clone(),
            });
        }
        state.screenshots.push(path.to_path_buf());
        Ok(())
    }

    async fn close(&self) -> LookoutResult<()> {
        let mut state = self.state.lock().await;
        state.ensure_open()?;
        state.closed = true;
        Ok(())
    }
}
