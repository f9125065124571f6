//! Browser control over the Chrome `DevTools` Protocol.
//!
//! With the `browser` feature, [`Browser`] launches Chromium through
//! chromiumoxide and [`BrowserPage`] implements [`PageSession`] on a real
//! page. Without it, launching fails with
//! [`LookoutError::BrowserUnavailable`] so the rest of the crate (and its
//! tests) still builds on machines with no Chromium.

use crate::result::{LookoutError, LookoutResult};
use crate::session::PageSession;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable consulted when no chromium path is configured
pub const CHROMIUM_PATH_ENV: &str = "CHROMIUM_PATH";

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = `CHROMIUM_PATH` or auto-detect)
    pub chromium_path: Option<PathBuf>,
    /// User agent string
    pub user_agent: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            chromium_path: None,
            user_agent: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Set user agent
    #[must_use]
    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Configured chromium path, falling back to `CHROMIUM_PATH`
    #[must_use]
    pub fn resolved_chromium_path(&self) -> Option<PathBuf> {
        self.chromium_path.clone().or_else(|| {
            std::env::var_os(CHROMIUM_PATH_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        })
    }

    /// Chromium executable to launch; `None` leaves detection to the driver
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::BrowserNotFound`] if a configured path does
    /// not exist
    pub fn executable(&self) -> LookoutResult<Option<PathBuf>> {
        match self.resolved_chromium_path() {
            Some(path) if !path.exists() => Err(LookoutError::BrowserNotFound),
            other => Ok(other),
        }
    }
}

// ============================================================================
// Real CDP Implementation (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
mod cdp {
    use super::{BrowserConfig, LookoutError, LookoutResult, PageSession};
    use crate::keys::KeyDefinition;
    use async_trait::async_trait;
    use base64::Engine;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::input::{
        DispatchKeyEventParams, DispatchKeyEventType,
    };
    use chromiumoxide::cdp::browser_protocol::page::{
        CaptureScreenshotFormat, CaptureScreenshotParams,
    };
    use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
    use chromiumoxide::handler::viewport::Viewport;
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use serde_json::Value;
    use std::path::Path;
    use tokio::sync::Mutex;
    use tracing::{debug, info, warn};

    /// Browser instance with real CDP connection
    #[derive(Debug)]
    pub struct Browser {
        config: BrowserConfig,
        inner: CdpBrowser,
        handle: tokio::task::JoinHandle<()>,
    }

    impl Browser {
        /// Launch a new browser instance
        ///
        /// # Errors
        ///
        /// Returns error if browser cannot be launched
        pub async fn launch(config: BrowserConfig) -> LookoutResult<Self> {
            let mut builder = CdpConfig::builder()
                .window_size(config.viewport_width, config.viewport_height)
                .viewport(Viewport {
                    width: config.viewport_width,
                    height: config.viewport_height,
                    ..Viewport::default()
                });

            if !config.headless {
                builder = builder.with_head();
            }
            if !config.sandbox {
                builder = builder.no_sandbox();
            }
            if let Some(path) = config.executable()? {
                builder = builder.chrome_executable(path);
            }
            if let Some(ref ua) = config.user_agent {
                builder = builder.arg(format!("--user-agent={ua}"));
            }

            let cdp_config = builder.build().map_err(|message| {
                if message.contains("executable") {
                    LookoutError::BrowserNotFound
                } else {
                    LookoutError::BrowserLaunchError { message }
                }
            })?;

            info!(
                headless = config.headless,
                width = config.viewport_width,
                height = config.viewport_height,
                "launching browser"
            );
            let (inner, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(|e| {
                LookoutError::BrowserLaunchError {
                    message: e.to_string(),
                }
            })?;

            let handle = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if let Err(e) = event {
                        debug!(error = %e, "CDP handler stopped");
                        break;
                    }
                }
            });

            Ok(Self {
                config,
                inner,
                handle,
            })
        }

        /// Get the browser configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }

        /// Open a blank page. The page owns the browser from here on and
        /// closing the page shuts the browser down.
        ///
        /// # Errors
        ///
        /// Returns error if page cannot be created
        pub async fn open_page(self) -> LookoutResult<BrowserPage> {
            let page = self
                .inner
                .new_page("about:blank")
                .await
                .map_err(|e| LookoutError::page(e.to_string()))?;

            Ok(BrowserPage {
                page: Mutex::new(Some(page)),
                browser: Mutex::new(Some(self)),
            })
        }

        async fn shutdown(mut self) -> LookoutResult<()> {
            let closed = self.inner.close().await;
            if closed.is_ok() {
                if let Err(e) = self.inner.wait().await {
                    debug!(error = %e, "waiting for browser process");
                }
            }
            self.handle.abort();
            closed
                .map(|_| ())
                .map_err(|e| LookoutError::page(format!("closing browser: {e}")))
        }
    }

    /// A browser page with real CDP connection
    #[derive(Debug)]
    pub struct BrowserPage {
        page: Mutex<Option<CdpPage>>,
        browser: Mutex<Option<Browser>>,
    }

    fn closed() -> LookoutError {
        LookoutError::page("page is closed")
    }

    fn input_error(e: impl std::fmt::Display) -> LookoutError {
        LookoutError::InputError {
            message: e.to_string(),
        }
    }

    fn key_event(
        kind: DispatchKeyEventType,
        def: &KeyDefinition,
    ) -> LookoutResult<DispatchKeyEventParams> {
        let mut builder = DispatchKeyEventParams::builder()
            .r#type(kind.clone())
            .key(def.key.clone())
            .code(def.code.clone())
            .windows_virtual_key_code(def.key_code)
            .native_virtual_key_code(def.key_code);
        if kind == DispatchKeyEventType::KeyDown {
            if let Some(ref text) = def.text {
                builder = builder.text(text.clone());
            }
        }
        builder.build().map_err(input_error)
    }

    #[async_trait]
    impl PageSession for BrowserPage {
        async fn navigate(&self, url: &str) -> LookoutResult<()> {
            let guard = self.page.lock().await;
            let page = guard.as_ref().ok_or_else(closed)?;
            debug!(url, "navigating");
            page.goto(url)
                .await
                .map_err(|e| LookoutError::NavigationError {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            Ok(())
        }

        async fn evaluate(&self, expression: &str) -> LookoutResult<Value> {
            let guard = self.page.lock().await;
            let page = guard.as_ref().ok_or_else(closed)?;
            let params = EvaluateParams::builder()
                .expression(expression)
                .return_by_value(true)
                .await_promise(true)
                .build()
                .map_err(|message| LookoutError::evaluation(expression, message))?;
            let result = page
                .evaluate_expression(params)
                .await
                .map_err(|e| LookoutError::evaluation(expression, e.to_string()))?;
            // `undefined` comes back with no value at all
            Ok(result.value().cloned().unwrap_or(Value::Null))
        }

        async fn press_key(&self, key: &str) -> LookoutResult<()> {
            let def = KeyDefinition::lookup(key)?;
            let guard = self.page.lock().await;
            let page = guard.as_ref().ok_or_else(closed)?;
            debug!(key = %def.key, code = %def.code, "pressing key");
            for kind in [DispatchKeyEventType::KeyDown, DispatchKeyEventType::KeyUp] {
                page.execute(key_event(kind, &def)?)
                    .await
                    .map_err(input_error)?;
            }
            Ok(())
        }

        async fn screenshot(&self, path: &Path) -> LookoutResult<()> {
            let guard = self.page.lock().await;
            let page = guard.as_ref().ok_or_else(closed)?;
            let params = CaptureScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .build();

            let screenshot =
                page.execute(params)
                    .await
                    .map_err(|e| LookoutError::ScreenshotError {
                        message: e.to_string(),
                    })?;

            let bytes = base64::engine::general_purpose::STANDARD
                .decode(&screenshot.data)
                .map_err(|e| LookoutError::ScreenshotError {
                    message: e.to_string(),
                })?;
            tokio::fs::write(path, bytes).await?;
            info!(path = %path.display(), "saved screenshot");
            Ok(())
        }

        async fn close(&self) -> LookoutResult<()> {
            let page = self.page.lock().await.take().ok_or_else(closed)?;
            if let Err(e) = page.close().await {
                warn!(error = %e, "closing page failed, shutting browser down anyway");
            }
            match self.browser.lock().await.take() {
                Some(browser) => browser.shutdown().await,
                None => Ok(()),
            }
        }
    }
}

// ============================================================================
// Unavailable Implementation (when `browser` feature is NOT enabled)
// ============================================================================

#[cfg(not(feature = "browser"))]
mod unavailable {
    use super::{BrowserConfig, LookoutError, LookoutResult, PageSession};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::path::Path;

    /// Browser handle; cannot be launched without the `browser` feature
    #[derive(Debug)]
    pub struct Browser {
        config: BrowserConfig,
    }

    impl Browser {
        /// Always fails with [`LookoutError::BrowserUnavailable`]
        ///
        /// # Errors
        ///
        /// Always returns error in this build
        #[allow(clippy::unused_async)]
        pub async fn launch(_config: BrowserConfig) -> LookoutResult<Self> {
            Err(LookoutError::BrowserUnavailable)
        }

        /// Get the browser configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }

        /// Always fails with [`LookoutError::BrowserUnavailable`]
        ///
        /// # Errors
        ///
        /// Always returns error in this build
        #[allow(clippy::unused_async)]
        pub async fn open_page(self) -> LookoutResult<BrowserPage> {
            Err(LookoutError::BrowserUnavailable)
        }
    }

    /// Page handle; every operation fails without the `browser` feature
    #[derive(Debug)]
    pub struct BrowserPage {
        _private: (),
    }

    #[async_trait]
    impl PageSession for BrowserPage {
        async fn navigate(&self, _url: &str) -> LookoutResult<()> {
            Err(LookoutError::BrowserUnavailable)
        }

        async fn evaluate(&self, _expression: &str) -> LookoutResult<Value> {
            Err(LookoutError::BrowserUnavailable)
        }

        async fn press_key(&self, _key: &str) -> LookoutResult<()> {
            Err(LookoutError::BrowserUnavailable)
        }

        async fn screenshot(&self, _path: &Path) -> LookoutResult<()> {
            Err(LookoutError::BrowserUnavailable)
        }

        async fn close(&self) -> LookoutResult<()> {
            Err(LookoutError::BrowserUnavailable)
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::{Browser, BrowserPage};

#[cfg(not(feature = "browser"))]
pub use unavailable::{Browser, BrowserPage};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BrowserConfig::default();
        assert!(config.headless);
        assert!(config.sandbox);
        assert_eq!((config.viewport_width, config.viewport_height), (1280, 720));
    }

    #[test]
    fn test_builder_chain() {
        let config = BrowserConfig::default()
            .with_viewport(800, 600)
            .with_headless(false)
            .with_no_sandbox()
            .with_chromium_path("/usr/bin/chromium")
            .with_user_agent("lookout");
        assert!(!config.headless);
        assert!(!config.sandbox);
        assert_eq!(config.viewport_width, 800);
        assert_eq!(
            config.resolved_chromium_path(),
            Some(PathBuf::from("/usr/bin/chromium"))
        );
        assert_eq!(config.user_agent.as_deref(), Some("lookout"));
    }

    #[test]
    fn test_partial_yaml_takes_defaults() {
        let config: BrowserConfig = serde_yaml_ng::from_str("headless: false").unwrap();
        assert!(!config.headless);
        assert_eq!(config.viewport_width, 1280);
        assert!(config.sandbox);
    }

    #[test]
    fn test_missing_executable_not_found() {
        let config = BrowserConfig::default().with_chromium_path("/nonexistent/chromium");
        assert!(matches!(
            config.executable(),
            Err(LookoutError::BrowserNotFound)
        ));
    }

    #[test]
    fn test_existing_executable_passes_through() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = BrowserConfig::default().with_chromium_path(file.path());
        assert_eq!(config.executable().unwrap(), Some(file.path().to_path_buf()));
    }

    #[cfg(feature = "browser")]
    #[tokio::test]
    async fn test_launch_with_missing_executable() {
        let config = BrowserConfig::default().with_chromium_path("/nonexistent/chromium");
        let err = Browser::launch(config).await.unwrap_err();
        assert!(matches!(err, LookoutError::BrowserNotFound));
    }

    #[cfg(not(feature = "browser"))]
    #[tokio::test]
    async fn test_launch_without_feature_fails() {
        let err = Browser::launch(BrowserConfig::default()).await.unwrap_err();
        assert!(matches!(err, LookoutError::BrowserUnavailable));
    }
}
