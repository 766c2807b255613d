//! Browser session abstraction used by the listing adapters.
//!
//! A `SessionFactory` hands out one isolated `PageSession` per adapter call.
//! The production factory launches a dedicated headless Chromium (own profile
//! directory, browser-like fingerprint) via chromiumoxide; tests substitute
//! scripted sessions.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::ingest::config::ScrapeConfig;

pub const ENV_CHROMIUM_PATH: &str = "GHOST_RADAR_CHROMIUM_PATH";

/// Hides the usual automation tells before any site script runs.
const STEALTH_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
"#;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// One open page inside an isolated browsing session.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Navigate and wait for the document, bounded by `timeout`.
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<()>;
    /// URL the page actually landed on (after redirects).
    async fn current_url(&self) -> Result<String>;
    /// Current serialized DOM.
    async fn content(&self) -> Result<String>;
    /// Poll for `selector` until it appears or `timeout` elapses.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> bool;
    async fn scroll_to_bottom(&self) -> Result<()>;
    /// Click the first element matching `selector`; `Ok(false)` when absent.
    async fn click(&self, selector: &str) -> Result<bool>;
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Starts a fresh, unshared session for every call.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn PageSession>>;
}

/// Find the Chromium binary path.
pub fn find_chromium(configured: Option<&PathBuf>) -> Option<PathBuf> {
    if let Some(p) = configured {
        if p.exists() {
            return Some(p.clone());
        }
    }
    if let Ok(p) = std::env::var(ENV_CHROMIUM_PATH) {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }
    ["google-chrome", "chromium", "chromium-browser"]
        .into_iter()
        .find_map(|name| which::which(name).ok())
}

/// Production factory: one headless Chromium process per session.
#[derive(Debug, Clone)]
pub struct ChromiumSessionFactory {
    cfg: ScrapeConfig,
}

impl ChromiumSessionFactory {
    pub fn new(cfg: ScrapeConfig) -> Self {
        Self { cfg }
    }

    fn browser_config(&self, profile_dir: &Path) -> Result<BrowserConfig> {
        let chrome = find_chromium(self.cfg.chromium_path.as_ref())
            .context("Chromium not found; set chromium_path or GHOST_RADAR_CHROMIUM_PATH")?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome)
            .user_data_dir(profile_dir)
            .window_size(self.cfg.viewport_width, self.cfg.viewport_height)
            .request_timeout(Duration::from_millis(self.cfg.navigation_timeout_ms))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg(format!("--user-agent={}", self.cfg.user_agent))
            .arg(format!("--lang={}", self.cfg.locale));
        if !self.cfg.headless {
            builder = builder.with_head();
        }
        builder
            .build()
            .map_err(|e| anyhow!("failed to build browser config: {e}"))
    }
}

#[async_trait]
impl SessionFactory for ChromiumSessionFactory {
    async fn open(&self) -> Result<Box<dyn PageSession>> {
        let profile_dir =
            std::env::temp_dir().join(format!("ghost-radar-profile-{}", uuid::Uuid::new_v4()));
        let config = self.browser_config(&profile_dir)?;

        let (browser, mut handler) = match Browser::launch(config).await {
            Ok(pair) => pair,
            Err(e) => {
                let _ = std::fs::remove_dir_all(&profile_dir);
                return Err(e).context("failed to launch Chromium");
            }
        };

        let handler = tokio::spawn(async move {
            while handler.next().await.is_some() {}
        });

        let page = match browser.new_page("about:blank").await {
            Ok(p) => p,
            Err(e) => {
                handler.abort();
                let _ = std::fs::remove_dir_all(&profile_dir);
                return Err(e).context("failed to create new page");
            }
        };
        let session = ChromiumSession {
            browser,
            page,
            handler,
            profile_dir,
        };
        let installed = session
            .page
            .execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT))
            .await;
        if let Err(e) = installed {
            let _ = Box::new(session).close().await;
            return Err(e).context("failed to install stealth script");
        }

        Ok(Box::new(session))
    }
}

/// A single Chromium process with one page.
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    profile_dir: PathBuf,
}

#[async_trait]
impl PageSession for ChromiumSession {
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(anyhow!("navigation failed: {e}")),
            Err(_) => Err(anyhow!(
                "navigation timed out after {}ms",
                timeout.as_millis()
            )),
        }
    }

    async fn current_url(&self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .context("failed to get URL")?
            .map(|u| u.to_string())
            .unwrap_or_default();
        Ok(url)
    }

    async fn content(&self) -> Result<String> {
        self.page.content().await.context("failed to get HTML")
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await
            .context("scroll failed")?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<bool> {
        let Ok(element) = self.page.find_element(selector).await else {
            return Ok(false);
        };
        element.click().await.context("click failed")?;
        Ok(true)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let ChromiumSession {
            mut browser,
            page,
            handler,
            profile_dir,
        } = *self;
        let _ = page.close().await;
        if let Err(e) = browser.close().await {
            debug!(target: "scrape", error = %e, "browser close failed");
        }
        let _ = browser.wait().await;
        handler.abort();
        let _ = std::fs::remove_dir_all(&profile_dir);
        Ok(())
    }
}
