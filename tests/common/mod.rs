// tests/common/mod.rs
//
// Test doubles shared by the integration tests: listing sources with canned
// output and a scripted browser session factory. Nothing here is reachable
// from the library.
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use ghost_job_radar::ingest::browser::{PageSession, SessionFactory};
use ghost_job_radar::ingest::config::ScrapeConfig;
use ghost_job_radar::ingest::types::{JobPosting, ListingSource, Platform};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn posting(title: &str, company: &str, platform: Platform) -> JobPosting {
    JobPosting {
        title: title.to_string(),
        company: company.to_string(),
        location: "Remote".to_string(),
        description: String::new(),
        url: format!(
            "https://{}.example.test/{}",
            platform.as_str().to_ascii_lowercase(),
            title.replace(' ', "-")
        ),
        platform,
        posted_date: None,
        salary: None,
        job_type: None,
    }
}

pub fn posting_aged(title: &str, company: &str, platform: Platform, days: i64) -> JobPosting {
    JobPosting {
        posted_date: Some(Utc::now() - ChronoDuration::days(days)),
        ..posting(title, company, platform)
    }
}

/// Returns a fixed list (capped at `max_results`) and records how it was called.
pub struct FixedSource {
    pub platform: Platform,
    pub postings: Vec<JobPosting>,
    pub delay: Duration,
    pub calls: AtomicUsize,
    pub asked: Mutex<Vec<usize>>,
}

impl FixedSource {
    pub fn new(platform: Platform, postings: Vec<JobPosting>) -> Arc<Self> {
        Arc::new(Self {
            platform,
            postings,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            asked: Mutex::new(Vec::new()),
        })
    }

    pub fn slow(platform: Platform, postings: Vec<JobPosting>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            platform,
            postings,
            delay,
            calls: AtomicUsize::new(0),
            asked: Mutex::new(Vec::new()),
        })
    }

    pub fn empty(platform: Platform) -> Arc<Self> {
        Self::new(platform, Vec::new())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn asked(&self) -> Vec<usize> {
        self.asked.lock().unwrap().clone()
    }
}

#[async_trait]
impl ListingSource for FixedSource {
    async fn search(&self, _keywords: &[String], _location: &str, max_results: usize) -> Vec<JobPosting> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.asked.lock().unwrap().push(max_results);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.postings.iter().take(max_results).cloned().collect()
    }

    fn platform(&self) -> Platform {
        self.platform
    }
}

/// Generates `max_results` postings derived from the keywords.
pub struct SyntheticSource {
    pub platform: Platform,
}

#[async_trait]
impl ListingSource for SyntheticSource {
    async fn search(&self, keywords: &[String], location: &str, max_results: usize) -> Vec<JobPosting> {
        let role = keywords.join(" ");
        (0..max_results)
            .map(|i| JobPosting {
                location: if location.is_empty() {
                    "Remote".to_string()
                } else {
                    location.to_string()
                },
                ..posting(&format!("{role} {i}"), &format!("Synthetic {i}"), self.platform)
            })
            .collect()
    }

    fn platform(&self) -> Platform {
        self.platform
    }
}

pub fn as_sources(v: Vec<Arc<FixedSource>>) -> Vec<Arc<dyn ListingSource>> {
    v.into_iter()
        .map(|s| s as Arc<dyn ListingSource>)
        .collect()
}

/// Config with every wait set to zero so adapter tests run instantly.
pub fn instant_config() -> ScrapeConfig {
    ScrapeConfig {
        initial_settle_ms: 0,
        settle_delay_ms: 0,
        selector_timeout_ms: 0,
        navigation_timeout_ms: 1_000,
        max_stalled_attempts: 2,
        ..ScrapeConfig::default()
    }
}

/// What the scripted session does.
#[derive(Clone)]
pub struct Script {
    /// URL reported after navigation.
    pub landing_url: Option<String>,
    /// Page HTML; the last entry repeats once scrolling runs past the end.
    pub pages: Vec<String>,
    pub fail_open: bool,
    pub fail_goto: bool,
}

impl Script {
    pub fn page(html: &str) -> Self {
        Self {
            landing_url: None,
            pages: vec![html.to_string()],
            fail_open: false,
            fail_goto: false,
        }
    }
}

/// Counts opened/closed sessions and the URLs visited.
#[derive(Default)]
pub struct SessionLog {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub visited: Mutex<Vec<String>>,
}

pub struct ScriptedSessions {
    pub script: Script,
    pub log: Arc<SessionLog>,
}

impl ScriptedSessions {
    pub fn new(script: Script) -> (Arc<Self>, Arc<SessionLog>) {
        let log = Arc::new(SessionLog::default());
        (
            Arc::new(Self {
                script,
                log: Arc::clone(&log),
            }),
            log,
        )
    }
}

#[async_trait]
impl SessionFactory for ScriptedSessions {
    async fn open(&self) -> Result<Box<dyn PageSession>> {
        if self.script.fail_open {
            return Err(anyhow!("no browser available"));
        }
        self.log.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedPage {
            script: self.script.clone(),
            log: Arc::clone(&self.log),
            url: String::new(),
            step: AtomicUsize::new(0),
        }))
    }
}

struct ScriptedPage {
    script: Script,
    log: Arc<SessionLog>,
    url: String,
    step: AtomicUsize,
}

#[async_trait]
impl PageSession for ScriptedPage {
    async fn goto(&mut self, url: &str, _timeout: Duration) -> Result<()> {
        self.log.visited.lock().unwrap().push(url.to_string());
        if self.script.fail_goto {
            return Err(anyhow!("navigation timed out"));
        }
        self.url = self
            .script
            .landing_url
            .clone()
            .unwrap_or_else(|| url.to_string());
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.url.clone())
    }

    async fn content(&self) -> Result<String> {
        let i = self
            .step
            .load(Ordering::SeqCst)
            .min(self.script.pages.len().saturating_sub(1));
        Ok(self.script.pages.get(i).cloned().unwrap_or_default())
    }

    async fn wait_for_selector(&self, _selector: &str, _timeout: Duration) -> bool {
        true
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.step.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn click(&self, _selector: &str) -> Result<bool> {
        Ok(false)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.log.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{name}")).expect("fixture")
}
