// src/ingest/providers/mod.rs
//! Listing-site adapters.
//!
//! Control flow lives in `SiteAdapter`; each site only contributes a
//! `SiteProfile` (base URL, query parameters, block markers, locator tables).

pub mod glassdoor;
pub mod indeed;
pub mod linkedin;

use async_trait::async_trait;
use chrono::Utc;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

use crate::ingest::browser::{PageSession, SessionFactory};
use crate::ingest::config::ScrapeConfig;
use crate::ingest::extract::{LocatorTable, ResilientExtractor};
use crate::ingest::paginate::Paginator;
use crate::ingest::types::{JobPosting, ListingSource, Platform};

/// One query-string parameter of a site's search URL.
#[derive(Debug, Clone, Copy)]
pub enum QueryParam {
    /// Space-joined keywords.
    Keywords(&'static str),
    /// The location text.
    Location(&'static str),
    /// Fixed value, only sent alongside a non-empty location.
    WithLocation(&'static str, &'static str),
}

/// Static description of one listing site.
#[derive(Debug, Clone, Copy)]
pub struct SiteProfile {
    pub platform: Platform,
    pub origin: &'static str,
    pub search_path: &'static str,
    pub query: &'static [QueryParam],
    /// Substrings of the landing URL that mean a challenge or login wall.
    pub blocked_url_markers: &'static [&'static str],
    /// Substrings of the landing page body that mean an interstitial.
    pub blocked_body_markers: &'static [&'static str],
    pub containers: &'static [&'static str],
    pub load_more: &'static [&'static str],
    pub locators: LocatorTable,
}

impl SiteProfile {
    /// Build the search URL; empty keyword/location values are omitted.
    pub fn search_url(&self, keywords: &[String], location: &str) -> anyhow::Result<Url> {
        let mut url = Url::parse(self.origin)?.join(self.search_path)?;
        let joined = keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let location = location.trim();

        let pairs: Vec<(&str, &str)> = self
            .query
            .iter()
            .filter_map(|p| match *p {
                QueryParam::Keywords(k) => (!joined.is_empty()).then_some((k, joined.as_str())),
                QueryParam::Location(k) => (!location.is_empty()).then_some((k, location)),
                QueryParam::WithLocation(k, v) => (!location.is_empty()).then_some((k, v)),
            })
            .collect();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    fn block_reason(&self, landing_url: &str, body: &str) -> Option<String> {
        let url_lower = landing_url.to_ascii_lowercase();
        if let Some(m) = self
            .blocked_url_markers
            .iter()
            .find(|m| url_lower.contains(*m))
        {
            return Some(format!("redirected to '{m}' page"));
        }
        let body_lower = body.to_ascii_lowercase();
        self.blocked_body_markers
            .iter()
            .find(|m| body_lower.contains(*m))
            .map(|m| format!("interstitial '{m}' in page body"))
    }
}

/// Internal failure classes of one adapter call; never escape `search`.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("blocked by {platform}: {reason}")]
    Blocked { platform: Platform, reason: String },
    #[error("session could not be started: {0:#}")]
    Session(anyhow::Error),
    #[error("navigation failed: {0:#}")]
    Navigation(anyhow::Error),
}

impl ScrapeError {
    fn kind(&self) -> &'static str {
        match self {
            ScrapeError::Blocked { .. } => "blocked",
            ScrapeError::Session(_) => "session",
            ScrapeError::Navigation(_) => "navigation",
        }
    }
}

/// Timing knobs copied out of `ScrapeConfig`.
#[derive(Debug, Clone, Copy)]
struct Timing {
    navigation: Duration,
    selector: Duration,
    initial_settle: Duration,
}

/// Generic adapter: session + pagination + extraction over a `SiteProfile`.
pub struct SiteAdapter {
    profile: &'static SiteProfile,
    extractor: ResilientExtractor,
    paginator: Paginator,
    timing: Timing,
    sessions: Arc<dyn SessionFactory>,
}

impl SiteAdapter {
    pub fn new(
        profile: &'static SiteProfile,
        cfg: &ScrapeConfig,
        sessions: Arc<dyn SessionFactory>,
    ) -> anyhow::Result<Self> {
        let origin = Url::parse(profile.origin)?;
        Ok(Self {
            profile,
            extractor: ResilientExtractor::new(profile.platform, origin, &profile.locators),
            paginator: Paginator::new(cfg.settle_delay(), cfg.max_stalled_attempts),
            timing: Timing {
                navigation: cfg.navigation_timeout(),
                selector: cfg.selector_timeout(),
                initial_settle: cfg.initial_settle(),
            },
            sessions,
        })
    }

    async fn run(&self, url: &Url, max_results: usize) -> Result<Vec<JobPosting>, ScrapeError> {
        let mut session = self.sessions.open().await.map_err(ScrapeError::Session)?;
        let out = self.drive(session.as_mut(), url, max_results).await;
        if let Err(e) = session.close().await {
            debug!(target: "scrape", platform = %self.profile.platform, error = %e, "session close failed");
        }
        out
    }

    async fn drive(
        &self,
        session: &mut dyn PageSession,
        url: &Url,
        max_results: usize,
    ) -> Result<Vec<JobPosting>, ScrapeError> {
        let platform = self.profile.platform;
        info!(target: "scrape", %platform, %url, "navigating");

        session
            .goto(url.as_str(), self.timing.navigation)
            .await
            .map_err(ScrapeError::Navigation)?;
        tokio::time::sleep(self.timing.initial_settle).await;

        let landing = session
            .current_url()
            .await
            .map_err(ScrapeError::Navigation)?;
        let body = session.content().await.map_err(ScrapeError::Navigation)?;
        if let Some(reason) = self.profile.block_reason(&landing, &body) {
            return Err(ScrapeError::Blocked { platform, reason });
        }

        let mut container_found = false;
        for sel in self.profile.containers {
            if session.wait_for_selector(sel, self.timing.selector).await {
                container_found = true;
                break;
            }
        }
        if !container_found {
            debug!(target: "scrape", %platform, "results container not found; paginating anyway");
        }

        let outcome = self
            .paginator
            .run(session, &self.extractor, self.profile.load_more, max_results)
            .await
            .map_err(ScrapeError::Navigation)?;

        let html = session.content().await.map_err(ScrapeError::Navigation)?;
        let extraction = self.extractor.extract_all(&html, max_results, Utc::now());
        counter!("scrape_cards_total", "platform" => platform.as_str())
            .increment(outcome.cards as u64);
        info!(
            target: "scrape",
            %platform,
            cards = outcome.cards,
            kept = extraction.postings.len(),
            dropped = extraction.dropped,
            stop = ?outcome.reason,
            "extraction finished"
        );
        Ok(extraction.postings)
    }
}

#[async_trait]
impl ListingSource for SiteAdapter {
    async fn search(
        &self,
        keywords: &[String],
        location: &str,
        max_results: usize,
    ) -> Vec<JobPosting> {
        let platform = self.profile.platform;
        if max_results == 0 {
            return Vec::new();
        }
        let url = match self.profile.search_url(keywords, location) {
            Ok(u) => u,
            Err(e) => {
                warn!(target: "scrape", %platform, error = %e, "could not build search url");
                return Vec::new();
            }
        };

        let t0 = Instant::now();
        let result = self.run(&url, max_results).await;
        histogram!("scrape_duration_ms", "platform" => platform.as_str())
            .record(t0.elapsed().as_secs_f64() * 1_000.0);

        match result {
            Ok(postings) => postings,
            Err(e) => {
                match &e {
                    ScrapeError::Blocked { .. } => {
                        counter!("scrape_blocked_total", "platform" => platform.as_str())
                            .increment(1)
                    }
                    _ => counter!("scrape_failures_total", "platform" => platform.as_str())
                        .increment(1),
                }
                warn!(target: "scrape", %platform, kind = e.kind(), error = %e, "returning no postings");
                Vec::new()
            }
        }
    }

    fn platform(&self) -> Platform {
        self.profile.platform
    }
}

/// Profile for a platform.
pub fn profile_for(platform: Platform) -> &'static SiteProfile {
    match platform {
        Platform::LinkedIn => &linkedin::PROFILE,
        Platform::Indeed => &indeed::PROFILE,
        Platform::Glassdoor => &glassdoor::PROFILE,
    }
}

/// All three site adapters in source-priority order.
pub fn default_sources(
    cfg: &ScrapeConfig,
    sessions: Arc<dyn SessionFactory>,
) -> anyhow::Result<Vec<Arc<dyn ListingSource>>> {
    Platform::ALL
        .into_iter()
        .map(|p| {
            SiteAdapter::new(profile_for(p), cfg, Arc::clone(&sessions))
                .map(|a| Arc::new(a) as Arc<dyn ListingSource>)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_urls_encode_and_skip_empty_values() {
        let kw = vec!["Machine".to_string(), "Learning".to_string()];
        let u = linkedin::PROFILE.search_url(&kw, "San Francisco, CA").unwrap();
        assert_eq!(
            u.as_str(),
            "https://www.linkedin.com/jobs/search?keywords=Machine+Learning&location=San+Francisco%2C+CA"
        );

        let u = indeed::PROFILE.search_url(&kw, "  ").unwrap();
        assert_eq!(u.as_str(), "https://www.indeed.com/jobs?q=Machine+Learning");

        let u = glassdoor::PROFILE.search_url(&[], "").unwrap();
        assert_eq!(u.as_str(), "https://www.glassdoor.com/Job/jobs.htm");

        let u = glassdoor::PROFILE.search_url(&kw, "Austin").unwrap();
        assert_eq!(
            u.as_str(),
            "https://www.glassdoor.com/Job/jobs.htm?sc.keyword=Machine+Learning&locT=C&locId=Austin"
        );
    }

    #[test]
    fn block_markers_match_url_and_body() {
        let p = &linkedin::PROFILE;
        assert!(p
            .block_reason("https://www.linkedin.com/authwall?trk=x", "")
            .is_some());
        assert!(p
            .block_reason("https://www.linkedin.com/checkpoint/challenge/abc", "")
            .is_some());
        assert!(p
            .block_reason("https://www.linkedin.com/jobs/search?keywords=x", "<html>ok</html>")
            .is_none());
        assert!(indeed::PROFILE
            .block_reason(
                "https://www.indeed.com/jobs?q=x",
                "<title>Just a moment...</title><div>Verify you are human</div>"
            )
            .is_some());
    }

    #[test]
    fn every_profile_is_reachable_by_platform() {
        for p in Platform::ALL {
            assert_eq!(profile_for(p).platform, p);
        }
    }
}
