// src/ticker.rs
//! # Ticker Cache
//! Company-level "market ticker" built from freshly aggregated postings,
//! memoized for a fixed TTL.
//!
//! Reads take a short `RwLock` on the snapshot. Recomputation is serialised
//! by a separate `Mutex` held for the whole scrape, so concurrent callers
//! with a stale snapshot wait for the in-flight refresh instead of starting
//! their own, while callers with a fresh snapshot are never blocked by it.

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::info;

use crate::analyze::truth_score::{days_old, score_at, Signals};
use crate::ingest::config::ScrapeConfig;
use crate::ingest::types::{JobPosting, Platform};
use crate::ingest::{ensure_metrics_described, Aggregator};

const SYMBOL_LEN: usize = 4;
const CHANGE_LIMIT: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerEntry {
    pub ticker: String,
    pub company: String,
    /// Average truth score of the company's postings.
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub total_jobs: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerResponse {
    pub tickers: Vec<TickerEntry>,
    pub last_updated: DateTime<Utc>,
    pub cached: bool,
}

/// Which query the ticker runs and where it looks.
#[derive(Debug, Clone)]
pub struct TickerSettings {
    pub ttl: Duration,
    pub keywords: Vec<String>,
    pub primary: (Platform, usize),
    pub secondary: (Platform, usize),
}

impl TickerSettings {
    pub fn from_config(cfg: &ScrapeConfig) -> Self {
        Self {
            ttl: cfg.ticker_ttl(),
            keywords: cfg.ticker_keywords.clone(),
            primary: (Platform::LinkedIn, cfg.ticker_primary_max),
            secondary: (Platform::Indeed, cfg.ticker_secondary_max),
        }
    }
}

#[derive(Debug, Clone)]
struct Snapshot {
    tickers: Vec<TickerEntry>,
    last_updated: DateTime<Utc>,
    taken_at: Instant,
}

/// Owner of the one shared ticker snapshot.
pub struct TickerCache {
    aggregator: Arc<Aggregator>,
    settings: TickerSettings,
    snapshot: RwLock<Option<Snapshot>>,
    refresh: Mutex<()>,
}

impl TickerCache {
    pub fn new(aggregator: Arc<Aggregator>, settings: TickerSettings) -> Self {
        ensure_metrics_described();
        Self {
            aggregator,
            settings,
            snapshot: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// First `limit` ticker entries, from cache while the snapshot is younger
    /// than the TTL, otherwise recomputed. `force_refresh` always recomputes.
    pub async fn get_ticker(&self, limit: usize, force_refresh: bool) -> TickerResponse {
        if !force_refresh {
            if let Some(hit) = self.cached(limit).await {
                return hit;
            }
        }

        let _refreshing = self.refresh.lock().await;
        if !force_refresh {
            // another caller refreshed while we waited for the lock
            if let Some(hit) = self.cached(limit).await {
                return hit;
            }
        }

        let jobs = self.fetch_postings().await;
        let now = Utc::now();
        let tickers = build_tickers(&jobs, now);
        counter!("ticker_refresh_total").increment(1);
        gauge!("ticker_last_refresh_ts").set(now.timestamp() as f64);
        info!(
            target: "ticker",
            cached = false,
            forced = force_refresh,
            postings = jobs.len(),
            companies = tickers.len(),
            "ticker refreshed"
        );

        let out = TickerResponse {
            tickers: tickers.iter().take(limit).cloned().collect(),
            last_updated: now,
            cached: false,
        };
        *self.snapshot.write().await = Some(Snapshot {
            tickers,
            last_updated: now,
            taken_at: Instant::now(),
        });
        out
    }

    async fn cached(&self, limit: usize) -> Option<TickerResponse> {
        let slot = self.snapshot.read().await;
        let snap = slot.as_ref().filter(|s| s.taken_at.elapsed() < self.settings.ttl)?;
        counter!("ticker_cache_hits_total").increment(1);
        info!(target: "ticker", cached = true, companies = snap.tickers.len(), "serving cached ticker");
        Some(TickerResponse {
            tickers: snap.tickers.iter().take(limit).cloned().collect(),
            last_updated: snap.last_updated,
            cached: true,
        })
    }

    /// Broad query against the primary source, retried once on the secondary.
    async fn fetch_postings(&self) -> Vec<JobPosting> {
        let s = &self.settings;
        let (primary, primary_max) = s.primary;
        let jobs = self
            .aggregator
            .aggregate(&s.keywords, "", primary_max, Some(&[primary][..]))
            .await;
        if !jobs.is_empty() {
            return jobs;
        }
        let (secondary, secondary_max) = s.secondary;
        info!(target: "ticker", %primary, %secondary, "primary source empty; trying secondary");
        self.aggregator
            .aggregate(&s.keywords, "", secondary_max, Some(&[secondary][..]))
            .await
    }
}

/// 4-character symbol: one word gives its first four letters, several words
/// give their initials; short results are padded with 'X'.
pub fn ticker_symbol(company: &str) -> String {
    let words: Vec<&str> = company.split_whitespace().collect();
    let raw: String = match words.as_slice() {
        [] => String::new(),
        [single] => single.chars().take(SYMBOL_LEN).collect(),
        many => many.iter().filter_map(|w| w.chars().next()).collect(),
    };
    let mut sym: String = raw.to_uppercase().chars().take(SYMBOL_LEN).collect();
    while sym.chars().count() < SYMBOL_LEN {
        sym.push('X');
    }
    sym
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[derive(Default)]
struct CompanyAcc {
    jobs: usize,
    score_sum: u64,
    ages: Vec<i64>,
}

/// Group postings by company and derive ticker entries, most postings first.
pub fn build_tickers(jobs: &[JobPosting], now: DateTime<Utc>) -> Vec<TickerEntry> {
    let mut order: Vec<&str> = Vec::new();
    let mut by_company: HashMap<&str, CompanyAcc> = HashMap::new();

    for job in jobs {
        let company = job.company.as_str();
        let acc = by_company.entry(company).or_insert_with(|| {
            order.push(company);
            CompanyAcc::default()
        });
        let s = score_at(Signals::UNKNOWN, Some(job.posted_date.unwrap_or(now)), now);
        acc.jobs += 1;
        acc.score_sum += u64::from(s.truth_score);
        if job.posted_date.is_some() {
            acc.ages.push(days_old(job.posted_date, now));
        }
    }

    let mut tickers: Vec<TickerEntry> = order
        .into_iter()
        .filter_map(|company| {
            let acc = by_company.get(company)?;
            let avg_score = acc.score_sum as f64 / acc.jobs as f64;
            let change = if acc.ages.is_empty() {
                0.0
            } else {
                let avg_days = acc.ages.iter().sum::<i64>() as f64 / acc.ages.len() as f64;
                ((7.0 - avg_days) * 1.5).clamp(-CHANGE_LIMIT, CHANGE_LIMIT)
            };
            let change_percent = if avg_score > 0.0 {
                change / avg_score * 100.0
            } else {
                0.0
            };
            Some(TickerEntry {
                ticker: ticker_symbol(company),
                company: company.to_string(),
                price: round1(avg_score),
                change: round1(change),
                change_percent: round1(change_percent),
                total_jobs: acc.jobs,
            })
        })
        .collect();

    // stable: ties keep first-seen order
    tickers.sort_by(|a, b| b.total_jobs.cmp(&a.total_jobs));
    tickers
}
