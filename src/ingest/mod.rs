// src/ingest/mod.rs
pub mod browser;
pub mod config;
pub mod extract;
pub mod paginate;
pub mod providers;
pub mod types;

use crate::ingest::types::{JobPosting, ListingSource, Platform};
use futures::future::join_all;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Keyword sets used for popular-jobs discovery, most in demand first.
pub const POPULAR_KEYWORDS: &[&[&str]] = &[
    &["Software", "Engineer"],
    &["Product", "Manager"],
    &["Data", "Scientist"],
    &["Full", "Stack", "Developer"],
    &["Machine", "Learning", "Engineer"],
    &["DevOps", "Engineer"],
    &["UX", "Designer"],
    &["Product", "Designer"],
];

const POPULAR_SETS: usize = 5;
const TEXT_CAP: usize = 1500;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("scrape_cards_total", "Listing cards revealed by pagination.");
        describe_counter!(
            "scrape_dropped_total",
            "Cards discarded for a missing title or link."
        );
        describe_counter!(
            "scrape_blocked_total",
            "Searches aborted on a challenge or login wall."
        );
        describe_counter!(
            "scrape_failures_total",
            "Searches aborted on session or navigation errors."
        );
        describe_histogram!("scrape_duration_ms", "Adapter search time in milliseconds.");
        describe_counter!(
            "aggregate_dedup_total",
            "Postings removed as cross-source duplicates."
        );
        describe_counter!(
            "aggregate_empty_total",
            "Aggregations where every source returned nothing."
        );
        describe_histogram!("aggregate_duration_ms", "Aggregation time in milliseconds.");
        describe_counter!("ticker_cache_hits_total", "Ticker requests served from cache.");
        describe_counter!("ticker_refresh_total", "Ticker recomputations.");
        describe_gauge!("ticker_last_refresh_ts", "Unix ts of the last ticker refresh.");
        describe_gauge!("ticker_cache_ttl_secs", "Configured ticker cache TTL in seconds.");
    });
}

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Normalize scraped text: decode entities, strip tags, collapse whitespace, cap length.
pub fn normalize_text(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s);
    let stripped = RE_TAGS.replace_all(&decoded, "");

    // “ ” ‘ ’ to ASCII quotes
    let quoted = stripped
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    let out = RE_WS.replace_all(&quoted, " ").trim().to_string();
    if out.chars().count() > TEXT_CAP {
        out.chars().take(TEXT_CAP).collect()
    } else {
        out
    }
}

/// Drop later postings whose case-insensitive (title, company) was already seen.
/// Returns the survivors in input order and the number removed.
pub fn dedup_postings(postings: Vec<JobPosting>) -> (Vec<JobPosting>, usize) {
    let mut seen: HashSet<(String, String)> = HashSet::with_capacity(postings.len());
    let mut keep = Vec::with_capacity(postings.len());
    let mut removed = 0usize;
    for p in postings {
        if seen.insert(p.dedup_key()) {
            keep.push(p);
        } else {
            removed += 1;
        }
    }
    (keep, removed)
}

/// Fans a query out to the listing sources, merges, deduplicates and caps.
#[derive(Clone)]
pub struct Aggregator {
    sources: Vec<Arc<dyn ListingSource>>,
    per_source_floor: usize,
}

impl Aggregator {
    /// Sources are kept in platform priority order regardless of input order.
    pub fn new(mut sources: Vec<Arc<dyn ListingSource>>, per_source_floor: usize) -> Self {
        sources.sort_by_key(|s| s.platform());
        Self {
            sources,
            per_source_floor: per_source_floor.max(1),
        }
    }

    pub fn platforms(&self) -> Vec<Platform> {
        self.sources.iter().map(|s| s.platform()).collect()
    }

    /// Aggregate postings across `requested` sources (`None` = all of them).
    ///
    /// Each source is asked for `max(per_source_floor, max_results / n)`
    /// postings. Results are concatenated in priority order, deduplicated
    /// keeping the first occurrence, and truncated to `max_results`. When
    /// every source comes back empty the result is empty.
    pub async fn aggregate(
        &self,
        keywords: &[String],
        location: &str,
        max_results: usize,
        requested: Option<&[Platform]>,
    ) -> Vec<JobPosting> {
        ensure_metrics_described();

        let selected: Vec<&Arc<dyn ListingSource>> = self
            .sources
            .iter()
            .filter(|s| requested.map_or(true, |r| r.contains(&s.platform())))
            .collect();
        if selected.is_empty() || max_results == 0 {
            warn!(target: "aggregate", ?requested, max_results, "nothing to query");
            return Vec::new();
        }

        let per_source = (max_results / selected.len()).max(self.per_source_floor);
        let t0 = Instant::now();

        let batches = join_all(
            selected
                .iter()
                .map(|s| s.search(keywords, location, per_source)),
        )
        .await;

        let mut merged = Vec::new();
        for (source, batch) in selected.iter().zip(batches) {
            info!(target: "aggregate", platform = %source.platform(), count = batch.len(), "source finished");
            merged.extend(batch);
        }
        metrics::histogram!("aggregate_duration_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        if merged.is_empty() {
            counter!("aggregate_empty_total").increment(1);
            warn!(target: "aggregate", keywords = ?keywords, location, "no postings from any source");
            return Vec::new();
        }

        let (mut unique, removed) = dedup_postings(merged);
        counter!("aggregate_dedup_total").increment(removed as u64);
        unique.truncate(max_results);
        info!(target: "aggregate", kept = unique.len(), dedup = removed, "aggregation finished");
        unique
    }

    /// Postings for the top popular keyword sets, deduplicated across sets and
    /// capped at `max_per_source * 5`.
    pub async fn discover_popular(&self, location: &str, max_per_source: usize) -> Vec<JobPosting> {
        let mut all = Vec::new();
        for set in POPULAR_KEYWORDS.iter().take(POPULAR_SETS) {
            let keywords: Vec<String> = set.iter().map(|k| k.to_string()).collect();
            all.extend(self.aggregate(&keywords, location, max_per_source, None).await);
        }
        let (mut unique, _) = dedup_postings(all);
        unique.truncate(max_per_source * POPULAR_SETS);
        unique
    }
}
