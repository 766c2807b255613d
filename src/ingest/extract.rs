//! Resilient field extraction over listing-card markup.
//!
//! Every field has an ordered list of locators; the first one that yields a
//! non-empty value wins. Title and link are essential: a card without them is
//! dropped. Everything else falls back to a placeholder or `None`.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::ingest::normalize_text;
use crate::ingest::types::{JobPosting, Platform, LOCATION_NOT_SPECIFIED, UNKNOWN_COMPANY};

/// How a value is read from the first element matching a CSS selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    /// Visible text of the element.
    Text(&'static str),
    /// Value of an attribute on the element.
    Attr(&'static str, &'static str),
}

/// Per-site locator configuration. Adding a site means adding one of these.
#[derive(Debug, Clone, Copy)]
pub struct LocatorTable {
    /// Candidate card selectors; the first one matching anything is used.
    pub cards: &'static [&'static str],
    /// Anchors whose text is the title and whose `href` is the link.
    pub title_link: &'static [&'static str],
    pub company: &'static [Locator],
    pub location: &'static [Locator],
    pub salary: &'static [Locator],
    pub description: &'static [Locator],
    pub posted: &'static [Locator],
    pub job_type: &'static [Locator],
}

#[derive(Debug, Clone)]
struct CompiledLocator {
    selector: Selector,
    attr: Option<&'static str>,
}

#[derive(Debug, Clone, Default)]
struct FieldRule(Vec<CompiledLocator>);

impl FieldRule {
    fn compile(platform: Platform, field: &str, locators: &[Locator]) -> Self {
        let mut out = Vec::with_capacity(locators.len());
        for loc in locators {
            let (css, attr) = match *loc {
                Locator::Text(css) => (css, None),
                Locator::Attr(css, attr) => (css, Some(attr)),
            };
            match Selector::parse(css) {
                Ok(selector) => out.push(CompiledLocator { selector, attr }),
                Err(e) => {
                    warn!(target: "scrape", %platform, field, css, error = ?e, "skipping invalid locator")
                }
            }
        }
        Self(out)
    }

    fn first_value(&self, card: ElementRef<'_>) -> Option<String> {
        self.0.iter().find_map(|loc| {
            let el = card.select(&loc.selector).next()?;
            let raw = match loc.attr {
                Some(attr) => el.value().attr(attr)?.to_string(),
                None => element_text(el),
            };
            let v = normalize_text(&raw);
            (!v.is_empty()).then_some(v)
        })
    }
}

/// Compiled form of a `LocatorTable`, bound to one site origin.
#[derive(Debug, Clone)]
pub struct ResilientExtractor {
    platform: Platform,
    origin: Url,
    cards: Vec<Selector>,
    title_link: Vec<Selector>,
    company: FieldRule,
    location: FieldRule,
    salary: FieldRule,
    description: FieldRule,
    posted: FieldRule,
    job_type: FieldRule,
}

/// Outcome of one extraction pass.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub postings: Vec<JobPosting>,
    /// Cards discarded because an essential field was missing.
    pub dropped: usize,
}

impl ResilientExtractor {
    pub fn new(platform: Platform, origin: Url, table: &LocatorTable) -> Self {
        let compile_all = |field: &str, css: &[&'static str]| -> Vec<Selector> {
            css.iter()
                .filter_map(|s| match Selector::parse(s) {
                    Ok(sel) => Some(sel),
                    Err(e) => {
                        warn!(target: "scrape", %platform, field, css = *s, error = ?e, "skipping invalid selector");
                        None
                    }
                })
                .collect()
        };
        Self {
            platform,
            origin,
            cards: compile_all("cards", table.cards),
            title_link: compile_all("title_link", table.title_link),
            company: FieldRule::compile(platform, "company", table.company),
            location: FieldRule::compile(platform, "location", table.location),
            salary: FieldRule::compile(platform, "salary", table.salary),
            description: FieldRule::compile(platform, "description", table.description),
            posted: FieldRule::compile(platform, "posted", table.posted),
            job_type: FieldRule::compile(platform, "job_type", table.job_type),
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Number of candidate cards currently present in `html`.
    pub fn count_cards(&self, html: &str) -> usize {
        let doc = Html::parse_document(html);
        self.select_cards(&doc).len()
    }

    fn select_cards<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>> {
        for sel in &self.cards {
            let cards: Vec<_> = doc.select(sel).collect();
            if !cards.is_empty() {
                return cards;
            }
        }
        Vec::new()
    }

    /// Extract up to `max` postings; relative dates resolve against `now`.
    pub fn extract_all(&self, html: &str, max: usize, now: DateTime<Utc>) -> Extraction {
        let doc = Html::parse_document(html);
        let mut out = Extraction::default();
        for card in self.select_cards(&doc).into_iter().take(max) {
            match self.extract_card(card, now) {
                Some(p) => out.postings.push(p),
                None => out.dropped += 1,
            }
        }
        if out.dropped > 0 {
            debug!(target: "scrape", platform = %self.platform, dropped = out.dropped, "cards without title/link discarded");
            counter!("scrape_dropped_total", "platform" => self.platform.as_str())
                .increment(out.dropped as u64);
        }
        out
    }

    fn extract_card(&self, card: ElementRef<'_>, now: DateTime<Utc>) -> Option<JobPosting> {
        let (title, url) = self.title_and_link(card)?;

        Some(JobPosting {
            title,
            company: self
                .company
                .first_value(card)
                .unwrap_or_else(|| UNKNOWN_COMPANY.to_string()),
            location: self
                .location
                .first_value(card)
                .unwrap_or_else(|| LOCATION_NOT_SPECIFIED.to_string()),
            description: self.description.first_value(card).unwrap_or_default(),
            url,
            platform: self.platform,
            posted_date: self
                .posted
                .first_value(card)
                .map(|raw| normalize_posted_date(&raw, now)),
            salary: self.salary.first_value(card),
            job_type: self.job_type.first_value(card),
        })
    }

    fn title_and_link(&self, card: ElementRef<'_>) -> Option<(String, String)> {
        self.title_link.iter().find_map(|sel| {
            let el = card.select(sel).next()?;
            let title = normalize_text(&element_text(el));
            let href = el.value().attr("href")?.trim();
            if title.is_empty() || href.is_empty() {
                return None;
            }
            let url = self.origin.join(href).ok()?;
            Some((title, url.to_string()))
        })
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ")
}

static RE_RELATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(\d+)\s*\+?\s*(minutes?|mins?|hours?|hrs?|h|days?|d|weeks?|wks?|w|months?|mos?|years?|yrs?|y)\b",
    )
    .expect("relative date regex")
});

const MAX_AGE_DAYS: i64 = 3650;

/// Normalize posted-date text to an absolute timestamp.
///
/// Absolute ISO values are taken as-is, relative phrases resolve against `now`,
/// and anything unrecognised is treated as posted `now`.
pub fn normalize_posted_date(raw: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    parse_absolute(raw)
        .or_else(|| parse_relative(raw, now))
        .unwrap_or(now)
}

pub(crate) fn parse_absolute(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_relative(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let lower = raw.to_lowercase();

    if let Some(caps) = RE_RELATIVE.captures(&lower) {
        let n: i64 = caps[1].parse().ok()?;
        let unit = &caps[2];
        let ago = if unit.starts_with("mi") {
            Duration::minutes(n.min(MAX_AGE_DAYS * 24 * 60))
        } else if unit.starts_with('h') {
            Duration::hours(n.min(MAX_AGE_DAYS * 24))
        } else if unit.starts_with('d') {
            Duration::days(n.min(MAX_AGE_DAYS))
        } else if unit.starts_with('w') {
            Duration::days(n.saturating_mul(7).min(MAX_AGE_DAYS))
        } else if unit.starts_with("mo") {
            Duration::days(n.saturating_mul(30).min(MAX_AGE_DAYS))
        } else {
            Duration::days(n.saturating_mul(365).min(MAX_AGE_DAYS))
        };
        return Some(now - ago);
    }

    if lower.contains("yesterday") {
        return Some(now - Duration::days(1));
    }
    if ["just posted", "just now", "today", "moment", "second", "minute", "hour"]
        .iter()
        .any(|k| lower.contains(k))
    {
        return Some(now);
    }
    None
}
