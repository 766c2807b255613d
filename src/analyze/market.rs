// src/analyze/market.rs
//! Role-level market summary derived from freshly aggregated postings.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

use crate::analyze::truth_score::{days_old, UNKNOWN_AGE_DAYS};
use crate::ingest::types::JobPosting;
use crate::ingest::Aggregator;

const ROLE_SAMPLE: usize = 100;
const DEFAULT_AVG_DAYS: f64 = 30.0;
const TOP_LOCATIONS: usize = 5;
const INSIGHT_LIST_LEN: usize = 5;
/// Roles summarised at once; each one drives a browser per source.
const INSIGHT_CONCURRENCY: usize = 2;

/// Roles surveyed for market-wide insights.
pub const COMMON_ROLES: [&str; 20] = [
    "Software Engineer",
    "Senior Software Engineer",
    "Full Stack Developer",
    "Backend Developer",
    "Frontend Developer",
    "DevOps Engineer",
    "Machine Learning Engineer",
    "Data Engineer",
    "Cloud Engineer",
    "Product Manager",
    "Senior Product Manager",
    "Product Designer",
    "UX Designer",
    "UI Designer",
    "UX Researcher",
    "Data Scientist",
    "Data Analyst",
    "Business Analyst",
    "Product Analyst",
    "Analytics Engineer",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrowthTrend {
    Rising,
    Stable,
    Declining,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleMarketData {
    pub role: String,
    pub demand_score: f64,
    pub hiring_velocity: f64,
    pub average_posted_days: f64,
    pub total_postings: usize,
    pub growth_trend: GrowthTrend,
    pub top_locations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketTemperature {
    Hot,
    Warm,
    Cool,
}

impl MarketTemperature {
    /// Mean hiring velocity of the trending roles: above 10 is hot, above 0 warm.
    fn from_trending(trending: &[RoleMarketData]) -> Self {
        if trending.is_empty() {
            return MarketTemperature::Cool;
        }
        let avg = trending.iter().map(|r| r.hiring_velocity).sum::<f64>() / trending.len() as f64;
        if avg > 10.0 {
            MarketTemperature::Hot
        } else if avg > 0.0 {
            MarketTemperature::Warm
        } else {
            MarketTemperature::Cool
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketInsight {
    pub most_demanding_roles: Vec<RoleMarketData>,
    pub fastest_hiring_roles: Vec<RoleMarketData>,
    pub trending_roles: Vec<RoleMarketData>,
    pub market_temperature: MarketTemperature,
    pub last_updated: DateTime<Utc>,
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Record returned when no postings are available; carries no invented numbers.
fn empty_market(role: &str, location: &str) -> RoleMarketData {
    RoleMarketData {
        role: role.to_string(),
        demand_score: 0.0,
        hiring_velocity: 0.0,
        average_posted_days: UNKNOWN_AGE_DAYS as f64,
        total_postings: 0,
        growth_trend: GrowthTrend::Declining,
        top_locations: if location.trim().is_empty() {
            Vec::new()
        } else {
            vec![location.trim().to_string()]
        },
    }
}

/// Summarise `jobs` for `role` as of `now`.
pub fn summarize_market(
    role: &str,
    location: &str,
    jobs: &[JobPosting],
    now: DateTime<Utc>,
) -> RoleMarketData {
    if jobs.is_empty() {
        return empty_market(role, location);
    }
    let total = jobs.len();

    let ages: Vec<i64> = jobs
        .iter()
        .filter(|j| j.posted_date.is_some())
        .map(|j| days_old(j.posted_date, now))
        .collect();
    let avg_days = if ages.is_empty() {
        DEFAULT_AVG_DAYS
    } else {
        ages.iter().sum::<i64>() as f64 / ages.len() as f64
    };

    let recent = ages.iter().filter(|d| **d < 7).count();
    let velocity = recent as f64 / total as f64 * 100.0;

    let growth_trend = if avg_days < 7.0 {
        GrowthTrend::Rising
    } else if avg_days < 14.0 {
        GrowthTrend::Stable
    } else {
        GrowthTrend::Declining
    };

    // Count per location, remembering first appearance for stable ties.
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (i, j) in jobs.iter().enumerate() {
        counts.entry(j.location.as_str()).or_insert((0, i)).0 += 1;
    }
    let mut ranked: Vec<(&str, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
    let mut top: Vec<String> = ranked
        .into_iter()
        .take(TOP_LOCATIONS)
        .map(|(l, _)| l.to_string())
        .collect();
    let wanted = location.trim();
    if !wanted.is_empty() && !top.iter().any(|l| l == wanted) {
        top.insert(0, wanted.to_string());
    }
    top.truncate(TOP_LOCATIONS);

    RoleMarketData {
        role: role.to_string(),
        demand_score: round1((total as f64).min(100.0)),
        hiring_velocity: round1(velocity),
        average_posted_days: round1(avg_days),
        total_postings: total,
        growth_trend,
        top_locations: top,
    }
}

/// Aggregate postings for `role` across every source and summarise them.
pub async fn role_market_data(aggregator: &Aggregator, role: &str, location: &str) -> RoleMarketData {
    let keywords: Vec<String> = role.split_whitespace().map(str::to_string).collect();
    let jobs = aggregator
        .aggregate(&keywords, location, ROLE_SAMPLE, None)
        .await;
    let data = summarize_market(role, location, &jobs, Utc::now());
    info!(
        target: "aggregate",
        role,
        total = data.total_postings,
        trend = ?data.growth_trend,
        "role market summary"
    );
    data
}

/// Rank per-role summaries into market-wide insights. Sorts are stable, so
/// equal keys keep the input order.
pub fn derive_insights(summaries: &[RoleMarketData], now: DateTime<Utc>) -> MarketInsight {
    let mut most_demanding = summaries.to_vec();
    most_demanding.sort_by(|a, b| b.demand_score.total_cmp(&a.demand_score));
    most_demanding.truncate(INSIGHT_LIST_LEN);

    let mut fastest_hiring = summaries.to_vec();
    fastest_hiring.sort_by(|a, b| {
        a.average_posted_days
            .total_cmp(&b.average_posted_days)
            .then_with(|| b.hiring_velocity.total_cmp(&a.hiring_velocity))
    });
    fastest_hiring.truncate(INSIGHT_LIST_LEN);

    let mut trending: Vec<RoleMarketData> = summaries
        .iter()
        .filter(|r| r.growth_trend == GrowthTrend::Rising)
        .cloned()
        .collect();
    trending.sort_by(|a, b| b.hiring_velocity.total_cmp(&a.hiring_velocity));
    trending.truncate(INSIGHT_LIST_LEN);

    MarketInsight {
        market_temperature: MarketTemperature::from_trending(&trending),
        most_demanding_roles: most_demanding,
        fastest_hiring_roles: fastest_hiring,
        trending_roles: trending,
        last_updated: now,
    }
}

/// Summarise every role in `roles` (a couple at a time) and rank the results.
pub async fn market_insights(aggregator: &Aggregator, roles: &[&str], location: &str) -> MarketInsight {
    let pending: Vec<_> = roles
        .iter()
        .map(|role| role_market_data(aggregator, role, location))
        .collect();
    let summaries: Vec<RoleMarketData> = stream::iter(pending)
        .buffered(INSIGHT_CONCURRENCY)
        .collect()
        .await;
    let insight = derive_insights(&summaries, Utc::now());
    info!(
        target: "aggregate",
        roles = summaries.len(),
        trending = insight.trending_roles.len(),
        temperature = ?insight.market_temperature,
        "market insights"
    );
    insight
}
