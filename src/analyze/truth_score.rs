// src/analyze/truth_score.rs
//! Deterministic truth score: four categorical signals plus posting age.
//!
//! Base 50, then recruiter activity (+40 / +20), reposting (-30 / -10),
//! age (-20 above 30 days, -10 above 14 days) and community sentiment
//! (+15 / -25). The sum is clamped to [1, 100].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ingest::extract::parse_absolute;
use crate::ingest::types::JobPosting;

/// Age used when no (parseable) posting date is available.
pub const UNKNOWN_AGE_DAYS: i64 = 999;

const BASE: i32 = 50;
pub const FALLBACK_RATIONALE: &str = "Moderate signals across all indicators.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecruiterActivity {
    #[serde(alias = "high", alias = "HIGH")]
    High,
    #[serde(alias = "moderate", alias = "MODERATE")]
    Moderate,
    #[serde(alias = "none", alias = "NONE")]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RepostFrequency {
    #[serde(alias = "high", alias = "HIGH")]
    High,
    #[serde(alias = "low", alias = "LOW")]
    Low,
    #[serde(alias = "none", alias = "NONE")]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommunitySentiment {
    #[serde(alias = "positive", alias = "POSITIVE")]
    Positive,
    #[serde(alias = "neutral", alias = "NEUTRAL")]
    Neutral,
    #[serde(alias = "negative", alias = "NEGATIVE")]
    Negative,
}

impl RecruiterActivity {
    fn label(self) -> &'static str {
        match self {
            RecruiterActivity::High => "high",
            RecruiterActivity::Moderate => "moderate",
            RecruiterActivity::None => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GhostRisk {
    Low,
    Medium,
    High,
}

impl GhostRisk {
    /// > 80 is LOW, 50..=80 is MEDIUM, below 50 is HIGH.
    pub fn from_score(score: u8) -> Self {
        if score > 80 {
            GhostRisk::Low
        } else if score >= 50 {
            GhostRisk::Medium
        } else {
            GhostRisk::High
        }
    }
}

impl fmt::Display for GhostRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GhostRisk::Low => "LOW",
            GhostRisk::Medium => "MEDIUM",
            GhostRisk::High => "HIGH",
        })
    }
}

/// The four categorical inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signals {
    pub recruiter_activity: RecruiterActivity,
    pub repost_frequency: RepostFrequency,
    pub community_sentiment: CommunitySentiment,
}

impl Signals {
    /// Defaults for a posting whose real signals are unknown.
    pub const UNKNOWN: Signals = Signals {
        recruiter_activity: RecruiterActivity::Moderate,
        repost_frequency: RepostFrequency::None,
        community_sentiment: CommunitySentiment::Neutral,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub base: i32,
    pub recruiter_activity: i32,
    pub repost_frequency: i32,
    pub posting_age: i32,
    pub community_signal: i32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> i32 {
        self.base
            + self.recruiter_activity
            + self.repost_frequency
            + self.posting_age
            + self.community_signal
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TruthScore {
    pub truth_score: u8,
    pub ghost_risk: GhostRisk,
    pub breakdown: ScoreBreakdown,
    pub days_old: i64,
    #[serde(rename = "whyScore")]
    pub rationale: String,
}

/// Whole days between `posted` and `now`, floored; future dates count as 0.
pub fn days_old(posted: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    match posted {
        Some(p) => (now - p).num_seconds().div_euclid(86_400).max(0),
        None => UNKNOWN_AGE_DAYS,
    }
}

/// Parse a caller-supplied ISO-8601 date; `None` when absent or unparseable.
pub fn parse_posted_date(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(parse_absolute)
}

/// Score against an explicit `now`. Same inputs, same output.
pub fn score_at(signals: Signals, posted: Option<DateTime<Utc>>, now: DateTime<Utc>) -> TruthScore {
    let days = days_old(posted, now);

    let breakdown = ScoreBreakdown {
        base: BASE,
        recruiter_activity: match signals.recruiter_activity {
            RecruiterActivity::High => 40,
            RecruiterActivity::Moderate => 20,
            RecruiterActivity::None => 0,
        },
        repost_frequency: match signals.repost_frequency {
            RepostFrequency::High => -30,
            RepostFrequency::Low => -10,
            RepostFrequency::None => 0,
        },
        posting_age: if days > 30 {
            -20
        } else if days > 14 {
            -10
        } else {
            0
        },
        community_signal: match signals.community_sentiment {
            CommunitySentiment::Positive => 15,
            CommunitySentiment::Neutral => 0,
            CommunitySentiment::Negative => -25,
        },
    };

    let truth_score = breakdown.total().clamp(1, 100) as u8;
    TruthScore {
        truth_score,
        ghost_risk: GhostRisk::from_score(truth_score),
        breakdown,
        days_old: days,
        rationale: rationale(&signals, &breakdown, days),
    }
}

/// Score against the current instant.
pub fn score(signals: Signals, posted: Option<DateTime<Utc>>) -> TruthScore {
    score_at(signals, posted, Utc::now())
}

fn rationale(signals: &Signals, breakdown: &ScoreBreakdown, days: i64) -> String {
    let mut clauses: Vec<String> = Vec::new();

    if breakdown.recruiter_activity > 0 {
        clauses.push(format!(
            "Strong recruiter activity ({})",
            signals.recruiter_activity.label()
        ));
    }
    if signals.repost_frequency == RepostFrequency::High {
        clauses.push("High repost frequency suggests this may be an evergreen posting".into());
    }
    if days > 30 {
        clauses.push(format!("Posted {days} days ago, may be stale"));
    } else if days < 7 {
        clauses.push(format!("Fresh posting ({days} days old)"));
    }
    match signals.community_sentiment {
        CommunitySentiment::Negative => {
            clauses.push("Community reports suggest ghosting concerns".into())
        }
        CommunitySentiment::Positive => clauses.push("Positive community sentiment".into()),
        CommunitySentiment::Neutral => {}
    }

    if clauses.is_empty() {
        FALLBACK_RATIONALE.to_string()
    } else {
        format!("{}.", clauses.join(". "))
    }
}

/// A posting together with its default-signal score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredPosting {
    pub job: JobPosting,
    pub truth_score: u8,
    pub ghost_risk: GhostRisk,
    pub why_score: String,
}

/// Score with the unknown-signal defaults; an undated posting is taken as posted at `now`.
pub fn score_posting_at(job: JobPosting, now: DateTime<Utc>) -> ScoredPosting {
    let s = score_at(Signals::UNKNOWN, Some(job.posted_date.unwrap_or(now)), now);
    ScoredPosting {
        job,
        truth_score: s.truth_score,
        ghost_risk: s.ghost_risk,
        why_score: s.rationale,
    }
}

pub fn score_postings(jobs: Vec<JobPosting>) -> Vec<ScoredPosting> {
    let now = Utc::now();
    jobs.into_iter().map(|j| score_posting_at(j, now)).collect()
}
