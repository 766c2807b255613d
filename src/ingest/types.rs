// src/ingest/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const UNKNOWN_COMPANY: &str = "Unknown Company";
pub const LOCATION_NOT_SPECIFIED: &str = "Location not specified";

/// Listing sites, declared in source-priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "LinkedIn", alias = "linkedin")]
    LinkedIn,
    #[serde(rename = "Indeed", alias = "indeed")]
    Indeed,
    #[serde(rename = "Glassdoor", alias = "glassdoor")]
    Glassdoor,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::LinkedIn, Platform::Indeed, Platform::Glassdoor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::LinkedIn => "LinkedIn",
            Platform::Indeed => "Indeed",
            Platform::Glassdoor => "Glassdoor",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow::anyhow!("unknown listing source: {s}"))
    }
}

/// A normalized job posting. Never mutated once an adapter hands it out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub url: String,
    pub platform: Platform,
    pub posted_date: Option<DateTime<Utc>>,
    pub salary: Option<String>,
    pub job_type: Option<String>,
}

impl JobPosting {
    /// Case-insensitive (title, company) key used for cross-source dedup.
    pub fn dedup_key(&self) -> (String, String) {
        (self.title.to_lowercase(), self.company.to_lowercase())
    }
}

/// One external listing site behind a uniform contract.
///
/// `search` never fails: blocks, challenges and navigation errors are logged by
/// the implementation and surface as an empty vector ("no data right now").
#[async_trait::async_trait]
pub trait ListingSource: Send + Sync {
    async fn search(&self, keywords: &[String], location: &str, max_results: usize)
        -> Vec<JobPosting>;
    fn platform(&self) -> Platform;
}
