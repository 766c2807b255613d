// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CONFIG_PATH: &str = "GHOST_RADAR_CONFIG_PATH";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Read-only scraping configuration shared by every adapter.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScrapeConfig {
    pub headless: bool,
    pub chromium_path: Option<PathBuf>,
    pub user_agent: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub locale: String,
    pub navigation_timeout_ms: u64,
    pub selector_timeout_ms: u64,
    /// Wait after the first navigation before the landing page is inspected.
    pub initial_settle_ms: u64,
    /// Wait between two "reveal more" attempts.
    pub settle_delay_ms: u64,
    pub max_stalled_attempts: u32,
    pub per_source_floor: usize,
    pub ticker_ttl_secs: u64,
    pub ticker_keywords: Vec<String>,
    pub ticker_primary_max: usize,
    pub ticker_secondary_max: usize,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chromium_path: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            viewport_width: 1920,
            viewport_height: 1080,
            locale: "en-US".to_string(),
            navigation_timeout_ms: 30_000,
            selector_timeout_ms: 5_000,
            initial_settle_ms: 5_000,
            settle_delay_ms: 2_000,
            max_stalled_attempts: 10,
            per_source_floor: 10,
            ticker_ttl_secs: 300,
            ticker_keywords: vec!["Software".to_string(), "Engineer".to_string()],
            ticker_primary_max: 100,
            ticker_secondary_max: 50,
        }
    }
}

impl ScrapeConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn selector_timeout(&self) -> Duration {
        Duration::from_millis(self.selector_timeout_ms)
    }

    pub fn initial_settle(&self) -> Duration {
        Duration::from_millis(self.initial_settle_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn ticker_ttl(&self) -> Duration {
        Duration::from_secs(self.ticker_ttl_secs)
    }
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<ScrapeConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading scrape config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, ext.as_str())
}

/// Load config using env var + fallbacks:
/// 1) $GHOST_RADAR_CONFIG_PATH
/// 2) config/scrape.toml
/// 3) config/scrape.json
/// 4) built-in defaults
pub fn load_config_default() -> Result<ScrapeConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        } else {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/scrape.toml");
    if toml_p.exists() {
        return load_config_from(&toml_p);
    }
    let json_p = PathBuf::from("config/scrape.json");
    if json_p.exists() {
        return load_config_from(&json_p);
    }
    Ok(ScrapeConfig::default())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<ScrapeConfig> {
    let cfg = match hint_ext {
        "toml" => toml::from_str::<ScrapeConfig>(s).context("parsing scrape config toml")?,
        "json" => serde_json::from_str::<ScrapeConfig>(s).context("parsing scrape config json")?,
        _ => match serde_json::from_str::<ScrapeConfig>(s) {
            Ok(c) => c,
            Err(_) => toml::from_str::<ScrapeConfig>(s)
                .map_err(|_| anyhow!("unsupported scrape config format"))?,
        },
    };
    Ok(sanitize(cfg))
}

fn sanitize(mut cfg: ScrapeConfig) -> ScrapeConfig {
    let defaults = ScrapeConfig::default();
    if cfg.max_stalled_attempts == 0 {
        cfg.max_stalled_attempts = defaults.max_stalled_attempts;
    }
    if cfg.per_source_floor == 0 {
        cfg.per_source_floor = defaults.per_source_floor;
    }
    cfg.ticker_keywords.retain(|k| !k.trim().is_empty());
    if cfg.ticker_keywords.is_empty() {
        cfg.ticker_keywords = defaults.ticker_keywords;
    }
    if cfg.user_agent.trim().is_empty() {
        cfg.user_agent = defaults.user_agent;
    }
    cfg
}
