// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analyze;
pub mod api;
pub mod ingest;
pub mod telemetry;
pub mod ticker;

use std::sync::Arc;

use crate::api::AppState;
use crate::ingest::browser::SessionFactory;
use crate::ingest::config::ScrapeConfig;
use crate::ingest::providers::default_sources;
use crate::ingest::Aggregator;
use crate::ticker::{TickerCache, TickerSettings};

pub use crate::api::create_router;
pub use crate::ingest::types::{JobPosting, ListingSource, Platform};

/// Wire the three site adapters, the aggregator and the ticker cache.
pub fn build_state(cfg: &ScrapeConfig, sessions: Arc<dyn SessionFactory>) -> anyhow::Result<AppState> {
    let sources = default_sources(cfg, sessions)?;
    Ok(state_from_sources(cfg, sources))
}

/// Same wiring over arbitrary listing sources.
pub fn state_from_sources(cfg: &ScrapeConfig, sources: Vec<Arc<dyn ListingSource>>) -> AppState {
    let aggregator = Arc::new(Aggregator::new(sources, cfg.per_source_floor));
    let ticker = Arc::new(TickerCache::new(
        Arc::clone(&aggregator),
        TickerSettings::from_config(cfg),
    ));
    AppState { aggregator, ticker }
}
