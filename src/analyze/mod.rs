// src/analyze/mod.rs
//! Derived analytics over aggregated postings: truth score, role market data and
//! market-wide insights.

pub mod market;
pub mod truth_score;

pub use crate::analyze::market::{
    market_insights, role_market_data, GrowthTrend, MarketInsight, MarketTemperature, RoleMarketData,
};
pub use crate::analyze::truth_score::{
    score, score_at, score_postings, CommunitySentiment, GhostRisk, RecruiterActivity,
    RepostFrequency, ScoreBreakdown, ScoredPosting, Signals, TruthScore,
};
