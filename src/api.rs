use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shuttle_axum::axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::analyze::market::{
    market_insights, role_market_data, summarize_market, MarketInsight, RoleMarketData,
    COMMON_ROLES,
};
use crate::analyze::truth_score::{
    parse_posted_date, score, score_postings, CommunitySentiment, RecruiterActivity,
    RepostFrequency, ScoredPosting, Signals, TruthScore,
};
use crate::ingest::types::{JobPosting, Platform};
use crate::ingest::Aggregator;
use crate::ticker::{TickerCache, TickerResponse};

const DEFAULT_MAX_RESULTS: usize = 50;
const DEFAULT_TICKER_LIMIT: usize = 20;
const DEFAULT_DISCOVER_LIMIT: usize = 50;

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub ticker: Arc<TickerCache>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/search", post(search))
        .route("/truth-score", post(truth_score))
        .route("/market-ticker", get(market_ticker))
        .route("/find-jobs-by-role", post(find_jobs_by_role))
        .route("/discover-jobs", get(discover_jobs))
        .route("/role-market-data", post(role_market))
        .route("/market-insights", get(insights))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Request validation failure, rendered as `{"error": ...}` with 400.
struct BadRequest(&'static str);

impl IntoResponse for BadRequest {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": self.0 })),
        )
            .into_response()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchReq {
    keywords: Vec<String>,
    #[serde(default)]
    location: String,
    #[serde(default)]
    max_results: Option<usize>,
    #[serde(default)]
    sources: Option<Vec<Platform>>,
}

async fn search(
    State(state): State<AppState>,
    Json(body): Json<SearchReq>,
) -> Result<Json<Vec<JobPosting>>, BadRequest> {
    if body.keywords.iter().all(|k| k.trim().is_empty()) {
        return Err(BadRequest("keywords are required"));
    }
    let jobs = state
        .aggregator
        .aggregate(
            &body.keywords,
            &body.location,
            body.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
            body.sources.as_deref(),
        )
        .await;
    Ok(Json(jobs))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TruthScoreReq {
    recruiter_activity: Option<RecruiterActivity>,
    repost_frequency: Option<RepostFrequency>,
    posted_date: Option<String>,
    community_sentiment: Option<CommunitySentiment>,
}

async fn truth_score(Json(body): Json<TruthScoreReq>) -> Json<TruthScore> {
    let signals = Signals {
        recruiter_activity: body.recruiter_activity.unwrap_or(RecruiterActivity::None),
        repost_frequency: body.repost_frequency.unwrap_or(RepostFrequency::None),
        community_sentiment: body
            .community_sentiment
            .unwrap_or(CommunitySentiment::Neutral),
    };
    Json(score(signals, parse_posted_date(body.posted_date.as_deref())))
}

#[derive(Deserialize)]
struct TickerQuery {
    limit: Option<usize>,
    #[serde(default)]
    force_refresh: bool,
}

async fn market_ticker(
    State(state): State<AppState>,
    Query(q): Query<TickerQuery>,
) -> Json<TickerResponse> {
    Json(
        state
            .ticker
            .get_ticker(q.limit.unwrap_or(DEFAULT_TICKER_LIMIT), q.force_refresh)
            .await,
    )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoleReq {
    role: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    max_results: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RoleJobsResp {
    role: String,
    location: String,
    total_jobs_found: usize,
    market_data: RoleMarketData,
    jobs: Vec<ScoredPosting>,
}

fn role_keywords(role: &str) -> Result<Vec<String>, BadRequest> {
    let kw: Vec<String> = role.split_whitespace().map(str::to_string).collect();
    if kw.is_empty() {
        return Err(BadRequest("role is required"));
    }
    Ok(kw)
}

async fn find_jobs_by_role(
    State(state): State<AppState>,
    Json(body): Json<RoleReq>,
) -> Result<Json<RoleJobsResp>, BadRequest> {
    let keywords = role_keywords(&body.role)?;
    let max = body.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
    let jobs = state
        .aggregator
        .aggregate(&keywords, &body.location, max, None)
        .await;
    let market_data = summarize_market(&body.role, &body.location, &jobs, chrono::Utc::now());
    Ok(Json(RoleJobsResp {
        total_jobs_found: jobs.len(),
        jobs: score_postings(jobs),
        market_data,
        role: body.role,
        location: body.location,
    }))
}

#[derive(Deserialize)]
struct DiscoverQuery {
    #[serde(default)]
    location: String,
    limit: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DiscoverResp {
    total_jobs: usize,
    jobs: Vec<ScoredPosting>,
}

async fn discover_jobs(
    State(state): State<AppState>,
    Query(q): Query<DiscoverQuery>,
) -> Json<DiscoverResp> {
    let limit = q.limit.unwrap_or(DEFAULT_DISCOVER_LIMIT);
    let mut jobs = state
        .aggregator
        .discover_popular(&q.location, (limit / 3).max(1))
        .await;
    jobs.truncate(limit);
    let jobs = score_postings(jobs);
    Json(DiscoverResp {
        total_jobs: jobs.len(),
        jobs,
    })
}

async fn role_market(
    State(state): State<AppState>,
    Json(body): Json<RoleReq>,
) -> Result<Json<RoleMarketData>, BadRequest> {
    role_keywords(&body.role)?;
    Ok(Json(
        role_market_data(&state.aggregator, &body.role, &body.location).await,
    ))
}

#[derive(Deserialize)]
struct InsightsQuery {
    #[serde(default)]
    location: String,
}

async fn insights(
    State(state): State<AppState>,
    Query(q): Query<InsightsQuery>,
) -> Json<MarketInsight> {
    Json(market_insights(&state.aggregator, &COMMON_ROLES, &q.location).await)
}
