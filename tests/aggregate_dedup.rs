// tests/aggregate_dedup.rs
//
// Cross-source aggregation: budget split, priority order, dedup, fail-safe.

mod common;

use common::{as_sources, posting, FixedSource, SyntheticSource};
use ghost_job_radar::ingest::types::{ListingSource, Platform};
use ghost_job_radar::ingest::Aggregator;
use std::sync::Arc;

fn kw(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

#[tokio::test]
async fn duplicate_from_lower_priority_source_is_dropped() {
    let linkedin = FixedSource::new(
        Platform::LinkedIn,
        vec![posting("Rust Engineer", "Acme Corp", Platform::LinkedIn)],
    );
    let glassdoor = FixedSource::new(
        Platform::Glassdoor,
        vec![
            posting("RUST ENGINEER", "acme corp", Platform::Glassdoor),
            posting("Go Engineer", "Acme Corp", Platform::Glassdoor),
        ],
    );
    // registration order must not matter
    let agg = Aggregator::new(as_sources(vec![glassdoor, linkedin]), 10);
    assert_eq!(agg.platforms(), vec![Platform::LinkedIn, Platform::Glassdoor]);

    let out = agg.aggregate(&kw("Rust Engineer"), "", 20, None).await;
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].platform, Platform::LinkedIn);
    assert_eq!(out[0].title, "Rust Engineer");
    assert_eq!(out[1].title, "Go Engineer");
}

#[tokio::test]
async fn budget_is_split_with_a_floor() {
    let sources = vec![
        FixedSource::empty(Platform::LinkedIn),
        FixedSource::empty(Platform::Indeed),
        FixedSource::empty(Platform::Glassdoor),
    ];
    let agg = Aggregator::new(as_sources(sources.clone()), 10);

    agg.aggregate(&kw("a"), "", 90, None).await;
    agg.aggregate(&kw("a"), "", 5, None).await;
    agg.aggregate(&kw("a"), "", 100, Some(&[Platform::Indeed][..])).await;

    assert_eq!(sources[0].asked(), vec![30, 10]);
    assert_eq!(sources[1].asked(), vec![30, 10, 100]);
    assert_eq!(sources[2].asked(), vec![30, 10]);
}

#[tokio::test]
async fn only_requested_sources_are_invoked() {
    let li = FixedSource::new(
        Platform::LinkedIn,
        vec![posting("A", "One", Platform::LinkedIn)],
    );
    let ind = FixedSource::new(Platform::Indeed, vec![posting("B", "Two", Platform::Indeed)]);
    let agg = Aggregator::new(as_sources(vec![li.clone(), ind.clone()]), 10);

    let out = agg.aggregate(&kw("x"), "", 10, Some(&[Platform::Indeed][..])).await;
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].platform, Platform::Indeed);
    assert_eq!(li.calls(), 0);
    assert_eq!(ind.calls(), 1);

    let none = agg.aggregate(&kw("x"), "", 10, Some(&[] as &[Platform])).await;
    assert!(none.is_empty());
}

#[tokio::test]
async fn output_is_truncated_after_dedup() {
    let li = FixedSource::new(
        Platform::LinkedIn,
        (0..8)
            .map(|i| posting(&format!("Role {i}"), "Same", Platform::LinkedIn))
            .collect(),
    );
    let ind = FixedSource::new(
        Platform::Indeed,
        (0..8)
            .map(|i| posting(&format!("role {i}"), "same", Platform::Indeed))
            .collect(),
    );
    let agg = Aggregator::new(as_sources(vec![li, ind]), 10);
    let out = agg.aggregate(&kw("x"), "", 5, None).await;
    assert_eq!(out.len(), 5);
    assert!(out.iter().all(|j| j.platform == Platform::LinkedIn));
}

#[tokio::test]
async fn all_sources_empty_means_empty_result() {
    let agg = Aggregator::new(
        as_sources(vec![
            FixedSource::empty(Platform::LinkedIn),
            FixedSource::empty(Platform::Indeed),
            FixedSource::empty(Platform::Glassdoor),
        ]),
        10,
    );
    let out = agg.aggregate(&kw("Software Engineer"), "Anywhere", 50, None).await;
    assert!(out.is_empty(), "no placeholder postings may be produced");
}

#[tokio::test]
async fn sources_run_concurrently() {
    use std::time::Duration;
    let slow = |p: Platform| FixedSource::slow(p, vec![posting("x", &p.to_string(), p)], Duration::from_millis(200));
    let agg = Aggregator::new(
        as_sources(vec![slow(Platform::LinkedIn), slow(Platform::Indeed), slow(Platform::Glassdoor)]),
        10,
    );
    let t0 = std::time::Instant::now();
    let out = agg.aggregate(&kw("x"), "", 30, None).await;
    assert_eq!(out.len(), 3);
    assert!(t0.elapsed() < Duration::from_millis(550));
}

#[tokio::test]
async fn popular_discovery_dedups_across_keyword_sets() {
    let sources: Vec<Arc<dyn ListingSource>> = vec![
        Arc::new(SyntheticSource { platform: Platform::LinkedIn }),
        // identical output on every keyword set -> deduplicated down to one copy
        FixedSource::new(
            Platform::Indeed,
            vec![posting("Evergreen Role", "Staffing Co", Platform::Indeed)],
        ),
    ];
    let agg = Aggregator::new(sources, 2);
    let out = agg.discover_popular("Denver", 4).await;

    assert_eq!(
        out.iter().filter(|j| j.title == "Evergreen Role").count(),
        1
    );
    assert!(out.len() <= 4 * 5);
    assert!(out.iter().any(|j| j.title.starts_with("Software Engineer")));
    assert!(out.iter().any(|j| j.title.starts_with("Machine Learning Engineer")));
    assert!(!out.iter().any(|j| j.title.starts_with("DevOps")));
}
