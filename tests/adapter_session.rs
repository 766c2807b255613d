// tests/adapter_session.rs
//
// Site adapters driven end to end over scripted browser sessions.

mod common;

use chrono::{Duration, TimeZone, Utc};
use common::{fixture, instant_config, Script, ScriptedSessions};
use ghost_job_radar::ingest::providers::{linkedin, profile_for, SiteAdapter};
use ghost_job_radar::ingest::types::{ListingSource, Platform, UNKNOWN_COMPANY};
use std::sync::atomic::Ordering;

fn kw(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

#[tokio::test]
async fn linkedin_adapter_extracts_fixture_and_closes_session() {
    let (sessions, log) = ScriptedSessions::new(Script::page(&fixture("linkedin_search.html")));
    let adapter = SiteAdapter::new(&linkedin::PROFILE, &instant_config(), sessions).unwrap();

    let before = Utc::now();
    let jobs = adapter.search(&kw(&["Rust", "Engineer"]), "Berlin", 10).await;

    assert_eq!(jobs.len(), 2, "card without a link must be dropped");
    assert_eq!(jobs[0].title, "Senior Rust Engineer");
    assert_eq!(jobs[0].company, "Ferrous Systems");
    assert_eq!(jobs[0].location, "Berlin, Germany");
    assert_eq!(jobs[0].platform, Platform::LinkedIn);
    assert_eq!(
        jobs[0].posted_date,
        Some(Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap())
    );
    assert!(jobs[0].salary.is_some());

    assert_eq!(jobs[1].title, "Backend Engineer & SRE");
    assert_eq!(jobs[1].company, UNKNOWN_COMPANY);
    assert_eq!(jobs[1].location, "Remote");
    assert_eq!(
        jobs[1].url,
        "https://www.linkedin.com/jobs/view/backend-engineer-4102"
    );
    let posted = jobs[1].posted_date.expect("relative date resolved");
    let expected = before - Duration::days(3);
    assert!((posted - expected).num_seconds().abs() < 60);

    assert_eq!(log.opened.load(Ordering::SeqCst), 1);
    assert_eq!(log.closed.load(Ordering::SeqCst), 1);
    assert_eq!(
        log.visited.lock().unwrap().as_slice(),
        ["https://www.linkedin.com/jobs/search?keywords=Rust+Engineer&location=Berlin"]
    );
}

#[tokio::test]
async fn every_search_gets_its_own_session() {
    let (sessions, log) = ScriptedSessions::new(Script::page(&fixture("indeed_search.html")));
    let adapter = SiteAdapter::new(profile_for(Platform::Indeed), &instant_config(), sessions).unwrap();

    let k = kw(&["Rust"]);
    let (a, b) = tokio::join!(adapter.search(&k, "", 5), adapter.search(&k, "", 5));
    assert_eq!(a.len(), 2);
    let titles = |v: &[ghost_job_radar::JobPosting]| v.iter().map(|j| j.title.clone()).collect::<Vec<_>>();
    assert_eq!(titles(&a), titles(&b));
    assert_eq!(log.opened.load(Ordering::SeqCst), 2);
    assert_eq!(log.closed.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn login_wall_redirect_yields_empty_without_retry() {
    let script = Script {
        landing_url: Some("https://www.linkedin.com/authwall?trk=qf&sessionRedirect=x".into()),
        ..Script::page(&fixture("linkedin_search.html"))
    };
    let (sessions, log) = ScriptedSessions::new(script);
    let adapter = SiteAdapter::new(&linkedin::PROFILE, &instant_config(), sessions).unwrap();

    let jobs = adapter.search(&kw(&["Rust"]), "", 10).await;
    assert!(jobs.is_empty());
    assert_eq!(log.visited.lock().unwrap().len(), 1, "no retry inside one call");
    assert_eq!(log.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn challenge_interstitial_in_body_yields_empty() {
    let html = "<html><head><title>Just a moment...</title></head>\
                <body><h1>Verify you are human</h1></body></html>";
    let (sessions, _log) = ScriptedSessions::new(Script::page(html));
    let adapter = SiteAdapter::new(profile_for(Platform::Indeed), &instant_config(), sessions).unwrap();
    assert!(adapter.search(&kw(&["Rust"]), "", 10).await.is_empty());
}

#[tokio::test]
async fn session_and_navigation_failures_degrade_to_empty() {
    let script = Script {
        fail_open: true,
        ..Script::page("")
    };
    let (sessions, _) = ScriptedSessions::new(script);
    let adapter = SiteAdapter::new(profile_for(Platform::Glassdoor), &instant_config(), sessions).unwrap();
    assert!(adapter.search(&kw(&["Rust"]), "", 10).await.is_empty());

    let script = Script {
        fail_goto: true,
        ..Script::page(&fixture("glassdoor_search.html"))
    };
    let (sessions, log) = ScriptedSessions::new(script);
    let adapter = SiteAdapter::new(profile_for(Platform::Glassdoor), &instant_config(), sessions).unwrap();
    assert!(adapter.search(&kw(&["Rust"]), "", 10).await.is_empty());
    assert_eq!(log.closed.load(Ordering::SeqCst), 1, "session closed after failure");
}

#[tokio::test]
async fn pagination_reveals_more_cards_until_target() {
    let card = |i: usize| {
        format!(
            r#"<li data-test="jobListing"><a data-test="job-title" href="/job-listing/{i}.htm">Role {i}</a>
               <span class="EmployerProfile_compactEmployerName__x">Co {i}</span></li>"#
        )
    };
    let page = |n: usize| format!("<ul>{}</ul>", (0..n).map(card).collect::<String>());
    let script = Script {
        pages: vec![page(2), page(4), page(7), page(9)],
        ..Script::page("")
    };
    let (sessions, _) = ScriptedSessions::new(script);
    let adapter = SiteAdapter::new(profile_for(Platform::Glassdoor), &instant_config(), sessions).unwrap();

    let jobs = adapter.search(&kw(&["Rust"]), "", 6).await;
    assert_eq!(jobs.len(), 6, "extraction is capped at max_results");
    assert_eq!(jobs[5].title, "Role 5");
    assert_eq!(jobs[5].url, "https://www.glassdoor.com/job-listing/5.htm");
}

#[tokio::test]
async fn zero_results_requested_opens_no_session() {
    let (sessions, log) = ScriptedSessions::new(Script::page(&fixture("linkedin_search.html")));
    let adapter = SiteAdapter::new(&linkedin::PROFILE, &instant_config(), sessions).unwrap();
    assert!(adapter.search(&kw(&["Rust"]), "", 0).await.is_empty());
    assert_eq!(log.opened.load(Ordering::SeqCst), 0);
}
