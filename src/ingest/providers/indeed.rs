// src/ingest/providers/indeed.rs
use super::{QueryParam, SiteProfile};
use crate::ingest::extract::{Locator, LocatorTable};
use crate::ingest::types::Platform;

pub static PROFILE: SiteProfile = SiteProfile {
    platform: Platform::Indeed,
    origin: "https://www.indeed.com",
    search_path: "/jobs",
    query: &[QueryParam::Keywords("q"), QueryParam::Location("l")],
    blocked_url_markers: &["captcha", "challenge", "/account/login", "auth?"],
    blocked_body_markers: &["verify you are human", "checking your browser", "hcaptcha"],
    containers: &[
        "#mosaic-jobResults",
        "#mosaic-provider-jobcards",
        "ul.jobsearch-ResultsList",
        "td#resultsCol",
    ],
    load_more: &["a[data-testid=\"pagination-page-next\"]", "a[aria-label=\"Next Page\"]"],
    locators: LocatorTable {
        cards: &[
            "div.job_seen_beacon",
            "td.resultContent",
            "div.cardOutline",
            "a.tapItem",
            "div.jobsearch-SerpJobCard",
        ],
        title_link: &[
            "h2.jobTitle a",
            "a.jcs-JobTitle",
            "a[data-jk]",
            "h2 a",
            "a[href*=\"/viewjob\"]",
            "a[href*=\"/rc/clk\"]",
        ],
        company: &[
            Locator::Text("span[data-testid=\"company-name\"]"),
            Locator::Text("span.companyName"),
            Locator::Text(".company"),
        ],
        location: &[
            Locator::Text("div[data-testid=\"text-location\"]"),
            Locator::Text("div.companyLocation"),
            Locator::Text(".location"),
        ],
        salary: &[
            Locator::Text("div.salary-snippet-container"),
            Locator::Text("div[data-testid=\"attribute_snippet_testid\"].salary-snippet-container"),
            Locator::Text("span.salaryText"),
            Locator::Text(".estimated-salary"),
        ],
        description: &[
            Locator::Text("div.job-snippet"),
            Locator::Text("div[data-testid=\"jobsnippet_footer\"]"),
            Locator::Text(".summary"),
        ],
        posted: &[
            Locator::Text("span[data-testid=\"myJobsStateDate\"]"),
            Locator::Text("span.date"),
            Locator::Text(".result-footer .date"),
        ],
        job_type: &[
            Locator::Text("div[data-testid=\"attribute_snippet_testid\"]"),
            Locator::Text(".metadata .attribute_snippet"),
        ],
    },
};
