// src/ingest/providers/linkedin.rs
//! LinkedIn guest job search (no authentication).

use super::{QueryParam, SiteProfile};
use crate::ingest::extract::{Locator, LocatorTable};
use crate::ingest::types::Platform;

pub static PROFILE: SiteProfile = SiteProfile {
    platform: Platform::LinkedIn,
    origin: "https://www.linkedin.com",
    search_path: "/jobs/search",
    query: &[
        QueryParam::Keywords("keywords"),
        QueryParam::Location("location"),
    ],
    blocked_url_markers: &["challenge", "login", "authwall", "checkpoint", "signup"],
    blocked_body_markers: &["security verification", "let's do a quick security check"],
    containers: &[
        "ul.jobs-search__results-list",
        ".jobs-search-results__list",
        ".scaffold-layout__list-container",
        "ul.scaffold-layout__list",
        "[data-test-id=\"job-search-results-list\"]",
    ],
    load_more: &[
        "button[aria-label=\"Load more results\"]",
        "button.infinite-scroller__show-more-button",
    ],
    locators: LocatorTable {
        cards: &[
            "li.jobs-search-results__list-item",
            "li.job-search-card",
            "div[data-test-id=\"job-search-card\"]",
            "li.scaffold-layout__list-item",
            "div.base-card",
            "li[data-entity-urn*=\"job\"]",
        ],
        title_link: &[
            "a.base-card__full-link",
            "a.job-card-list__title",
            "h3.base-search-card__title a",
            "h4.job-search-card__title a",
            "a[data-control-name=\"job_card_title\"]",
            "a[href*=\"/jobs/view/\"]",
            "h3 a",
            "h4 a",
            "a[href*=\"jobs\"]",
        ],
        company: &[
            Locator::Text("h4.base-search-card__subtitle a"),
            Locator::Text("a.job-search-card__subtitle-link"),
            Locator::Text("a[data-control-name=\"job_card_company_link\"]"),
            Locator::Text(".base-search-card__subtitle a"),
            Locator::Text(".job-search-card__subtitle a"),
            Locator::Text("h4.base-search-card__subtitle"),
        ],
        location: &[
            Locator::Text(".job-search-card__location"),
            Locator::Text(".base-search-card__metadata .job-search-card__location"),
            Locator::Text("span.job-search-card__location"),
            Locator::Text(".job-search-card__metadata-item"),
        ],
        salary: &[
            Locator::Text(".job-search-card__salary-info"),
            Locator::Text(".base-search-card__salary"),
        ],
        description: &[
            Locator::Text(".job-search-card__snippet"),
            Locator::Text(".base-search-card__snippet"),
            Locator::Text("p.job-search-card__snippet"),
        ],
        posted: &[
            Locator::Attr("time", "datetime"),
            Locator::Text("time"),
            Locator::Text(".job-search-card__listdate"),
            Locator::Text("span[data-test-id=\"job-posted-date\"]"),
        ],
        job_type: &[
            Locator::Text(".job-search-card__employment-type"),
            Locator::Text(".job-insight"),
        ],
    },
};
