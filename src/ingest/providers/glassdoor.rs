// src/ingest/providers/glassdoor.rs
use super::{QueryParam, SiteProfile};
use crate::ingest::extract::{Locator, LocatorTable};
use crate::ingest::types::Platform;

pub static PROFILE: SiteProfile = SiteProfile {
    platform: Platform::Glassdoor,
    origin: "https://www.glassdoor.com",
    search_path: "/Job/jobs.htm",
    query: &[
        QueryParam::Keywords("sc.keyword"),
        QueryParam::WithLocation("locT", "C"),
        QueryParam::Location("locId"),
    ],
    blocked_url_markers: &["challenge", "login", "captcha", "/member/"],
    blocked_body_markers: &["help us protect glassdoor", "verify you are human"],
    containers: &["ul[aria-label=\"Jobs List\"]", "ul.JobsList_jobsList__lqjTr", "#MainCol"],
    load_more: &[
        "button[data-test=\"load-more\"]",
        "button[data-test=\"pagination-next\"]",
    ],
    locators: LocatorTable {
        cards: &[
            "li[data-test=\"jobListing\"]",
            "li[data-test=\"job-listing\"]",
            "li.react-job-listing",
            "div[data-test=\"job-listing\"]",
            "li.jl",
        ],
        title_link: &[
            "a[data-test=\"job-title\"]",
            "a[data-test=\"job-link\"]",
            "a.jobLink",
            "h3 a",
        ],
        company: &[
            Locator::Text("span[class*=\"EmployerProfile_compactEmployerName\"]"),
            Locator::Text("a[data-test=\"employer-name\"]"),
            Locator::Text(".employerName"),
            Locator::Text("div[data-test=\"employer-name\"]"),
        ],
        location: &[
            Locator::Text("div[data-test=\"emp-location\"]"),
            Locator::Text("span[data-test=\"job-location\"]"),
            Locator::Text(".location"),
            Locator::Text("div[data-test=\"job-location\"]"),
        ],
        salary: &[
            Locator::Text("div[data-test=\"detailSalary\"]"),
            Locator::Text("span[data-test=\"detailSalary\"]"),
            Locator::Text(".salary"),
        ],
        description: &[
            Locator::Text("div[data-test=\"descSnippet\"]"),
            Locator::Text("div[data-test=\"job-snippet\"]"),
            Locator::Text(".jobSnippet"),
        ],
        posted: &[
            Locator::Text("div[data-test=\"job-age\"]"),
            Locator::Text(".job-age"),
        ],
        job_type: &[Locator::Text("div[data-test=\"job-type\"]")],
    },
};
