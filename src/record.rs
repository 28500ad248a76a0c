use std::time::Duration;

use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::browser::{BrowseError, Browser, Page};
use crate::extract::{company, job_id, location, posted, title};
use crate::settings::Heuristics;
use crate::urls::{canonicalize, view_url};

/// Path fragments of login and verification redirects.
pub const AUTH_WALL_MARKERS: &[&str] = &["/authwall", "/checkpoint", "/uas/login"];

pub const CSV_HEADERS: [&str; 5] = ["title", "company", "location", "posted date", "job url"];

/// One extracted job posting. Unknown fields are empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRecord {
    pub title: String,
    pub company: String,
    pub location: String,
    #[serde(rename = "posted date")]
    pub posted_date: String,
    #[serde(rename = "job url")]
    pub job_url: String,
}

impl JobRecord {
    /// Values in [`CSV_HEADERS`] order.
    pub fn row(&self) -> [&str; 5] {
        [
            &self.title,
            &self.company,
            &self.location,
            &self.posted_date,
            &self.job_url,
        ]
    }
}

#[derive(Debug)]
pub enum Outcome {
    Done(JobRecord),
    /// Redirected to a login or checkpoint page.
    AuthWall { resolved: String },
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Navigation(#[from] BrowseError),
}

pub fn is_auth_wall(url: &str) -> bool {
    AUTH_WALL_MARKERS.iter().any(|m| url.contains(m))
}

/// Load one canonical job URL and assemble its record.
pub async fn scrape_one<B: Browser>(
    browser: &mut B,
    url: &str,
    heuristics: &Heuristics,
    settle_timeout: Duration,
    now: NaiveDateTime,
) -> Result<Outcome, ScrapeError> {
    let target = canonicalize(url);
    let page = browser.open(&target).await?;
    if let Err(e) = browser.settle(&page, settle_timeout).await {
        debug!(url = %target, error = %e, "page did not settle, extracting anyway");
    }

    if is_auth_wall(page.url()) {
        return Ok(Outcome::AuthWall {
            resolved: page.url().to_string(),
        });
    }

    Ok(Outcome::Done(build_record(&page, heuristics, now)))
}

/// Run every extractor against a loaded page. A miss in one never blocks
/// the others.
pub fn build_record(page: &dyn Page, heuristics: &Heuristics, now: NaiveDateTime) -> JobRecord {
    let raw_canonical = page
        .first_attr("link[rel='canonical']", "href")
        .ok()
        .flatten()
        .filter(|href| !href.trim().is_empty())
        .unwrap_or_else(|| page.url().to_string());

    let id = job_id::extract(page, &raw_canonical, heuristics);
    let job_url = if id.is_empty() {
        canonicalize(&raw_canonical)
    } else {
        view_url(&id)
    };

    JobRecord {
        title: title::extract(page),
        company: company::extract(page, heuristics),
        location: location::extract(page, heuristics),
        posted_date: posted::extract(page, now).to_string(),
        job_url,
    }
}
