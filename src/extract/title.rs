use crate::browser::Page;

/// Most specific first; the bare `h1` is the last resort.
const TITLE_SELECTORS: &[&str] = &[
    "h1[class*='jobs-unified-top-card__job-title']",
    "h1[class*='job-details-jobs-title']",
    ".top-card-layout__title",
    ".topcard__title",
    "h1",
];

pub fn extract(page: &dyn Page) -> String {
    TITLE_SELECTORS
        .iter()
        .find_map(|sel| page.first_text(sel).ok().flatten())
        .unwrap_or_default()
}
