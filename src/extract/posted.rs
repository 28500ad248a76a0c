use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::browser::Page;

static ISO_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").unwrap());
static RELATIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s+(minute|hour|day|week|month|year)s?\s+ago").unwrap());

const TIME_AGO_SELECTORS: &str = "span[class*='posted-time-ago__text'], span[class*='jobs-unified-top-card__posted-date'], time[datetime]";
const TIME_ELEMENT: &str = "time[datetime]";

/// Approximate length of each unit in days. Months and years drift; the
/// output is only used for coarse freshness.
fn unit_days(unit: &str) -> f64 {
    match unit {
        "minute" => 1.0 / 1440.0,
        "hour" => 1.0 / 24.0,
        "day" => 1.0,
        "week" => 7.0,
        "month" => 30.0,
        _ => 365.0,
    }
}

/// Posting date of the loaded page. Falls back to today.
pub fn extract(page: &dyn Page, now: NaiveDateTime) -> NaiveDate {
    let time_ago = page.first_text(TIME_AGO_SELECTORS).ok().flatten();
    if let Some(date) = time_ago.and_then(|raw| parse_posted(&raw, now)) {
        return date;
    }
    let datetime_attr = page.first_attr(TIME_ELEMENT, "datetime").ok().flatten();
    norm_date(datetime_attr.as_deref().unwrap_or_default(), now)
}

/// Normalise a posted-date string against `now`; anything unparseable is
/// `now`'s date.
pub fn norm_date(text: &str, now: NaiveDateTime) -> NaiveDate {
    parse_posted(text, now).unwrap_or_else(|| now.date())
}

/// `None` when the text carries no usable date.
pub fn parse_posted(text: &str, now: NaiveDateTime) -> Option<NaiveDate> {
    let raw = text.trim();
    if raw.is_empty() {
        return None;
    }

    if ISO_PREFIX_RE.is_match(raw) {
        if let Some(date) = parse_iso(raw) {
            return Some(date);
        }
    }

    let t = raw.to_lowercase();
    if t.contains("today") || t.contains("just") {
        return Some(now.date());
    }

    let caps = RELATIVE_RE.captures(&t)?;
    let n: f64 = caps[1].parse::<u32>().ok()?.into();
    let days = unit_days(&caps[2]) * n;
    let offset = Duration::try_milliseconds((days * 86_400_000.0) as i64)?;
    now.checked_sub_signed(offset).map(|dt| dt.date())
}

fn parse_iso(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    // Other ISO shapes (no seconds, "+0000" offsets): the date part is enough
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::http::HtmlPage;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn relative_days() {
        assert_eq!(norm_date("3 days ago", now()), now().date() - Duration::days(3));
        assert_eq!(norm_date("Reposted 2 weeks ago", now()), day(2024, 3, 1));
        assert_eq!(norm_date("1 month ago", now()), day(2024, 2, 14));
        assert_eq!(norm_date("1 year ago", now()), day(2023, 3, 16));
    }

    #[test]
    fn sub_day_units_can_cross_midnight() {
        assert_eq!(norm_date("5 hours ago", now()), day(2024, 3, 15));
        assert_eq!(norm_date("13 hours ago", now()), day(2024, 3, 14));
        assert_eq!(norm_date("30 minutes ago", now()), day(2024, 3, 15));
    }

    #[test]
    fn today_and_empty() {
        assert_eq!(norm_date("today", now()), now().date());
        assert_eq!(norm_date("Just now", now()), now().date());
        assert_eq!(norm_date("", now()), now().date());
        assert_eq!(norm_date("sometime soon", now()), now().date());
    }

    #[test]
    fn iso_strings() {
        assert_eq!(norm_date("2024-01-05T00:00:00Z", now()), day(2024, 1, 5));
        assert_eq!(norm_date("2023-11-30", now()), day(2023, 11, 30));
        assert_eq!(norm_date("2023-11-30T08:15:00", now()), day(2023, 11, 30));
        assert_eq!(norm_date("2023-11-30T23:00:00-05:00", now()), day(2023, 11, 30));
    }

    #[test]
    fn loose_iso_shapes_use_date_prefix() {
        assert_eq!(norm_date("2024-01-05T10:00Z", now()), day(2024, 1, 5));
        assert_eq!(norm_date("2024-01-05T00:00:00.000+0000", now()), day(2024, 1, 5));
        assert_eq!(norm_date("2024-01-05 10:00", now()), day(2024, 1, 5));
        assert_eq!(norm_date("2024-13-45T10:00Z", now()), now().date());
    }

    #[test]
    fn huge_counts_fall_back_to_today() {
        assert_eq!(norm_date("99999999999 years ago", now()), now().date());
    }

    #[test]
    fn page_time_ago_then_datetime_attr() {
        let html = r#"<span class="posted-time-ago__text">2 days ago</span><time datetime="2020-01-01">x</time>"#;
        let page = HtmlPage::parse("https://www.linkedin.com/jobs/view/1/", html);
        assert_eq!(extract(&page, now()), day(2024, 3, 13));

        let html = r#"<span class="jobs-unified-top-card__posted-date">recently</span><time datetime="2024-02-29">last month</time>"#;
        let page = HtmlPage::parse("https://www.linkedin.com/jobs/view/1/", html);
        assert_eq!(extract(&page, now()), day(2024, 2, 29));

        let page = HtmlPage::parse("https://www.linkedin.com/jobs/view/1/", "<p>none</p>");
        assert_eq!(extract(&page, now()), now().date());
    }
}
