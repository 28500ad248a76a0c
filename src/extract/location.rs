use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::{first_found, json_ld_objects, scalar_text, split_tokens, Strategy};
use crate::browser::{Lookup, Page};
use crate::settings::Heuristics;

static NOISE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(posted|reposted|minute|hour|week|day|apply|applicant|people|clicked|promoted|response|managed|saved|premium)").unwrap()
});
static CITY_STATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*[A-Za-z]{2}\b").unwrap());
static CAPITALIZED_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][a-z]+(?:\s[A-Z][a-z]+)*\s+[A-Z]{2}\b").unwrap());
static COUNTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(United States|USA|Canada|United Kingdom|UK|India|Germany|France|Australia|Netherlands|Spain|Italy|Singapore|Mexico|Brazil)\b").unwrap()
});
static REMOTE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)remote|telecommute").unwrap());

const SUBLINE: &str = ".top-card-layout__first-subline, .jobs-unified-top-card__subtitle-primary, .jobs-unified-top-card__subtitle-primary-group";
const SPANS: &str = ".top-card-layout__entity-info span, span[class*='jobs-unified-top-card__bullet'], .jobs-unified-top-card__subtitle-primary span, span.topcard__flavor--bullet";
const TOP_CARD_WIDE: &str = ".jobs-unified-top-card, .top-card-layout, .jobs-details-top-card, .jobs-details__main";

const STRATEGIES: &[(&str, Strategy)] = &[
    ("subline", from_subline),
    ("spans", from_spans),
    ("top-card-lines", from_top_card_lines),
    ("json-ld", from_json_ld),
];

pub fn extract(page: &dyn Page, heuristics: &Heuristics) -> String {
    first_found(page, heuristics, "location", STRATEGIES).unwrap_or_default()
}

pub fn looks_like_location(tok: &str, h: &Heuristics) -> bool {
    let x = tok.trim();
    if x.is_empty() || x.chars().count() > h.max_location_len {
        return false;
    }
    if NOISE_RE.is_match(x) {
        return false;
    }
    x.eq_ignore_ascii_case("remote")
        || CITY_STATE_RE.is_match(x)
        || CAPITALIZED_CODE_RE.is_match(x)
        || COUNTRY_RE.is_match(x)
}

fn pick_location(text: &str, h: &Heuristics) -> Option<String> {
    split_tokens(text)
        .into_iter()
        .find(|tok| looks_like_location(tok, h))
        .map(str::to_string)
}

fn from_subline(page: &dyn Page, h: &Heuristics) -> Lookup<String> {
    Ok(page.first_text(SUBLINE)?.and_then(|s| pick_location(&s, h)))
}

fn from_spans(page: &dyn Page, h: &Heuristics) -> Lookup<String> {
    Ok(page
        .query(SPANS, h.span_scan_limit)?
        .iter()
        .find_map(|span| pick_location(&span.text, h)))
}

fn from_top_card_lines(page: &dyn Page, h: &Heuristics) -> Lookup<String> {
    Ok(page.first_text(TOP_CARD_WIDE)?.and_then(|text| {
        text.lines()
            .filter(|l| !l.trim().is_empty())
            .take(h.top_card_line_limit)
            .find_map(|line| pick_location(line, h))
    }))
}

fn from_json_ld(page: &dyn Page, h: &Heuristics) -> Lookup<String> {
    let objects = json_ld_objects(page, h.json_ld_scan_limit)?.unwrap_or_default();
    Ok(objects.iter().find_map(json_ld_location))
}

/// Remote markers win over addresses; otherwise "city, region", then
/// whichever single part is present.
fn json_ld_location(obj: &Value) -> Option<String> {
    let is_remote = |v: Option<&Value>| v.and_then(Value::as_str).is_some_and(|s| REMOTE_RE.is_match(s));
    if is_remote(obj.get("jobLocationType")) || is_remote(obj.get("jobLocation")) {
        return Some("Remote".into());
    }

    let located = obj.get("jobLocation")?;
    let places: Vec<&Value> = match located {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![located],
        _ => Vec::new(),
    };
    places.into_iter().find_map(|place| {
        let addr = place.get("address")?;
        if let Some(text) = scalar_text(addr) {
            return Some(text);
        }
        let part = |key: &str| addr.get(key).and_then(named_text);
        match (part("addressLocality"), part("addressRegion")) {
            (Some(city), Some(region)) => Some(format!("{}, {}", city, region)),
            (Some(city), None) => Some(city),
            (None, Some(region)) => Some(region),
            (None, None) => part("addressCountry"),
        }
    })
}

/// Plain string, or a schema.org thing with a `name`.
fn named_text(v: &Value) -> Option<String> {
    scalar_text(v).or_else(|| v.get("name").and_then(scalar_text))
}
