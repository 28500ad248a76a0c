pub mod company;
pub mod job_id;
pub mod location;
pub mod posted;
pub mod title;

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::browser::{Lookup, Page};
use crate::settings::Heuristics;

pub const JSON_LD_SELECTOR: &str = r#"script[type="application/ld+json"]"#;

/// The region holding the primary job metadata.
pub const TOP_CARD: &str = ".jobs-unified-top-card, .top-card-layout, .jobs-details-top-card";

static BULLETS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*(?:[•·|—–]|\n)\s*|\s+\.\s+").unwrap());

/// One way of finding a field. `Ok(None)` and `Err` both mean "try the next one".
pub type Strategy = fn(&dyn Page, &Heuristics) -> Lookup<String>;

/// Run `strategies` in order and return the first non-empty value.
pub fn first_found(
    page: &dyn Page,
    heuristics: &Heuristics,
    field: &str,
    strategies: &[(&str, Strategy)],
) -> Option<String> {
    for (name, strategy) in strategies {
        match strategy(page, heuristics) {
            Ok(Some(value)) if !value.trim().is_empty() => {
                debug!(field, strategy = name, "found");
                return Some(value.trim().to_string());
            }
            Ok(_) => {}
            Err(e) => debug!(field, strategy = name, error = %e, "lookup failed"),
        }
    }
    debug!(field, "no strategy matched");
    None
}

/// Split a subtitle-like block on bullets, pipes, dashes and line breaks.
pub fn split_tokens(s: &str) -> Vec<&str> {
    BULLETS_RE
        .split(s)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Parsed JSON-LD objects from the first `limit` script blocks. A top-level
/// array contributes each of its elements. Blocks that fail to parse are
/// skipped.
pub fn json_ld_objects(page: &dyn Page, limit: usize) -> Lookup<Vec<Value>> {
    let scripts = page.query(JSON_LD_SELECTOR, limit)?;
    let mut objects = Vec::new();
    for script in scripts {
        match serde_json::from_str::<Value>(&script.text) {
            Ok(Value::Array(items)) => objects.extend(items),
            Ok(obj) => objects.push(obj),
            Err(e) => debug!(error = %e, "skipping malformed JSON-LD block"),
        }
    }
    Ok(Some(objects).filter(|o| !o.is_empty()))
}

/// A JSON value as text when it is a non-empty string or a number.
pub fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
