use serde_json::Value;

use super::{first_found, json_ld_objects, scalar_text, Strategy};
use crate::browser::{Lookup, Page};
use crate::settings::Heuristics;
use crate::urls::{is_numeric_id, job_id_from, URN_JOB_RE};

const META_URL_TAGS: &[(&str, &str)] = &[
    ("link[rel='canonical']", "href"),
    ("meta[property='og:url']", "content"),
    ("meta[name='twitter:url']", "content"),
];

const JOB_ANCHORS: &str = "a[href*='/jobs/view/'], a[href*='/jobPosting/']";

const STRATEGIES: &[(&str, Strategy)] = &[
    ("meta-tags", from_meta_tags),
    ("anchors", from_anchors),
    ("urn", from_urn),
    ("json-ld", from_json_ld),
];

/// Best job id for the loaded page, or an empty string. The URL hint wins;
/// page sources are consulted in strict priority order after it.
pub fn extract(page: &dyn Page, url_hint: &str, heuristics: &Heuristics) -> String {
    if let Some(id) = job_id_from(url_hint) {
        return id;
    }
    first_found(page, heuristics, "job_id", STRATEGIES).unwrap_or_default()
}

fn from_meta_tags(page: &dyn Page, _: &Heuristics) -> Lookup<String> {
    for (selector, attr) in META_URL_TAGS {
        // one broken tag must not hide the next one
        if let Ok(Some(id)) = page.first_attr(selector, attr).map(|v| v.as_deref().and_then(job_id_from)) {
            return Ok(Some(id));
        }
    }
    Ok(None)
}

fn from_anchors(page: &dyn Page, h: &Heuristics) -> Lookup<String> {
    Ok(page
        .query(JOB_ANCHORS, h.anchor_scan_limit)?
        .iter()
        .find_map(|a| a.attr("href").and_then(job_id_from)))
}

fn from_urn(page: &dyn Page, _: &Heuristics) -> Lookup<String> {
    Ok(page
        .html()?
        .and_then(|html| URN_JOB_RE.captures(&html).map(|c| c[1].to_string())))
}

fn from_json_ld(page: &dyn Page, h: &Heuristics) -> Lookup<String> {
    let objects = json_ld_objects(page, h.json_ld_scan_limit)?.unwrap_or_default();
    Ok(objects.iter().find_map(identifier))
}

/// `identifier` is either a scalar or a PropertyValue object with `value`.
fn identifier(obj: &Value) -> Option<String> {
    let ident = obj.get("identifier")?;
    let raw = match ident {
        Value::Object(map) => map.get("value").and_then(scalar_text),
        other => scalar_text(other),
    }?;
    is_numeric_id(&raw).then_some(raw)
}
