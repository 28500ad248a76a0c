use std::sync::LazyLock;

use regex::Regex;

use super::{first_found, json_ld_objects, scalar_text, Strategy, TOP_CARD};
use crate::browser::{Lookup, Page};
use crate::settings::Heuristics;

static COMPANY_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\r\n]+|[•·|]|—|–").unwrap());
static AT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bat\s+(.+)$").unwrap());
static COUNT_TAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+(?:[\d,.]+[km+]*\s+)?(?:employees|followers)\b.*$").unwrap());
static MULTI_SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());
/// "Role - Company | LinkedIn"
static TITLE_COMPANY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\s*([^-|•]+)\s*(?:[-|•]|$)").unwrap());

const COMPANY_ANCHORS: &[&str] = &[
    "a[href*='/company/']",
    "a[href*='linkedin.com/company/']",
    "a[data-entity-hovercard-id^='urn:li:fs_miniCompany']",
    ".jobs-unified-top-card__company-name a",
    "a.topcard__org-name-link",
    ".top-card-layout__second-subline a",
    ".top-card-layout__entity-info a",
    "a[data-tracking-control-name*='topcard']",
];

const SUBTITLE_BLOCKS: &[&str] = &[
    ".jobs-unified-top-card__company-name",
    ".top-card-layout__second-subline",
    ".top-card-layout__entity-info",
];

const STRATEGIES: &[(&str, Strategy)] = &[
    ("top-card-anchors", from_top_card_anchors),
    ("subtitle-blocks", from_subtitle_blocks),
    ("json-ld", from_json_ld),
    ("page-title", from_page_title),
];

pub fn extract(page: &dyn Page, heuristics: &Heuristics) -> String {
    first_found(page, heuristics, "company", STRATEGIES).unwrap_or_default()
}

/// Reduce a scraped company candidate to the bare name.
pub fn clean_company_name(txt: &str, h: &Heuristics) -> String {
    let mut s = COMPANY_SPLIT_RE
        .split(txt)
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();

    // "Senior Engineer at Beta Industries" caught instead of the name
    if let Some(caps) = AT_RE.captures(&s) {
        let company = caps[1].trim();
        let company_len = company.chars().count();
        if s.chars().count() > h.at_split_min_candidate
            && (h.at_split_min_company..=h.at_split_max_company).contains(&company_len)
        {
            s = company.to_string();
        }
    }

    let s = COUNT_TAIL_RE.replace(&s, "");
    MULTI_SPACE_RE.replace_all(s.trim(), " ").into_owned()
}

fn from_top_card_anchors(page: &dyn Page, h: &Heuristics) -> Lookup<String> {
    for sel in COMPANY_ANCHORS {
        let anchors = match page.query_in(TOP_CARD, sel, h.company_anchor_limit)? {
            Some(found) => found,
            None => page.query(sel, h.company_anchor_limit)?,
        };
        let hit = anchors.iter().find_map(|a| {
            let href = a.attr("href").unwrap_or_default();
            let name = clean_company_name(&a.text, h);
            (href.contains("/company/") && !name.is_empty()).then_some(name)
        });
        if hit.is_some() {
            return Ok(hit);
        }
    }
    Ok(None)
}

fn from_subtitle_blocks(page: &dyn Page, h: &Heuristics) -> Lookup<String> {
    for sel in SUBTITLE_BLOCKS {
        if let Some(block) = page.first_text(sel)? {
            return Ok(Some(clean_company_name(&block, h)));
        }
    }
    Ok(None)
}

fn from_json_ld(page: &dyn Page, h: &Heuristics) -> Lookup<String> {
    let objects = json_ld_objects(page, h.json_ld_scan_limit)?.unwrap_or_default();
    Ok(objects.iter().find_map(|o| {
        o.pointer("/hiringOrganization/name")
            .or_else(|| o.pointer("/jobLocation/hiringOrganization/name"))
            .and_then(scalar_text)
            .map(|name| clean_company_name(&name, h))
    }))
}

fn from_page_title(page: &dyn Page, h: &Heuristics) -> Lookup<String> {
    Ok(page.title()?.and_then(|title| {
        TITLE_COMPANY_RE
            .captures(&title)
            .map(|c| clean_company_name(c[1].trim(), h))
    }))
}
