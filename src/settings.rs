use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use config::{Config, Environment};
use serde::Deserialize;

const ENV_PREFIX: &str = "JOBPOST";

/// Empirically tuned thresholds used by the field extractors.
///
/// Every field can be overridden from the environment, e.g.
/// `JOBPOST_AT_SPLIT_MIN_CANDIDATE=25`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Heuristics {
    /// A company candidate containing " at " is only re-split when the
    /// candidate is longer than this (chars).
    pub at_split_min_candidate: usize,
    /// Accepted length band (chars) for the text after " at ".
    pub at_split_min_company: usize,
    pub at_split_max_company: usize,
    /// Tokens longer than this are never a location.
    pub max_location_len: usize,
    pub anchor_scan_limit: usize,
    pub json_ld_scan_limit: usize,
    pub company_anchor_limit: usize,
    pub span_scan_limit: usize,
    pub top_card_line_limit: usize,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            at_split_min_candidate: 20,
            at_split_min_company: 2,
            at_split_max_company: 60,
            max_location_len: 70,
            anchor_scan_limit: 50,
            json_ld_scan_limit: 10,
            company_anchor_limit: 20,
            span_scan_limit: 40,
            top_card_line_limit: 30,
        }
    }
}

impl Heuristics {
    pub fn from_env() -> Result<Self> {
        let settings = Config::builder()
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserMode {
    Headless,
    Visible,
}

/// Validated run options, built from the command line.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: PathBuf,
    pub csv_path: PathBuf,
    /// `None` disables the structured text sink.
    pub text_path: Option<PathBuf>,
    pub mode: BrowserMode,
    pub delay_min: Duration,
    pub delay_max: Duration,
    pub max_urls: Option<usize>,
    pub nav_timeout: Duration,
    pub settle_timeout: Duration,
}

pub struct RawOptions {
    pub input: PathBuf,
    pub csv: PathBuf,
    pub txt: String,
    pub headful: bool,
    pub delay_min: f64,
    pub delay_max: f64,
    pub max: Option<usize>,
    pub nav_timeout_secs: u64,
    pub settle_timeout_ms: u64,
}

impl RunConfig {
    pub fn from_options(raw: RawOptions) -> Result<Self> {
        if !raw.delay_min.is_finite() || !raw.delay_max.is_finite() {
            bail!("delay bounds must be finite numbers");
        }
        if raw.delay_min < 0.0 || raw.delay_max < 0.0 {
            bail!("delay bounds must not be negative");
        }
        if raw.delay_min > raw.delay_max {
            bail!(
                "--delay-min ({}) is greater than --delay-max ({})",
                raw.delay_min,
                raw.delay_max
            );
        }

        let text_path = match raw.txt.trim() {
            "" => None,
            p => Some(PathBuf::from(p)),
        };

        Ok(Self {
            input: raw.input,
            csv_path: raw.csv,
            text_path,
            mode: if raw.headful {
                BrowserMode::Visible
            } else {
                BrowserMode::Headless
            },
            delay_min: Duration::from_secs_f64(raw.delay_min),
            delay_max: Duration::from_secs_f64(raw.delay_max),
            // --max 0 means no cap, like leaving it out
            max_urls: raw.max.filter(|n| *n > 0),
            nav_timeout: Duration::from_secs(raw.nav_timeout_secs),
            settle_timeout: Duration::from_millis(raw.settle_timeout_ms),
        })
    }
}
