mod browser;
mod extract;
mod record;
mod run;
mod settings;
mod sink;
mod urls;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;

use browser::HttpBrowser;
use run::RunContext;
use settings::{Heuristics, RawOptions, RunConfig};
use sink::{CsvSink, SinkWriter, TextSink};

#[derive(Parser)]
#[command(
    name = "jobpost_scraper",
    about = "Batch extract job postings from a list of URLs into CSV + text blocks"
)]
struct Cli {
    /// File with one job URL per line (blank lines and #comments ignored)
    #[arg(long = "in", value_name = "PATH")]
    input: PathBuf,
    /// CSV output path
    #[arg(long, default_value = "out/applications.csv")]
    csv: PathBuf,
    /// Structured text output path (empty string disables it)
    #[arg(long, default_value = "out/jobs.ndjson")]
    txt: String,
    /// Show the browser while running
    #[arg(long)]
    headful: bool,
    /// Minimum pause between pages, seconds
    #[arg(long, default_value_t = 1.5)]
    delay_min: f64,
    /// Maximum pause between pages, seconds
    #[arg(long, default_value_t = 3.0)]
    delay_max: f64,
    /// Process only the first N URLs
    #[arg(long)]
    max: Option<usize>,
    /// Page load timeout, seconds
    #[arg(long, default_value_t = 120)]
    nav_timeout_secs: u64,
    /// Network-idle wait after load, milliseconds
    #[arg(long, default_value_t = 8000)]
    settle_timeout_ms: u64,
}

impl From<Cli> for RawOptions {
    fn from(cli: Cli) -> Self {
        RawOptions {
            input: cli.input,
            csv: cli.csv,
            txt: cli.txt,
            headful: cli.headful,
            delay_min: cli.delay_min,
            delay_max: cli.delay_max,
            max: cli.max,
            nav_timeout_secs: cli.nav_timeout_secs,
            settle_timeout_ms: cli.settle_timeout_ms,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cfg = RunConfig::from_options(Cli::parse().into())?;
    let heuristics = Heuristics::from_env().context("invalid JOBPOST_* heuristic override")?;

    // Fresh run: outputs never carry over between runs
    sink::remove_stale(&cfg.csv_path);
    if let Some(path) = &cfg.text_path {
        sink::remove_stale(path);
    }

    let text = std::fs::read_to_string(&cfg.input)
        .with_context(|| format!("Failed to read {}", cfg.input.display()))?;
    let mut urls = urls::parse_input(&text);
    if urls.is_empty() {
        bail!("No valid job URLs in {}", cfg.input.display());
    }
    if let Some(max) = cfg.max_urls {
        urls.truncate(max);
    }
    info!("Loaded {} job URLs from {}", urls.len(), cfg.input.display());

    let browser = HttpBrowser::new(cfg.mode, cfg.nav_timeout)?;
    let mut ctx = RunContext {
        browser,
        sinks: SinkWriter::new(
            CsvSink::new(&cfg.csv_path),
            cfg.text_path.as_ref().map(TextSink::new),
        ),
        heuristics,
        delay: (cfg.delay_min, cfg.delay_max),
        settle_timeout: cfg.settle_timeout,
    };

    let stats = ctx.run(&urls).await;
    info!(
        total = stats.total,
        written = stats.written,
        duplicates = stats.duplicates,
        auth_walls = stats.auth_walls,
        errors = stats.errors,
        "Run finished"
    );

    println!(
        "\nDone in {}: {} written, {} duplicates, {} auth walls, {} errors.",
        format_duration(t0.elapsed()),
        stats.written,
        stats.duplicates,
        stats.auth_walls,
        stats.errors
    );
    println!("CSV → {}", absolute(ctx.sinks.csv_path()).display());
    if let Some(path) = ctx.sinks.text_path() {
        println!("Text → {}", absolute(path).display());
    }
    Ok(())
}

fn absolute(path: &std::path::Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
