use std::time::Duration;

use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use tracing::{info, warn};

use crate::browser::Browser;
use crate::record::{scrape_one, Outcome};
use crate::settings::Heuristics;
use crate::sink::{Accepted, SinkWriter};

/// Run stats reported after the last URL.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub total: usize,
    pub written: usize,
    pub duplicates: usize,
    pub auth_walls: usize,
    pub errors: usize,
}

/// Everything one run owns: the single browser, the sinks with their seen
/// set, and the pacing window.
pub struct RunContext<B> {
    pub browser: B,
    pub sinks: SinkWriter,
    pub heuristics: Heuristics,
    pub delay: (Duration, Duration),
    pub settle_timeout: Duration,
}

impl<B: Browser> RunContext<B> {
    /// Process `urls` one at a time. Per-URL failures are logged and counted,
    /// never propagated.
    pub async fn run(&mut self, urls: &[String]) -> RunStats {
        let mut stats = RunStats {
            total: urls.len(),
            ..RunStats::default()
        };

        let pb = ProgressBar::new(urls.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} (eta {eta})")
        {
            pb.set_style(style.progress_chars("=> "));
        }

        for (i, url) in urls.iter().enumerate() {
            pb.suspend(|| info!("[{}/{}] {}", i + 1, urls.len(), url));
            let now = Local::now().naive_local();

            let outcome =
                scrape_one(&mut self.browser, url, &self.heuristics, self.settle_timeout, now).await;
            // logs print with the bar cleared
            pb.suspend(|| match outcome {
                Ok(Outcome::Done(record)) => match self.sinks.accept(&record) {
                    Accepted::Written => {
                        stats.written += 1;
                        info!("  ✓ {} — {}", record.company, record.location);
                    }
                    Accepted::Duplicate => {
                        stats.duplicates += 1;
                        info!("  - duplicate, skipping {}", record.job_url);
                    }
                },
                Ok(Outcome::AuthWall { resolved }) => {
                    stats.auth_walls += 1;
                    info!("  - skipped (login/auth wall at {})", resolved);
                }
                Err(e) => {
                    stats.errors += 1;
                    warn!("  ! error: {}", e);
                }
            });
            pb.inc(1);

            if i + 1 < urls.len() {
                tokio::time::sleep(self.pause()).await;
            }
        }

        pb.finish_and_clear();
        stats
    }

    fn pause(&self) -> Duration {
        let (min, max) = self.delay;
        if max <= min {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }
}
