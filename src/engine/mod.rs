mod pacing;
mod sampler;

pub use sampler::{HttpSampler, RequestError, Sampler};

use crate::metrics;
use crate::model::{InfoEvent, Report, RunConfig, RunOutcome, Sample, TestEvent};
use anyhow::{Context, Result};
use pacing::Pacer;
use reqwest::Url;
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Samples and failures accumulated over one invocation.
#[derive(Debug, Default)]
pub struct Run {
    pub samples: Vec<Sample>,
    pub failures: Vec<RequestError>,
}

impl Run {
    pub fn attempted(&self) -> usize {
        self.samples.len() + self.failures.len()
    }

    pub fn durations(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.duration_ms).collect()
    }

    /// Aggregate the run. With no successful samples nothing is computed and
    /// the outcome is [`RunOutcome::NoData`].
    pub fn into_outcome(self, cfg: &RunConfig) -> RunOutcome {
        let errors: Vec<String> = self.failures.iter().map(ToString::to_string).collect();
        let failed_requests = self.failures.len() as u64;

        let Some(latency) = metrics::compute_latency_stats(&self.durations()) else {
            return RunOutcome::NoData {
                failed_requests,
                errors,
            };
        };

        let mut status_codes = BTreeMap::new();
        for s in &self.samples {
            *status_codes.entry(s.status).or_insert(0u64) += 1;
        }

        RunOutcome::Completed(Box::new(Report {
            timestamp_utc: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_else(|_| "now".into()),
            config: cfg.clone(),
            total_requests: self.samples.len() as u64,
            failed_requests,
            latency,
            status_codes,
            errors,
        }))
    }
}

pub struct BenchEngine<S> {
    cfg: RunConfig,
    sampler: S,
}

impl BenchEngine<HttpSampler> {
    pub fn new(cfg: RunConfig) -> Result<Self> {
        let sampler = HttpSampler::new(&cfg)?;
        Ok(Self::with_sampler(cfg, sampler))
    }
}

impl<S: Sampler> BenchEngine<S> {
    pub fn with_sampler(cfg: RunConfig, sampler: S) -> Self {
        Self { cfg, sampler }
    }

    /// Run every iteration sequentially and return the accumulated samples.
    ///
    /// Failed requests are recorded and never abort the run. The pacer waits
    /// after each attempt except the last.
    pub async fn run(self, event_tx: mpsc::UnboundedSender<TestEvent>) -> Result<Run> {
        let url = Url::parse(&self.cfg.url).context("invalid target URL")?;
        let total = self.cfg.iterations;
        let mut pacer = Pacer::new(self.cfg.pacing);
        let mut run = Run::default();

        info!(url = %url, iterations = total, "benchmark starting");
        let _ = event_tx.send(TestEvent::Info(InfoEvent::Starting {
            url: url.to_string(),
            iterations: total,
        }));

        for i in 0..total {
            let _ = event_tx.send(TestEvent::Progress {
                completed: i,
                total,
            });

            match self.sampler.sample(&url).await {
                Ok(sample) => {
                    debug!(
                        iteration = i,
                        rtt_ms = sample.duration_ms,
                        status = sample.status,
                        "sample recorded"
                    );
                    run.samples.push(sample);
                }
                Err(e) => {
                    debug!(iteration = i, error = %e, "request failed");
                    run.failures.push(e);
                }
            }

            if i + 1 < total {
                pacer.wait().await;
            }
        }

        let _ = event_tx.send(TestEvent::Progress {
            completed: total,
            total,
        });
        let _ = event_tx.send(TestEvent::Info(InfoEvent::Finished));
        info!(
            attempted = run.attempted(),
            succeeded = run.samples.len(),
            failed = run.failures.len(),
            "benchmark finished"
        );

        Ok(run)
    }
}
