use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub url: String,
    pub iterations: u32,
    pub pacing: PacingConfig,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub user_agent: String,
}

/// How the driver waits between consecutive requests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PacingConfig {
    None,
    Fixed {
        #[serde(with = "humantime_serde")]
        delay: Duration,
    },
    TokenBucket {
        rate_per_sec: f64,
        burst: u32,
    },
}

/// One timed request that produced an HTTP response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub duration_ms: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub status: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TestEvent {
    /// Emitted before each request; `completed` attempts have finished so far.
    Progress {
        completed: u32,
        total: u32,
    },
    Info(InfoEvent),
}

/// Structured info events emitted by the engine and consumed by the CLI layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InfoEvent {
    Starting { url: String, iterations: u32 },
    Finished,
}

impl InfoEvent {
    /// Render a human-readable message for the CLI layer.
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Starting { url, iterations } => {
                format!(
                    "Starting benchmark for {}\nRunning {} iterations...",
                    url, iterations
                )
            }
            InfoEvent::Finished => "Benchmark complete!".to_string(),
        }
    }
}

/// Aggregate latency statistics, all in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub mean_ms: f64,
    pub median_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub timestamp_utc: String,
    pub config: RunConfig,
    pub total_requests: u64,
    pub failed_requests: u64,
    pub latency: LatencyStats,
    pub status_codes: BTreeMap<u16, u64>,
    pub errors: Vec<String>,
}

/// Final state of a run once every iteration has been attempted.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    NoData { failed_requests: u64, errors: Vec<String> },
    Completed(Box<Report>),
}
