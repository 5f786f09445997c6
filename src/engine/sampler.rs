use crate::model::{RunConfig, Sample};
use anyhow::{Context, Result};
use reqwest::Url;
use std::future::Future;
use std::time::Instant;
use thiserror::Error;

/// A request that never produced an HTTP response.
///
/// Error statuses (4xx/5xx) are not represented here; they are recorded as
/// ordinary samples.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        let message = error_chain(&err);
        if err.is_timeout() {
            RequestError::Timeout(message)
        } else if err.is_connect() {
            RequestError::Connect(message)
        } else if err.is_builder() {
            RequestError::InvalidRequest(message)
        } else {
            RequestError::Transport(message)
        }
    }
}

/// Flatten an error and its sources into one line.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_msg = cause.to_string();
        if !message.contains(&cause_msg) {
            message.push_str(": ");
            message.push_str(&cause_msg);
        }
        source = cause.source();
    }
    message
}

/// Issues one timed request per call.
pub trait Sampler: Send + Sync + 'static {
    fn sample(&self, url: &Url) -> impl Future<Output = Result<Sample, RequestError>> + Send;
}

#[derive(Clone)]
pub struct HttpSampler {
    http: reqwest::Client,
}

impl HttpSampler {
    pub fn new(cfg: &RunConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http })
    }
}

impl Sampler for HttpSampler {
    /// Time a single GET from send until the response head arrives.
    async fn sample(&self, url: &Url) -> Result<Sample, RequestError> {
        let start = Instant::now();
        let resp = self.http.get(url.clone()).send().await?;
        let elapsed = start.elapsed();

        Ok(Sample {
            duration_ms: elapsed.as_secs_f64() * 1000.0,
            timestamp: time::OffsetDateTime::now_utc(),
            status: resp.status().as_u16(),
        })
    }
}
