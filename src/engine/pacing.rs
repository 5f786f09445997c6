use crate::model::PacingConfig;
use std::time::Duration;
use tokio::time::Instant;

/// Waits between consecutive requests according to a [`PacingConfig`].
pub(crate) enum Pacer {
    None,
    Fixed(Duration),
    TokenBucket(TokenBucket),
}

impl Pacer {
    pub fn new(cfg: PacingConfig) -> Self {
        match cfg {
            PacingConfig::None => Pacer::None,
            PacingConfig::Fixed { delay } => Pacer::Fixed(delay),
            PacingConfig::TokenBucket {
                rate_per_sec,
                burst,
            } => Pacer::TokenBucket(TokenBucket::new(rate_per_sec, burst)),
        }
    }

    /// Called after each attempt, successful or not.
    pub async fn wait(&mut self) {
        match self {
            Pacer::None => {}
            Pacer::Fixed(delay) => tokio::time::sleep(*delay).await,
            Pacer::TokenBucket(bucket) => bucket.acquire().await,
        }
    }
}

pub(crate) struct TokenBucket {
    rate_per_sec: f64,
    capacity: f64,
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(rate_per_sec: f64, burst: u32) -> Self {
        let capacity = f64::from(burst.max(1));
        Self {
            rate_per_sec: rate_per_sec.max(f64::MIN_POSITIVE),
            capacity,
            // The request that just completed already spent a token.
            tokens: capacity - 1.0,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate_per_sec).min(self.capacity);
        self.last_refill = now;
    }

    /// Take one token, sleeping until one is available.
    pub async fn acquire(&mut self) {
        self.refill();
        if self.tokens < 1.0 {
            let deficit = 1.0 - self.tokens;
            let wait = Duration::from_secs_f64(deficit / self.rate_per_sec);
            tokio::time::sleep(wait).await;
            self.refill();
        }
        self.tokens = (self.tokens - 1.0).max(0.0);
    }
}
