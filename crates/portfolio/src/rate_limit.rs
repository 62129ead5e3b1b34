use shared::config::RateLimitConfig;
use shared::{Error, Result};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// In-process token bucket throttling outbound balance batches.
///
/// Holds up to `burst` permits and refills at `requests_per_second`.
pub struct TokenBucket {
    rate: f64,
    capacity: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub fn new(config: &RateLimitConfig) -> Self {
        let rate = config.requests_per_second.max(1) as f64;
        let capacity = config.burst.max(1) as f64;
        Self {
            rate,
            capacity,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Take a permit without waiting
    pub fn try_acquire(&self) -> Result<bool> {
        let mut state = self.lock()?;
        self.refill(&mut state);
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Wait for a permit. Returns `Error::Cancelled` as soon as `cancel` fires.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<()> {
        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let wait = {
                let mut state = self.lock()?;
                self.refill(&mut state);
                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return Ok(());
                }
                Duration::from_secs_f64((1.0 - state.tokens) / self.rate)
            };

            tokio::select! {
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.rate).min(self.capacity);
        state.last_refill = now;
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BucketState>> {
        self.state
            .lock()
            .map_err(|_| Error::Internal("rate limiter lock poisoned".to_string()))
    }
}
