use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};

/// Token bucket shared by every request of a sweep.
///
/// Holds up to `capacity` tokens and earns one back per `interval`. With a
/// capacity of one, consecutive requests are spaced by exactly `interval`.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: u32,
    interval: Duration,
    bucket: Mutex<Bucket>,
}

#[derive(Debug)]
struct Bucket {
    tokens: u32,
    last_refill: Instant,
}

impl Bucket {
    fn refill(&mut self, capacity: u32, interval: Duration) {
        let now = Instant::now();
        if self.tokens >= capacity {
            self.last_refill = now;
            return;
        }

        let elapsed = now.saturating_duration_since(self.last_refill);
        let earned = (elapsed.as_nanos() / interval.as_nanos().max(1)).min(capacity as u128) as u32;
        if earned == 0 {
            return;
        }

        self.tokens = (self.tokens + earned).min(capacity);
        self.last_refill = if self.tokens == capacity {
            now
        } else {
            self.last_refill + interval * earned
        };
    }
}

impl RateLimiter {
    pub fn new(capacity: u32, interval: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            interval,
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Waits until a token is available and takes it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut bucket = self.bucket.lock().await;
                bucket.refill(self.capacity, self.interval);
                if bucket.tokens > 0 {
                    bucket.tokens -= 1;
                    return;
                }
                self.interval
                    .saturating_sub(Instant::now().saturating_duration_since(bucket.last_refill))
            };
            sleep(wait.max(Duration::from_millis(1))).await;
        }
    }
}
