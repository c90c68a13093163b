use log::debug;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Minimum spacing between two network dispatches.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(1000);

/// Spaces outbound requests at least `min_interval` apart.
///
/// The lock is held while waiting, so concurrent callers queue up in FIFO order
/// and each one is released a full interval after the previous.
#[derive(Debug)]
pub struct RequestThrottle {
    min_interval: Duration,
    last_dispatch: Mutex<Option<Instant>>,
}

impl Default for RequestThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}

impl RequestThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_dispatch: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until a dispatch is allowed, then records it as happening now.
    pub async fn acquire(&self) {
        let mut last_dispatch = self.last_dispatch.lock().await;
        if let Some(previous) = *last_dispatch {
            let ready_at = previous + self.min_interval;
            let now = Instant::now();
            if now < ready_at {
                debug!("Throttling request for {:?}", ready_at - now);
                sleep_until(ready_at).await;
            }
        }
        *last_dispatch = Some(Instant::now());
    }
}
