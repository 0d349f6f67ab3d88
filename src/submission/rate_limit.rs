use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Entries are swept once the table grows past this many keys
const SWEEP_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window counter per client key
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Count one hit for `key`. Returns the seconds until the window resets
    /// when the key is already at its limit; a refused hit is not counted.
    pub async fn hit(&self, key: &str, now: Instant) -> Result<u32, u64> {
        let mut windows = self.windows.lock().await;
        if windows.len() > SWEEP_THRESHOLD {
            let window = self.window;
            windows.retain(|_, w| now.saturating_duration_since(w.started) < window);
        }

        let entry = windows.entry(key.to_string()).or_insert(Window { started: now, count: 0 });
        let elapsed = now.saturating_duration_since(entry.started);
        if elapsed >= self.window {
            *entry = Window { started: now, count: 0 };
        }

        if entry.count >= self.limit {
            let remaining = self.window.saturating_sub(now.saturating_duration_since(entry.started));
            let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
            return Err(secs.max(1));
        }

        entry.count += 1;
        Ok(self.limit - entry.count)
    }
}
