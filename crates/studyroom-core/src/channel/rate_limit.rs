use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Window within which an identical message is suppressed.
pub const DEFAULT_DEBOUNCE_MS: u64 = 1000;

/// Per-message debounce: a message is allowed again once `window` has passed
/// since it was last *sent* (suppressed attempts do not extend the window).
#[derive(Debug, Clone)]
pub struct RateLimiter {
    window: Duration,
    last_sent: HashMap<String, DateTime<Utc>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_MS)
    }
}

impl RateLimiter {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window: Duration::milliseconds(window_ms.min(i64::MAX as u64) as i64),
            last_sent: HashMap::new(),
        }
    }

    pub fn allow(&self, message: &str, now: DateTime<Utc>) -> bool {
        match self.last_sent.get(message) {
            Some(&last) => now - last >= self.window,
            None => true,
        }
    }

    pub fn mark_sent(&mut self, message: &str, now: DateTime<Utc>) {
        let window = self.window;
        self.last_sent.retain(|_, &mut last| now - last < window);
        self.last_sent.insert(message.to_string(), now);
    }
}
