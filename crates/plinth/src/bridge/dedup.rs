//! Runtime Error Dedup
//!
//! Suppresses repeats of the same runtime error within a short window. The
//! map lives for the process lifetime; entries are overwritten on key churn
//! and never evicted otherwise.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;

/// Tracks when each error key was last sent
pub struct ErrorDedup {
    last_sent: HashMap<String, u64>,
    window_ms: u64,
    clock: Arc<dyn Clock>,
}

impl ErrorDedup {
    pub fn new(window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            last_sent: HashMap::new(),
            window_ms: window.as_millis() as u64,
            clock,
        }
    }

    /// Composite key for an error occurrence
    pub fn key(message: &str, file: Option<&str>, line: Option<u32>) -> String {
        format!("{}|{}|{}", message, file.unwrap_or(""), line.unwrap_or(0))
    }

    /// Whether an error with this key should be sent now.
    ///
    /// Returns `false` while an identical key was sent within the window.
    /// The timestamp is refreshed only when the answer is `true`, so a
    /// steady stream of repeats resends once per window.
    pub fn should_send(&mut self, key: &str) -> bool {
        let now = self.clock.now_ms();
        if let Some(&sent_at) = self.last_sent.get(key) {
            if now.saturating_sub(sent_at) < self.window_ms {
                return false;
            }
        }
        self.last_sent.insert(key.to_string(), now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::fake::ManualClock;

    fn dedup(clock: Arc<ManualClock>) -> ErrorDedup {
        ErrorDedup::new(Duration::from_millis(5000), clock)
    }

    #[test]
    fn test_first_occurrence_sends() {
        let clock = Arc::new(ManualClock::at(0));
        let mut dedup = dedup(clock);
        assert!(dedup.should_send("boom|app.rs|3"));
    }

    #[test]
    fn test_repeat_within_window_suppressed() {
        let clock = Arc::new(ManualClock::at(0));
        let mut dedup = dedup(clock.clone());

        assert!(dedup.should_send("boom|app.rs|3"));
        clock.advance(4999);
        assert!(!dedup.should_send("boom|app.rs|3"));
    }

    #[test]
    fn test_repeat_after_window_sends_again() {
        let clock = Arc::new(ManualClock::at(0));
        let mut dedup = dedup(clock.clone());

        assert!(dedup.should_send("boom|app.rs|3"));
        clock.advance(5000);
        assert!(dedup.should_send("boom|app.rs|3"));
    }

    #[test]
    fn test_suppressed_repeat_does_not_refresh_window() {
        let clock = Arc::new(ManualClock::at(0));
        let mut dedup = dedup(clock.clone());

        assert!(dedup.should_send("boom|app.rs|3"));
        clock.advance(3000);
        assert!(!dedup.should_send("boom|app.rs|3"));
        clock.advance(3000);
        // 6s since the send, 3s since the suppressed repeat
        assert!(dedup.should_send("boom|app.rs|3"));
    }

    #[test]
    fn test_distinct_keys_do_not_interfere() {
        let clock = Arc::new(ManualClock::at(0));
        let mut dedup = dedup(clock);

        assert!(dedup.should_send("boom|app.rs|3"));
        assert!(dedup.should_send("boom|app.rs|4"));
        assert!(dedup.should_send("bang|app.rs|3"));
    }

    #[test]
    fn test_key_defaults_for_missing_location() {
        assert_eq!(ErrorDedup::key("boom", None, None), "boom||0");
        assert_eq!(
            ErrorDedup::key("boom", Some("app.rs"), Some(7)),
            "boom|app.rs|7"
        );
    }
}
