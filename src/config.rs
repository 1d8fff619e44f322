//! Queue configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Operation queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Debounce interval in milliseconds.
    #[serde(default = "default_debounce_interval_ms")]
    pub debounce_interval_ms: u64,

    /// Maximum number of retained error records.
    #[serde(default = "default_max_error_history")]
    pub max_error_history: usize,
}

fn default_debounce_interval_ms() -> u64 {
    1500
}

fn default_max_error_history() -> usize {
    10
}

impl QueueConfig {
    /// Debounce interval as a `Duration`.
    pub fn debounce_interval(&self) -> Duration {
        Duration::from_millis(self.debounce_interval_ms)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            debounce_interval_ms: default_debounce_interval_ms(),
            max_error_history: default_max_error_history(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = QueueConfig::default();
        assert_eq!(config.debounce_interval_ms, 1500);
        assert_eq!(config.max_error_history, 10);
        assert_eq!(config.debounce_interval(), Duration::from_millis(1500));
    }

    #[test]
    fn test_serde_fills_missing_fields() {
        let config: QueueConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.debounce_interval_ms, 1500);
        assert_eq!(config.max_error_history, 10);

        let config: QueueConfig =
            serde_json::from_str(r#"{"debounce_interval_ms": 250}"#).unwrap();
        assert_eq!(config.debounce_interval_ms, 250);
        assert_eq!(config.max_error_history, 10);
    }
}
