//! # Player Configuration
//!
//! Configuration for the streamer engine: ticker cadence, channel depths.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Streamer engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Cadence of `timeUpdate` events while playing or buffering.
    ///
    /// Default: 1 second, matching the periodic time observer of the native
    /// players this core fronts.
    #[serde(default = "default_time_update_interval")]
    pub time_update_interval: Duration,

    /// Capacity of the event broadcast channel. A subscriber that falls more
    /// than this many events behind observes a lag gap instead of blocking
    /// the producer.
    ///
    /// Default: 64.
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,

    /// Depth of the engine mailbox (commands, signals, ticks).
    ///
    /// Default: 32.
    #[serde(default = "default_mailbox_depth")]
    pub mailbox_depth: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            time_update_interval: default_time_update_interval(),
            event_buffer_size: default_event_buffer_size(),
            mailbox_depth: default_mailbox_depth(),
        }
    }
}

impl PlayerConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.time_update_interval.is_zero() {
            return Err("time_update_interval must be > 0".to_string());
        }

        if self.event_buffer_size == 0 {
            return Err("event_buffer_size must be > 0".to_string());
        }

        if self.mailbox_depth == 0 {
            return Err("mailbox_depth must be > 0".to_string());
        }

        Ok(())
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_time_update_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_event_buffer_size() -> usize {
    64
}

fn default_mailbox_depth() -> usize {
    32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlayerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.time_update_interval, Duration::from_secs(1));
        assert_eq!(config.event_buffer_size, 64);
    }

    #[test]
    fn test_config_validation() {
        let mut config = PlayerConfig::default();
        assert!(config.validate().is_ok());

        config.time_update_interval = Duration::ZERO;
        assert!(config.validate().is_err());
        config.time_update_interval = Duration::from_millis(250);

        config.event_buffer_size = 0;
        assert!(config.validate().is_err());
        config.event_buffer_size = 64;

        config.mailbox_depth = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: PlayerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.time_update_interval, Duration::from_secs(1));
    }
}
