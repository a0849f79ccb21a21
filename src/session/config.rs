use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::audio::DeviceConfig;

/// Configuration for a capture session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How long a recording may run before it stops itself
    /// Default: 5000ms
    pub deadline_ms: u64,

    /// Interval between progress reports and deadline checks
    /// Default: 100ms
    pub tick_interval_ms: u64,

    /// Device parameters (fixed 44.1kHz/16-bit/mono format)
    pub device: DeviceConfig,
}

impl SessionConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            deadline_ms: 5000,
            tick_interval_ms: 100,
            device: DeviceConfig::default(),
        }
    }
}
