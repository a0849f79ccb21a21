use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::audio::{AudioFormat, DeviceConfig};
use crate::recognition::MAX_PAYLOAD_BYTES;
use crate::session::SessionConfig;

/// Environment variable prefix, e.g. `VIBECATCH__RECOGNITION__API_KEY`
pub const ENV_PREFIX: &str = "VIBECATCH";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub capture: CaptureSettings,
    #[serde(default)]
    pub recognition: RecognitionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Recording deadline
    pub deadline_ms: u64,
    /// Progress tick interval (also the deadline check cadence)
    pub tick_interval_ms: u64,
    /// Device chunk cadence
    pub chunk_interval_ms: u64,
    /// Input device name; host default when unset
    pub device_name: Option<String>,
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            deadline_ms: 5000,
            tick_interval_ms: 100,
            chunk_interval_ms: 100,
            device_name: None,
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

impl CaptureSettings {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            deadline_ms: self.deadline_ms,
            tick_interval_ms: self.tick_interval_ms,
            device: DeviceConfig {
                format: AudioFormat::CAPTURE,
                chunk_interval_ms: self.chunk_interval_ms,
                device_name: self.device_name.clone(),
                echo_cancellation: self.echo_cancellation,
                noise_suppression: self.noise_suppression,
                auto_gain_control: self.auto_gain_control,
            },
        }
    }
}

/// Recognition endpoint, credentials and upload shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    pub endpoint: String,
    pub api_host: String,
    pub api_key: String,
    /// Multipart field carrying the container
    pub field_name: String,
    pub file_name: String,
    pub content_type: String,
    pub max_payload_bytes: usize,
    pub timeout_secs: u64,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://shazam-api6.p.rapidapi.com/shazam/recognize/".to_string(),
            api_host: "shazam-api6.p.rapidapi.com".to_string(),
            api_key: String::new(),
            field_name: "upload_file".to_string(),
            file_name: "recording.wav".to_string(),
            content_type: "audio/wav".to_string(),
            max_payload_bytes: MAX_PAYLOAD_BYTES,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn level(&self) -> Result<tracing::Level> {
        self.level
            .parse()
            .with_context(|| format!("Invalid log level: {}", self.level))
    }
}

impl Config {
    /// Load from an optional config file, overridden by `VIBECATCH__*` env vars
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let cfg = Config::load("/nonexistent/vibecatch").unwrap();

        assert_eq!(cfg.capture, CaptureSettings::default());
        assert_eq!(cfg.recognition.max_payload_bytes, 500_000);
        assert_eq!(cfg.recognition.field_name, "upload_file");
        assert_eq!(cfg.logging.level().unwrap(), tracing::Level::INFO);

        let session = cfg.capture.session_config();
        assert_eq!(session, SessionConfig::default());
    }

    #[test]
    fn test_file_overrides_selected_values() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("vibecatch.toml");
        std::fs::write(
            &path,
            "[capture]\ndeadline_ms = 8000\ndevice_name = \"USB Mic\"\n\n[recognition]\napi_key = \"secret\"\n\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();

        let cfg = Config::load(path.to_str().unwrap()).unwrap();

        assert_eq!(cfg.capture.deadline_ms, 8000);
        assert_eq!(cfg.capture.tick_interval_ms, 100);
        assert_eq!(cfg.capture.session_config().device.device_name.as_deref(), Some("USB Mic"));
        assert_eq!(cfg.recognition.api_key, "secret");
        assert_eq!(cfg.recognition.api_host, "shazam-api6.p.rapidapi.com");
        assert_eq!(cfg.logging.level().unwrap(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_invalid_log_level_is_an_error() {
        let logging = LoggingConfig {
            level: "loud".to_string(),
        };
        assert!(logging.level().is_err());
    }
}
