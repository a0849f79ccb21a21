use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::mpsc;

use crate::diagnostics::Diagnostics;

/// Capacity of the channel a device delivers chunks on
pub const CHUNK_CHANNEL_CAPACITY: usize = 100;

/// PCM capture format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Bits per sample
    pub bits_per_sample: u16,
    /// Number of channels
    pub channels: u16,
}

impl AudioFormat {
    /// The only format a capture session records in: 44.1kHz, 16-bit, mono
    pub const CAPTURE: AudioFormat = AudioFormat {
        sample_rate: 44_100,
        bits_per_sample: 16,
        channels: 1,
    };

    /// Bytes per sample frame (all channels)
    pub fn block_align(&self) -> u16 {
        self.channels * (self.bits_per_sample / 8)
    }

    /// Bytes per second of audio
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }

    /// Number of interleaved samples covering `duration_ms`
    pub fn samples_for_duration(&self, duration_ms: u64) -> usize {
        (self.sample_rate as u64 * self.channels as u64 * duration_ms / 1000) as usize
    }

    /// Playback duration of `byte_len` bytes of PCM
    pub fn duration_ms(&self, byte_len: usize) -> u64 {
        let byte_rate = self.byte_rate() as u64;
        if byte_rate == 0 {
            return 0;
        }
        byte_len as u64 * 1000 / byte_rate
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::CAPTURE
    }
}

/// Contiguous slice of raw audio delivered by a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    /// Raw PCM bytes (16-bit little-endian samples)
    pub bytes: Vec<u8>,
    /// Position of this chunk in the device's delivery order
    pub sequence_index: u64,
}

impl AudioChunk {
    pub fn new(bytes: Vec<u8>, sequence_index: u64) -> Self {
        Self {
            bytes,
            sequence_index,
        }
    }

    /// Build a chunk from i16 samples
    pub fn from_samples(samples: &[i16], sequence_index: u64) -> Self {
        let bytes = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        Self::new(bytes, sequence_index)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Peak absolute level in 0.0..=1.0, reading the bytes as 16-bit LE samples
    pub fn peak_level(&self) -> f32 {
        self.bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]).unsigned_abs())
            .max()
            .map(|peak| peak as f32 / 32_768.0)
            .unwrap_or(0.0)
    }
}

/// Configuration for opening a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Requested capture format
    pub format: AudioFormat,
    /// Cadence at which chunks are delivered
    pub chunk_interval_ms: u64,
    /// Preferred input device name (host default when `None`)
    pub device_name: Option<String>,
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            format: AudioFormat::CAPTURE,
            chunk_interval_ms: 100, // 100ms chunks
            device_name: None,
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

/// Audio capture device trait
///
/// Implementations:
/// - Microphone: cpal input stream (feature `microphone`)
/// - File: replay of a WAV file (offline runs and tests)
#[async_trait::async_trait]
pub trait AudioDevice: Send + Sync {
    /// Acquire the device and start delivering chunks
    ///
    /// Returns a channel receiver that will receive chunks in sequence order.
    /// The channel closes when the device stops delivering.
    async fn open(&mut self, config: &DeviceConfig) -> Result<mpsc::Receiver<AudioChunk>>;

    /// Release the device. Closing a device that is not open is a no-op.
    async fn close(&mut self) -> Result<()>;

    /// Check if the device is currently open
    fn is_open(&self) -> bool;

    /// Device name for logging
    fn name(&self) -> &str;
}

/// Device source type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSource {
    /// Host microphone input
    Microphone,
    /// WAV file replay
    File {
        path: PathBuf,
        /// Deliver chunks at the configured cadence instead of as fast as possible
        realtime: bool,
    },
}

/// Audio device factory
pub struct AudioDeviceFactory;

impl AudioDeviceFactory {
    /// Create a device for the given source
    pub fn create(source: DeviceSource, diagnostics: Diagnostics) -> Result<Box<dyn AudioDevice>> {
        match source {
            DeviceSource::Microphone => {
                #[cfg(feature = "microphone")]
                {
                    use super::microphone::MicrophoneDevice;
                    Ok(Box::new(MicrophoneDevice::new(diagnostics)))
                }

                #[cfg(not(feature = "microphone"))]
                {
                    let _ = diagnostics;
                    anyhow::bail!(
                        "Microphone capture is not available in this build (enable the `microphone` feature)"
                    )
                }
            }

            DeviceSource::File { path, realtime } => {
                use super::file::FileDevice;
                Ok(Box::new(FileDevice::new(path, realtime, diagnostics)))
            }
        }
    }
}
