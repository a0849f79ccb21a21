use anyhow::{bail, Context, Result};
use hound::WavReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use super::device::{AudioChunk, AudioDevice, AudioFormat, DeviceConfig, CHUNK_CHANNEL_CAPACITY};
use crate::diagnostics::{DiagnosticContext, Diagnostics};

pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path)
            .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;

        let spec = reader.spec();
        if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
            bail!(
                "Unsupported sample encoding: {:?} {}-bit (expected 16-bit integer PCM)",
                spec.sample_format,
                spec.bits_per_sample
            );
        }

        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let duration_seconds = samples.len() as f64 /
            (spec.sample_rate as f64 * spec.channels as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            bits_per_sample: spec.bits_per_sample,
            samples,
        })
    }

    pub fn format(&self) -> AudioFormat {
        AudioFormat {
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits_per_sample,
            channels: self.channels,
        }
    }
}

/// Replays a WAV file as if it were a live input
///
/// The file must already be in the requested capture format; no resampling
/// or channel mixing is done.
pub struct FileDevice {
    path: PathBuf,
    realtime: bool,
    name: String,
    diagnostics: Diagnostics,
    task: Option<JoinHandle<()>>,
}

impl FileDevice {
    pub fn new(path: impl Into<PathBuf>, realtime: bool, diagnostics: Diagnostics) -> Self {
        let path = path.into();
        let name = format!("file:{}", path.display());

        Self {
            path,
            realtime,
            name,
            diagnostics,
            task: None,
        }
    }
}

#[async_trait::async_trait]
impl AudioDevice for FileDevice {
    async fn open(&mut self, config: &DeviceConfig) -> Result<mpsc::Receiver<AudioChunk>> {
        if self.task.is_some() {
            bail!("Already capturing");
        }

        let audio = AudioFile::open(&self.path)?;
        if audio.format() != config.format {
            bail!(
                "{} is {}Hz/{}-bit/{}ch, capture requires {}Hz/{}-bit/{}ch",
                audio.path,
                audio.sample_rate,
                audio.bits_per_sample,
                audio.channels,
                config.format.sample_rate,
                config.format.bits_per_sample,
                config.format.channels
            );
        }

        let samples_per_chunk = config
            .format
            .samples_for_duration(config.chunk_interval_ms)
            .max(1);
        let period = Duration::from_millis(config.chunk_interval_ms.max(1));
        let realtime = self.realtime;
        let samples: Arc<[i16]> = audio.samples.into();

        self.diagnostics.log_with(
            DiagnosticContext::Init,
            "File device opened",
            serde_json::json!({
                "path": audio.path,
                "duration_secs": audio.duration_seconds,
                "samples_per_chunk": samples_per_chunk,
                "realtime": realtime,
            }),
        );

        let (tx, rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);

            for (index, window) in samples.chunks(samples_per_chunk).enumerate() {
                if realtime {
                    ticker.tick().await;
                }

                if tx.send(AudioChunk::from_samples(window, index as u64)).await.is_err() {
                    // Receiver dropped, nobody is listening any more
                    break;
                }
            }
        });

        self.task = Some(task);

        Ok(rx)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            task.abort();
            self.diagnostics
                .log(DiagnosticContext::Cleanup, format!("Released {}", self.name));
        }

        Ok(())
    }

    fn is_open(&self) -> bool {
        self.task.is_some()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for FileDevice {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
