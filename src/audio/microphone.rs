// Microphone device backed by cpal
//
// cpal streams are not Send, so each open() spawns a capture thread that owns
// the stream until close() signals it. Samples are downmixed to mono, converted
// to i16 and cut into fixed-size chunks inside the data callback.

use anyhow::{anyhow, bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::device::{AudioChunk, AudioDevice, DeviceConfig, CHUNK_CHANNEL_CAPACITY};
use crate::diagnostics::{DiagnosticContext, Diagnostics};

pub struct MicrophoneDevice {
    name: String,
    diagnostics: Diagnostics,
    stop_tx: Option<std_mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl MicrophoneDevice {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self {
            name: "microphone".to_string(),
            diagnostics,
            stop_tx: None,
            thread: None,
        }
    }

    /// List input device names so the user can pick one in the config
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host.input_devices().context("No input devices available")?;

        Ok(devices.filter_map(|device| device.name().ok()).collect())
    }
}

#[async_trait::async_trait]
impl AudioDevice for MicrophoneDevice {
    async fn open(&mut self, config: &DeviceConfig) -> Result<mpsc::Receiver<AudioChunk>> {
        if self.thread.is_some() {
            bail!("Already capturing");
        }

        let (tx, rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();
        let (ready_tx, ready_rx) = std_mpsc::sync_channel::<Result<String, String>>(1);
        let thread_config = config.clone();

        let thread = std::thread::Builder::new()
            .name("vibecatch-capture".to_string())
            .spawn(move || capture_thread(thread_config, tx, stop_rx, ready_tx))
            .context("Failed to spawn capture thread")?;

        // Wait for the stream to come up (or fail) without blocking the runtime
        let ready = tokio::task::spawn_blocking(move || ready_rx.recv())
            .await
            .context("Capture readiness task panicked")?;

        match ready {
            Ok(Ok(device_name)) => {
                self.name = device_name;
                self.stop_tx = Some(stop_tx);
                self.thread = Some(thread);
                self.diagnostics.log_with(
                    DiagnosticContext::Init,
                    "Got media stream",
                    serde_json::json!({
                        "device": self.name,
                        "sample_rate": config.format.sample_rate,
                        "channels": config.format.channels,
                        "echo_cancellation": config.echo_cancellation,
                        "noise_suppression": config.noise_suppression,
                        "auto_gain_control": config.auto_gain_control,
                    }),
                );
                Ok(rx)
            }
            Ok(Err(message)) => {
                let _ = thread.join();
                Err(anyhow!(message))
            }
            Err(_) => {
                let _ = thread.join();
                Err(anyhow!("Capture thread exited before the stream started"))
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        if let Some(thread) = self.thread.take() {
            tokio::task::spawn_blocking(move || thread.join())
                .await
                .context("Failed to join capture thread")?
                .map_err(|_| anyhow!("Capture thread panicked"))?;

            self.diagnostics
                .log(DiagnosticContext::Cleanup, format!("Track stopped: {}", self.name));
        }

        Ok(())
    }

    fn is_open(&self) -> bool {
        self.thread.is_some()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for MicrophoneDevice {
    fn drop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
    }
}

fn capture_thread(
    config: DeviceConfig,
    tx: mpsc::Sender<AudioChunk>,
    stop_rx: std_mpsc::Receiver<()>,
    ready_tx: std_mpsc::SyncSender<Result<String, String>>,
) {
    let (stream, chunker) = match build_stream(&config, tx) {
        Ok((stream, device_name, chunker)) => {
            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(format!("Failed to start input stream: {e}")));
                return;
            }
            let _ = ready_tx.send(Ok(device_name));
            (stream, chunker)
        }
        Err(e) => {
            let _ = ready_tx.send(Err(format!("{e:#}")));
            return;
        }
    };

    // Park until close() or the device handle is dropped
    let _ = stop_rx.recv();

    if let Err(e) = stream.pause() {
        debug!("Failed to pause input stream: {}", e);
    }
    drop(stream);

    // The callback is gone; hand over the partial chunk it left behind
    if let Ok(mut chunker) = chunker.lock() {
        chunker.flush();
    }
    info!("Microphone capture stopped");
}

type SharedChunker = Arc<Mutex<Chunker>>;

fn build_stream(
    config: &DeviceConfig,
    tx: mpsc::Sender<AudioChunk>,
) -> Result<(cpal::Stream, String, SharedChunker)> {
    let host = cpal::default_host();
    let device = match &config.device_name {
        Some(name) => {
            let mut devices = host.input_devices().context("No input devices available")?;
            devices
                .find(|d| d.name().map(|n| &n == name).unwrap_or(false))
                .ok_or_else(|| anyhow!("Input device '{name}' not found"))?
        }
        None => host
            .default_input_device()
            .context("No default input device available")?,
    };
    let device_name = device.name().unwrap_or_else(|_| "Unknown Device".to_string());

    let target_rate = SampleRate(config.format.sample_rate);
    let supported = device
        .supported_input_configs()
        .with_context(|| format!("Failed to query input configs for '{device_name}'"))?
        .filter(|range| range.min_sample_rate() <= target_rate && range.max_sample_rate() >= target_rate)
        // Prefer a native mono config so no downmix is needed
        .min_by_key(|range| range.channels())
        .ok_or_else(|| {
            anyhow!(
                "'{device_name}' cannot capture at {}Hz",
                config.format.sample_rate
            )
        })?
        .with_sample_rate(target_rate);

    let sample_format = supported.sample_format();
    let stream_config: StreamConfig = supported.config();
    let channels = usize::from(stream_config.channels.max(1));
    let samples_per_chunk = config
        .format
        .samples_for_duration(config.chunk_interval_ms)
        .max(1);

    debug!(
        "Microphone config: device={} format={:?} rate={}Hz channels={} (echo_cancellation={}, noise_suppression={}, auto_gain_control={} are left to the host)",
        device_name,
        sample_format,
        stream_config.sample_rate.0,
        channels,
        config.echo_cancellation,
        config.noise_suppression,
        config.auto_gain_control
    );

    let chunker = Arc::new(Mutex::new(Chunker::new(samples_per_chunk, tx)));
    let shared = chunker.clone();
    let err_fn = |err: cpal::StreamError| warn!("Input stream error: {}", err);

    let stream = match sample_format {
        SampleFormat::I16 => device.build_input_stream(
            &stream_config,
            move |data: &[i16], _| {
                if let Ok(mut chunker) = shared.lock() {
                    chunker.push(data, channels, |s| s);
                }
            },
            err_fn,
            None,
        )?,
        SampleFormat::F32 => device.build_input_stream(
            &stream_config,
            move |data: &[f32], _| {
                if let Ok(mut chunker) = shared.lock() {
                    chunker.push(data, channels, |s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16);
                }
            },
            err_fn,
            None,
        )?,
        SampleFormat::U16 => device.build_input_stream(
            &stream_config,
            move |data: &[u16], _| {
                if let Ok(mut chunker) = shared.lock() {
                    chunker.push(data, channels, |s| (s as i32 - 32_768) as i16);
                }
            },
            err_fn,
            None,
        )?,
        other => bail!("Unsupported sample format: {other:?}"),
    };

    Ok((stream, device_name, chunker))
}

/// Accumulates mono i16 samples and emits fixed-size chunks
struct Chunker {
    pending: Vec<i16>,
    samples_per_chunk: usize,
    sequence: u64,
    tx: mpsc::Sender<AudioChunk>,
}

impl Chunker {
    fn new(samples_per_chunk: usize, tx: mpsc::Sender<AudioChunk>) -> Self {
        Self {
            pending: Vec::with_capacity(samples_per_chunk),
            samples_per_chunk,
            sequence: 0,
            tx,
        }
    }

    fn push<T: Copy>(&mut self, data: &[T], channels: usize, convert: impl Fn(T) -> i16) {
        for frame in data.chunks(channels) {
            let sum: i32 = frame.iter().map(|&s| convert(s) as i32).sum();
            self.pending.push((sum / frame.len() as i32) as i16);

            if self.pending.len() >= self.samples_per_chunk {
                self.emit();
            }
        }
    }

    /// Send whatever is pending as a final, possibly short, chunk
    fn flush(&mut self) {
        if !self.pending.is_empty() {
            self.emit();
        }
    }

    fn emit(&mut self) {
        let chunk = AudioChunk::from_samples(&self.pending, self.sequence);
        self.pending.clear();
        self.sequence += 1;

        // Never block the audio callback; a full channel drops the chunk
        if self.tx.try_send(chunk).is_err() {
            warn!("Chunk channel full or closed, dropping chunk");
        }
    }
}
