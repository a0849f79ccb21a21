use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use super::config::SessionConfig;
use super::error::CaptureError;
use super::state::SessionState;
use super::ticker::{Progress, ProgressTicker};
use crate::audio::{AudioChunk, AudioDevice, ChunkBuffer, EncodedContainer, WaveContainerEncoder};
use crate::diagnostics::{DiagnosticContext, Diagnostics};
use crate::mood::{Mood, MoodStore};
use crate::recognition::{RecognizedTrack, Recognizer};

/// Observable milestones of a capture session, for a presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StateChanged(SessionState),
    Progress(Progress),
    ChunkBuffered {
        sequence_index: u64,
        bytes: usize,
        total_bytes: usize,
    },
    Recognized(RecognizedTrack),
    Failed(CaptureError),
}

/// Requests a stop of the running recording from outside the session loop
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: mpsc::Sender<()>,
}

impl StopHandle {
    /// Ask the recording loop to stop. Extra requests while one is pending are dropped.
    pub fn request_stop(&self) {
        let _ = self.tx.try_send(());
    }
}

enum Step {
    StopRequested,
    Tick(Progress),
    Chunk(AudioChunk),
    StreamEnded,
}

/// One capture-and-recognize pipeline: device → buffer → container → recognizer
///
/// Only one attempt runs at a time. Every attempt ends back in `Idle`, either
/// with a recognized track or with the error that ended it.
pub struct CaptureSession {
    /// Session configuration
    config: SessionConfig,

    device: Box<dyn AudioDevice>,
    recognizer: Box<dyn Recognizer>,
    encoder: WaveContainerEncoder,
    diagnostics: Diagnostics,

    state: SessionState,

    /// Identifier of the current (or last) attempt
    session_id: Option<String>,

    /// When the current recording started
    started_at: Option<DateTime<Utc>>,

    elapsed_ms: u64,
    progress: f64,

    buffer: ChunkBuffer,
    chunk_rx: Option<mpsc::Receiver<AudioChunk>>,
    ticker: Option<ProgressTicker>,

    /// Container produced by the last attempt that reached encoding
    container: Option<EncodedContainer>,

    /// Track awaiting classification
    recognized: Option<RecognizedTrack>,

    last_error: Option<CaptureError>,

    stop_tx: mpsc::Sender<()>,
    stop_rx: mpsc::Receiver<()>,
    events: Option<mpsc::UnboundedSender<SessionEvent>>,
}

impl CaptureSession {
    pub fn new(
        config: SessionConfig,
        device: Box<dyn AudioDevice>,
        recognizer: Box<dyn Recognizer>,
        diagnostics: Diagnostics,
    ) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel(1);

        Self {
            encoder: WaveContainerEncoder::new(config.device.format),
            config,
            device,
            recognizer,
            diagnostics,
            state: SessionState::Idle,
            session_id: None,
            started_at: None,
            elapsed_ms: 0,
            progress: 0.0,
            buffer: ChunkBuffer::new(),
            chunk_rx: None,
            ticker: None,
            container: None,
            recognized: None,
            last_error: None,
            stop_tx,
            stop_rx,
            events: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn deadline_ms(&self) -> u64 {
        self.config.deadline_ms
    }

    /// Recording progress in percent (0-100)
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn buffered_bytes(&self) -> usize {
        self.buffer.total_bytes()
    }

    pub fn recognized_track(&self) -> Option<&RecognizedTrack> {
        self.recognized.as_ref()
    }

    pub fn container(&self) -> Option<&EncodedContainer> {
        self.container.as_ref()
    }

    pub fn last_error(&self) -> Option<&CaptureError> {
        self.last_error.as_ref()
    }

    pub fn device_name(&self) -> &str {
        self.device.name()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            tx: self.stop_tx.clone(),
        }
    }

    /// Receive session events from now on (replaces any earlier subscriber)
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    /// Open the device and begin recording
    ///
    /// Rejected without side effects unless the session is idle.
    pub async fn start(&mut self) -> Result<(), CaptureError> {
        if !self.state.is_idle() {
            return Err(self.reject(CaptureError::AlreadyInProgress(self.state)));
        }

        let session_id = format!("capture-{}", Uuid::new_v4());
        self.diagnostics.log_with(
            DiagnosticContext::Start,
            "Starting recording process",
            json!({ "session_id": session_id }),
        );

        self.reset();
        self.session_id = Some(session_id);
        self.transition(SessionState::Initializing);

        let format = self.config.device.format;
        self.diagnostics.log_with(
            DiagnosticContext::Init,
            "Starting audio initialization",
            json!({
                "device": self.device.name(),
                "sample_rate": format.sample_rate,
                "bits_per_sample": format.bits_per_sample,
                "channels": format.channels,
            }),
        );

        match self.device.open(&self.config.device).await {
            Ok(chunk_rx) => {
                self.chunk_rx = Some(chunk_rx);
                self.started_at = Some(Utc::now());
                self.ticker = Some(ProgressTicker::start(
                    self.config.tick_interval(),
                    self.config.deadline(),
                ));
                self.transition(SessionState::Recording);
                // Stops requested while the device was opening predate this recording
                self.discard_stop_requests();
                self.diagnostics
                    .log(DiagnosticContext::Recording, "Recording...");
                Ok(())
            }
            Err(e) => {
                let err = CaptureError::DeviceAccess(format!("{e:#}"));
                // A half-opened device may still hold the hardware
                self.release_device().await;
                Err(self.fail(err))
            }
        }
    }

    /// Start, record until the deadline (or a stop request), then recognize
    pub async fn capture(&mut self) -> Result<RecognizedTrack, CaptureError> {
        self.start().await?;
        self.run().await
    }

    /// Drive the recording loop until the deadline, a stop request, or the end
    /// of the device stream, then stop and submit
    pub async fn run(&mut self) -> Result<RecognizedTrack, CaptureError> {
        if !self.state.is_recording() {
            return Err(self.reject(CaptureError::NotRecording));
        }

        loop {
            let step = {
                let Self {
                    ticker,
                    chunk_rx,
                    stop_rx,
                    ..
                } = self;
                let (Some(ticker), Some(chunk_rx)) = (ticker.as_mut(), chunk_rx.as_mut()) else {
                    break;
                };

                tokio::select! {
                    biased;
                    Some(()) = stop_rx.recv() => Step::StopRequested,
                    progress = ticker.tick() => Step::Tick(progress),
                    chunk = chunk_rx.recv() => match chunk {
                        Some(chunk) => Step::Chunk(chunk),
                        None => Step::StreamEnded,
                    },
                }
            };

            match step {
                Step::StopRequested => {
                    self.diagnostics
                        .log(DiagnosticContext::Recording, "Stop requested");
                    break;
                }
                Step::Tick(progress) => {
                    if self.on_tick(progress) {
                        break;
                    }
                }
                Step::Chunk(chunk) => self.on_chunk(chunk),
                Step::StreamEnded => {
                    self.diagnostics
                        .log(DiagnosticContext::Recording, "Device stream ended");
                    break;
                }
            }
        }

        self.stop().await
    }

    /// Stop recording, release the device, then encode and submit
    ///
    /// Only valid while recording; otherwise returns `NotRecording` and does
    /// nothing. The device is released before anything else happens.
    pub async fn stop(&mut self) -> Result<RecognizedTrack, CaptureError> {
        if !self.state.is_recording() {
            return Err(self.reject(CaptureError::NotRecording));
        }

        self.diagnostics
            .log(DiagnosticContext::Cleanup, "Stopping recording");
        self.transition(SessionState::Stopping);

        if let Some(ticker) = self.ticker.take() {
            self.elapsed_ms = ticker.elapsed().as_millis() as u64;
        }

        self.release_device().await;

        // Keep whatever the device delivered before it went away
        if let Some(mut chunk_rx) = self.chunk_rx.take() {
            chunk_rx.close();
            while let Ok(chunk) = chunk_rx.try_recv() {
                self.on_chunk(chunk);
            }
        }

        self.diagnostics.log_with(
            DiagnosticContext::Recording,
            "MediaRecorder stopped",
            json!({
                "chunks": self.buffer.len(),
                "bytes": self.buffer.total_bytes(),
                "elapsed_ms": self.elapsed_ms,
            }),
        );

        self.transition(SessionState::Submitting);
        self.submit().await
    }

    /// File the pending recognized track under `mood`
    ///
    /// The track is handed over once; a second call fails until another
    /// capture recognizes something.
    pub fn classify(
        &mut self,
        mood: Mood,
        store: &mut MoodStore,
    ) -> Result<RecognizedTrack, CaptureError> {
        let track = self
            .recognized
            .take()
            .ok_or(CaptureError::NothingToClassify)?;

        debug!("Adding '{}' to {}", track, mood.display_name());
        store.add(mood, track.clone());

        Ok(track)
    }

    async fn submit(&mut self) -> Result<RecognizedTrack, CaptureError> {
        if self.buffer.is_empty() {
            return Err(self.fail(CaptureError::EmptyCapture));
        }

        let chunks = self.buffer.drain();
        let container = match self.encoder.finalize(&chunks) {
            Ok(container) => container,
            Err(e) => return Err(self.fail(e.into())),
        };

        self.diagnostics.log_with(
            DiagnosticContext::AudioData,
            format!("Size: {} bytes", container.total_size()),
            json!({
                "type": "audio/wav",
                "chunks": chunks.len(),
                "duration_ms": container.duration_ms(),
            }),
        );

        let result = self.recognizer.recognize(&container).await;
        self.container = Some(container);

        match result {
            Ok(track) => {
                self.recognized = Some(track.clone());
                self.emit(SessionEvent::Recognized(track.clone()));
                self.transition(SessionState::Idle);
                Ok(track)
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    fn on_tick(&mut self, progress: Progress) -> bool {
        self.elapsed_ms = progress.elapsed_ms;
        self.progress = self.progress.max(progress.percent);
        self.emit(SessionEvent::Progress(progress));

        if progress.deadline_reached() {
            self.diagnostics
                .log(DiagnosticContext::Recording, "Maximum time reached, stopping");
            return true;
        }

        false
    }

    fn on_chunk(&mut self, chunk: AudioChunk) {
        let sequence_index = chunk.sequence_index;
        let bytes = chunk.len();

        self.diagnostics.log_with(
            DiagnosticContext::Recording,
            format!("Chunk received: {} bytes", bytes),
            json!({ "sequence": sequence_index, "peak_level": chunk.peak_level() }),
        );

        if self.buffer.append(chunk) {
            self.emit(SessionEvent::ChunkBuffered {
                sequence_index,
                bytes,
                total_bytes: self.buffer.total_bytes(),
            });
        }
    }

    async fn release_device(&mut self) {
        match self.device.close().await {
            Ok(()) => self.diagnostics.log(DiagnosticContext::Cleanup, "Complete"),
            Err(e) => self.diagnostics.log_with(
                DiagnosticContext::Error,
                "Failed to release audio device",
                json!({ "device": self.device.name(), "error": format!("{e:#}") }),
            ),
        }
    }

    /// Record `err`, pass through Failed and settle back in Idle
    fn fail(&mut self, err: CaptureError) -> CaptureError {
        self.transition(SessionState::Failed);
        self.diagnostics.log_with(
            DiagnosticContext::Error,
            err.to_string(),
            json!({ "session_id": self.session_id }),
        );

        self.ticker = None;
        self.chunk_rx = None;
        self.buffer.drain();
        self.last_error = Some(err.clone());
        self.emit(SessionEvent::Failed(err.clone()));

        self.transition(SessionState::Idle);
        err
    }

    /// Report a refused call; the session itself is left untouched
    fn reject(&self, err: CaptureError) -> CaptureError {
        self.diagnostics.log_with(
            DiagnosticContext::Error,
            err.to_string(),
            json!({ "state": self.state.label(), "session_id": self.session_id }),
        );
        err
    }

    fn reset(&mut self) {
        self.started_at = None;
        self.elapsed_ms = 0;
        self.progress = 0.0;
        self.buffer = ChunkBuffer::new();
        self.container = None;
        self.recognized = None;
        self.last_error = None;

        // A stop requested between attempts must not end the next one
        self.discard_stop_requests();
    }

    fn discard_stop_requests(&mut self) {
        while self.stop_rx.try_recv().is_ok() {}
    }

    fn transition(&mut self, next: SessionState) {
        debug!("Session state: {} -> {}", self.state, next);
        self.state = next;
        self.emit(SessionEvent::StateChanged(next));
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}
