pub mod audio;
pub mod config;
pub mod diagnostics;
pub mod mood;
pub mod recognition;
pub mod session;

pub use audio::{
    AudioChunk, AudioDevice, AudioDeviceFactory, AudioFile, AudioFormat, ChunkBuffer,
    DeviceConfig, DeviceSource, EncodedContainer, FileDevice, WaveContainerEncoder, WaveError,
    WaveHeader,
};
pub use config::Config;
pub use diagnostics::{DiagnosticContext, DiagnosticEvent, DiagnosticSink, Diagnostics};
pub use mood::{Mood, MoodStore, UnknownMood};
pub use recognition::{RecognitionClient, RecognitionError, RecognizedTrack, Recognizer};
pub use session::{
    CaptureError, CaptureSession, Progress, SessionConfig, SessionEvent, SessionState, StopHandle,
};
