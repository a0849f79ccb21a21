use thiserror::Error;

use super::state::SessionState;
use crate::audio::WaveError;
use crate::recognition::RecognitionError;

/// Everything that can end a capture attempt early
///
/// All variants are local to one attempt; the session is back in `Idle`
/// whenever one of these is returned from `stop()` or `start()`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Microphone access error: {0}")]
    DeviceAccess(String),

    #[error("No audio data recorded. Please try again.")]
    EmptyCapture,

    #[error(transparent)]
    Recognition(#[from] RecognitionError),

    #[error("Failed to encode recording: {0}")]
    Encoding(#[from] WaveError),

    #[error("A capture session is already in progress ({0})")]
    AlreadyInProgress(SessionState),

    #[error("No recording in progress")]
    NotRecording,

    #[error("No recognized track to classify")]
    NothingToClassify,
}
