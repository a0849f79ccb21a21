use serde::Serialize;
use std::fmt;

/// Capture session state machine.
///
/// State transitions:
/// ```text
/// idle → initializing → recording → stopping → submitting → idle
///             ↓                                    ↓
///           failed → idle  ←───────────────────  failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SessionState {
    Idle,
    Initializing,
    Recording,
    Stopping,
    Submitting,
    Failed,
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Initializing => "initializing",
            Self::Recording => "recording",
            Self::Stopping => "stopping",
            Self::Submitting => "submitting",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
