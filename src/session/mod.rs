//! Capture session management
//!
//! This module provides the `CaptureSession` state machine that drives:
//! - Device acquisition and release
//! - Chunk buffering and deadline tracking
//! - Container encoding and submission to the recognizer
//! - Handing recognized tracks to the mood store

mod config;
mod error;
mod session;
mod state;
mod ticker;

pub use config::SessionConfig;
pub use error::CaptureError;
pub use session::{CaptureSession, SessionEvent, StopHandle};
pub use state::SessionState;
pub use ticker::{progress_percent, Progress, ProgressTicker};
