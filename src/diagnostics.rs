//! Diagnostic event sink
//!
//! Components report lifecycle milestones (device init, chunk arrival, stop,
//! API request/response, errors) to an injected sink. The sink is purely
//! observational: nothing it does feeds back into the capture pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

/// Where in the pipeline an event originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticContext {
    Start,
    Init,
    Recording,
    AudioData,
    Cleanup,
    Api,
    Error,
}

impl DiagnosticContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Init => "Init",
            Self::Recording => "Recording",
            Self::AudioData => "AudioData",
            Self::Cleanup => "Cleanup",
            Self::Api => "API",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for DiagnosticContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single structured diagnostic event
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticEvent {
    pub context: DiagnosticContext,
    pub message: String,
    pub data: Option<Value>,
    pub at: DateTime<Utc>,
}

/// Receiver of diagnostic events
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, event: DiagnosticEvent);
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, event: DiagnosticEvent) {
        let data = event.data.map(|d| d.to_string()).unwrap_or_default();

        match event.context {
            DiagnosticContext::Error => {
                error!(context = %event.context, data = %data, "{}", event.message)
            }
            DiagnosticContext::AudioData => {
                debug!(context = %event.context, data = %data, "{}", event.message)
            }
            _ => info!(context = %event.context, data = %data, "{}", event.message),
        }
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn record(&self, _event: DiagnosticEvent) {}
}

/// Keeps every event in memory, in arrival order
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Messages recorded under `context`
    pub fn messages(&self, context: DiagnosticContext) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.context == context)
            .map(|e| e.message)
            .collect()
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, event: DiagnosticEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Cloneable handle to a shared sink, passed into each component
#[derive(Clone)]
pub struct Diagnostics {
    sink: Arc<dyn DiagnosticSink>,
}

impl Diagnostics {
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { sink }
    }

    pub fn tracing() -> Self {
        Self::new(Arc::new(TracingSink))
    }

    pub fn noop() -> Self {
        Self::new(Arc::new(NoopSink))
    }

    pub fn log(&self, context: DiagnosticContext, message: impl Into<String>) {
        self.emit(context, message.into(), None);
    }

    pub fn log_with(&self, context: DiagnosticContext, message: impl Into<String>, data: Value) {
        self.emit(context, message.into(), Some(data));
    }

    fn emit(&self, context: DiagnosticContext, message: String, data: Option<Value>) {
        self.sink.record(DiagnosticEvent {
            context,
            message,
            data,
            at: Utc::now(),
        });
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::noop()
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics").finish_non_exhaustive()
    }
}
