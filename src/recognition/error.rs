use thiserror::Error;

const NO_MATCH_MESSAGE: &str = "Could not identify the song. Please try again.";

/// Why a submission did not produce a track
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecognitionError {
    /// The service answered but matched nothing
    #[error("{}", .message.as_deref().unwrap_or(NO_MATCH_MESSAGE))]
    NoMatch { message: Option<String> },

    /// The service answered with a non-success status
    #[error("Recognition failed: {message}")]
    Service { status: u16, message: String },

    /// The request never completed (connect, timeout, body read)
    #[error("Recognition failed: {0}")]
    Network(String),

    #[error("Recognition failed: malformed response: {0}")]
    MalformedResponse(String),

    #[error("Recognition failed: invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for RecognitionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::InvalidRequest(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}
