use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::error::RecognitionError;

/// A track identified by the recognition service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecognizedTrack {
    pub title: String,
    pub artist: String,
    /// Service-side identifier of the track
    pub external_key: String,
}

impl fmt::Display for RecognizedTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.title, self.artist)
    }
}

/// Top-level response body from the recognition endpoint
#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    track: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

/// The `track` object; every field is required
#[derive(Debug, Deserialize)]
struct TrackPayload {
    title: String,
    subtitle: String, // artist
    key: String,
}

impl From<TrackPayload> for RecognizedTrack {
    fn from(track: TrackPayload) -> Self {
        Self {
            title: track.title,
            artist: track.subtitle,
            external_key: track.key,
        }
    }
}

/// Parse a successful (2xx) response body
///
/// A body without a `track` object is a miss; a `track` missing any of
/// `title`, `subtitle` or `key` is rejected as malformed.
pub fn parse_response(body: &[u8]) -> Result<RecognizedTrack, RecognitionError> {
    let response: RecognizeResponse = serde_json::from_slice(body)
        .map_err(|e| RecognitionError::MalformedResponse(e.to_string()))?;

    match response.track {
        Some(Value::Null) | None => Err(RecognitionError::NoMatch {
            message: response.message,
        }),
        Some(track) => serde_json::from_value::<TrackPayload>(track)
            .map(RecognizedTrack::from)
            .map_err(|e| RecognitionError::MalformedResponse(format!("track: {e}"))),
    }
}

/// The `message` field of an error body, if the service sent one
pub fn service_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<RecognizeResponse>(body)
        .ok()
        .and_then(|response| response.message)
        .filter(|message| !message.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_track() {
        let body = br#"{"track":{"title":"X","subtitle":"Y","key":"Z","images":{}},"tagid":"abc"}"#;
        let track = parse_response(body).unwrap();

        assert_eq!(track.title, "X");
        assert_eq!(track.artist, "Y");
        assert_eq!(track.external_key, "Z");
        assert_eq!(track.to_string(), "X - Y");
    }

    #[test]
    fn test_absent_track_carries_service_message() {
        let err = parse_response(br#"{"message":"No match found"}"#).unwrap_err();
        assert_eq!(
            err,
            RecognitionError::NoMatch {
                message: Some("No match found".to_string())
            }
        );
        assert_eq!(err.to_string(), "No match found");
    }

    #[test]
    fn test_track_missing_key_fails_closed() {
        let err = parse_response(br#"{"track":{"title":"X","subtitle":"Y"}}"#).unwrap_err();
        assert!(matches!(err, RecognitionError::MalformedResponse(_)));
    }

    #[test]
    fn test_non_json_body_is_malformed() {
        let err = parse_response(b"<html>502</html>").unwrap_err();
        assert!(matches!(err, RecognitionError::MalformedResponse(_)));
    }

    #[test]
    fn test_service_message_ignores_blank() {
        assert_eq!(service_message(br#"{"message":"   "}"#), None);
        assert_eq!(service_message(b"not json"), None);
        assert_eq!(
            service_message(br#"{"message":"Invalid API key"}"#),
            Some("Invalid API key".to_string())
        );
    }
}
