use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use super::error::RecognitionError;
use super::messages::{parse_response, service_message, RecognizedTrack};
use crate::audio::EncodedContainer;
use crate::config::RecognitionConfig;
use crate::diagnostics::{DiagnosticContext, Diagnostics};

/// Upstream ceiling on the uploaded sample size
pub const MAX_PAYLOAD_BYTES: usize = 500_000;

const API_KEY_HEADER: &str = "x-rapidapi-key";
const API_HOST_HEADER: &str = "x-rapidapi-host";

/// Something that can turn an encoded container into a track
#[async_trait::async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(&self, container: &EncodedContainer)
        -> Result<RecognizedTrack, RecognitionError>;
}

/// The bytes actually uploaded: the first `ceiling` bytes of the full container
pub fn upload_slice(bytes: &[u8], ceiling: usize) -> &[u8] {
    &bytes[..bytes.len().min(ceiling)]
}

/// HTTP client for the recognition endpoint
pub struct RecognitionClient {
    http: Client,
    config: RecognitionConfig,
    diagnostics: Diagnostics,
}

impl RecognitionClient {
    pub fn new(config: RecognitionConfig, diagnostics: Diagnostics) -> Result<Self, RecognitionError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            config,
            diagnostics,
        })
    }

    pub fn config(&self) -> &RecognitionConfig {
        &self.config
    }

    /// Upload `container` and interpret the answer
    pub async fn submit(
        &self,
        container: &EncodedContainer,
    ) -> Result<RecognizedTrack, RecognitionError> {
        let full = container.as_bytes();
        let payload = upload_slice(full, self.config.max_payload_bytes);

        if payload.len() < full.len() {
            self.diagnostics.log_with(
                DiagnosticContext::Recording,
                "Audio file too large, truncating",
                json!({ "total_size": full.len(), "sent_size": payload.len() }),
            );
        }

        self.diagnostics.log_with(
            DiagnosticContext::Api,
            "Sending request to recognition service",
            json!({
                "endpoint": self.config.endpoint,
                "bytes": payload.len(),
                "duration_ms": container.duration_ms(),
            }),
        );

        match self.send(payload.to_vec()).await {
            Ok(track) => {
                self.diagnostics.log_with(
                    DiagnosticContext::Api,
                    "Track recognized",
                    json!({ "title": track.title, "artist": track.artist, "key": track.external_key }),
                );
                Ok(track)
            }
            Err(e) => {
                self.diagnostics.log_with(
                    DiagnosticContext::Error,
                    "API request failed",
                    json!({ "error": e.to_string() }),
                );
                Err(e)
            }
        }
    }

    async fn send(&self, payload: Vec<u8>) -> Result<RecognizedTrack, RecognitionError> {
        let part = Part::bytes(payload)
            .file_name(self.config.file_name.clone())
            .mime_str(&self.config.content_type)?;
        let form = Form::new().part(self.config.field_name.clone(), part);

        let response = self
            .http
            .post(&self.config.endpoint)
            .header(API_KEY_HEADER, &self.config.api_key)
            .header(API_HOST_HEADER, &self.config.api_host)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        self.diagnostics.log_with(
            DiagnosticContext::Api,
            "Response received",
            json!({
                "status": status.as_u16(),
                "body": serde_json::from_slice::<serde_json::Value>(&body)
                    .unwrap_or_else(|_| json!(String::from_utf8_lossy(&body))),
            }),
        );

        if !status.is_success() {
            return Err(RecognitionError::Service {
                status: status.as_u16(),
                message: service_message(&body)
                    .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16())),
            });
        }

        parse_response(&body)
    }
}

#[async_trait::async_trait]
impl Recognizer for RecognitionClient {
    async fn recognize(
        &self,
        container: &EncodedContainer,
    ) -> Result<RecognizedTrack, RecognitionError> {
        self.submit(container).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_slice_under_ceiling_is_untouched() {
        let bytes = vec![7u8; 100_044];
        assert_eq!(upload_slice(&bytes, MAX_PAYLOAD_BYTES).len(), 100_044);
    }

    #[test]
    fn test_upload_slice_cuts_to_exact_ceiling() {
        let bytes: Vec<u8> = (0..600_044u32).map(|i| (i % 251) as u8).collect();
        let sent = upload_slice(&bytes, MAX_PAYLOAD_BYTES);

        assert_eq!(sent.len(), MAX_PAYLOAD_BYTES);
        assert_eq!(sent, &bytes[..MAX_PAYLOAD_BYTES]);
    }

    #[test]
    fn test_upload_slice_at_ceiling_boundary() {
        let bytes = vec![1u8; MAX_PAYLOAD_BYTES];
        assert_eq!(upload_slice(&bytes, MAX_PAYLOAD_BYTES).len(), MAX_PAYLOAD_BYTES);
    }
}
