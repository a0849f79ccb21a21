//! Recognition service client
//!
//! Uploads an encoded container to the remote fingerprinting endpoint and maps
//! the JSON answer to a `RecognizedTrack`:
//! - Payloads over the size ceiling are cut to the first N bytes of the container
//! - No retries; a failed submission surfaces immediately

mod client;
mod error;
mod messages;

pub use client::{upload_slice, RecognitionClient, Recognizer, MAX_PAYLOAD_BYTES};
pub use error::RecognitionError;
pub use messages::{parse_response, service_message, RecognizedTrack};
