//! RIFF/WAVE container encoding
//!
//! Produces a standard 44-byte PCM header followed by the raw chunk payload,
//! little-endian throughout:
//!
//! ```text
//! [0-3]    "RIFF"
//! [4-7]    total size - 8
//! [8-11]   "WAVE"
//! [12-15]  "fmt "
//! [16-19]  16 (fmt chunk size)
//! [20-21]  1 (linear PCM)
//! [22-23]  channels
//! [24-27]  sample_rate
//! [28-31]  byte_rate = sample_rate * block_align
//! [32-33]  block_align = channels * bits_per_sample / 8
//! [34-35]  bits_per_sample
//! [36-39]  "data"
//! [40-43]  total size - 44
//! [44-..]  payload
//! ```

use anyhow::{Context, Result};
use std::path::Path;
use thiserror::Error;

use super::device::{AudioChunk, AudioFormat};

/// Size of the RIFF/WAVE header in bytes
pub const WAV_HEADER_SIZE: usize = 44;

const PCM_FORMAT_CODE: u16 = 1;
const FMT_CHUNK_SIZE: u32 = 16;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WaveError {
    #[error("no audio chunks to encode")]
    EmptyPayload,

    #[error("payload of {0} bytes does not fit a WAV container")]
    TooLarge(usize),

    #[error("invalid WAV header: {0}")]
    InvalidHeader(String),
}

/// Serializes buffered chunks into a WAV container
#[derive(Debug, Clone, Copy, Default)]
pub struct WaveContainerEncoder {
    format: AudioFormat,
}

impl WaveContainerEncoder {
    pub fn new(format: AudioFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Concatenate `chunks` (in the given order) behind a header
    ///
    /// Chunk contents are copied untouched. An empty sequence is rejected.
    pub fn finalize(&self, chunks: &[AudioChunk]) -> Result<EncodedContainer, WaveError> {
        if chunks.is_empty() {
            return Err(WaveError::EmptyPayload);
        }

        let payload_size: usize = chunks.iter().map(AudioChunk::len).sum();
        let total_size = WAV_HEADER_SIZE + payload_size;
        let total_size_u32 =
            u32::try_from(total_size).map_err(|_| WaveError::TooLarge(payload_size))?;

        let mut bytes = Vec::with_capacity(total_size);
        bytes.extend_from_slice(&self.header(total_size_u32));
        for chunk in chunks {
            bytes.extend_from_slice(&chunk.bytes);
        }

        Ok(EncodedContainer {
            bytes,
            format: self.format,
        })
    }

    fn header(&self, total_size: u32) -> [u8; WAV_HEADER_SIZE] {
        let format = self.format;
        let mut header = [0u8; WAV_HEADER_SIZE];

        // RIFF chunk descriptor
        header[0..4].copy_from_slice(b"RIFF");
        header[4..8].copy_from_slice(&(total_size - 8).to_le_bytes());
        header[8..12].copy_from_slice(b"WAVE");

        // fmt sub-chunk
        header[12..16].copy_from_slice(b"fmt ");
        header[16..20].copy_from_slice(&FMT_CHUNK_SIZE.to_le_bytes());
        header[20..22].copy_from_slice(&PCM_FORMAT_CODE.to_le_bytes());
        header[22..24].copy_from_slice(&format.channels.to_le_bytes());
        header[24..28].copy_from_slice(&format.sample_rate.to_le_bytes());
        header[28..32].copy_from_slice(&format.byte_rate().to_le_bytes());
        header[32..34].copy_from_slice(&format.block_align().to_le_bytes());
        header[34..36].copy_from_slice(&format.bits_per_sample.to_le_bytes());

        // data sub-chunk
        header[36..40].copy_from_slice(b"data");
        header[40..44].copy_from_slice(&(total_size - WAV_HEADER_SIZE as u32).to_le_bytes());

        header
    }
}

/// A finished container: header and payload in one contiguous buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedContainer {
    bytes: Vec<u8>,
    format: AudioFormat,
}

impl EncodedContainer {
    pub fn header(&self) -> &[u8] {
        &self.bytes[..WAV_HEADER_SIZE]
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes[WAV_HEADER_SIZE..]
    }

    /// The full serialized container
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Header size plus payload size
    pub fn total_size(&self) -> usize {
        self.bytes.len()
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Playback duration of the payload
    pub fn duration_ms(&self) -> u64 {
        self.format.duration_ms(self.payload().len())
    }

    /// Write the container to disk as a .wav file
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, &self.bytes)
            .with_context(|| format!("Failed to write WAV file: {:?}", path))
    }
}

/// Decoded header fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveHeader {
    pub riff_size: u32,
    pub fmt_chunk_size: u32,
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_size: u32,
}

impl WaveHeader {
    /// Decode the first 44 bytes of a container, checking the magic tags
    pub fn parse(bytes: &[u8]) -> Result<Self, WaveError> {
        if bytes.len() < WAV_HEADER_SIZE {
            return Err(WaveError::InvalidHeader(format!(
                "expected {} bytes, got {}",
                WAV_HEADER_SIZE,
                bytes.len()
            )));
        }

        for (offset, tag) in [(0, b"RIFF"), (8, b"WAVE"), (12, b"fmt "), (36, b"data")] {
            if bytes[offset..offset + 4] != tag[..] {
                return Err(WaveError::InvalidHeader(format!(
                    "missing {:?} tag at offset {}",
                    String::from_utf8_lossy(tag),
                    offset
                )));
            }
        }

        let u16_at = |offset: usize| u16::from_le_bytes([bytes[offset], bytes[offset + 1]]);
        let u32_at = |offset: usize| {
            u32::from_le_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ])
        };

        Ok(Self {
            riff_size: u32_at(4),
            fmt_chunk_size: u32_at(16),
            audio_format: u16_at(20),
            channels: u16_at(22),
            sample_rate: u32_at(24),
            byte_rate: u32_at(28),
            block_align: u16_at(32),
            bits_per_sample: u16_at(34),
            data_size: u32_at(40),
        })
    }

    pub fn format(&self) -> AudioFormat {
        AudioFormat {
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits_per_sample,
            channels: self.channels,
        }
    }
}
