// Integration tests for WAV container encoding
//
// These tests verify the header layout, size accounting and that the produced
// container is a playable WAV file.

use anyhow::Result;
use tempfile::TempDir;
use vibecatch::audio::{
    AudioChunk, AudioFormat, WaveContainerEncoder, WaveError, WaveHeader, WAV_HEADER_SIZE,
};

fn chunk(len: usize, fill: u8, sequence_index: u64) -> AudioChunk {
    AudioChunk::new(vec![fill; len], sequence_index)
}

#[test]
fn test_five_chunks_of_20000_bytes() -> Result<()> {
    let chunks: Vec<AudioChunk> = (0..5).map(|i| chunk(20_000, i as u8, i)).collect();
    let container = WaveContainerEncoder::new(AudioFormat::CAPTURE).finalize(&chunks)?;

    assert_eq!(container.total_size(), 100_044);
    assert_eq!(container.payload().len(), 100_000);

    let header = WaveHeader::parse(container.as_bytes())?;
    assert_eq!(header.riff_size, 100_036);
    assert_eq!(header.data_size, 100_000);
    assert_eq!(header.fmt_chunk_size, 16);
    assert_eq!(header.audio_format, 1);
    assert_eq!(header.channels, 1);
    assert_eq!(header.sample_rate, 44_100);
    assert_eq!(header.byte_rate, 88_200);
    assert_eq!(header.block_align, 2);
    assert_eq!(header.bits_per_sample, 16);
    assert_eq!(header.format(), AudioFormat::CAPTURE);

    Ok(())
}

#[test]
fn test_header_byte_layout() -> Result<()> {
    let container = WaveContainerEncoder::new(AudioFormat::CAPTURE).finalize(&[chunk(100, 0, 0)])?;
    let header = container.header();

    assert_eq!(header.len(), WAV_HEADER_SIZE);
    assert_eq!(&header[0..4], b"RIFF");
    assert_eq!(&header[4..8], &136u32.to_le_bytes());
    assert_eq!(&header[8..12], b"WAVE");
    assert_eq!(&header[12..16], b"fmt ");
    assert_eq!(&header[24..28], &44_100u32.to_le_bytes());
    assert_eq!(&header[36..40], b"data");
    assert_eq!(&header[40..44], &100u32.to_le_bytes());

    Ok(())
}

#[test]
fn test_payload_keeps_chunk_order_and_odd_sizes() -> Result<()> {
    let chunks = vec![chunk(3, 0xAA, 0), chunk(1, 0xBB, 1), chunk(5, 0xCC, 2)];
    let container = WaveContainerEncoder::new(AudioFormat::CAPTURE).finalize(&chunks)?;

    assert_eq!(container.total_size(), WAV_HEADER_SIZE + 9);
    assert_eq!(
        container.payload(),
        &[0xAA, 0xAA, 0xAA, 0xBB, 0xCC, 0xCC, 0xCC, 0xCC, 0xCC]
    );

    Ok(())
}

#[test]
fn test_empty_chunk_sequence_is_rejected() {
    let result = WaveContainerEncoder::new(AudioFormat::CAPTURE).finalize(&[]);
    assert_eq!(result, Err(WaveError::EmptyPayload));
}

#[test]
fn test_parse_rejects_short_or_foreign_headers() {
    assert!(matches!(
        WaveHeader::parse(&[0u8; 20]),
        Err(WaveError::InvalidHeader(_))
    ));

    let mut bytes = vec![0u8; WAV_HEADER_SIZE];
    bytes[0..4].copy_from_slice(b"OggS");
    assert!(matches!(
        WaveHeader::parse(&bytes),
        Err(WaveError::InvalidHeader(_))
    ));
}

#[test]
fn test_saved_container_plays_back_with_hound() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("recording.wav");

    let samples: Vec<i16> = (0..4410).map(|i| ((i % 100) * 300 - 15_000) as i16).collect();
    let chunks = vec![
        AudioChunk::from_samples(&samples[..2205], 0),
        AudioChunk::from_samples(&samples[2205..], 1),
    ];
    let container = WaveContainerEncoder::new(AudioFormat::CAPTURE).finalize(&chunks)?;
    assert_eq!(container.duration_ms(), 100);

    container.write_to(&path)?;

    let reader = hound::WavReader::open(&path)?;
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, 44_100);
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 16);

    let decoded: Vec<i16> = reader.into_samples::<i16>().collect::<Result<_, _>>()?;
    assert_eq!(decoded, samples);

    Ok(())
}
