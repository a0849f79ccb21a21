// Integration tests for the file-backed audio device
//
// These tests verify that a WAV file is replayed as sequence-numbered chunks
// at the capture format and that the device can be released safely.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vibecatch::audio::{AudioDevice, AudioFile, DeviceConfig, FileDevice};
use vibecatch::Diagnostics;

fn write_wav(path: &Path, sample_rate: u32, channels: u16, frames: usize) -> Result<()> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for i in 0..frames * channels as usize {
        writer.write_sample((i % 1000) as i16)?;
    }
    writer.finalize()?;

    Ok(())
}

fn one_second_fixture(dir: &TempDir) -> Result<PathBuf> {
    let path = dir.path().join("one-second.wav");
    write_wav(&path, 44_100, 1, 44_100)?;
    Ok(path)
}

#[tokio::test]
async fn test_replays_file_as_100ms_chunks() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = one_second_fixture(&temp_dir)?;

    let mut device = FileDevice::new(&path, false, Diagnostics::noop());
    let mut rx = device.open(&DeviceConfig::default()).await?;
    assert!(device.is_open());

    let mut chunks = Vec::new();
    while let Some(chunk) = rx.recv().await {
        chunks.push(chunk);
    }

    assert_eq!(chunks.len(), 10);
    assert!(chunks.iter().all(|c| c.len() == 8820));
    let sequence: Vec<u64> = chunks.iter().map(|c| c.sequence_index).collect();
    assert_eq!(sequence, (0..10).collect::<Vec<_>>());

    device.close().await?;
    assert!(!device.is_open());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_realtime_replay_follows_chunk_cadence() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = one_second_fixture(&temp_dir)?;

    let mut device = FileDevice::new(&path, true, Diagnostics::noop());
    let started = tokio::time::Instant::now();
    let mut rx = device.open(&DeviceConfig::default()).await?;

    let mut count = 0;
    while rx.recv().await.is_some() {
        count += 1;
    }

    assert_eq!(count, 10);
    // First chunk is immediate, the remaining nine follow at 100ms
    assert!(started.elapsed() >= std::time::Duration::from_millis(900));

    device.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_rejects_file_in_other_format() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("stereo-48k.wav");
    write_wav(&path, 48_000, 2, 4_800)?;

    let mut device = FileDevice::new(&path, false, Diagnostics::noop());
    let result = device.open(&DeviceConfig::default()).await;

    assert!(result.is_err(), "A 48kHz stereo file must not be accepted");
    assert!(!device.is_open());

    Ok(())
}

#[tokio::test]
async fn test_missing_file_fails_to_open() {
    let mut device = FileDevice::new("/nonexistent/path/to/audio.wav", false, Diagnostics::noop());
    assert!(device.open(&DeviceConfig::default()).await.is_err());
}

#[tokio::test]
async fn test_close_is_idempotent() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = one_second_fixture(&temp_dir)?;

    let mut device = FileDevice::new(&path, true, Diagnostics::noop());
    device.close().await?;

    let _rx = device.open(&DeviceConfig::default()).await?;
    device.close().await?;
    device.close().await?;
    assert!(!device.is_open());

    // Released devices can be opened again
    let mut rx = device.open(&DeviceConfig::default()).await?;
    assert!(rx.recv().await.is_some());
    device.close().await?;

    Ok(())
}

#[test]
fn test_audio_file_metadata() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = one_second_fixture(&temp_dir)?;

    let audio = AudioFile::open(&path)?;
    assert_eq!(audio.sample_rate, 44_100);
    assert_eq!(audio.channels, 1);
    assert_eq!(audio.bits_per_sample, 16);
    assert_eq!(audio.samples.len(), 44_100);
    assert!((audio.duration_seconds - 1.0).abs() < 1e-9);
    assert!(audio.path.contains("one-second.wav"));

    Ok(())
}
