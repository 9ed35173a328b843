// Integration tests for WAV capture
//
// These tests run the real capture device: frames from a backend are
// written to disk with hound and finalized through the session.

mod common;

use anyhow::Result;
use common::write_wav;
use pitch_perfect::audio::{AudioBackendConfig, AudioSource, WavCaptureDevice, METER_FLOOR_DB};
use pitch_perfect::session::{
    CaptureDevice, RecorderOptions, RecordingSession, SessionCategory, SessionConfig, SessionState,
};
use pitch_perfect::Error;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn replay_config() -> AudioBackendConfig {
    AudioBackendConfig {
        realtime: false,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_session_records_replayed_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = temp_dir.path().join("input.wav");
    write_wav(&input, 1.0, 8000)?;

    let device = WavCaptureDevice::new(AudioSource::File(input), replay_config());
    let recordings = temp_dir.path().join("recordings");
    let session = RecordingSession::new(SessionConfig::new(&recordings), Arc::new(device));

    let path = session.start().await?;
    // Unpaced replay finishes well within this
    tokio::time::sleep(Duration::from_millis(200)).await;
    session.stop().await?;

    let state = session.wait_for_completion().await;
    let asset = state.asset().cloned().expect("recording should finish");
    assert_eq!(asset.location(), path);
    assert!(path.starts_with(&recordings), "Recordings dir should be created");

    let reader = hound::WavReader::open(asset.location())?;
    assert_eq!(reader.spec().sample_rate, 8000, "Format follows the input");
    assert_eq!(reader.spec().bits_per_sample, 16);
    assert_eq!(reader.len(), 8000);

    Ok(())
}

#[tokio::test]
async fn test_session_records_tone_with_metering() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = AudioBackendConfig {
        buffer_duration_ms: 20,
        ..Default::default()
    };
    let device = WavCaptureDevice::new(AudioSource::Tone { frequency_hz: 440.0 }, config);
    let session = RecordingSession::new(SessionConfig::new(temp_dir.path()), Arc::new(device));

    session.start().await?;
    tokio::time::sleep(Duration::from_millis(150)).await;

    let level = session.input_level_db().await.expect("metering is enabled");
    assert!(level > METER_FLOOR_DB, "Tone should register on the meter");

    session.stop().await?;
    let state = session.wait_for_completion().await;
    let asset = state.asset().cloned().expect("recording should finish");

    let reader = hound::WavReader::open(asset.location())?;
    assert_eq!(reader.spec().sample_rate, 44100);
    assert!(reader.len() > 0, "Some audio should have been captured");

    Ok(())
}

#[tokio::test]
async fn test_missing_input_is_device_unavailable() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let device = WavCaptureDevice::new(
        AudioSource::File(temp_dir.path().join("missing.wav")),
        replay_config(),
    );
    let session = RecordingSession::new(SessionConfig::new(temp_dir.path()), Arc::new(device));

    let result = session.start().await;

    assert!(matches!(result, Err(Error::DeviceUnavailable(_))));
    assert!(matches!(session.state().await, SessionState::Failed { .. }));

    Ok(())
}

#[tokio::test]
async fn test_failed_capture_start_leaves_no_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = temp_dir.path().join("input.wav");
    std::fs::write(&input, b"not a wav")?;

    let device = WavCaptureDevice::new(AudioSource::File(input), replay_config());
    let recordings = temp_dir.path().join("recordings");
    let session = RecordingSession::new(SessionConfig::new(&recordings), Arc::new(device));

    let result = session.start().await;

    assert!(matches!(result, Err(Error::DeviceUnavailable(_))));
    assert!(matches!(session.state().await, SessionState::Failed { .. }));

    let leftovers: Vec<_> = std::fs::read_dir(&recordings)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    assert!(leftovers.is_empty(), "Unexpected files: {:?}", leftovers);

    Ok(())
}

#[tokio::test]
async fn test_recorder_requires_recording_category() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let device = WavCaptureDevice::new(AudioSource::Tone { frequency_hz: 440.0 }, replay_config());
    let path = temp_dir.path().join("take.wav");
    let options = RecorderOptions::default();

    assert!(device.open_recorder(&path, &options).await.is_err());

    device.configure(SessionCategory::Playback).await?;
    assert!(device.open_recorder(&path, &options).await.is_err());

    device.configure(SessionCategory::PlayAndRecord).await?;
    assert!(device.open_recorder(&path, &options).await.is_ok());
    assert!(device.is_active());

    Ok(())
}

#[tokio::test]
async fn test_paused_recorder_drops_frames() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = temp_dir.path().join("input.wav");
    write_wav(&input, 0.5, 8000)?;

    let device = WavCaptureDevice::new(AudioSource::File(input), replay_config());
    device.configure(SessionCategory::Record).await?;

    let path = temp_dir.path().join("take.wav");
    let options = RecorderOptions {
        sample_rate: 22050,
        ..Default::default()
    };
    let mut recorder = device.open_recorder(&path, &options).await?;

    // Pause before the writer task gets to run
    recorder.record().await?;
    recorder.pause().await?;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let signal = recorder.finalize().await?;
    assert!(signal.await?, "Finalize should succeed");
    assert!(recorder.finalize().await.is_err(), "Finalize is one-shot");

    // Nothing was written, so the file takes the option format
    let reader = hound::WavReader::open(&path)?;
    assert_eq!(reader.len(), 0);
    assert_eq!(reader.spec().sample_rate, 22050);

    Ok(())
}
