// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Audio engine for tunesmith.
//!
//! This module provides:
//! - Audio output via cpal, eight channels with a stereo fallback
//! - Song playback through the block scheduler
//! - Auditions of pre-rendered buffers

pub mod output;
pub mod preview;

pub use output::{default_device_name, AudioConfig, AudioOutput};
pub use preview::{scale_preview, PreviewPlayer};

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::arrangement::Song;
use crate::playback::{PlaybackStats, Scheduler, StopHandle, DEFAULT_CAPACITY};

/// Smallest buffer size accepted (frames)
pub const MIN_BUFFER_SIZE: u32 = 64;
/// Largest buffer size accepted (frames)
pub const MAX_BUFFER_SIZE: u32 = DEFAULT_CAPACITY as u32;

/// Audio engine: opens outputs for songs and auditions
pub struct AudioEngine {
    /// Requested output configuration
    config: AudioConfig,
    /// Mixing worker threads (0 = hardware threads)
    workers: usize,
}

impl AudioEngine {
    /// Create a new audio engine
    pub fn new() -> Self {
        Self {
            config: AudioConfig::default(),
            workers: 0,
        }
    }

    /// Create with an output configuration
    pub fn with_config(config: AudioConfig) -> Self {
        let mut engine = Self::new();
        engine.set_buffer_size(config.buffer_size);
        engine.config.sample_rate = config.sample_rate;
        engine.config.channels = config.channels;
        engine
    }

    /// Set the mixing worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Requested configuration
    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    /// Get sample rate
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Set buffer size (applies to the next output)
    pub fn set_buffer_size(&mut self, size: u32) {
        self.config.buffer_size = size.clamp(MIN_BUFFER_SIZE, MAX_BUFFER_SIZE);
    }

    /// Check the configuration before touching a device
    pub fn validate(&self) -> Result<(), AudioError> {
        if !(8000..=192_000).contains(&self.config.sample_rate) {
            return Err(AudioError::InvalidConfig(format!(
                "sample rate {} outside 8000..=192000",
                self.config.sample_rate
            )));
        }
        if !matches!(self.config.channels, 1 | 2 | 8) {
            return Err(AudioError::InvalidConfig(format!(
                "{} channels; expected 1, 2 or 8",
                self.config.channels
            )));
        }
        Ok(())
    }

    /// Start playing a song; returns once the stream is running
    pub fn play(&self, song: Arc<Song>) -> Result<PlaybackHandle, AudioError> {
        self.validate()?;
        let stop = StopHandle::new();
        let stats = Arc::new(PlaybackStats::default());
        let sample_rate = self.config.sample_rate as f64;
        let workers = self.workers;

        let output = AudioOutput::open(self.config.clone(), || {
            let mut scheduler = Scheduler::new(Arc::clone(&song), sample_rate, DEFAULT_CAPACITY, workers)
                .map_err(|e| AudioError::InitFailed(e.to_string()))?
                .with_stop_handle(stop.clone())
                .with_stats(Arc::clone(&stats));
            Ok(move |data: &mut [f32], channels: usize| {
                // Errors leave silence and the fatal flag for the control loop
                let _ = scheduler.render(data, channels);
            })
        })?;

        info!(
            "Playing '{}' on {} ({} channels, {:.1} ms buffers)",
            song.title(),
            default_device_name().unwrap_or_else(|| "default device".into()),
            output.channels(),
            output.latency_ms()
        );
        Ok(PlaybackHandle { output, stop, stats })
    }

    /// Start playing a mono buffer
    pub fn preview(&self, samples: Vec<f32>) -> Result<PlaybackHandle, AudioError> {
        self.validate()?;
        let stop = StopHandle::new();
        let stats = Arc::new(PlaybackStats::default());
        let samples: Arc<[f32]> = samples.into();

        let output = AudioOutput::open(self.config.clone(), || {
            let mut player = PreviewPlayer::new(Arc::clone(&samples), stop.clone(), Arc::clone(&stats));
            Ok(move |data: &mut [f32], channels: usize| player.fill(data, channels))
        })?;
        Ok(PlaybackHandle { output, stop, stats })
    }
}

impl Default for AudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// A running output; dropping it closes the stream
pub struct PlaybackHandle {
    output: AudioOutput,
    stop: StopHandle,
    stats: Arc<PlaybackStats>,
}

impl PlaybackHandle {
    /// Silence the output from the next callback on
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Everything has played
    pub fn is_finished(&self) -> bool {
        self.stats.is_finished()
    }

    /// A callback hit a fatal error
    pub fn is_fatal(&self) -> bool {
        self.stats.is_fatal()
    }

    /// Playback counters
    pub fn stats(&self) -> &PlaybackStats {
        &self.stats
    }

    /// Seconds played
    pub fn position(&self) -> f64 {
        self.stats.frames() as f64 / self.output.sample_rate() as f64
    }

    /// Open stream settings
    pub fn config(&self) -> &AudioConfig {
        self.output.config()
    }
}

/// Audio error types
#[derive(Debug, Error)]
pub enum AudioError {
    /// Failed to initialize audio
    #[error("Audio initialization failed: {0}")]
    InitFailed(String),
    /// Failed to start audio stream
    #[error("Audio stream failed: {0}")]
    StreamFailed(String),
    /// No audio device available
    #[error("No audio device available")]
    NoDevice,
    /// Invalid configuration
    #[error("Invalid audio configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_engine_creation() {
        let engine = AudioEngine::new();
        assert_eq!(engine.sample_rate(), 44100);
        assert_eq!(engine.config().channels, 8);
        assert!(engine.validate().is_ok());
    }

    #[test]
    fn test_buffer_size_clamping() {
        let mut engine = AudioEngine::new();

        engine.set_buffer_size(32);
        assert_eq!(engine.config().buffer_size, 64);

        engine.set_buffer_size(100_000);
        assert_eq!(engine.config().buffer_size, 8192);

        let engine = AudioEngine::with_config(AudioConfig {
            sample_rate: 48000,
            buffer_size: 1,
            channels: 2,
        });
        assert_eq!(engine.config().buffer_size, 64);
        assert_eq!(engine.sample_rate(), 48000);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let engine = AudioEngine::with_config(AudioConfig {
            channels: 6,
            ..AudioConfig::default()
        });
        assert!(matches!(engine.validate(), Err(AudioError::InvalidConfig(_))));

        let engine = AudioEngine::with_config(AudioConfig {
            sample_rate: 0,
            ..AudioConfig::default()
        });
        assert!(matches!(engine.validate(), Err(AudioError::InvalidConfig(_))));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(AudioError::NoDevice.to_string(), "No audio device available");
        assert!(AudioError::StreamFailed("x".into()).to_string().contains("x"));
    }
}
