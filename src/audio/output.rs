// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Audio output via cpal.
//!
//! Opens an f32 output stream that pulls interleaved frames from a
//! callback. Multichannel streams that the device refuses are retried
//! once in stereo.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use tracing::{debug, error, warn};

use super::AudioError;

/// Audio output configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Buffer size in frames
    pub buffer_size: u32,
    /// Number of output channels
    pub channels: u16,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            buffer_size: 1024,
            channels: 8,
        }
    }
}

impl AudioConfig {
    /// Same settings in stereo
    pub fn stereo(&self) -> Self {
        Self {
            channels: 2,
            ..self.clone()
        }
    }

    /// Latency of one buffer in milliseconds
    pub fn latency_ms(&self) -> f64 {
        (self.buffer_size as f64 / self.sample_rate as f64) * 1000.0
    }
}

/// Audio output stream
pub struct AudioOutput {
    /// cpal stream
    _stream: Stream,
    /// Output device
    _device: Device,
    /// Current configuration
    config: AudioConfig,
}

impl AudioOutput {
    /// Create a new audio output with callback
    pub fn new<F>(config: AudioConfig, mut callback: F) -> Result<Self, AudioError>
    where
        F: FnMut(&mut [f32], usize) + Send + 'static,
    {
        let host = cpal::default_host();

        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;

        let stream_config = StreamConfig {
            channels: config.channels,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(config.buffer_size),
        };

        let channels = config.channels as usize;

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    callback(data, channels);
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| AudioError::StreamFailed(format!("Failed to build stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| AudioError::StreamFailed(format!("Failed to start stream: {}", e)))?;

        debug!(
            "Audio stream started: {} Hz, {} channels, {} frames",
            config.sample_rate, config.channels, config.buffer_size
        );

        Ok(Self {
            _stream: stream,
            _device: device,
            config,
        })
    }

    /// Open an output, retrying once in stereo if a wider layout fails.
    ///
    /// `make_callback` is called once per attempt.
    pub fn open<M, F>(config: AudioConfig, mut make_callback: M) -> Result<Self, AudioError>
    where
        M: FnMut() -> Result<F, AudioError>,
        F: FnMut(&mut [f32], usize) + Send + 'static,
    {
        match Self::new(config.clone(), make_callback()?) {
            Ok(output) => Ok(output),
            Err(AudioError::NoDevice) => Err(AudioError::NoDevice),
            Err(err) if config.channels > 2 => {
                warn!("{}-channel output failed ({}), retrying in stereo", config.channels, err);
                Self::new(config.stereo(), make_callback()?)
            }
            Err(err) => Err(err),
        }
    }

    /// Get current configuration
    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    /// Get sample rate
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Get number of channels
    pub fn channels(&self) -> u16 {
        self.config.channels
    }

    /// Calculate latency in milliseconds
    pub fn latency_ms(&self) -> f64 {
        self.config.latency_ms()
    }
}

/// Get default device name
pub fn default_device_name() -> Option<String> {
    let host = cpal::default_host();
    host.default_output_device().and_then(|d| d.name().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_config_default() {
        let config = AudioConfig::default();
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.buffer_size, 1024);
        assert_eq!(config.channels, 8);
    }

    #[test]
    fn test_stereo_keeps_timing() {
        let config = AudioConfig::default().stereo();
        assert_eq!(config.channels, 2);
        assert_eq!(config.buffer_size, 1024);
    }

    #[test]
    fn test_latency_calculation() {
        let config = AudioConfig {
            sample_rate: 44100,
            buffer_size: 1024,
            channels: 2,
        };
        assert!((config.latency_ms() - 23.2).abs() < 0.1);
    }

    #[test]
    fn test_default_device_name() {
        // Should not panic without a device
        let _ = default_device_name();
    }
}
