// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Playback of a pre-rendered mono buffer, used for auditions.

use std::sync::Arc;

use crate::music::semitone_ratio;
use crate::playback::{PlaybackStats, StopHandle};
use crate::synth::{Instrument, Role, SampleCache};

/// Semitones of the major scale, root to octave
const AUDITION_STEPS: [f64; 8] = [0.0, 2.0, 4.0, 5.0, 7.0, 9.0, 11.0, 12.0];
/// Length of each audition note (seconds)
const AUDITION_NOTE: f64 = 0.4;
/// Onset spacing between audition notes (seconds)
const AUDITION_SPACING: f64 = 0.5;

/// Render a one-octave major scale from the instrument's nominal pitch.
///
/// Drums play the same pitch eight times. Vocal notes cycle the vowels.
pub fn scale_preview(cache: &mut SampleCache, instrument: &'static dyn Instrument) -> Vec<f32> {
    let spec = instrument.spec();
    let sample_rate = cache.sample_rate();
    let spacing = (AUDITION_SPACING * sample_rate).round() as usize;
    let mut buffer: Vec<f32> = Vec::new();

    for (i, &step) in AUDITION_STEPS.iter().enumerate() {
        let freq = if spec.role == Role::Rhythm {
            spec.nominal
        } else {
            spec.clamp_freq(spec.nominal * semitone_ratio(step))
        };
        let phoneme = (spec.role == Role::Vocal).then_some(i as u8);
        let samples = cache.get_or_render(instrument, freq, AUDITION_NOTE, phoneme, false);

        let offset = i * spacing;
        if buffer.len() < offset + samples.len() {
            buffer.resize(offset + samples.len(), 0.0);
        }
        for (out, s) in buffer[offset..].iter_mut().zip(samples.iter()) {
            *out += s;
        }
    }
    buffer
}

/// Streams a mono buffer to the front left and right channels
pub struct PreviewPlayer {
    samples: Arc<[f32]>,
    position: usize,
    gain: f32,
    stop: StopHandle,
    stats: Arc<PlaybackStats>,
}

impl PreviewPlayer {
    /// Create a player over shared samples
    pub fn new(samples: Arc<[f32]>, stop: StopHandle, stats: Arc<PlaybackStats>) -> Self {
        Self {
            samples,
            position: 0,
            gain: 0.8,
            stop,
            stats,
        }
    }

    /// Frames already played
    pub fn position(&self) -> usize {
        self.position
    }

    /// Fill an interleaved block
    pub fn fill(&mut self, data: &mut [f32], channels: usize) {
        data.fill(0.0);
        if channels == 0 || self.stop.is_stopped() {
            return;
        }
        let mut frames = 0u64;
        for frame in data.chunks_exact_mut(channels) {
            let Some(&sample) = self.samples.get(self.position) else {
                break;
            };
            let s = (sample * self.gain).clamp(-1.0, 1.0);
            frame[0] = s;
            if channels > 1 {
                frame[1] = s;
            }
            self.position += 1;
            frames += 1;
        }
        self.stats.advance(frames);
        if self.position >= self.samples.len() {
            self.stats.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(samples: Vec<f32>) -> (PreviewPlayer, StopHandle, Arc<PlaybackStats>) {
        let stop = StopHandle::new();
        let stats = Arc::new(PlaybackStats::default());
        let player = PreviewPlayer::new(samples.into(), stop.clone(), Arc::clone(&stats));
        (player, stop, stats)
    }

    #[test]
    fn test_fills_front_pair_then_finishes() {
        let (mut player, _, stats) = player(vec![0.5; 3]);
        let mut block = vec![9.0f32; 4 * 8];
        player.fill(&mut block, 8);
        assert_eq!(block[0], 0.4);
        assert_eq!(block[1], 0.4);
        assert_eq!(block[2], 0.0);
        assert_eq!(block[3 * 8], 0.0);
        assert_eq!(player.position(), 3);
        assert_eq!(stats.frames(), 3);
        assert!(stats.is_finished());
    }

    #[test]
    fn test_scale_preview_uses_cache() {
        let mut cache = SampleCache::new(8000.0, 16);
        let piano = crate::synth::instruments::lookup("piano").unwrap();
        let buffer = scale_preview(&mut cache, piano);
        assert!(buffer.len() >= 7 * 4000);
        assert!(buffer.iter().any(|&s| s != 0.0));
        assert!(buffer.iter().all(|s| s.is_finite()));
        assert_eq!(cache.misses(), 8);

        let kick = crate::synth::instruments::lookup("kick").unwrap();
        scale_preview(&mut cache, kick);
        // one pitch, rendered once
        assert_eq!(cache.misses(), 9);
        assert_eq!(cache.hits(), 7);
    }

    #[test]
    fn test_stop_silences() {
        let (mut player, stop, stats) = player(vec![1.0; 16]);
        stop.stop();
        let mut block = vec![1.0f32; 8];
        player.fill(&mut block, 2);
        assert!(block.iter().all(|&s| s == 0.0));
        assert_eq!(player.position(), 0);
        assert!(!stats.is_finished());
    }
}
