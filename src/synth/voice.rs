// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Per-voice synthesis state.
//!
//! A `Voice` owns every stateful DSP element a sounding note needs, so
//! two overlapping notes of the same instrument never share filter or
//! noise memory. Playback keeps one voice per active-note slot and
//! re-arms it for each new note without allocating.

use super::dsp::{Biquad, EnvelopeFollower, FormantBank, Noise, OnePole, Protector};

/// Onset crossfade used when a vocal note follows another (seconds)
pub const VOCAL_CROSSFADE: f64 = 0.015;

/// Stateful DSP for one sounding note
#[derive(Debug, Clone)]
pub struct Voice {
    sample_rate: f64,
    /// Oscillator phase in cycles (0.0 - 1.0)
    pub(crate) phase: f64,
    /// Second oscillator phase for detuned layers
    pub(crate) phase2: f64,
    pub(crate) noise: Noise,
    pub(crate) filters: [Biquad; 3],
    pub(crate) smoother: OnePole,
    pub(crate) follower: EnvelopeFollower,
    pub(crate) formants: FormantBank,
    pub(crate) protector: Protector,
    phoneme: Option<u8>,
    open: bool,
    onset_fade: f64,
}

impl Voice {
    /// Create a voice for a sample rate with a noise seed
    pub fn new(sample_rate: f64, seed: u64) -> Self {
        let sample_rate = if sample_rate.is_finite() && sample_rate > 0.0 {
            sample_rate
        } else {
            super::DEFAULT_SAMPLE_RATE
        };
        Self {
            sample_rate,
            phase: 0.0,
            phase2: 0.0,
            noise: Noise::new(seed),
            filters: [
                Biquad::new(sample_rate),
                Biquad::new(sample_rate),
                Biquad::new(sample_rate),
            ],
            smoother: OnePole::new(8000.0, sample_rate),
            follower: EnvelopeFollower::new(0.005, 0.08, sample_rate),
            formants: FormantBank::new(sample_rate),
            protector: Protector::new(sample_rate),
            phoneme: None,
            open: false,
            onset_fade: 0.0,
        }
    }

    /// Re-arm for a new note: clear state, reseed noise, set articulation
    pub fn start(&mut self, seed: u64, phoneme: Option<u8>, open: bool) {
        self.phase = 0.0;
        self.phase2 = 0.0;
        self.noise.reseed(seed);
        for filter in &mut self.filters {
            filter.reset();
        }
        self.smoother.reset();
        self.follower.reset();
        self.formants.reset();
        self.protector.reset();
        self.phoneme = phoneme;
        self.open = open;
        self.onset_fade = 0.0;
    }

    /// Carry the formant filter memory of the previous vocal note into this one
    pub fn inherit_formants(&mut self, previous: &Voice) {
        self.formants.copy_state(&previous.formants);
        self.onset_fade = VOCAL_CROSSFADE;
    }

    /// Sample rate
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Seconds per sample
    pub fn dt(&self) -> f64 {
        1.0 / self.sample_rate
    }

    /// Vowel index for vocal notes
    pub fn phoneme(&self) -> Option<u8> {
        self.phoneme
    }

    /// Open articulation for hi-hats
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Onset crossfade length (0 when the note starts cold)
    pub fn onset_fade(&self) -> f64 {
        self.onset_fade
    }

    /// Advance the main oscillator by one sample at `freq`, returning the phase before the step
    #[inline]
    pub(crate) fn advance(&mut self, freq: f64) -> f64 {
        let current = self.phase;
        self.phase = (self.phase + freq / self.sample_rate).fract();
        current
    }

    /// Advance the second oscillator
    #[inline]
    pub(crate) fn advance2(&mut self, freq: f64) -> f64 {
        let current = self.phase2;
        self.phase2 = (self.phase2 + freq / self.sample_rate).fract();
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_phase_wraps() {
        let mut voice = Voice::new(100.0, 1);
        for _ in 0..250 {
            voice.advance(30.0);
        }
        assert!((0.0..1.0).contains(&voice.phase));
    }

    #[test]
    fn test_start_resets_state() {
        let mut voice = Voice::new(44100.0, 1);
        voice.advance(440.0);
        voice.follower.process(1.0);
        voice.start(9, Some(3), true);
        assert_eq!(voice.phase, 0.0);
        assert_eq!(voice.follower.level(), 0.0);
        assert_eq!(voice.phoneme(), Some(3));
        assert!(voice.is_open());
        assert_eq!(voice.onset_fade(), 0.0);
    }

    #[test]
    fn test_invalid_sample_rate_falls_back() {
        let voice = Voice::new(0.0, 1);
        assert_eq!(voice.sample_rate(), crate::synth::DEFAULT_SAMPLE_RATE);
    }
}
