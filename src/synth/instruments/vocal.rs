// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Formant vocal.
//!
//! A band-limited sawtooth plus breath noise is shaped by two formant
//! band-passes chosen from the note's phoneme. Phonemes 0-7 select a
//! vowel in the chest register, 8-15 the same vowel in head register.

use std::f64::consts::{PI, TAU};

use super::{Instrument, InstrumentSpec, Role, SpatialClass};
use crate::music::semitone_ratio;
use crate::synth::dsp::{Adsr, Formant, NoiseColor};
use crate::synth::voice::Voice;

/// Vowels per register
pub const VOWELS: u8 = 8;

/// Upper bound on sawtooth harmonics
const MAX_HARMONICS: usize = 40;

/// (first, second) formant per vowel: a, e, i, o, u, ae, er, uh
const FORMANTS: [[(Formant, Formant); VOWELS as usize]; 2] = [
    [
        (Formant::new(730.0, 90.0), Formant::new(1090.0, 110.0)),
        (Formant::new(530.0, 60.0), Formant::new(1840.0, 100.0)),
        (Formant::new(270.0, 60.0), Formant::new(2290.0, 100.0)),
        (Formant::new(570.0, 70.0), Formant::new(840.0, 80.0)),
        (Formant::new(300.0, 60.0), Formant::new(870.0, 80.0)),
        (Formant::new(660.0, 80.0), Formant::new(1720.0, 100.0)),
        (Formant::new(490.0, 70.0), Formant::new(1350.0, 90.0)),
        (Formant::new(520.0, 80.0), Formant::new(1190.0, 100.0)),
    ],
    [
        (Formant::new(850.0, 100.0), Formant::new(1220.0, 120.0)),
        (Formant::new(610.0, 80.0), Formant::new(2330.0, 120.0)),
        (Formant::new(310.0, 70.0), Formant::new(2790.0, 120.0)),
        (Formant::new(590.0, 80.0), Formant::new(920.0, 100.0)),
        (Formant::new(370.0, 70.0), Formant::new(950.0, 90.0)),
        (Formant::new(860.0, 100.0), Formant::new(2050.0, 120.0)),
        (Formant::new(500.0, 80.0), Formant::new(1640.0, 110.0)),
        (Formant::new(760.0, 90.0), Formant::new(1400.0, 110.0)),
    ],
];

/// Formant pair for a phoneme
pub fn formants_for(phoneme: u8) -> (Formant, Formant) {
    let register = ((phoneme / VOWELS) % 2) as usize;
    let vowel = (phoneme % VOWELS) as usize;
    FORMANTS[register][vowel]
}

/// The vocal instrument
#[derive(Debug, Clone)]
pub struct Vocal {
    spec: InstrumentSpec,
    envelope: Adsr,
}

impl Vocal {
    pub fn new() -> Self {
        Self {
            spec: InstrumentSpec {
                name: "vocal",
                role: Role::Vocal,
                low: 98.0,
                high: 1050.0,
                nominal: 261.63,
                tail: 0.25,
                spatial: SpatialClass::Center,
                max_gain: 0.85,
                distortable: false,
            },
            envelope: Adsr::new(0.04, 0.1, 0.85, 0.12),
        }
    }
}

impl Default for Vocal {
    fn default() -> Self {
        Self::new()
    }
}

impl Instrument for Vocal {
    fn spec(&self) -> &InstrumentSpec {
        &self.spec
    }

    fn raw(&self, voice: &mut Voice, t: f64, freq: f64, duration: f64) -> f64 {
        let ramp = (t / 0.15).min(1.0);
        let f = freq * semitone_ratio(0.25 * ramp * (TAU * 5.5 * t).sin());

        let phase = voice.advance(f);
        let harmonics = ((voice.sample_rate() * 0.45) / f).floor() as usize;
        let harmonics = harmonics.clamp(1, MAX_HARMONICS);
        let saw: f64 = (1..=harmonics)
            .map(|h| (TAU * (h as f64 * phase).fract()).sin() / h as f64)
            .sum::<f64>()
            * (2.0 / PI);

        let breath = voice.noise.sample(NoiseColor::Pink) * 0.06;
        let (first, second) = formants_for(voice.phoneme().unwrap_or(0));
        voice.formants.set(first, second);
        let shaped = voice.formants.process(saw * 0.6 + breath) * 3.0;

        let mut level = self.envelope.level(t, duration);
        let onset = voice.onset_fade();
        if onset > 0.0 && t < onset {
            level *= t / onset;
        }
        shaped * level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_selection() {
        let (chest, _) = formants_for(0);
        let (head, _) = formants_for(8);
        assert_eq!(chest.center, 730.0);
        assert_eq!(head.center, 850.0);
        assert_eq!(formants_for(16), formants_for(0));
    }

    #[test]
    fn test_vowels_differ() {
        let mut seen = Vec::new();
        for phoneme in 0..VOWELS {
            let pair = formants_for(phoneme);
            assert!(!seen.contains(&pair));
            seen.push(pair);
        }
    }

    #[test]
    fn test_vocal_produces_sound() {
        let vocal = Vocal::new();
        let mut voice = Voice::new(44100.0, 1);
        voice.start(1, Some(3), false);
        let peak = (0..8820)
            .map(|i| vocal.raw(&mut voice, i as f64 / 44100.0, 220.0, 0.5).abs())
            .fold(0.0, f64::max);
        assert!(peak > 0.01);
        assert!(peak.is_finite());
    }

    #[test]
    fn test_crossfade_starts_silent() {
        let vocal = Vocal::new();
        let previous = Voice::new(44100.0, 1);
        let mut voice = Voice::new(44100.0, 2);
        voice.inherit_formants(&previous);
        assert_eq!(vocal.raw(&mut voice, 0.0, 220.0, 0.5), 0.0);
    }
}
