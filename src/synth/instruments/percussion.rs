// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Drum kit: swept sines for the membranes, filtered noise for the rest.

use std::f64::consts::TAU;

use super::{Instrument, InstrumentSpec, Role, SpatialClass};
use crate::synth::dsp::FilterKind;
use crate::synth::voice::Voice;

/// Drum sound model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrumKind {
    Kick,
    Snare,
    HiHat,
    Clap,
    Tom,
    Crash,
}

/// Clap burst onsets (seconds)
const CLAP_BURSTS: [f64; 3] = [0.0, 0.011, 0.022];

/// Crash partial ratios relative to the note frequency
const CRASH_RATIOS: [f64; 4] = [1.0, 1.47, 2.09, 2.56];

/// A percussion instrument
#[derive(Debug, Clone)]
pub struct Percussion {
    spec: InstrumentSpec,
    kind: DrumKind,
}

impl Percussion {
    fn new(kind: DrumKind) -> Self {
        let (name, range, nominal, tail, spatial, max_gain) = match kind {
            DrumKind::Kick => ("kick", (30.0, 150.0), 55.0, 0.4, SpatialClass::Low, 0.95),
            DrumKind::Snare => ("snare", (120.0, 400.0), 190.0, 0.3, SpatialClass::Front, 0.85),
            DrumKind::HiHat => ("hihat", (1000.0, 16000.0), 8000.0, 0.4, SpatialClass::Wide, 0.6),
            DrumKind::Clap => ("clap", (500.0, 4000.0), 1200.0, 0.3, SpatialClass::Front, 0.8),
            DrumKind::Tom => ("tom", (60.0, 400.0), 110.0, 0.5, SpatialClass::Wide, 0.85),
            DrumKind::Crash => ("crash", (1000.0, 16000.0), 5000.0, 1.5, SpatialClass::Wide, 0.6),
        };
        Self {
            spec: InstrumentSpec {
                name,
                role: Role::Rhythm,
                low: range.0,
                high: range.1,
                nominal,
                tail,
                spatial,
                max_gain,
                distortable: false,
            },
            kind,
        }
    }

    /// Sound model
    pub fn kind(&self) -> DrumKind {
        self.kind
    }
}

impl Instrument for Percussion {
    fn spec(&self) -> &InstrumentSpec {
        &self.spec
    }

    fn raw(&self, voice: &mut Voice, t: f64, freq: f64, _duration: f64) -> f64 {
        match self.kind {
            DrumKind::Kick => {
                let f = freq * (1.0 + 2.5 * (-t / 0.03).exp());
                let phase = voice.advance(f);
                let body = (TAU * phase).sin() * (-t / 0.28).exp();
                let click = voice.noise.white() * (-t / 0.004).exp() * 0.3;
                body + click
            }
            DrumKind::Snare => {
                let f = freq * (1.0 + 0.3 * (-t / 0.01).exp());
                let phase = voice.advance(f);
                let tone = (TAU * phase).sin() * (-t / 0.06).exp() * 0.5;
                voice.filters[0].set(FilterKind::Highpass, 1200.0, 0.707);
                let rattle = voice.filters[0].process(voice.noise.white()) * (-t / 0.13).exp();
                tone + rattle * 0.8
            }
            DrumKind::HiHat => {
                let decay = if voice.is_open() { 0.3 } else { 0.045 };
                voice.filters[0].set(FilterKind::Highpass, 7000.0, 0.707);
                voice.filters[1].set(FilterKind::Bandpass, freq.max(7000.0) + 2000.0, 1.0);
                let n = voice.noise.white();
                let bright = voice.filters[0].process(n);
                let shaped = voice.filters[1].process(bright);
                (bright * 0.5 + shaped) * (-t / decay).exp() * 1.5
            }
            DrumKind::Clap => {
                let bursts: f64 = CLAP_BURSTS
                    .iter()
                    .filter(|&&onset| t >= onset)
                    .map(|&onset| (-(t - onset) / 0.006).exp())
                    .sum();
                let last = CLAP_BURSTS[CLAP_BURSTS.len() - 1];
                let body = if t >= last {
                    0.5 * (-(t - last) / 0.1).exp()
                } else {
                    0.0
                };
                voice.filters[0].set(FilterKind::Bandpass, freq, 1.5);
                voice.filters[0].process(voice.noise.white()) * (bursts + body) * 2.0
            }
            DrumKind::Tom => {
                let f = freq * (1.0 + 0.6 * (-t / 0.04).exp());
                let phase = voice.advance(f);
                let body = (TAU * phase).sin() * (-t / 0.35).exp();
                let stick = voice.noise.white() * (-t / 0.02).exp() * 0.1;
                body + stick
            }
            DrumKind::Crash => {
                voice.filters[0].set(FilterKind::Highpass, 4000.0, 0.707);
                let wash = voice.filters[0].process(voice.noise.white());
                let ring: f64 = CRASH_RATIOS
                    .iter()
                    .map(|ratio| (TAU * freq * ratio * t).sin())
                    .sum::<f64>()
                    / CRASH_RATIOS.len() as f64;
                (wash * 0.8 + ring * 0.2) * (-t / 0.9).exp()
            }
        }
    }
}

/// Every percussion instrument
pub fn all() -> Vec<Percussion> {
    [
        DrumKind::Kick,
        DrumKind::Snare,
        DrumKind::HiHat,
        DrumKind::Clap,
        DrumKind::Tom,
        DrumKind::Crash,
    ]
    .into_iter()
    .map(Percussion::new)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn energy(drum: &Percussion, open: bool, seconds: f64) -> f64 {
        let mut voice = Voice::new(44100.0, 5);
        voice.start(5, None, open);
        let n = (seconds * 44100.0) as usize;
        (0..n)
            .map(|i| {
                let x = drum.raw(&mut voice, i as f64 / 44100.0, drum.spec().nominal, 0.1);
                x * x
            })
            .sum()
    }

    #[test]
    fn test_drums_are_finite() {
        for drum in all() {
            let mut voice = Voice::new(44100.0, 2);
            for i in 0..44100 {
                let x = drum.raw(&mut voice, i as f64 / 44100.0, drum.spec().nominal, 0.1);
                assert!(x.is_finite(), "{:?}", drum.kind());
            }
        }
    }

    #[test]
    fn test_open_hat_rings_longer() {
        let hat = Percussion::new(DrumKind::HiHat);
        assert!(energy(&hat, true, 0.4) > energy(&hat, false, 0.4) * 2.0);
    }

    #[test]
    fn test_kick_decays() {
        let kick = Percussion::new(DrumKind::Kick);
        let early = energy(&kick, false, 0.1);
        let total = energy(&kick, false, 0.4);
        assert!(early > (total - early));
    }
}
