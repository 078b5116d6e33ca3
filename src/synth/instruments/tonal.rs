// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Pitched instruments built from additive partial stacks.

use std::f64::consts::TAU;

use super::{Instrument, InstrumentSpec, Role, SpatialClass};
use crate::music::semitone_ratio;
use crate::synth::dsp::{Adsr, FilterKind, NoiseColor};
use crate::synth::voice::Voice;

/// One harmonic of the stack
#[derive(Debug, Clone, Copy)]
pub struct Partial {
    /// Integer multiple of the fundamental
    pub harmonic: u32,
    /// Relative amplitude
    pub amp: f64,
    /// Exponential decay rate (1/s, 0 = sustained)
    pub decay: f64,
}

const fn p(harmonic: u32, amp: f64, decay: f64) -> Partial {
    Partial { harmonic, amp, decay }
}

/// Periodic pitch modulation
#[derive(Debug, Clone, Copy)]
pub struct Vibrato {
    /// Rate in Hz
    pub rate: f64,
    /// Depth in semitones
    pub depth: f64,
    /// Seconds before full depth is reached
    pub delay: f64,
}

/// Pitch glide into the note from below
#[derive(Debug, Clone, Copy)]
pub struct Slide {
    /// Starting offset in semitones
    pub semitones: f64,
    /// Time constant in seconds
    pub time: f64,
}

/// Noise texture mixed into the tone (breath, bow, pick)
#[derive(Debug, Clone, Copy)]
pub struct NoiseLayer {
    pub color: NoiseColor,
    pub level: f64,
    /// Exponential decay rate (1/s, 0 = sustained)
    pub decay: f64,
}

/// Filter whose cutoff follows the signal's own envelope
#[derive(Debug, Clone, Copy)]
pub struct ToneFilter {
    pub kind: FilterKind,
    /// Cutoff as a multiple of the note frequency
    pub ratio: f64,
    /// Cutoff offset in Hz
    pub base: f64,
    /// How far the envelope follower opens the filter
    pub env_amount: f64,
    pub q: f64,
}

/// Additive instrument
#[derive(Debug, Clone)]
pub struct Tonal {
    spec: InstrumentSpec,
    envelope: Adsr,
    partials: &'static [Partial],
    vibrato: Option<Vibrato>,
    slide: Option<Slide>,
    noise: Option<NoiseLayer>,
    filter: Option<ToneFilter>,
    /// Second oscillator detune in cents (0 = single oscillator)
    detune_cents: f64,
    /// Internal soft-clip amount (0 = clean)
    drive: f64,
}

impl Tonal {
    fn new(spec: InstrumentSpec, envelope: Adsr, partials: &'static [Partial]) -> Self {
        Self {
            spec,
            envelope,
            partials,
            vibrato: None,
            slide: None,
            noise: None,
            filter: None,
            detune_cents: 0.0,
            drive: 0.0,
        }
    }

    fn vibrato(mut self, rate: f64, depth: f64, delay: f64) -> Self {
        self.vibrato = Some(Vibrato { rate, depth, delay });
        self
    }

    fn slide(mut self, semitones: f64, time: f64) -> Self {
        self.slide = Some(Slide { semitones, time });
        self
    }

    fn noise(mut self, color: NoiseColor, level: f64, decay: f64) -> Self {
        self.noise = Some(NoiseLayer { color, level, decay });
        self
    }

    fn lowpass(mut self, ratio: f64, base: f64, env_amount: f64, q: f64) -> Self {
        self.filter = Some(ToneFilter {
            kind: FilterKind::Lowpass,
            ratio,
            base,
            env_amount,
            q,
        });
        self
    }

    fn detune(mut self, cents: f64) -> Self {
        self.detune_cents = cents;
        self
    }

    fn drive(mut self, drive: f64) -> Self {
        self.drive = drive;
        self
    }

    /// Amplitude envelope
    pub fn envelope(&self) -> &Adsr {
        &self.envelope
    }

    fn pitch_offset(&self, t: f64) -> f64 {
        let mut semis = 0.0;
        if let Some(v) = self.vibrato {
            let ramp = if v.delay > 0.0 { (t / v.delay).min(1.0) } else { 1.0 };
            semis += v.depth * ramp * (TAU * v.rate * t).sin();
        }
        if let Some(s) = self.slide {
            semis -= s.semitones * (-t / s.time.max(1e-4)).exp();
        }
        semis
    }

    fn stack(&self, phase: f64, freq: f64, t: f64, nyquist: f64, limit: usize) -> f64 {
        self.partials
            .iter()
            .take(limit)
            .filter(|partial| freq * partial.harmonic as f64 <= nyquist)
            .map(|partial| {
                partial.amp
                    * (-partial.decay * t).exp()
                    * (TAU * (partial.harmonic as f64 * phase).fract()).sin()
            })
            .sum()
    }
}

impl Instrument for Tonal {
    fn spec(&self) -> &InstrumentSpec {
        &self.spec
    }

    fn raw(&self, voice: &mut Voice, t: f64, freq: f64, duration: f64) -> f64 {
        let f = freq * semitone_ratio(self.pitch_offset(t));
        let nyquist = voice.sample_rate() * 0.45;
        let norm: f64 = self.partials.iter().map(|p| p.amp).sum();

        let phase = voice.advance(f);
        let mut tone = self.stack(phase, f, t, nyquist, self.partials.len());
        if self.detune_cents != 0.0 {
            let f2 = f * semitone_ratio(self.detune_cents / 100.0);
            let phase2 = voice.advance2(f2);
            let layer = self.stack(phase2, f2, t, nyquist, self.partials.len());
            tone = 0.6 * tone + 0.4 * layer;
        }
        let mut x = if norm > 0.0 { tone / norm } else { 0.0 };

        if let Some(layer) = self.noise {
            let n = voice.noise.sample(layer.color);
            x += layer.level * n * (-layer.decay * t).exp();
        }

        x *= self.envelope.level(t, duration);

        if let Some(filter) = self.filter {
            let follow = voice.follower.process(x);
            let cutoff = (freq * filter.ratio + filter.base) * (1.0 + filter.env_amount * follow);
            voice.filters[0].set(filter.kind, cutoff, filter.q);
            x = voice.filters[0].process(x);
        }

        if self.drive > 0.0 {
            let gain = 1.0 + self.drive;
            x = (x * gain).tanh() / gain.tanh();
        }
        x
    }
}

fn spec(
    name: &'static str,
    role: Role,
    range: (f64, f64),
    nominal: f64,
    tail: f64,
    spatial: SpatialClass,
    max_gain: f64,
) -> InstrumentSpec {
    InstrumentSpec {
        name,
        role,
        low: range.0,
        high: range.1,
        nominal,
        tail,
        spatial,
        max_gain,
        distortable: false,
    }
}

fn distortable(mut spec: InstrumentSpec) -> InstrumentSpec {
    spec.distortable = true;
    spec
}

const SAW: &[Partial] = &[
    p(1, 1.0, 0.0),
    p(2, 0.5, 0.0),
    p(3, 0.33, 0.0),
    p(4, 0.25, 0.0),
    p(5, 0.2, 0.0),
    p(6, 0.16, 0.0),
    p(7, 0.14, 0.0),
    p(8, 0.12, 0.0),
];

const SQUARE: &[Partial] = &[
    p(1, 1.0, 0.0),
    p(3, 0.33, 0.0),
    p(5, 0.2, 0.0),
    p(7, 0.14, 0.0),
    p(9, 0.11, 0.0),
];

// Keys

fn piano() -> Tonal {
    const PARTIALS: &[Partial] = &[
        p(1, 1.0, 0.8),
        p(2, 0.6, 1.2),
        p(3, 0.35, 1.8),
        p(4, 0.25, 2.4),
        p(5, 0.15, 3.0),
        p(6, 0.1, 3.5),
        p(7, 0.05, 4.0),
    ];
    Tonal::new(
        spec("piano", Role::Harmony, (27.5, 4186.0), 261.63, 1.0, SpatialClass::Front, 0.9),
        Adsr::new(0.005, 1.2, 0.25, 0.6),
        PARTIALS,
    )
    .noise(NoiseColor::White, 0.05, 40.0)
    .lowpass(6.0, 800.0, 1.5, 0.707)
}

fn electric_piano() -> Tonal {
    const PARTIALS: &[Partial] = &[p(1, 1.0, 0.6), p(2, 0.3, 2.0), p(3, 0.15, 3.0), p(4, 0.2, 6.0)];
    Tonal::new(
        spec("electric_piano", Role::Harmony, (55.0, 2100.0), 261.63, 0.8, SpatialClass::Front, 0.85),
        Adsr::new(0.003, 0.9, 0.35, 0.5),
        PARTIALS,
    )
    .detune(4.0)
    .lowpass(8.0, 500.0, 1.0, 0.707)
}

fn organ() -> Tonal {
    const DRAWBARS: &[Partial] = &[
        p(1, 1.0, 0.0),
        p(2, 0.7, 0.0),
        p(3, 0.5, 0.0),
        p(4, 0.4, 0.0),
        p(6, 0.25, 0.0),
        p(8, 0.2, 0.0),
    ];
    Tonal::new(
        distortable(spec("organ", Role::Harmony, (65.0, 2100.0), 261.63, 0.15, SpatialClass::Wide, 0.8)),
        Adsr::new(0.01, 0.05, 1.0, 0.1),
        DRAWBARS,
    )
    .vibrato(6.0, 0.08, 0.0)
    .drive(0.5)
}

// Synths

fn pad() -> Tonal {
    Tonal::new(
        spec("pad", Role::Harmony, (55.0, 1760.0), 220.0, 1.5, SpatialClass::Wide, 0.7),
        Adsr::new(0.6, 0.5, 0.8, 1.2),
        &SAW[..6],
    )
    .detune(9.0)
    .noise(NoiseColor::Pink, 0.02, 0.0)
    .lowpass(3.0, 400.0, 0.5, 0.9)
}

fn synth_arp() -> Tonal {
    Tonal::new(
        spec("synth_arp", Role::Arpeggio, (110.0, 2640.0), 440.0, 0.3, SpatialClass::Wide, 0.75),
        Adsr::new(0.003, 0.15, 0.4, 0.15),
        SQUARE,
    )
    .lowpass(4.0, 600.0, 3.0, 2.0)
}

fn synth_lead() -> Tonal {
    Tonal::new(
        distortable(spec("synth_lead", Role::Melody, (110.0, 2640.0), 440.0, 0.3, SpatialClass::Front, 0.8)),
        Adsr::new(0.01, 0.2, 0.7, 0.2),
        SAW,
    )
    .detune(7.0)
    .vibrato(5.5, 0.1, 0.25)
    .lowpass(5.0, 800.0, 2.0, 1.5)
}

fn synth_bass() -> Tonal {
    Tonal::new(
        distortable(spec("synth_bass", Role::Bass, (30.0, 400.0), 55.0, 0.2, SpatialClass::Low, 0.9)),
        Adsr::new(0.003, 0.2, 0.7, 0.1),
        &SAW[..6],
    )
    .lowpass(2.0, 150.0, 4.0, 2.5)
    .drive(0.3)
}

// Plucked and bowed strings

fn acoustic_guitar() -> Tonal {
    const PARTIALS: &[Partial] = &[
        p(1, 1.0, 1.5),
        p(2, 0.7, 2.5),
        p(3, 0.45, 3.5),
        p(4, 0.3, 4.5),
        p(5, 0.2, 6.0),
        p(6, 0.12, 7.0),
    ];
    Tonal::new(
        spec("acoustic_guitar", Role::Arpeggio, (82.0, 1320.0), 196.0, 0.8, SpatialClass::Wide, 0.85),
        Adsr::new(0.002, 1.5, 0.0, 0.4),
        PARTIALS,
    )
    .noise(NoiseColor::White, 0.08, 60.0)
    .lowpass(5.0, 1200.0, 1.0, 0.707)
}

fn electric_guitar() -> Tonal {
    const PARTIALS: &[Partial] = &[
        p(1, 1.0, 0.5),
        p(2, 0.8, 0.8),
        p(3, 0.6, 1.0),
        p(4, 0.4, 1.3),
        p(5, 0.3, 1.6),
        p(6, 0.2, 2.0),
    ];
    Tonal::new(
        distortable(spec("electric_guitar", Role::Harmony, (82.0, 1320.0), 196.0, 0.5, SpatialClass::Wide, 0.85)),
        Adsr::new(0.004, 0.8, 0.6, 0.3),
        PARTIALS,
    )
    .vibrato(5.5, 0.1, 0.3)
    .lowpass(6.0, 1500.0, 1.0, 0.707)
    .drive(1.5)
}

fn bass() -> Tonal {
    const PARTIALS: &[Partial] = &[p(1, 1.0, 0.3), p(2, 0.5, 0.8), p(3, 0.25, 1.5), p(4, 0.1, 2.0)];
    Tonal::new(
        distortable(spec("bass", Role::Bass, (41.0, 400.0), 55.0, 0.25, SpatialClass::Low, 0.9)),
        Adsr::new(0.005, 0.4, 0.6, 0.15),
        PARTIALS,
    )
    .noise(NoiseColor::White, 0.04, 80.0)
    .lowpass(4.0, 200.0, 1.0, 0.707)
}

fn violin() -> Tonal {
    Tonal::new(
        spec("violin", Role::Melody, (196.0, 3520.0), 440.0, 0.4, SpatialClass::Front, 0.8),
        Adsr::new(0.08, 0.2, 0.85, 0.25),
        &SAW[..7],
    )
    .vibrato(5.8, 0.15, 0.2)
    .noise(NoiseColor::Pink, 0.03, 0.0)
    .lowpass(6.0, 1500.0, 0.5, 0.707)
}

fn cello() -> Tonal {
    Tonal::new(
        spec("cello", Role::Melody, (65.0, 1050.0), 196.0, 0.5, SpatialClass::Front, 0.8),
        Adsr::new(0.1, 0.2, 0.85, 0.3),
        &SAW[..7],
    )
    .vibrato(5.2, 0.12, 0.25)
    .noise(NoiseColor::Brown, 0.04, 0.0)
    .lowpass(5.0, 600.0, 0.5, 0.707)
}

// Winds and brass

fn flute() -> Tonal {
    const PARTIALS: &[Partial] = &[p(1, 1.0, 0.0), p(2, 0.25, 0.0), p(3, 0.1, 0.0)];
    Tonal::new(
        spec("flute", Role::Melody, (261.0, 2100.0), 523.25, 0.3, SpatialClass::Front, 0.75),
        Adsr::new(0.06, 0.1, 0.9, 0.15),
        PARTIALS,
    )
    .vibrato(5.0, 0.1, 0.3)
    .noise(NoiseColor::White, 0.08, 0.0)
    .lowpass(5.0, 1000.0, 0.3, 0.707)
}

fn saxophone() -> Tonal {
    const PARTIALS: &[Partial] = &[
        p(1, 1.0, 0.0),
        p(2, 0.8, 0.0),
        p(3, 0.6, 0.0),
        p(4, 0.45, 0.0),
        p(5, 0.35, 0.0),
        p(6, 0.2, 0.0),
        p(7, 0.15, 0.0),
    ];
    Tonal::new(
        spec("saxophone", Role::Melody, (103.0, 880.0), 293.66, 0.3, SpatialClass::Front, 0.8),
        Adsr::new(0.04, 0.1, 0.85, 0.15),
        PARTIALS,
    )
    .slide(0.8, 0.03)
    .vibrato(5.0, 0.12, 0.3)
    .noise(NoiseColor::Pink, 0.05, 0.0)
    .lowpass(4.0, 800.0, 1.0, 0.707)
    .drive(0.4)
}

fn trumpet() -> Tonal {
    const PARTIALS: &[Partial] = &[
        p(1, 1.0, 0.0),
        p(2, 0.9, 0.0),
        p(3, 0.75, 0.0),
        p(4, 0.6, 0.0),
        p(5, 0.45, 0.0),
        p(6, 0.3, 0.0),
        p(7, 0.2, 0.0),
        p(8, 0.1, 0.0),
    ];
    Tonal::new(
        spec("trumpet", Role::Melody, (164.0, 1175.0), 466.16, 0.3, SpatialClass::Front, 0.8),
        Adsr::new(0.03, 0.1, 0.85, 0.15),
        PARTIALS,
    )
    .slide(1.0, 0.02)
    .vibrato(5.5, 0.08, 0.35)
    .lowpass(3.0, 500.0, 3.0, 0.707)
}

/// Every tonal instrument
pub fn all() -> Vec<Tonal> {
    vec![
        piano(),
        electric_piano(),
        organ(),
        pad(),
        acoustic_guitar(),
        synth_arp(),
        electric_guitar(),
        bass(),
        synth_bass(),
        violin(),
        cello(),
        flute(),
        saxophone(),
        trumpet(),
        synth_lead(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_fits_in_tail() {
        for instrument in all() {
            assert!(
                instrument.envelope().release_time() <= instrument.spec().tail,
                "{}",
                instrument.spec().name
            );
        }
    }

    #[test]
    fn test_raw_output_is_finite_and_audible() {
        for instrument in all() {
            let mut voice = Voice::new(44100.0, 1);
            let freq = instrument.spec().nominal;
            let mut peak: f64 = 0.0;
            for i in 0..22050 {
                let t = i as f64 / 44100.0;
                let x = instrument.raw(&mut voice, t, freq, 0.4);
                assert!(x.is_finite(), "{}", instrument.spec().name);
                peak = peak.max(x.abs());
            }
            assert!(peak > 0.01, "{} is silent", instrument.spec().name);
        }
    }

    #[test]
    fn test_vibrato_ramps_in() {
        let violin = violin();
        assert_eq!(violin.pitch_offset(0.0), 0.0);
        let trumpet = trumpet();
        assert!(trumpet.pitch_offset(0.0) < -0.9);
        assert!(trumpet.pitch_offset(0.5).abs() < 0.1);
    }
}
