// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Harmony generator: sustained pads or rhythmic comping.
//!
//! Chords come from the section's progression. Inversions are chosen for
//! smooth voice leading: the candidate whose average pitch sits closest
//! to the previous chord wins.

use rand::rngs::StdRng;
use rand::Rng;

use super::{GeneratorContext, PartGenerator};
use crate::arrangement::{Note, TIME_EPSILON};
use crate::timing::STEPS_PER_BAR;

/// How chords are played
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HarmonyMode {
    /// Hold each chord for its whole span
    Sustain,
    /// Rhythmic hits on a comping pattern
    Comp,
}

/// Inversion selection method
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InversionMode {
    /// Root position only
    Root,
    /// Random inversion
    Random,
    /// Choose smoothest voice leading
    VoiceLed,
}

/// Comping patterns as hit steps within a bar
const COMP_PATTERNS: [&[u32]; 4] = [&[0, 8], &[0, 6, 12], &[4, 12], &[0, 3, 6, 10, 12]];

/// Highest inversion tried
const MAX_INVERSION: usize = 2;

/// Harmony generator
#[derive(Debug, Clone)]
pub struct ChordGenerator {
    inversion_mode: InversionMode,
    gate: f64,
    previous_center: Option<f64>,
}

impl Default for ChordGenerator {
    fn default() -> Self {
        Self {
            inversion_mode: InversionMode::VoiceLed,
            gate: 0.95,
            previous_center: None,
        }
    }
}

impl ChordGenerator {
    /// Create a new chord generator
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory function for registry
    pub fn create() -> Box<dyn PartGenerator> {
        Box::new(Self::new())
    }

    /// Builder: inversion selection
    pub fn with_inversion_mode(mut self, mode: InversionMode) -> Self {
        self.inversion_mode = mode;
        self
    }

    /// Sustaining instruments hold chords; everything else comps
    pub fn mode_for(instrument: &str) -> HarmonyMode {
        match instrument {
            "pad" | "organ" => HarmonyMode::Sustain,
            _ => HarmonyMode::Comp,
        }
    }

    fn voicing(&mut self, ctx: &GeneratorContext<'_>, time: f64, rng: &mut StdRng) -> Vec<f64> {
        let center = |tones: &[f64]| tones.iter().map(|f| f.log2()).sum::<f64>() / tones.len().max(1) as f64;
        let tones = match (self.inversion_mode, self.previous_center) {
            (InversionMode::Root, _) => ctx.chord_at(time, 0),
            (InversionMode::Random, _) | (InversionMode::VoiceLed, None) => {
                ctx.chord_at(time, rng.gen_range(0..=MAX_INVERSION))
            }
            (InversionMode::VoiceLed, Some(previous)) => (0..=MAX_INVERSION)
                .map(|inversion| ctx.chord_at(time, inversion))
                .min_by(|a, b| {
                    let da = (center(a) - previous).abs();
                    let db = (center(b) - previous).abs();
                    da.total_cmp(&db)
                })
                .unwrap_or_else(|| ctx.chord_at(time, 0)),
        };
        self.previous_center = Some(center(&tones));
        tones
    }
}

impl PartGenerator for ChordGenerator {
    fn name(&self) -> &'static str {
        "chord"
    }

    fn compose(&mut self, ctx: &GeneratorContext<'_>, rng: &mut StdRng) -> Vec<Note> {
        let span = ctx.chord_span();
        let bar_len = ctx.grid.bar_seconds();
        let step = ctx.grid.step_seconds();
        let end = ctx.section.end_time();
        let mode = Self::mode_for(ctx.instrument.name);
        let pattern = COMP_PATTERNS[rng.gen_range(0..COMP_PATTERNS.len())];
        let mut notes = Vec::new();

        let mut t = ctx.section.start_time();
        while t < end - TIME_EPSILON {
            let tones = self.voicing(ctx, t, rng);
            match mode {
                HarmonyMode::Sustain => {
                    let velocity = rng.gen_range(0.6..=0.8);
                    for &freq in &tones {
                        if let Some(note) = ctx.place(freq, t, span * self.gate) {
                            notes.push(note.with_velocity(velocity));
                        }
                    }
                }
                HarmonyMode::Comp => {
                    let mut bar = t;
                    while bar < (t + span).min(end) - TIME_EPSILON {
                        for (i, &hit) in pattern.iter().enumerate() {
                            let next = pattern.get(i + 1).copied().unwrap_or(STEPS_PER_BAR);
                            let room = (next - hit) as f64 * step;
                            let length = ctx.draw_duration(rng).min(room) * self.gate;
                            let velocity = if hit % 4 == 0 { 0.85 } else { 0.7 };
                            let start = bar + hit as f64 * step;
                            for &freq in &tones {
                                if let Some(note) = ctx.place(freq, start, length) {
                                    notes.push(note.with_velocity(velocity));
                                }
                            }
                        }
                        bar += bar_len;
                    }
                }
            }
            t += span;
        }
        notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrangement::{Section, SectionTemplate};
    use crate::style::StyleProfile;
    use crate::synth::instruments;
    use rand::SeedableRng;

    #[test]
    fn test_mode_for() {
        assert_eq!(ChordGenerator::mode_for("pad"), HarmonyMode::Sustain);
        assert_eq!(ChordGenerator::mode_for("piano"), HarmonyMode::Comp);
    }

    #[test]
    fn test_pad_sustains_whole_chords() {
        let style = StyleProfile::default();
        let section = Section::new("Verse", SectionTemplate::Verse, 0.0, 8.0).unwrap();
        let spec = instruments::spec("pad").unwrap();
        let ctx = GeneratorContext::new(&style, "major", 220.0, 120.0, 8.0, &section, spec, &[0, 3]);
        let mut rng = StdRng::seed_from_u64(3);
        let notes = ChordGenerator::new().compose(&ctx, &mut rng);

        // four one-bar chords
        let onsets: Vec<f64> = notes.iter().map(|n| n.start_time).collect();
        for bar in 0..4 {
            let count = onsets.iter().filter(|&&t| (t - bar as f64 * 2.0).abs() < 1e-9).count();
            assert!(count >= 2, "bar {}", bar);
        }
        assert!(notes.iter().all(|n| n.duration > 1.5));
    }

    #[test]
    fn test_voice_leading_stays_close() {
        let style = StyleProfile::default();
        let section = Section::new("Verse", SectionTemplate::Verse, 0.0, 32.0).unwrap();
        let spec = instruments::spec("piano").unwrap();
        let ctx = GeneratorContext::new(&style, "major", 220.0, 120.0, 32.0, &section, spec, &[0, 4, 5, 3]);
        let mut rng = StdRng::seed_from_u64(3);
        let mut gen = ChordGenerator::new();
        let mut last: Option<f64> = None;
        for bar in 0..16 {
            let tones = gen.voicing(&ctx, bar as f64 * 2.0, &mut rng);
            let center = tones.iter().map(|f| f.log2()).sum::<f64>() / tones.len() as f64;
            if let Some(prev) = last {
                // never more than an octave away from the previous chord
                assert!((center - prev).abs() < 1.0);
            }
            last = Some(center);
        }
    }
}
