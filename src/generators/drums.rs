// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Drum generator driven by the genre's step patterns.
//!
//! One part per percussion instrument: the pattern's steps are placed on
//! the sixteenth grid of every bar with swing and occasional syncopated
//! nudges, downbeats are accented and slightly detuned, hi-hats ring open
//! on the genre's open steps and the last bar of a section adds the fill.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::Rng;

use super::{GeneratorContext, PartGenerator};
use crate::arrangement::{Note, TIME_EPSILON};
use crate::music::semitone_ratio;
use crate::style::DrumPattern;
use crate::timing::{STEPS_PER_BAR, STEPS_PER_BEAT};

/// Largest downbeat detune (semitones)
const ACCENT_DETUNE: f64 = 0.15;

/// Pattern used when the genre has none for an instrument
pub fn default_pattern(instrument: &str) -> DrumPattern {
    let (steps, every_bars, fill_steps): (&[u8], u32, &[u8]) = match instrument {
        "kick" => (&[0, 8], 1, &[]),
        "snare" | "clap" => (&[4, 12], 1, &[14, 15]),
        "hihat" => (&[0, 2, 4, 6, 8, 10, 12, 14], 1, &[]),
        "crash" => (&[0], 4, &[]),
        "tom" => (&[], 1, &[12, 13, 14, 15]),
        _ => (&[0], 1, &[]),
    };
    DrumPattern {
        instrument: instrument.to_string(),
        steps: steps.to_vec(),
        every_bars,
        fill_steps: fill_steps.to_vec(),
    }
}

/// Drum generator
#[derive(Debug, Clone)]
pub struct DrumGenerator {
    /// Velocity for accented downbeats
    accent_velocity: f64,
    /// Base velocity
    velocity: f64,
    /// Humanize velocity (variation amount)
    humanize_velocity: f64,
}

impl Default for DrumGenerator {
    fn default() -> Self {
        Self {
            accent_velocity: 1.0,
            velocity: 0.7,
            humanize_velocity: 0.08,
        }
    }
}

impl DrumGenerator {
    /// Create a new drum generator
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory function for registry
    pub fn create() -> Box<dyn PartGenerator> {
        Box::new(Self::new())
    }

    /// Steps that sound in a bar
    fn bar_steps(pattern: &DrumPattern, bar: u64, last_bar: bool) -> BTreeSet<u32> {
        let mut steps = BTreeSet::new();
        if bar % pattern.every_bars.max(1) as u64 == 0 {
            steps.extend(pattern.steps.iter().map(|&s| s as u32));
        }
        if last_bar {
            steps.extend(pattern.fill_steps.iter().map(|&s| s as u32));
        }
        steps.retain(|&s| s < STEPS_PER_BAR);
        steps
    }

    fn length(instrument: &str, open: bool, step: f64) -> f64 {
        match instrument {
            "crash" => step * 8.0,
            "hihat" if open => step * 2.0,
            _ => step,
        }
    }
}

impl PartGenerator for DrumGenerator {
    fn name(&self) -> &'static str {
        "drums"
    }

    fn compose(&mut self, ctx: &GeneratorContext<'_>, rng: &mut StdRng) -> Vec<Note> {
        let style = ctx.style;
        let name = ctx.instrument.name;
        let pattern = style
            .drum_pattern(name)
            .cloned()
            .unwrap_or_else(|| default_pattern(name));

        let grid = ctx.grid;
        let step = grid.step_seconds();
        let bar_len = grid.bar_seconds();
        let start = ctx.section.start_time();
        let bars = (ctx.section.duration() / bar_len - TIME_EPSILON).ceil().max(1.0) as u64;
        let nominal = ctx.instrument.nominal;

        let mut notes = Vec::new();
        for bar in 0..bars {
            let bar_start = start + bar as f64 * bar_len;
            let last_bar = bar + 1 == bars;
            let fills: BTreeSet<u32> = pattern.fill_steps.iter().map(|&s| s as u32).collect();

            for s in Self::bar_steps(&pattern, bar, last_bar) {
                let downbeat = s % STEPS_PER_BEAT == 0;
                let fill = last_bar && fills.contains(&s);

                let mut position = s;
                if !downbeat && !fill && rng.gen::<f64>() < style.syncopation {
                    position = if rng.gen_bool(0.5) && s + 1 < STEPS_PER_BAR { s + 1 } else { s - 1 };
                }
                let time = bar_start
                    + position as f64 * step
                    + grid.swing_offset(position as u64, style.swing);

                let open = name == "hihat" && style.open_hat_steps.iter().any(|&o| o as u32 == s);
                let (freq, velocity) = if downbeat {
                    let detune = rng.gen_range(-ACCENT_DETUNE..=ACCENT_DETUNE);
                    (nominal * semitone_ratio(detune), self.accent_velocity)
                } else if fill {
                    // Fills climb toward the next downbeat
                    let rise = s as f64 / STEPS_PER_BAR as f64;
                    (nominal * semitone_ratio(-3.0 * (1.0 - rise)), 0.6 + 0.4 * rise)
                } else {
                    let h = self.humanize_velocity;
                    (nominal, (self.velocity + rng.gen_range(-h..=h)).clamp(0.0, 1.0))
                };

                if let Some(note) = ctx.place(freq, time, Self::length(name, open, step)) {
                    notes.push(note.with_velocity(velocity).with_open(open));
                }
            }
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

    fn straight() -> StyleProfile {
        StyleProfile {
            swing: 0.0,
            syncopation: 0.0,
            ..StyleProfile::default()
        }
    }

    fn run(style: &StyleProfile, instrument: &str, seconds: f64) -> Vec<Note> {
        let section = Section::new("Verse", SectionTemplate::Verse, 0.0, seconds).unwrap();
        let spec = instruments::spec(instrument).unwrap();
        let ctx = GeneratorContext::new(style, "major", 220.0, 120.0, seconds, &section, spec, &[0]);
        let mut rng = StdRng::seed_from_u64(6);
        DrumGenerator::new().compose(&ctx, &mut rng)
    }

    #[test]
    fn test_snare_backbeat_and_fill() {
        let style = StyleProfile {
            drum_patterns: vec![DrumPattern {
                instrument: "snare".into(),
                steps: vec![4, 12],
                every_bars: 1,
                fill_steps: vec![14, 15],
            }],
            ..straight()
        };
        let notes = run(&style, "snare", 6.0);
        // three bars of backbeat plus a two-hit fill in the last bar
        assert_eq!(notes.len(), 8);
        assert!((notes[0].start_time - 0.5).abs() < 1e-9);
        assert!((notes[1].start_time - 1.5).abs() < 1e-9);
        assert!(notes[6].start_time > 5.7);
    }

    #[test]
    fn test_crash_every_four_bars() {
        let style = StyleProfile {
            drum_patterns: vec![DrumPattern {
                instrument: "crash".into(),
                steps: vec![0],
                every_bars: 4,
                fill_steps: vec![],
            }],
            ..straight()
        };
        let notes = run(&style, "crash", 16.0);
        let onsets: Vec<f64> = notes.iter().map(|n| n.start_time).collect();
        assert_eq!(onsets.len(), 2);
        assert!((onsets[1] - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_open_hats_and_accents() {
        let style = StyleProfile {
            open_hat_steps: vec![14],
            drum_patterns: vec![default_pattern("hihat")],
            ..straight()
        };
        let notes = run(&style, "hihat", 2.0);
        assert_eq!(notes.len(), 8);
        assert!(notes[7].open);
        assert!(notes[..7].iter().all(|n| !n.open));
        assert_eq!(notes[0].velocity, 1.0);
        assert!(notes[1].velocity < 1.0);
        let nominal = instruments::spec("hihat").unwrap().nominal;
        assert!((notes[0].freq / nominal).log2().abs() * 12.0 <= ACCENT_DETUNE + 1e-9);
    }

    #[test]
    fn test_missing_pattern_uses_default() {
        let style = StyleProfile {
            drum_patterns: Vec::new(),
            ..straight()
        };
        let notes = run(&style, "kick", 4.0);
        assert_eq!(notes.len(), 4);
    }

    #[test]
    fn test_swing_delays_offbeats() {
        let style = StyleProfile {
            swing: 1.0,
            syncopation: 0.0,
            open_hat_steps: vec![],
            drum_patterns: vec![default_pattern("hihat")],
            ..StyleProfile::default()
        };
        let notes = run(&style, "hihat", 2.0);
        assert!(notes[1].start_time > 0.25);
        assert!((notes[2].start_time - 0.5).abs() < 1e-9);
    }
}
