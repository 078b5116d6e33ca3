// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Bass lines that follow the chord progression.
//!
//! Straight genres hold the chord root on the downbeat and the fifth on
//! beat three with the occasional octave push; swing genres walk
//! quarter notes along the scale toward the next chord root.

use rand::rngs::StdRng;
use rand::Rng;

use super::{GeneratorContext, PartGenerator};
use crate::arrangement::{Note, TIME_EPSILON};
use crate::music::{closest_frequency, closest_index, semitone_ratio};

/// Configuration for bass generator
#[derive(Debug, Clone)]
struct BassConfig {
    /// Portion of each slot the note sounds
    gate: f64,
    /// Chance of an octave pickup on the last eighth of a bar
    push_probability: f64,
    /// Chance of a chromatic approach into the next chord when walking
    approach_probability: f64,
}

impl Default for BassConfig {
    fn default() -> Self {
        Self {
            gate: 0.9,
            push_probability: 0.3,
            approach_probability: 0.5,
        }
    }
}

/// Bass generator
#[derive(Debug, Clone, Default)]
pub struct BassGenerator {
    config: BassConfig,
}

impl BassGenerator {
    /// Create a new bass generator
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory function for registry
    pub fn create() -> Box<dyn PartGenerator> {
        Box::new(Self::new())
    }

    fn root_and_fifth(&self, ctx: &GeneratorContext<'_>, pool: &[f64], rng: &mut StdRng, bar: f64) -> Vec<Note> {
        let beat = ctx.grid.seconds_per_beat();
        let root = closest_frequency(ctx.chord_root_at(bar), pool);
        let fifth = closest_frequency(root * 1.5, pool);
        let mut notes = Vec::new();

        let mut hit = |freq: f64, offset: f64, length: f64, velocity: f64| {
            if let Some(note) = ctx.place(freq, bar + offset, length * self.config.gate) {
                notes.push(note.with_velocity(velocity));
            }
        };

        if rng.gen::<f64>() < ctx.style.rest_probability * 0.5 {
            // Sparse bar: one long root
            hit(root, 0.0, beat * 4.0, 0.9);
            return notes;
        }
        hit(root, 0.0, beat * 1.5, 1.0);
        hit(root, beat * 1.5, beat * 0.5, 0.7);
        hit(fifth, beat * 2.0, beat, 0.85);
        if rng.gen::<f64>() < self.config.push_probability {
            hit(root, beat * 3.0, beat * 0.5, 0.8);
            hit(closest_frequency(root * 2.0, pool), beat * 3.5, beat * 0.5, 0.75);
        } else {
            hit(root, beat * 3.0, beat, 0.8);
        }
        notes
    }

    fn walk(&self, ctx: &GeneratorContext<'_>, pool: &[f64], rng: &mut StdRng, bar: f64) -> Vec<Note> {
        let beat = ctx.grid.seconds_per_beat();
        let bar_len = ctx.grid.bar_seconds();
        let mut index = closest_index(ctx.chord_root_at(bar), pool);
        let target_freq = ctx.chord_root_at(bar + bar_len);
        let target = closest_index(target_freq, pool);
        let mut notes = Vec::new();

        for b in 0..4 {
            let time = bar + b as f64 * beat;
            let freq = if b == 3 && rng.gen::<f64>() < self.config.approach_probability {
                let below = rng.gen_bool(0.5);
                let approach = pool[target] * semitone_ratio(if below { -1.0 } else { 1.0 });
                ctx.instrument.clamp_freq(approach)
            } else {
                pool[index]
            };
            if let Some(note) = ctx.place(freq, time, beat * self.config.gate) {
                notes.push(note.with_velocity(if b == 0 { 1.0 } else { 0.8 }));
            }

            index = if index < target {
                index + 1
            } else if index > target {
                index - 1
            } else if index + 1 < pool.len() && (index == 0 || rng.gen_bool(0.5)) {
                index + 1
            } else {
                index.saturating_sub(1)
            };
        }
        notes
    }
}

impl PartGenerator for BassGenerator {
    fn name(&self) -> &'static str {
        "bass"
    }

    fn compose(&mut self, ctx: &GeneratorContext<'_>, rng: &mut StdRng) -> Vec<Note> {
        let pool = ctx.pool();
        let bar_len = ctx.grid.bar_seconds();
        let end = ctx.section.end_time();
        let mut notes = Vec::new();
        let mut bar = ctx.section.start_time();
        while bar < end - TIME_EPSILON {
            let mut bar_notes = if ctx.style.walking_bass {
                self.walk(ctx, &pool, rng, bar)
            } else {
                self.root_and_fifth(ctx, &pool, rng, bar)
            };
            notes.append(&mut bar_notes);
            bar += bar_len;
        }
        notes
    }
}
