// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Vocal line generator.
//!
//! Sings in two-bar phrases that alternate between the chest and head
//! register. Every note carries a phoneme: the vowel index, plus eight in
//! the head register. Phrases open on a chord tone, move by scale steps
//! and breathe for the last beat.

use rand::rngs::StdRng;
use rand::Rng;

use super::{weighted_index, GeneratorContext, PartGenerator};
use crate::arrangement::{Note, TIME_EPSILON};
use crate::music::{closest_frequency, closest_index};
use crate::synth::instruments::vocal::VOWELS;

/// Bars per phrase
pub const PHRASE_BARS: u32 = 2;

/// Vocal generator
#[derive(Debug, Clone)]
pub struct VocalGenerator {
    /// Portion of each slot the note sounds
    gate: f64,
    /// Chance a note keeps the previous vowel
    vowel_hold: f64,
}

impl Default for VocalGenerator {
    fn default() -> Self {
        Self {
            gate: 0.95,
            vowel_hold: 0.4,
        }
    }
}

impl VocalGenerator {
    /// Create a new vocal generator
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory function for registry
    pub fn create() -> Box<dyn PartGenerator> {
        Box::new(Self::new())
    }

    /// Phoneme for a vowel in a register (0 = chest, 1 = head)
    pub fn phoneme(vowel: u8, register: u8) -> u8 {
        vowel % VOWELS + VOWELS * (register % 2)
    }
}

impl PartGenerator for VocalGenerator {
    fn name(&self) -> &'static str {
        "vocal"
    }

    fn compose(&mut self, ctx: &GeneratorContext<'_>, rng: &mut StdRng) -> Vec<Note> {
        let style = ctx.style;
        let pool = ctx.pool();
        let len = pool.len();
        let beat = ctx.grid.seconds_per_beat();
        let phrase_len = ctx.grid.bar_seconds() * PHRASE_BARS as f64;
        let end = ctx.section.end_time();

        let mut notes = Vec::new();
        let mut phrase_start = ctx.section.start_time();
        let mut register = 0u8;
        let mut vowel = rng.gen_range(0..VOWELS);

        while phrase_start < end - TIME_EPSILON {
            let breath = (phrase_start + phrase_len - beat).min(end);
            let mut t = phrase_start;

            // Phrase opens on a chord tone
            let tones = ctx.chord_at(t, 0);
            let mut index = closest_index(closest_frequency(ctx.chord_root_at(t), &tones), &pool);

            while t < breath - TIME_EPSILON {
                let duration = ctx.draw_duration(rng).min(breath - t);
                if t > phrase_start && rng.gen::<f64>() < style.rest_probability {
                    t += duration;
                    continue;
                }
                if rng.gen::<f64>() >= self.vowel_hold {
                    vowel = rng.gen_range(0..VOWELS);
                }
                if let Some(note) = ctx.place(pool[index], t, duration * self.gate) {
                    let velocity = if t == phrase_start { 0.9 } else { 0.8 };
                    notes.push(
                        note.with_phoneme(Self::phoneme(vowel, register))
                            .with_velocity(velocity),
                    );
                }
                t += duration;

                let size = weighted_index(&style.step_weights, rng).map(|i| i + 1).unwrap_or(1);
                index = if rng.gen_bool(0.5) {
                    (index + size).min(len - 1)
                } else {
                    index.saturating_sub(size)
                };
            }

            phrase_start += phrase_len;
            register ^= 1;
        }
        notes
    }
}
