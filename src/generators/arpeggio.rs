// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Arpeggiator generator.
//!
//! Cycles through the current chord's tones (plus the root an octave up
//! when it fits) at the genre's arpeggio rate, in one of four patterns
//! picked per section.

use rand::rngs::StdRng;
use rand::Rng;

use super::{GeneratorContext, PartGenerator};
use crate::arrangement::{Note, TIME_EPSILON};
use crate::timing::STEPS_PER_BEAT;

/// Arpeggio pattern types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpPattern {
    /// Play notes ascending
    Up,
    /// Play notes descending
    Down,
    /// Play up then down
    UpDown,
    /// Random note selection
    Random,
}

impl ArpPattern {
    /// All patterns
    pub const ALL: [ArpPattern; 4] = [ArpPattern::Up, ArpPattern::Down, ArpPattern::UpDown, ArpPattern::Random];

    /// Tone index for a position in the cycle; `len` must be non-zero
    pub fn index(self, position: usize, len: usize, rng: &mut StdRng) -> usize {
        match self {
            ArpPattern::Up => position % len,
            ArpPattern::Down => len - 1 - position % len,
            ArpPattern::UpDown => {
                if len < 2 {
                    return 0;
                }
                let period = 2 * len - 2;
                let p = position % period;
                if p < len {
                    p
                } else {
                    period - p
                }
            }
            ArpPattern::Random => rng.gen_range(0..len),
        }
    }
}

/// Arpeggiator generator
#[derive(Debug, Clone)]
pub struct ArpeggioGenerator {
    /// Gate percentage (0.0 - 1.0, portion of note length)
    gate: f64,
    /// Velocity accent on each beat
    accent_velocity: f64,
    /// Base velocity
    velocity: f64,
}

impl Default for ArpeggioGenerator {
    fn default() -> Self {
        Self {
            gate: 0.8,
            accent_velocity: 0.95,
            velocity: 0.75,
        }
    }
}

impl ArpeggioGenerator {
    /// Create a new arpeggiator
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory function for registry
    pub fn create() -> Box<dyn PartGenerator> {
        Box::new(Self::new())
    }
}

impl PartGenerator for ArpeggioGenerator {
    fn name(&self) -> &'static str {
        "arpeggio"
    }

    fn compose(&mut self, ctx: &GeneratorContext<'_>, rng: &mut StdRng) -> Vec<Note> {
        let pattern = ArpPattern::ALL[rng.gen_range(0..ArpPattern::ALL.len())];
        let rate = ctx.style.arp_rate.max(1) as u64;
        let slot = ctx.grid.step_seconds() * rate as f64;
        let (_, high) = ctx.window();
        let start = ctx.section.start_time();
        let end = ctx.section.end_time();

        let mut notes = Vec::new();
        let mut position = 0usize;
        let mut step = 0u64;
        loop {
            let t = ctx.grid.step_time(start, step);
            if t >= end - TIME_EPSILON {
                break;
            }
            let mut tones = ctx.chord_at(t, 0);
            if let Some(&root) = tones.first() {
                if root * 2.0 <= high && !tones.iter().any(|f| (f - root * 2.0).abs() < 1e-6) {
                    tones.push(root * 2.0);
                }
            }
            if !tones.is_empty() {
                let freq = tones[pattern.index(position, tones.len(), rng)];
                let velocity = if step % STEPS_PER_BEAT as u64 == 0 {
                    self.accent_velocity
                } else {
                    self.velocity
                };
                if let Some(note) = ctx.place(freq, t, slot * self.gate) {
                    notes.push(note.with_velocity(velocity));
                }
            }
            position += 1;
            step += rate;
        }
        notes
    }
}
