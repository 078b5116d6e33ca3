// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Melodic generator: a weighted walk over the scale with motif development.
//!
//! Each step is a rest, a scale step, a chromatic passing tone, a leap to
//! the nearest chord tone, or a replay of the section's opening motif
//! anchored on the current chord root (optionally inverted or reversed).

use rand::rngs::StdRng;
use rand::Rng;

use super::{weighted_index, GeneratorContext, PartGenerator};
use crate::arrangement::{Note, TIME_EPSILON};
use crate::music::{closest_frequency, closest_index, semitone_ratio};

/// Motif transformation types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotifTransform {
    /// Play as recorded
    Original,
    /// Mirror the steps (up becomes down)
    Invert,
    /// Play backwards
    Retrograde,
}

/// A short melodic fragment in pool steps relative to its first note
#[derive(Debug, Clone, PartialEq)]
pub struct Motif {
    steps: Vec<i32>,
    durations: Vec<f64>,
}

impl Motif {
    fn new() -> Self {
        Self {
            steps: Vec::new(),
            durations: Vec::new(),
        }
    }

    fn push(&mut self, step: i32, duration: f64) {
        self.steps.push(step);
        self.durations.push(duration);
    }

    /// Number of notes
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Transformed copy
    pub fn transform(&self, transform: MotifTransform) -> Self {
        match transform {
            MotifTransform::Original => self.clone(),
            MotifTransform::Invert => Self {
                steps: self.steps.iter().map(|s| -s).collect(),
                durations: self.durations.clone(),
            },
            MotifTransform::Retrograde => {
                let first = self.steps.last().copied().unwrap_or(0);
                Self {
                    steps: self.steps.iter().rev().map(|s| s - first).collect(),
                    durations: self.durations.iter().rev().copied().collect(),
                }
            }
        }
    }
}

/// Configuration for melody generator
#[derive(Debug, Clone)]
struct MelodyConfig {
    /// Portion of each slot the note sounds
    gate: f64,
    /// Notes recorded into the motif
    motif_length: usize,
    /// Base velocity
    velocity: f64,
    /// Velocity variation
    velocity_variation: f64,
}

impl Default for MelodyConfig {
    fn default() -> Self {
        Self {
            gate: 0.9,
            motif_length: 4,
            velocity: 0.85,
            velocity_variation: 0.1,
        }
    }
}

/// Melody generator
#[derive(Debug, Clone, Default)]
pub struct MelodyGenerator {
    config: MelodyConfig,
}

impl MelodyGenerator {
    /// Create a new melody generator
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory function for registry
    pub fn create() -> Box<dyn PartGenerator> {
        Box::new(Self::new())
    }

    fn random_velocity(&self, rng: &mut StdRng) -> f64 {
        let var = self.config.velocity_variation;
        (self.config.velocity + rng.gen_range(-var..=var)).clamp(0.0, 1.0)
    }

    fn choose_transform(rng: &mut StdRng) -> MotifTransform {
        let roll = rng.gen::<f64>();
        if roll < 0.6 {
            MotifTransform::Original
        } else if roll < 0.8 {
            MotifTransform::Invert
        } else {
            MotifTransform::Retrograde
        }
    }

    /// Next pool index for a scale step from `index`
    fn step(ctx: &GeneratorContext<'_>, index: usize, len: usize, rng: &mut StdRng) -> usize {
        let size = weighted_index(&ctx.style.step_weights, rng).map(|i| i + 1).unwrap_or(1);
        // Lean back toward the middle near the edges of the pool
        let up = if index < len / 4 {
            true
        } else if index + len / 4 >= len {
            false
        } else {
            rng.gen_bool(0.5)
        };
        if up {
            (index + size).min(len - 1)
        } else {
            index.saturating_sub(size)
        }
    }
}

impl PartGenerator for MelodyGenerator {
    fn name(&self) -> &'static str {
        "melody"
    }

    fn compose(&mut self, ctx: &GeneratorContext<'_>, rng: &mut StdRng) -> Vec<Note> {
        let style = ctx.style;
        let pool = ctx.pool();
        let len = pool.len();
        let end = ctx.section.end_time();

        let mut notes = Vec::new();
        let mut t = ctx.section.start_time();
        let mut index = closest_index(ctx.chord_root_at(t), &pool);
        let mut motif = Motif::new();
        let mut motif_origin = index as i32;

        while t < end - TIME_EPSILON {
            // Replay the motif once it is complete
            if motif.len() >= self.config.motif_length && rng.gen::<f64>() < style.motif_probability {
                let anchor = closest_index(ctx.chord_root_at(t), &pool) as i32;
                let variant = motif.transform(Self::choose_transform(rng));
                for (&step, &duration) in variant.steps.iter().zip(&variant.durations) {
                    if t >= end - TIME_EPSILON {
                        break;
                    }
                    index = (anchor + step).clamp(0, len as i32 - 1) as usize;
                    if let Some(note) = ctx.place(pool[index], t, duration * self.config.gate) {
                        notes.push(note.with_velocity(self.random_velocity(rng)));
                    }
                    t += duration;
                }
                continue;
            }

            let duration = ctx.draw_duration(rng);
            if rng.gen::<f64>() < style.rest_probability {
                t += duration;
                continue;
            }

            let roll = rng.gen::<f64>();
            let freq = if roll < style.chromatic_probability && index + 1 < len {
                // Passing tone a semitone above, resolving upward
                let passing = pool[index] * semitone_ratio(1.0);
                index += 1;
                passing
            } else if roll < style.chromatic_probability + style.chord_tone_probability {
                let tones = ctx.chord_at(t, 0);
                let target = closest_frequency(pool[index], &tones);
                index = closest_index(target, &pool);
                pool[index]
            } else {
                index = Self::step(ctx, index, len, rng);
                pool[index]
            };

            if motif.len() < self.config.motif_length {
                if motif.is_empty() {
                    motif_origin = index as i32;
                }
                motif.push(index as i32 - motif_origin, duration);
            }

            if let Some(note) = ctx.place(freq, t, duration * self.config.gate) {
                notes.push(note.with_velocity(self.random_velocity(rng)));
            }
            t += duration;
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
    fn test_motif_transforms() {
        let mut motif = Motif::new();
        motif.push(0, 0.5);
        motif.push(2, 0.25);
        motif.push(1, 1.0);

        assert_eq!(motif.transform(MotifTransform::Invert).steps, vec![0, -2, -1]);
        let retro = motif.transform(MotifTransform::Retrograde);
        assert_eq!(retro.steps, vec![0, 1, -1]);
        assert_eq!(retro.durations, vec![1.0, 0.25, 0.5]);
        assert_eq!(motif.transform(MotifTransform::Original), motif);
    }

    #[test]
    fn test_melody_stays_in_scale_window() {
        let style = StyleProfile {
            chromatic_probability: 0.0,
            ..StyleProfile::default()
        };
        let verse = Section::new("Verse", SectionTemplate::Verse, 0.0, 30.0).unwrap();
        let spec = instruments::spec("flute").unwrap();
        let ctx = GeneratorContext::new(&style, "major", 220.0, 110.0, 30.0, &verse, spec, &[0, 3, 4]);
        let pool = ctx.pool();
        let mut rng = StdRng::seed_from_u64(12);

        let notes = MelodyGenerator::new().compose(&ctx, &mut rng);
        assert!(notes.len() > 10);
        for note in &notes {
            assert!(pool.iter().any(|f| (f - note.freq).abs() < 1e-9));
        }
        for pair in notes.windows(2) {
            assert!(pair[0].start_time < pair[1].start_time);
        }
    }

    #[test]
    fn test_all_rests() {
        let style = StyleProfile {
            rest_probability: 1.0,
            motif_probability: 0.0,
            ..StyleProfile::default()
        };
        let verse = Section::new("Verse", SectionTemplate::Verse, 0.0, 10.0).unwrap();
        let spec = instruments::spec("violin").unwrap();
        let ctx = GeneratorContext::new(&style, "dorian", 196.0, 120.0, 10.0, &verse, spec, &[0]);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(MelodyGenerator::new().compose(&ctx, &mut rng).is_empty());
    }
}
