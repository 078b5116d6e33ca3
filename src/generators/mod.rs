// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Part generators.
//!
//! One generator per instrument role turns a section into a `Part`. The
//! shared skeleton in `PartGenerator::generate` handles template reuse
//! across repeated sections, trimming to the section and automation
//! keyframes; each role only supplies `compose`, the fresh note walk.
//! `finalize` is the song-wide post-pass run once every part exists.

pub mod arpeggio;
pub mod bass;
pub mod chord;
pub mod drums;
pub mod melody;
pub mod vocal;

use std::collections::HashMap;
use std::fmt;

use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, warn};

use crate::arrangement::{Automation, Note, Part, Section, Song, TIME_EPSILON};
use crate::composition::session::SectionTemplateNotes;
use crate::composition::Session;
use crate::music::scale::fold_into_range;
use crate::music::{build_chord, semitone_ratio, Scale, ScaleType};
use crate::style::{StyleProfile, DURATION_BUCKETS};
use crate::synth::dsp::MAX_REVERB_DELAY;
use crate::synth::instruments::{self, InstrumentSpec, Role, SpatialClass};
use crate::timing::TempoGrid;

/// Volume multiplier for repeated or climactic sections
pub const REPEAT_INTENSITY: f64 = 1.2;

/// Chance a reused section is transposed
pub const TRANSPOSE_PROBABILITY: f64 = 1.0 / 3.0;

/// Transposition applied to reused sections (semitones)
pub const TRANSPOSE_SEMITONES: f64 = 2.0;

/// Volume keyframe scale for a section at the very start of the song
pub const PROGRESS_FLOOR: f64 = 0.85;

/// Volume keyframe scale for a section at the very end of the song
pub const PROGRESS_CEILING: f64 = 1.1;

/// Length of the song-wide fade keyframes (seconds)
pub const FADE_SECONDS: f64 = 5.0;

/// Note ceiling for a whole song
pub const MAX_SONG_NOTES: usize = 5000;

/// Note ceiling for one part once the song ceiling is hit
pub const MAX_PART_NOTES: usize = 1000;

/// Percussion volume lift applied before the global mix scale
pub const PERCUSSION_BOOST: f64 = 1.5;

/// Global note volume scale
pub const MIX_SCALE: f64 = 0.75;

/// Shortest note worth keeping after trimming (seconds)
const MIN_NOTE: f64 = 1e-3;

/// Everything a generator may read while composing one section
#[derive(Debug, Clone)]
pub struct GeneratorContext<'a> {
    /// Genre table
    pub style: &'a StyleProfile,
    /// Song scale name as written in the `.song` file
    pub scale_name: &'a str,
    /// Parsed scale anchored at the song root
    pub scale: Scale,
    /// Song length (seconds)
    pub total_duration: f64,
    /// Section being generated
    pub section: &'a Section,
    /// Song tempo grid
    pub grid: TempoGrid,
    /// Instrument the part is for
    pub instrument: &'a InstrumentSpec,
    /// Chord degrees for this section's template
    pub progression: &'a [i32],
}

impl<'a> GeneratorContext<'a> {
    /// Build a context; unknown scale names fall back to major
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        style: &'a StyleProfile,
        scale_name: &'a str,
        root_freq: f64,
        bpm: f64,
        total_duration: f64,
        section: &'a Section,
        instrument: &'a InstrumentSpec,
        progression: &'a [i32],
    ) -> Self {
        let scale = Scale::parse(scale_name, root_freq)
            .unwrap_or_else(|| Scale::new(ScaleType::Major, root_freq));
        Self {
            style,
            scale_name,
            scale,
            total_duration,
            section,
            grid: TempoGrid::new(bpm),
            instrument,
            progression,
        }
    }

    /// Song tempo
    pub fn bpm(&self) -> f64 {
        self.grid.bpm()
    }

    /// Song root frequency
    pub fn root_freq(&self) -> f64 {
        self.scale.root_freq()
    }

    /// Comfortable pitch window: one octave either side of the nominal
    /// frequency, inside the instrument range
    pub fn window(&self) -> (f64, f64) {
        let spec = self.instrument;
        let low = (spec.nominal / 2.0).max(spec.low);
        let high = (spec.nominal * 2.0).min(spec.high);
        if low < high {
            (low, high)
        } else {
            (spec.low, spec.high)
        }
    }

    /// Scale tones inside the pitch window, ascending and never empty
    pub fn pool(&self) -> Vec<f64> {
        let (low, high) = self.window();
        self.scale.frequency_pool(low, high)
    }

    /// Draw a note length from the genre histogram, snapped to the grid
    pub fn draw_duration(&self, rng: &mut StdRng) -> f64 {
        let beats = weighted_index(&self.style.duration_weights, rng)
            .map(|i| DURATION_BUCKETS[i])
            .unwrap_or(1.0);
        self.grid.snap_duration(self.grid.beats_to_seconds(beats))
    }

    /// Seconds each chord of the progression lasts
    pub fn chord_span(&self) -> f64 {
        self.grid.bar_seconds() * self.style.bars_per_chord.max(1) as f64
    }

    /// Progression degree sounding at an absolute time
    pub fn degree_at(&self, time: f64) -> i32 {
        if self.progression.is_empty() {
            return 0;
        }
        let offset = (time - self.section.start_time()).max(0.0);
        let index = (offset / self.chord_span()).floor() as usize;
        self.progression[index % self.progression.len()]
    }

    /// Chord tones at an absolute time, folded into the pitch window
    pub fn chord_at(&self, time: f64, inversion: usize) -> Vec<f64> {
        let (low, high) = self.window();
        let mut tones: Vec<f64> = build_chord(
            self.degree_at(time),
            self.scale_name,
            self.root_freq(),
            self.style,
            inversion,
        )
        .into_iter()
        .map(|f| fold_into_range(f, low, high))
        .collect();
        tones.sort_by(|a, b| a.total_cmp(b));
        tones.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
        tones
    }

    /// Root of the chord at a time, folded into the pitch window
    pub fn chord_root_at(&self, time: f64) -> f64 {
        let (low, high) = self.window();
        fold_into_range(self.scale.degree_frequency(self.degree_at(time)), low, high)
    }

    /// A note clamped to the instrument range and trimmed to the section.
    ///
    /// `None` when the note would start at or after the section end.
    pub fn place(&self, freq: f64, start: f64, duration: f64) -> Option<Note> {
        let end = self.section.end_time();
        let start = start.max(self.section.start_time());
        if start >= end - TIME_EPSILON {
            return None;
        }
        let duration = duration.min(end - start);
        if !(duration >= MIN_NOTE) {
            return None;
        }
        Some(Note::new(self.instrument.clamp_freq(freq), duration, start))
    }
}

/// Index drawn in proportion to non-negative weights; `None` when every weight is zero
pub fn weighted_index(weights: &[f64], rng: &mut StdRng) -> Option<usize> {
    let usable = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
    let total: f64 = weights.iter().map(|&w| usable(w)).sum();
    if total <= 0.0 {
        return None;
    }
    let mut roll = rng.gen::<f64>() * total;
    let mut last = None;
    for (i, &w) in weights.iter().enumerate() {
        let w = usable(w);
        if w <= 0.0 {
            continue;
        }
        last = Some(i);
        roll -= w;
        if roll < 0.0 {
            return Some(i);
        }
    }
    last
}

/// Generator for one instrument role
pub trait PartGenerator: Send {
    /// Generator name for diagnostics
    fn name(&self) -> &'static str;

    /// Fresh notes for `ctx.section`, in absolute song time
    fn compose(&mut self, ctx: &GeneratorContext<'_>, rng: &mut StdRng) -> Vec<Note>;

    /// Generate the part for one section.
    ///
    /// Reusable sections replay the notes stored in the session for the
    /// same instrument and template; everything else is composed fresh.
    fn generate(&mut self, ctx: &GeneratorContext<'_>, session: &mut Session, rng: &mut StdRng) -> Part {
        let section = ctx.section;
        let template = section.template();
        let mut part = base_part(ctx, rng);

        let stored = if template.is_reusable() {
            session.template(ctx.instrument.name, template).cloned()
        } else {
            None
        };

        part.notes = match stored {
            Some(stored) => {
                debug!(
                    "Reusing {} template for {} in {}",
                    template,
                    ctx.instrument.name,
                    section.name()
                );
                reuse_template(ctx, &stored, rng)
            }
            None => {
                let notes = trim_to_section(self.compose(ctx, rng), section);
                session.store_template(
                    ctx.instrument.name,
                    template,
                    section.start_time(),
                    section.end_time(),
                    notes.clone(),
                );
                notes
            }
        };
        part.sort_notes();
        add_section_automation(&mut part, ctx, rng);
        debug!(
            "{} generated {} notes for {} in {}",
            self.name(),
            part.notes.len(),
            ctx.instrument.name,
            section.name()
        );
        part
    }
}

/// Drop notes outside a section and trim the ones that run past its end
pub fn trim_to_section(notes: Vec<Note>, section: &Section) -> Vec<Note> {
    let start = section.start_time();
    let end = section.end_time();
    notes
        .into_iter()
        .filter(|n| n.start_time >= start - TIME_EPSILON && n.start_time < end - TIME_EPSILON)
        .filter_map(|mut n| {
            n.start_time = n.start_time.max(start);
            n.duration = n.duration.min(end - n.start_time);
            (n.duration >= MIN_NOTE && n.validate().is_ok()).then_some(n)
        })
        .collect()
}

/// Replay stored notes in a new section, tiled to fill it
fn reuse_template(ctx: &GeneratorContext<'_>, stored: &SectionTemplateNotes, rng: &mut StdRng) -> Vec<Note> {
    let section = ctx.section;
    let template = section.template();
    let intensity = if section.is_repeat() || template.is_climactic() {
        REPEAT_INTENSITY
    } else {
        1.0
    };
    let ratio = if rng.gen_bool(TRANSPOSE_PROBABILITY) {
        semitone_ratio(TRANSPOSE_SEMITONES)
    } else {
        1.0
    };

    let length = stored.length();
    if length <= 0.0 || stored.notes.is_empty() {
        return Vec::new();
    }

    let mut notes = Vec::new();
    let mut origin = section.start_time();
    while origin < section.end_time() - TIME_EPSILON {
        let shift = origin - stored.origin;
        for note in &stored.notes {
            let mut copy = *note;
            copy.start_time += shift;
            copy.freq = ctx.instrument.clamp_freq(copy.freq * ratio);
            copy.volume = (copy.volume * intensity).min(1.0);
            copy.velocity = (copy.velocity * intensity).min(1.0);
            notes.push(copy);
        }
        origin += length;
    }
    trim_to_section(notes, section)
}

/// Part shell with pan, reverb send and effect settings for the instrument
fn base_part(ctx: &GeneratorContext<'_>, rng: &mut StdRng) -> Part {
    let spec = ctx.instrument;
    let side = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
    let pan = match spec.spatial {
        SpatialClass::Center | SpatialClass::Low => rng.gen_range(-0.1..=0.1),
        SpatialClass::Front => side * rng.gen_range(0.1..=0.4),
        SpatialClass::Wide => side * rng.gen_range(0.4..=0.7),
    };

    let mut part = Part::new(ctx.section.name(), spec.name)
        .with_pan(pan)
        .with_reverb_mix(ctx.style.reverb_amount);

    let fx = &mut part.effects;
    // Only snare and clap get room sound among the drums
    fx.use_reverb = ctx.style.reverb_amount > 0.05
        && (spec.role != Role::Rhythm || matches!(spec.name, "snare" | "clap"));
    fx.reverb_delay = (ctx.grid.seconds_per_beat() * 0.5).min(MAX_REVERB_DELAY);
    fx.reverb_decay = 0.3 + 0.3 * ctx.style.reverb_amount.clamp(0.0, 1.0);
    fx.reverb_mix_factor = 0.5;
    fx.use_distortion = spec.distortable && ctx.style.distortion > 0.0;
    if fx.use_distortion {
        fx.distortion_drive = ctx.style.distortion;
        fx.distortion_threshold = 0.6;
    }
    part
}

/// Four pan/volume/reverb keyframes, one at each quarter of the section
fn add_section_automation(part: &mut Part, ctx: &GeneratorContext<'_>, rng: &mut StdRng) {
    let section = ctx.section;
    let climactic = section.template().is_climactic();
    for quarter in 0..4 {
        let time = section.start_time() + section.duration() * quarter as f64 / 4.0;
        let pan = (part.pan + rng.gen_range(-0.1..=0.1)).clamp(-1.0, 1.0);
        let volume = if climactic {
            rng.gen_range(0.9..=1.0)
        } else {
            rng.gen_range(0.75..=0.95)
        };
        let reverb = (part.reverb_mix + rng.gen_range(-0.05..=0.05)).clamp(0.0, 1.0);
        part.pan_automation.add(time, pan);
        part.volume_automation.add(time, volume);
        part.reverb_automation.add(time, reverb);
    }
    // Later sections play louder
    let lift = PROGRESS_FLOOR + (PROGRESS_CEILING - PROGRESS_FLOOR) * section.progress();
    part.volume_automation.scale_values(lift);
    part.volume_automation.clamp_values(0.0, 1.0);
}

/// Volume curve with song-wide fade-in and fade-out keyframes
fn with_fades(curve: &Automation, total: f64) -> Automation {
    let fade = FADE_SECONDS.min(total / 2.0);
    let fade_in = curve.value_at(fade, 1.0);
    let fade_out = curve.value_at(total - fade, 1.0);

    let mut points = vec![(0.0, 0.0), (fade, fade_in)];
    points.extend(
        curve
            .points()
            .iter()
            .copied()
            .filter(|&(t, _)| t > fade && t < total - fade),
    );
    points.push((total - fade, fade_out));
    points.push((total, 0.0));
    Automation::from_points(points)
}

/// Song-wide post-pass.
///
/// Lifts percussion, scales every note by the mix factor, adds fade
/// keyframes, drops invalid notes, sorts, and enforces the note ceilings.
pub fn finalize(song: &mut Song) {
    let total = song.duration();
    let mut dropped = 0;

    for part in song.parts_mut().iter_mut() {
        let percussion = instruments::role_of(&part.instrument) == Some(Role::Rhythm);
        for note in &mut part.notes {
            if percussion {
                note.volume = (note.volume * PERCUSSION_BOOST).min(1.0);
            }
            note.volume = (note.volume * MIX_SCALE).clamp(0.0, 1.0);
        }
        part.volume_automation = with_fades(&part.volume_automation, total);
        dropped += part.retain_valid_notes(total);
        part.sort_notes();
    }
    if dropped > 0 {
        warn!("Dropped {} invalid notes", dropped);
    }

    let parts = song.parts_mut();
    let note_total: usize = parts.iter().map(|p| p.notes.len()).sum();
    if note_total > MAX_SONG_NOTES && !parts.is_empty() {
        let per_part = (MAX_SONG_NOTES / parts.len()).min(MAX_PART_NOTES);
        warn!(
            "Song has {} notes, capping each of {} parts at {}",
            note_total,
            parts.len(),
            per_part
        );
        for part in parts.iter_mut() {
            part.notes.truncate(per_part);
        }
    }
}

/// Factory function type for creating generators
pub type GeneratorFactory = fn() -> Box<dyn PartGenerator>;

/// Registry of generators keyed by instrument role
#[derive(Default)]
pub struct GeneratorRegistry {
    factories: HashMap<Role, GeneratorFactory>,
}

impl GeneratorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with a generator for every role
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Role::Melody, melody::MelodyGenerator::create);
        registry.register(Role::Bass, bass::BassGenerator::create);
        registry.register(Role::Harmony, chord::ChordGenerator::create);
        registry.register(Role::Arpeggio, arpeggio::ArpeggioGenerator::create);
        registry.register(Role::Rhythm, drums::DrumGenerator::create);
        registry.register(Role::Vocal, vocal::VocalGenerator::create);
        registry
    }

    /// Register a generator factory
    pub fn register(&mut self, role: Role, factory: GeneratorFactory) {
        self.factories.insert(role, factory);
    }

    /// Create the generator for a role
    pub fn create(&self, role: Role) -> Option<Box<dyn PartGenerator>> {
        self.factories.get(&role).map(|factory| factory())
    }

    /// Roles with a registered generator
    pub fn available(&self) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|r| self.factories.contains_key(r))
            .collect()
    }
}

impl fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("roles", &self.available())
            .finish()
    }
}
