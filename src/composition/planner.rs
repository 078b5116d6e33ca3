// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Composition planner.
//!
//! Turns a genre into a `Song` by walking a fixed sequence of stages:
//! duration, scale, section plan, optional extension, per-section
//! instrument assignment, part dispatch and the song-wide post-pass.
//! All randomness comes from the caller's `StdRng`, so a seed fully
//! determines the result.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use super::Session;
use crate::arrangement::{ordinal, Section, SectionTemplate, Song};
use crate::generators::{finalize, weighted_index, GeneratorContext, GeneratorRegistry};
use crate::style::{StyleBook, StyleProfile};
use crate::synth::instruments;
use crate::timing::TempoGrid;

/// Shortest generated song (seconds)
pub const MIN_SONG_SECONDS: f64 = 180.0;

/// Longest generated song (seconds)
pub const MAX_SONG_SECONDS: f64 = 300.0;

/// Chance the canned section plan is extended
pub const EXTEND_PROBABILITY: f64 = 0.2;

/// Lowest root frequency (A2); roots are drawn from the twelve semitones above it
pub const ROOT_BASE_HZ: f64 = 110.0;

const TITLE_ADJECTIVES: [&str; 16] = [
    "Amber", "Broken", "Crimson", "Distant", "Electric", "Fading", "Golden", "Hollow",
    "Midnight", "Neon", "Quiet", "Restless", "Silver", "Velvet", "Wandering", "Wild",
];

const TITLE_NOUNS: [&str; 16] = [
    "Avenue", "Circuit", "Daydream", "Echo", "Harbor", "Horizon", "Lantern", "Meadow",
    "Mirror", "Orbit", "Rain", "River", "Signal", "Skyline", "Tide", "Voltage",
];

/// Planner stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    DurationPick,
    ScalePick,
    SectionPlanPick,
    Extend,
    InstrumentAssign,
    PartDispatch,
    PostPass,
    Done,
}

impl Stage {
    /// Stage that follows this one
    pub fn next(self) -> Stage {
        match self {
            Stage::DurationPick => Stage::ScalePick,
            Stage::ScalePick => Stage::SectionPlanPick,
            Stage::SectionPlanPick => Stage::Extend,
            Stage::Extend => Stage::InstrumentAssign,
            Stage::InstrumentAssign => Stage::PartDispatch,
            Stage::PartDispatch => Stage::PostPass,
            Stage::PostPass | Stage::Done => Stage::Done,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Planner settings
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    /// Instruments per section (at least one)
    pub max_instruments_per_section: usize,
    /// Channel count written into the song (2 or 8)
    pub channel_count: u16,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_instruments_per_section: 6,
            channel_count: 8,
        }
    }
}

/// Intermediate state while a song is being planned
#[derive(Debug, Default)]
struct Draft {
    duration: f64,
    scale_name: String,
    root_freq: f64,
    bpm: f64,
    title: String,
    plan: Vec<SectionTemplate>,
    sections: Vec<Section>,
    assignments: Vec<Vec<String>>,
    song: Option<Song>,
}

/// Genre-driven song planner
#[derive(Debug)]
pub struct Planner<'a> {
    book: &'a StyleBook,
    registry: GeneratorRegistry,
    config: PlannerConfig,
}

impl<'a> Planner<'a> {
    /// Create a planner over a style book
    pub fn new(book: &'a StyleBook) -> Self {
        Self {
            book,
            registry: GeneratorRegistry::with_builtins(),
            config: PlannerConfig::default(),
        }
    }

    /// Builder: settings
    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    /// Settings
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Compose a song for a genre from a seed
    pub fn compose_seeded(&self, genre: &str, seed: u64) -> Song {
        let mut rng = StdRng::seed_from_u64(seed);
        self.compose(genre, &mut rng)
    }

    /// Compose a song for a genre. Unknown genres use the default profile.
    pub fn compose(&self, genre: &str, rng: &mut StdRng) -> Song {
        let style = self.book.resolve(genre);
        let mut draft = Draft::default();
        let mut session = Session::new();
        let mut stage = Stage::DurationPick;

        while stage != Stage::Done {
            debug!("Planner stage {}", stage);
            self.run_stage(stage, style, &mut draft, &mut session, rng);
            stage = stage.next();
        }

        let song = draft.song.unwrap_or_else(|| Song::new(draft.title.clone(), style.genre.clone()));
        info!(
            "Composed \"{}\" ({}): {} sections, {} parts, {} notes, {:.1}s",
            song.title(),
            song.genre(),
            song.sections().len(),
            song.parts().len(),
            song.note_count(),
            song.duration()
        );
        song
    }

    fn run_stage(&self, stage: Stage, style: &StyleProfile, draft: &mut Draft, session: &mut Session, rng: &mut StdRng) {
        match stage {
            Stage::DurationPick => {
                draft.duration = pick_duration(rng);
                draft.bpm = pick_bpm(style, rng);
                draft.root_freq = pick_root(rng);
                draft.title = pick_title(rng);
            }
            Stage::ScalePick => {
                draft.scale_name = pick_scale(style, rng);
            }
            Stage::SectionPlanPick => {
                draft.plan = pick_plan(style, rng);
            }
            Stage::Extend => {
                if rng.gen_bool(EXTEND_PROBABILITY) {
                    extend_plan(&mut draft.plan, style, rng);
                }
                draft.sections = layout_sections(&draft.plan, draft.duration, draft.bpm, rng);
                for section in &draft.sections {
                    info!(
                        "Section {} {:.1}s - {:.1}s",
                        section.name(),
                        section.start_time(),
                        section.end_time()
                    );
                }
            }
            Stage::InstrumentAssign => {
                draft.assignments = draft
                    .sections
                    .iter()
                    .map(|section| {
                        let chosen = assign_instruments(style, self.config.max_instruments_per_section, rng);
                        debug!("{}: {}", section.name(), chosen.join(", "));
                        chosen
                    })
                    .collect();
            }
            Stage::PartDispatch => {
                let song = self.dispatch(style, draft, session, rng);
                draft.song = Some(song);
            }
            Stage::PostPass => {
                if let Some(song) = draft.song.as_mut() {
                    finalize(song);
                    song.update_progress();
                }
            }
            Stage::Done => {}
        }
    }

    fn dispatch(&self, style: &StyleProfile, draft: &Draft, session: &mut Session, rng: &mut StdRng) -> Song {
        let mut song = Song::new(draft.title.clone(), style.genre.clone())
            .with_bpm(draft.bpm)
            .with_scale(draft.scale_name.clone(), draft.root_freq)
            .with_duration(draft.duration);
        song.set_channel_count(self.config.channel_count);
        for section in &draft.sections {
            song.add_section(section.clone());
        }

        for (section, chosen) in draft.sections.iter().zip(&draft.assignments) {
            for name in chosen {
                let Some(spec) = instruments::spec(name) else {
                    warn!("No synthesis model for '{}', skipping", name);
                    continue;
                };
                let Some(mut generator) = self.registry.create(spec.role) else {
                    warn!("No generator for role {}, skipping {}", spec.role, name);
                    continue;
                };
                let progression = session.progression(section.template(), style, rng);
                let ctx = GeneratorContext::new(
                    style,
                    &draft.scale_name,
                    draft.root_freq,
                    draft.bpm,
                    draft.duration,
                    section,
                    spec,
                    &progression,
                );
                song.add_part(generator.generate(&ctx, session, rng));
            }
        }
        song
    }
}

/// Song length, uniform in the allowed range
pub fn pick_duration(rng: &mut StdRng) -> f64 {
    rng.gen_range(MIN_SONG_SECONDS..=MAX_SONG_SECONDS)
}

/// Tempo, uniform in the genre range
pub fn pick_bpm(style: &StyleProfile, rng: &mut StdRng) -> f64 {
    let (a, b) = style.bpm_range;
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    if !(low.is_finite() && high.is_finite()) || low <= 0.0 {
        return 120.0;
    }
    if low == high {
        return low;
    }
    rng.gen_range(low..=high)
}

/// Root frequency: a random pitch class between A2 and G#3
pub fn pick_root(rng: &mut StdRng) -> f64 {
    let semitone = rng.gen_range(0..12);
    ROOT_BASE_HZ * 2f64.powf(semitone as f64 / 12.0)
}

/// Two random title words
pub fn pick_title(rng: &mut StdRng) -> String {
    let adjective = TITLE_ADJECTIVES[rng.gen_range(0..TITLE_ADJECTIVES.len())];
    let noun = TITLE_NOUNS[rng.gen_range(0..TITLE_NOUNS.len())];
    format!("{} {}", adjective, noun)
}

/// Weighted scale choice; falls back to major when the table is empty
pub fn pick_scale(style: &StyleProfile, rng: &mut StdRng) -> String {
    let weights: Vec<f64> = style.scales.iter().map(|w| w.weight).collect();
    match weighted_index(&weights, rng) {
        Some(i) => style.scales[i].name.clone(),
        None => {
            warn!("Genre {} has no usable scales, using major", style.genre);
            "major".to_string()
        }
    }
}

/// One of the genre's canned section orders
pub fn pick_plan(style: &StyleProfile, rng: &mut StdRng) -> Vec<SectionTemplate> {
    let plans: Vec<&Vec<SectionTemplate>> = style.section_plans.iter().filter(|p| !p.is_empty()).collect();
    if plans.is_empty() {
        return vec![
            SectionTemplate::Intro,
            SectionTemplate::Verse,
            SectionTemplate::Chorus,
            SectionTemplate::Outro,
        ];
    }
    plans[rng.gen_range(0..plans.len())].clone()
}

/// Splice one to four vocabulary sections in before the final section
pub fn extend_plan(plan: &mut Vec<SectionTemplate>, style: &StyleProfile, rng: &mut StdRng) {
    if style.vocabulary.is_empty() || plan.is_empty() {
        return;
    }
    let extra = rng.gen_range(1..=4);
    for _ in 0..extra {
        let template = style.vocabulary[rng.gen_range(0..style.vocabulary.len())];
        let position = rng.gen_range(0..plan.len());
        plan.insert(position, template);
    }
    info!("Extended section plan with {} sections", extra);
}

/// Length range for a section template (seconds)
pub fn section_length_range(template: SectionTemplate) -> (f64, f64) {
    match template {
        SectionTemplate::Intro | SectionTemplate::Outro => (7.0, 10.0),
        SectionTemplate::Bridge | SectionTemplate::Break => (16.0, 32.0),
        _ => (30.0, 42.0),
    }
}

/// Lay the plan out in time so the last section ends exactly at `duration`.
///
/// Boundaries are snapped to whole bars when that keeps every section
/// at least a bar long. If the non-final sections overrun the song they
/// are scaled down so the final section keeps its drawn length.
pub fn layout_sections(plan: &[SectionTemplate], duration: f64, bpm: f64, rng: &mut StdRng) -> Vec<Section> {
    let plan: Vec<SectionTemplate> = if plan.is_empty() {
        vec![SectionTemplate::Verse]
    } else {
        plan.to_vec()
    };
    let mut lengths: Vec<f64> = plan
        .iter()
        .map(|&t| {
            let (low, high) = section_length_range(t);
            rng.gen_range(low..=high)
        })
        .collect();

    let last = lengths.len() - 1;
    let body: f64 = lengths[..last].iter().sum();
    let (final_min, _) = section_length_range(plan[last]);
    if body + final_min.min(duration / 2.0) > duration && body > 0.0 {
        let final_len = lengths[last].min(duration / 2.0);
        let factor = (duration - final_len) / body;
        debug!("Sections overrun the song, scaling by {:.3}", factor);
        for length in &mut lengths[..last] {
            *length *= factor;
        }
    }

    // Section boundaries, the final one pinned to the song end
    let bar = TempoGrid::new(bpm).bar_seconds();
    let mut bounds = Vec::with_capacity(plan.len() + 1);
    bounds.push(0.0);
    let mut acc = 0.0;
    for length in &lengths[..last] {
        acc += length;
        let snapped = (acc / bar).round() * bar;
        let previous = bounds.last().copied().unwrap_or(0.0);
        let boundary = if snapped - previous >= bar && duration - snapped >= bar {
            snapped
        } else {
            acc
        };
        bounds.push(boundary);
    }
    bounds.push(duration);

    let mut counts = std::collections::HashMap::new();
    let mut sections = Vec::with_capacity(plan.len());
    for (i, &template) in plan.iter().enumerate() {
        let count = counts.entry(template).or_insert(0usize);
        *count += 1;
        let name = if *count == 1 {
            template.name().to_string()
        } else {
            format!("{} {}", ordinal(*count), template.name())
        };
        match Section::new(name, template, bounds[i], bounds[i + 1]) {
            Ok(section) => sections.push(section),
            Err(e) => warn!("Skipping {} section: {}", template, e),
        }
    }

    if let Some(section) = sections.last() {
        if (section.end_time() - duration).abs() > 1e-9 {
            warn!("Final section ends at {:.3}s instead of {:.3}s", section.end_time(), duration);
        }
    }
    for section in &mut sections {
        section.set_progress(section.midpoint() / duration);
    }
    sections
}

/// Pick a section's instruments in table order
pub fn assign_instruments(style: &StyleProfile, max: usize, rng: &mut StdRng) -> Vec<String> {
    let max = max.max(1);
    let mut chosen: Vec<String> = Vec::new();
    for entry in &style.instruments {
        if chosen.len() >= max {
            break;
        }
        if chosen.contains(&entry.name) || instruments::lookup(&entry.name).is_none() {
            continue;
        }
        let chance = entry.weight + style.boost_for(&entry.name, &chosen);
        if rng.gen::<f64>() < chance {
            chosen.push(entry.name.clone());
        }
    }

    if chosen.is_empty() {
        let fallback = style
            .instruments
            .iter()
            .filter(|w| instruments::lookup(&w.name).is_some())
            .max_by(|a, b| a.weight.total_cmp(&b.weight))
            .map(|w| w.name.clone())
            .unwrap_or_else(|| "piano".to_string());
        debug!("No instrument drawn, falling back to {}", fallback);
        chosen.push(fallback);
    }
    chosen
}
