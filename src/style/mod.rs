// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Per-genre style profiles.
//!
//! A `StyleProfile` is a pure lookup table: tempo range, scale weights,
//! instrument inclusion weights and conditional boosts, section plans,
//! note-length histogram and the per-genre knobs the generators read.
//! Nothing here draws random numbers.

mod builtin;

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::arrangement::SectionTemplate;
use crate::music::ChordStyle;

/// Note lengths (in beats) indexed by `StyleProfile::duration_weights`
pub const DURATION_BUCKETS: [f64; 8] = [0.25, 0.5, 0.75, 1.0, 1.5, 2.0, 3.0, 4.0];

/// Genre used when a lookup misses
pub const DEFAULT_GENRE: &str = "pop";

/// A named entry with a relative weight
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Weighted {
    /// Scale or instrument name
    pub name: String,
    /// Relative weight (scales) or inclusion probability (instruments)
    pub weight: f64,
}

impl Weighted {
    /// Create a new weighted entry
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }
}

/// "If `when` was already chosen, raise the chance of `raise`"
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Boost {
    /// Instrument that must already be in the section
    pub when: String,
    /// Instrument whose inclusion probability is raised
    pub raise: String,
    /// Added probability
    pub amount: f64,
}

/// Step pattern for one percussion instrument
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrumPattern {
    /// Percussion instrument name
    pub instrument: String,
    /// Hit positions in quarter-beat steps (0-15 within a 4/4 bar)
    #[serde(default)]
    pub steps: Vec<u8>,
    /// Only play on bars divisible by this (1 = every bar)
    #[serde(default = "default_every_bars")]
    pub every_bars: u32,
    /// Extra hits on the last bar of a section
    #[serde(default)]
    pub fill_steps: Vec<u8>,
}

fn default_every_bars() -> u32 {
    1
}

/// Parameters for one genre
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StyleProfile {
    /// Genre key
    pub genre: String,
    /// Tempo range in BPM (inclusive)
    pub bpm_range: (f64, f64),
    /// Weighted scale names
    pub scales: Vec<Weighted>,
    /// Base inclusion probability per instrument (table order is preserved)
    pub instruments: Vec<Weighted>,
    /// Conditional inclusion boosts
    pub boosts: Vec<Boost>,
    /// Canned section orders
    pub section_plans: Vec<Vec<SectionTemplate>>,
    /// Templates that may be spliced in when extending a plan
    pub vocabulary: Vec<SectionTemplate>,
    /// Weights over `DURATION_BUCKETS`
    pub duration_weights: [f64; 8],
    /// Probability of a rest at each walk step
    pub rest_probability: f64,
    /// Weights for scale-step sizes 1..=4
    pub step_weights: [f64; 4],
    /// Probability of a chromatic passing tone
    pub chromatic_probability: f64,
    /// Probability of landing on a chord tone
    pub chord_tone_probability: f64,
    /// Probability of replaying the section motif
    pub motif_probability: f64,
    /// Chord voicing
    pub chord_style: ChordStyle,
    /// Chord progressions as 0-based scale degrees
    pub progressions: Vec<Vec<i32>>,
    /// Bars each chord lasts
    pub bars_per_chord: u32,
    /// Swing amount (0.0 - 1.0)
    pub swing: f64,
    /// Probability of nudging a drum hit off the grid position
    pub syncopation: f64,
    /// Percussion step patterns
    pub drum_patterns: Vec<DrumPattern>,
    /// Steps where hi-hats ring open
    pub open_hat_steps: Vec<u8>,
    /// Frequency window for chord tones (Hz)
    pub chord_range: (f64, f64),
    /// Bass walks scale steps instead of holding roots
    pub walking_bass: bool,
    /// Grid steps per arpeggio note
    pub arp_rate: u32,
    /// Distortion drive for instruments that accept it (0 = off)
    pub distortion: f64,
    /// Base reverb send
    pub reverb_amount: f64,
}

impl Default for StyleProfile {
    fn default() -> Self {
        builtin::pop()
    }
}

impl StyleProfile {
    /// Base inclusion weight of an instrument (0 when absent)
    pub fn instrument_weight(&self, name: &str) -> f64 {
        self.instruments
            .iter()
            .find(|w| w.name == name)
            .map(|w| w.weight)
            .unwrap_or(0.0)
    }

    /// Whether a scale name is part of this genre's scale set
    pub fn has_scale(&self, name: &str) -> bool {
        self.scales.iter().any(|w| w.name == name)
    }

    /// Pattern for a percussion instrument, if the genre defines one
    pub fn drum_pattern(&self, instrument: &str) -> Option<&DrumPattern> {
        self.drum_patterns.iter().find(|p| p.instrument == instrument)
    }

    /// Sum of all boosts that apply to `instrument` given the already chosen set
    pub fn boost_for(&self, instrument: &str, chosen: &[String]) -> f64 {
        self.boosts
            .iter()
            .filter(|b| b.raise == instrument && chosen.iter().any(|c| *c == b.when))
            .map(|b| b.amount)
            .sum()
    }

    /// Drop every reference to instruments outside `available`
    fn retain_instruments(&mut self, available: &HashSet<String>) -> Vec<String> {
        let removed: Vec<String> = self
            .instruments
            .iter()
            .filter(|w| !available.contains(&w.name))
            .map(|w| w.name.clone())
            .collect();

        self.instruments.retain(|w| available.contains(&w.name));
        self.boosts
            .retain(|b| available.contains(&b.when) && available.contains(&b.raise));
        self.drum_patterns
            .retain(|p| available.contains(&p.instrument));
        removed
    }
}

/// Table of style profiles keyed by genre
#[derive(Debug, Clone)]
pub struct StyleBook {
    profiles: BTreeMap<String, StyleProfile>,
    fallback: StyleProfile,
}

impl Default for StyleBook {
    fn default() -> Self {
        Self::builtin()
    }
}

impl StyleBook {
    /// Create a book holding every built-in genre
    pub fn builtin() -> Self {
        let profiles = builtin::all()
            .into_iter()
            .map(|p| (p.genre.clone(), p))
            .collect();
        Self {
            profiles,
            fallback: builtin::pop(),
        }
    }

    /// Normalize a genre key ("Hip-Hop" -> "hiphop")
    pub fn normalize(genre: &str) -> String {
        genre
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect()
    }

    /// Exact lookup
    pub fn lookup(&self, genre: &str) -> Option<&StyleProfile> {
        self.profiles.get(&Self::normalize(genre))
    }

    /// Lookup with fallback to the default profile
    pub fn profile(&self, genre: &str) -> &StyleProfile {
        self.lookup(genre).unwrap_or(&self.fallback)
    }

    /// Lookup that logs when the default profile is substituted
    pub fn resolve(&self, genre: &str) -> &StyleProfile {
        match self.lookup(genre) {
            Some(profile) => profile,
            None => {
                warn!(genre, fallback = DEFAULT_GENRE, "unknown genre, using default style");
                &self.fallback
            }
        }
    }

    /// List known genres
    pub fn genres(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }

    /// Add or replace a profile
    pub fn insert(&mut self, profile: StyleProfile) {
        let key = Self::normalize(&profile.genre);
        self.profiles.insert(key, profile);
    }

    /// Parse YAML overrides (a map of genre -> profile) and merge them in
    pub fn apply_overrides_yaml(&mut self, yaml: &str) -> Result<usize> {
        let overrides: BTreeMap<String, StyleProfile> =
            serde_yaml::from_str(yaml).context("Failed to parse style overrides YAML")?;
        let count = overrides.len();
        for (genre, mut profile) in overrides {
            profile.genre = Self::normalize(&genre);
            debug!(genre = %profile.genre, "style override loaded");
            self.insert(profile);
        }
        Ok(count)
    }

    /// Load YAML overrides from a file
    pub fn load_overrides<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read style file: {:?}", path.as_ref()))?;
        self.apply_overrides_yaml(&contents)
    }

    /// Remove instruments that are not available on this system.
    ///
    /// Profiles that would lose every instrument keep their table so
    /// generation still has something to work with.
    pub fn validate(&mut self, available: &[String]) {
        let available: HashSet<String> = available.iter().cloned().collect();
        for profile in self
            .profiles
            .values_mut()
            .chain(std::iter::once(&mut self.fallback))
        {
            let mut candidate = profile.clone();
            let removed = candidate.retain_instruments(&available);
            if removed.is_empty() {
                continue;
            }
            if candidate.instruments.is_empty() {
                warn!(genre = %profile.genre, "no listed instrument is available, keeping table");
                continue;
            }
            warn!(genre = %profile.genre, ?removed, "instruments unavailable, removed from style");
            *profile = candidate;
        }
    }
}
