// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Scale tables and frequency pools.
//!
//! Provides scale definitions, pitch-class roots, equal-tempered
//! frequency math and nearest-frequency snapping against a pool of
//! scale tones.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Frequency of A4 in Hz
pub const A4_HZ: f64 = 440.0;

/// Note names (pitch classes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Note {
    C,
    Cs, // C# / Db
    D,
    Ds, // D# / Eb
    E,
    F,
    Fs, // F# / Gb
    G,
    Gs, // G# / Ab
    A,
    As, // A# / Bb
    B,
}

impl Note {
    /// All notes in chromatic order
    pub const ALL: [Note; 12] = [
        Note::C,
        Note::Cs,
        Note::D,
        Note::Ds,
        Note::E,
        Note::F,
        Note::Fs,
        Note::G,
        Note::Gs,
        Note::A,
        Note::As,
        Note::B,
    ];

    /// Get the pitch class (0-11) for this note
    pub fn pitch_class(self) -> u8 {
        Note::ALL.iter().position(|&n| n == self).unwrap_or(0) as u8
    }

    /// Get note from pitch class
    pub fn from_pitch_class(pc: u8) -> Self {
        Note::ALL[(pc % 12) as usize]
    }

    /// Frequency of this pitch class in the given octave (A4 = 440 Hz)
    pub fn frequency(self, octave: i32) -> f64 {
        let midi = (octave + 1) * 12 + self.pitch_class() as i32;
        A4_HZ * semitone_ratio((midi - 69) as f64)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Note::C => "C",
            Note::Cs => "C#",
            Note::D => "D",
            Note::Ds => "D#",
            Note::E => "E",
            Note::F => "F",
            Note::Fs => "F#",
            Note::G => "G",
            Note::Gs => "G#",
            Note::A => "A",
            Note::As => "A#",
            Note::B => "B",
        };
        write!(f, "{}", name)
    }
}

/// Scale types supported by the composer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleType {
    // Major scale and modes
    Major,        // Ionian
    Dorian,       // Minor with raised 6th
    Phrygian,     // Minor with lowered 2nd
    Lydian,       // Major with raised 4th
    Mixolydian,   // Major with lowered 7th
    NaturalMinor, // Aeolian
    Locrian,      // Diminished

    // Other minor scales
    HarmonicMinor,
    MelodicMinor, // Ascending form

    // Pentatonic scales
    MajorPentatonic,
    MinorPentatonic,

    // Blues
    Blues,
    MajorBlues,

    // Symmetric scales
    WholeTone,
    Diminished, // Half-whole
    Chromatic,
}

impl ScaleType {
    /// Every built-in scale type
    pub const ALL: [ScaleType; 16] = [
        ScaleType::Major,
        ScaleType::Dorian,
        ScaleType::Phrygian,
        ScaleType::Lydian,
        ScaleType::Mixolydian,
        ScaleType::NaturalMinor,
        ScaleType::Locrian,
        ScaleType::HarmonicMinor,
        ScaleType::MelodicMinor,
        ScaleType::MajorPentatonic,
        ScaleType::MinorPentatonic,
        ScaleType::Blues,
        ScaleType::MajorBlues,
        ScaleType::WholeTone,
        ScaleType::Diminished,
        ScaleType::Chromatic,
    ];

    /// Get the intervals (semitones from root) for this scale type
    pub fn intervals(self) -> &'static [u8] {
        match self {
            // Major and modes
            ScaleType::Major => &[0, 2, 4, 5, 7, 9, 11],
            ScaleType::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            ScaleType::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            ScaleType::Lydian => &[0, 2, 4, 6, 7, 9, 11],
            ScaleType::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            ScaleType::NaturalMinor => &[0, 2, 3, 5, 7, 8, 10],
            ScaleType::Locrian => &[0, 1, 3, 5, 6, 8, 10],

            // Other minor scales
            ScaleType::HarmonicMinor => &[0, 2, 3, 5, 7, 8, 11],
            ScaleType::MelodicMinor => &[0, 2, 3, 5, 7, 9, 11],

            // Pentatonic
            ScaleType::MajorPentatonic => &[0, 2, 4, 7, 9],
            ScaleType::MinorPentatonic => &[0, 3, 5, 7, 10],

            // Blues
            ScaleType::Blues => &[0, 3, 5, 6, 7, 10],
            ScaleType::MajorBlues => &[0, 2, 3, 4, 7, 9],

            // Symmetric scales
            ScaleType::WholeTone => &[0, 2, 4, 6, 8, 10],
            ScaleType::Diminished => &[0, 1, 3, 4, 6, 7, 9, 10],
            ScaleType::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
        }
    }

    /// Parse scale type from string
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase().replace([' ', '-', '_'], "");
        match s.as_str() {
            "major" | "ionian" => Some(ScaleType::Major),
            "dorian" => Some(ScaleType::Dorian),
            "phrygian" => Some(ScaleType::Phrygian),
            "lydian" => Some(ScaleType::Lydian),
            "mixolydian" => Some(ScaleType::Mixolydian),
            "minor" | "naturalminor" | "aeolian" => Some(ScaleType::NaturalMinor),
            "locrian" => Some(ScaleType::Locrian),
            "harmonicminor" => Some(ScaleType::HarmonicMinor),
            "melodicminor" => Some(ScaleType::MelodicMinor),
            "majorpentatonic" | "pentatonicmajor" => Some(ScaleType::MajorPentatonic),
            "minorpentatonic" | "pentatonicminor" | "pentatonic" => Some(ScaleType::MinorPentatonic),
            "blues" | "minorblues" => Some(ScaleType::Blues),
            "majorblues" => Some(ScaleType::MajorBlues),
            "wholetone" => Some(ScaleType::WholeTone),
            "diminished" | "octatonic" | "halfwhole" => Some(ScaleType::Diminished),
            "chromatic" => Some(ScaleType::Chromatic),
            _ => None,
        }
    }

    /// Identifier used in `.song` files and style tables
    pub fn key(self) -> &'static str {
        match self {
            ScaleType::Major => "major",
            ScaleType::Dorian => "dorian",
            ScaleType::Phrygian => "phrygian",
            ScaleType::Lydian => "lydian",
            ScaleType::Mixolydian => "mixolydian",
            ScaleType::NaturalMinor => "natural_minor",
            ScaleType::Locrian => "locrian",
            ScaleType::HarmonicMinor => "harmonic_minor",
            ScaleType::MelodicMinor => "melodic_minor",
            ScaleType::MajorPentatonic => "major_pentatonic",
            ScaleType::MinorPentatonic => "minor_pentatonic",
            ScaleType::Blues => "blues",
            ScaleType::MajorBlues => "major_blues",
            ScaleType::WholeTone => "whole_tone",
            ScaleType::Diminished => "diminished",
            ScaleType::Chromatic => "chromatic",
        }
    }

    /// Get a human-readable name for this scale type
    pub fn name(self) -> &'static str {
        match self {
            ScaleType::Major => "Major",
            ScaleType::Dorian => "Dorian",
            ScaleType::Phrygian => "Phrygian",
            ScaleType::Lydian => "Lydian",
            ScaleType::Mixolydian => "Mixolydian",
            ScaleType::NaturalMinor => "Natural Minor",
            ScaleType::Locrian => "Locrian",
            ScaleType::HarmonicMinor => "Harmonic Minor",
            ScaleType::MelodicMinor => "Melodic Minor",
            ScaleType::MajorPentatonic => "Major Pentatonic",
            ScaleType::MinorPentatonic => "Minor Pentatonic",
            ScaleType::Blues => "Blues",
            ScaleType::MajorBlues => "Major Blues",
            ScaleType::WholeTone => "Whole Tone",
            ScaleType::Diminished => "Diminished",
            ScaleType::Chromatic => "Chromatic",
        }
    }

    /// Semitone offset of a 0-based scale degree, wrapping into higher octaves
    pub fn semitone_at(self, degree: i32) -> i32 {
        let intervals = self.intervals();
        let len = intervals.len() as i32;
        let octave = degree.div_euclid(len);
        let step = degree.rem_euclid(len) as usize;
        octave * 12 + intervals[step] as i32
    }
}

impl fmt::Display for ScaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Frequency ratio for a (possibly fractional) number of semitones
pub fn semitone_ratio(semitones: f64) -> f64 {
    2f64.powf(semitones / 12.0)
}

/// Transpose a frequency by semitones
pub fn transpose(freq: f64, semitones: f64) -> f64 {
    freq * semitone_ratio(semitones)
}

/// Return the pool entry nearest to `target`.
///
/// A non-finite or non-positive target yields `pool[0]`. An empty pool
/// hands the target back unchanged.
pub fn closest_frequency(target: f64, pool: &[f64]) -> f64 {
    let Some(&first) = pool.first() else {
        return target;
    };
    if !target.is_finite() || target <= 0.0 {
        return first;
    }

    let mut best = first;
    let mut best_dist = (target - first).abs();
    for &freq in &pool[1..] {
        let dist = (target - freq).abs();
        if dist < best_dist {
            best = freq;
            best_dist = dist;
        }
    }
    best
}

/// Index of the pool entry nearest to `target`
pub fn closest_index(target: f64, pool: &[f64]) -> usize {
    if pool.is_empty() || !target.is_finite() || target <= 0.0 {
        return 0;
    }
    pool.iter()
        .enumerate()
        .fold((0usize, f64::INFINITY), |(best, dist), (i, &f)| {
            let d = (target - f).abs();
            if d < dist {
                (i, d)
            } else {
                (best, dist)
            }
        })
        .0
}

/// A scale anchored to a root frequency
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    scale_type: ScaleType,
    root_freq: f64,
}

impl Scale {
    /// Create a new scale from type and root frequency
    pub fn new(scale_type: ScaleType, root_freq: f64) -> Self {
        Self {
            scale_type,
            root_freq,
        }
    }

    /// Parse a scale by name; `None` when the name is unknown
    pub fn parse(name: &str, root_freq: f64) -> Option<Self> {
        ScaleType::from_str(name).map(|st| Scale::new(st, root_freq))
    }

    /// Get the scale type
    pub fn scale_type(&self) -> ScaleType {
        self.scale_type
    }

    /// Get the root frequency
    pub fn root_freq(&self) -> f64 {
        self.root_freq
    }

    /// Number of tones per octave
    pub fn len(&self) -> usize {
        self.scale_type.intervals().len()
    }

    /// Scales always hold at least one tone
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Frequency of a 0-based scale degree (may be negative or exceed one octave)
    pub fn degree_frequency(&self, degree: i32) -> f64 {
        transpose(self.root_freq, self.scale_type.semitone_at(degree) as f64)
    }

    /// All scale tones inside `[low, high]`, ascending. Never empty.
    pub fn frequency_pool(&self, low: f64, high: f64) -> Vec<f64> {
        frequency_pool(self.scale_type, self.root_freq, low, high)
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {:.2} Hz", self.scale_type, self.root_freq)
    }
}

/// Every tone of `scale_type` rooted at `root_freq` inside `[low, high]`.
///
/// When the window holds no scale tone the root is folded into it by
/// octaves (or `low` is used when even that fails) so the pool is never
/// empty.
pub fn frequency_pool(scale_type: ScaleType, root_freq: f64, low: f64, high: f64) -> Vec<f64> {
    let (low, high) = if low <= high { (low, high) } else { (high, low) };
    let mut pool = Vec::new();

    if root_freq.is_finite() && root_freq > 0.0 && low > 0.0 && high.is_finite() {
        // Octave of the root relative to the bottom of the window
        let start_octave = (low / root_freq).log2().floor() as i32 - 1;
        let end_octave = (high / root_freq).log2().ceil() as i32 + 1;
        for octave in start_octave..=end_octave {
            for &interval in scale_type.intervals() {
                let semis = octave * 12 + interval as i32;
                let freq = transpose(root_freq, semis as f64);
                if freq >= low && freq <= high {
                    pool.push(freq);
                }
            }
        }
    }

    if pool.is_empty() {
        pool.push(fold_into_range(root_freq, low, high));
    }
    pool.sort_by(|a, b| a.total_cmp(b));
    pool.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
    pool
}

/// Move `freq` by whole octaves until it lies in `[low, high]`
pub fn fold_into_range(freq: f64, low: f64, high: f64) -> f64 {
    if !freq.is_finite() || freq <= 0.0 || low <= 0.0 {
        return low.max(1.0);
    }
    let mut f = freq;
    while f < low {
        f *= 2.0;
    }
    while f > high && f / 2.0 >= low {
        f /= 2.0;
    }
    f.clamp(low, high)
}
