// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chord construction with genre-specific voicings and inversions.
//!
//! Chords are built from scale degrees (or fixed semitone stacks for
//! power and quartal voicings), resolved to frequencies against the
//! song root and snapped to the genre's chord pool.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::scale::{closest_frequency, frequency_pool, transpose, ScaleType};
use crate::style::StyleProfile;

/// Interval set used when stacking a chord
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordStyle {
    /// Diatonic 1-3-5
    Triad,
    /// Diatonic 1-3-5-7
    Seventh,
    /// Diatonic 1-3-5-7-9
    Extended,
    /// Root, fifth and octave
    Power,
    /// Stacked perfect fourths
    Quartal,
    /// Suspended: diatonic 1-4-5
    Sus,
}

impl ChordStyle {
    /// Scale-degree offsets for diatonic chord kinds
    fn degree_offsets(self) -> Option<&'static [i32]> {
        match self {
            ChordStyle::Triad => Some(&[0, 2, 4]),
            ChordStyle::Seventh => Some(&[0, 2, 4, 6]),
            ChordStyle::Extended => Some(&[0, 2, 4, 6, 8]),
            ChordStyle::Sus => Some(&[0, 3, 4]),
            ChordStyle::Power | ChordStyle::Quartal => None,
        }
    }

    /// Semitone offsets above the chord root for fixed stacks
    fn semitone_offsets(self) -> &'static [i32] {
        match self {
            ChordStyle::Power => &[0, 7, 12],
            ChordStyle::Quartal => &[0, 5, 10, 15],
            // Major triad, used as the fail-closed default
            _ => &[0, 4, 7],
        }
    }
}

impl fmt::Display for ChordStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChordStyle::Triad => "triad",
            ChordStyle::Seventh => "seventh",
            ChordStyle::Extended => "extended",
            ChordStyle::Power => "power",
            ChordStyle::Quartal => "quartal",
            ChordStyle::Sus => "sus",
        };
        write!(f, "{}", name)
    }
}

/// Semitone offsets (from the song root) for a chord on a 0-based degree
fn chord_semitones(degree: i32, scale_type: Option<ScaleType>, style: ChordStyle) -> Vec<i32> {
    let Some(scale_type) = scale_type else {
        // Unknown scale: plain major triad on the root
        return ChordStyle::Triad.semitone_offsets().to_vec();
    };

    match style.degree_offsets() {
        Some(offsets) => offsets
            .iter()
            .map(|&o| scale_type.semitone_at(degree + o))
            .collect(),
        None => {
            let base = scale_type.semitone_at(degree);
            style.semitone_offsets().iter().map(|&o| base + o).collect()
        }
    }
}

/// Build a chord on scale degree `degree` (0-based).
///
/// Interval set comes from the style's chord voicing; each tone is
/// snapped to the style's chord pool and the lowest `inversion` notes
/// are raised an octave (clamped to the top of the pool). Unknown scale
/// names fall back to a major triad. The result is never empty, all
/// finite and ascending.
pub fn build_chord(
    degree: i32,
    scale_name: &str,
    root_freq: f64,
    style: &StyleProfile,
    inversion: usize,
) -> Vec<f64> {
    let scale_type = ScaleType::from_str(scale_name);
    let root_freq = if root_freq.is_finite() && root_freq > 0.0 {
        root_freq
    } else {
        220.0
    };

    let (low, high) = style.chord_range;
    let pool = frequency_pool(scale_type.unwrap_or(ScaleType::Chromatic), root_freq, low, high);
    let top = pool.last().copied().unwrap_or(high);

    let mut chord: Vec<f64> = chord_semitones(degree, scale_type, style.chord_style)
        .into_iter()
        .map(|semis| closest_frequency(transpose(root_freq, semis as f64), &pool))
        .collect();
    chord.sort_by(|a, b| a.total_cmp(b));

    let inversion = inversion.min(chord.len().saturating_sub(1));
    for note in chord.iter_mut().take(inversion) {
        let raised = *note * 2.0;
        *note = if raised > top {
            closest_frequency(top, &pool)
        } else {
            closest_frequency(raised, &pool)
        };
    }

    chord.sort_by(|a, b| a.total_cmp(b));
    chord.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
    chord.retain(|f| f.is_finite() && *f > 0.0);
    if chord.is_empty() {
        chord.push(closest_frequency(root_freq, &pool));
    }
    chord
}
