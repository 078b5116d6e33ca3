// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Music theory utilities for the composer.
//!
//! This module provides scale tables, frequency pools, nearest-tone
//! snapping and chord construction.

pub mod chord;
pub mod scale;

pub use chord::{build_chord, ChordStyle};
pub use scale::{
    closest_frequency, closest_index, frequency_pool, semitone_ratio, transpose, Note, Scale,
    ScaleType,
};
