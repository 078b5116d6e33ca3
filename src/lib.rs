// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! tunesmith - genre-driven song generator and spatial synthesizer.
//!
//! Songs are planned from a genre's style profile, filled in by
//! per-role generators, stored as `.song` text files and played back
//! through an eight-channel mixer driven by a pull-based audio output.

pub mod arrangement;
pub mod audio;
pub mod composition;
pub mod config;
pub mod generators;
pub mod music;
pub mod playback;
pub mod style;
pub mod synth;
pub mod timing;
