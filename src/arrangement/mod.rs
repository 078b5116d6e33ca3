// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Song document model.
//!
//! This module provides:
//! - Song: global parameters, sections and parts
//! - Part: one instrument's notes, effects and automation in a section
//! - Codec: the `.song` text format

pub mod codec;
pub mod part;
pub mod song;

pub use codec::{next_song_path, parse_song, parse_song_with_diagnostics, write_song, ParseError};
pub use part::{Automation, Effects, Note, Part, ValidationError};
pub use song::{ordinal, Section, SectionTemplate, Song, TIME_EPSILON};
