// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timing module.
//!
//! This module provides the tempo grid used by the generators to place
//! notes on sixteenth-note boundaries.

pub mod grid;

pub use grid::{TempoGrid, STEPS_PER_BAR, STEPS_PER_BEAT};
