// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Tempo grid with sixteenth-note resolution.
//!
//! Converts between beats, bars, grid steps and seconds, snaps times to
//! the grid and computes swing offsets for off-beat steps.

/// Grid steps per quarter note (sixteenth-note resolution)
pub const STEPS_PER_BEAT: u32 = 4;

/// Grid steps per 4/4 bar
pub const STEPS_PER_BAR: u32 = STEPS_PER_BEAT * 4;

/// Tempo grid for one song
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoGrid {
    /// Tempo in BPM
    bpm: f64,
    /// Beats per bar (time signature numerator)
    beats_per_bar: u8,
}

impl Default for TempoGrid {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            beats_per_bar: 4,
        }
    }
}

impl TempoGrid {
    /// Create a grid at the given tempo; invalid tempos fall back to 120 BPM
    pub fn new(bpm: f64) -> Self {
        let bpm = if bpm.is_finite() && bpm > 0.0 {
            bpm.clamp(20.0, 400.0)
        } else {
            120.0
        };
        Self {
            bpm,
            ..Default::default()
        }
    }

    /// Get the tempo
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Get beats per bar
    pub fn beats_per_bar(&self) -> u8 {
        self.beats_per_bar
    }

    /// Seconds per quarter note
    pub fn seconds_per_beat(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Seconds per grid step (sixteenth note)
    pub fn step_seconds(&self) -> f64 {
        self.seconds_per_beat() / STEPS_PER_BEAT as f64
    }

    /// Seconds per bar
    pub fn bar_seconds(&self) -> f64 {
        self.seconds_per_beat() * self.beats_per_bar as f64
    }

    /// Convert a length in beats to seconds
    pub fn beats_to_seconds(&self, beats: f64) -> f64 {
        beats * self.seconds_per_beat()
    }

    /// Number of whole grid steps in a span of seconds (rounded to nearest)
    pub fn seconds_to_steps(&self, seconds: f64) -> u64 {
        if !seconds.is_finite() || seconds <= 0.0 {
            return 0;
        }
        (seconds / self.step_seconds()).round() as u64
    }

    /// Time of a grid step relative to an origin
    pub fn step_time(&self, origin: f64, step: u64) -> f64 {
        origin + step as f64 * self.step_seconds()
    }

    /// Snap an absolute time to the grid anchored at `origin`
    pub fn snap(&self, origin: f64, time: f64) -> f64 {
        let offset = (time - origin).max(0.0);
        self.step_time(origin, self.seconds_to_steps(offset))
    }

    /// Snap a duration to a whole number of steps (at least one)
    pub fn snap_duration(&self, seconds: f64) -> f64 {
        self.seconds_to_steps(seconds).max(1) as f64 * self.step_seconds()
    }

    /// Delay applied to an off-beat eighth for the given swing amount (0.0 - 1.0)
    pub fn swing_offset(&self, step: u64, swing: f64) -> f64 {
        if step % 4 == 2 {
            swing.clamp(0.0, 1.0) * self.step_seconds() * 0.66
        } else {
            0.0
        }
    }

    /// Number of whole bars in a span of seconds
    pub fn bars_in(&self, seconds: f64) -> u64 {
        (seconds / self.bar_seconds()).floor().max(0.0) as u64
    }
}
