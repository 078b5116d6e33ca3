// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Output protector applied to every synthesized sample.
//!
//! DC block, linear fade over the last 10 ms of the note, `tanh` soft
//! clip and a hard limit at the instrument's maximum gain.

use std::f64::consts::PI;

/// Length of the end-of-note fade (seconds)
pub const END_FADE: f64 = 0.010;

/// DC blocker corner frequency (Hz)
const DC_CORNER: f64 = 20.0;

/// Per-voice protector state
#[derive(Debug, Clone)]
pub struct Protector {
    r: f64,
    x1: f64,
    y1: f64,
}

impl Protector {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            r: 1.0 - 2.0 * PI * DC_CORNER / sample_rate,
            x1: 0.0,
            y1: 0.0,
        }
    }

    /// Protect one sample at `t` seconds into a sound lasting `total` seconds
    #[inline]
    pub fn process(&mut self, input: f64, t: f64, total: f64, max_gain: f64) -> f64 {
        let input = if input.is_finite() { input } else { 0.0 };
        let mut y = input - self.x1 + self.r * self.y1;
        self.x1 = input;
        self.y1 = y;

        let remaining = total - t;
        if remaining < END_FADE {
            y *= (remaining / END_FADE).clamp(0.0, 1.0);
        }

        let limit = max_gain.clamp(0.0, 1.0);
        y.tanh().clamp(-limit, limit)
    }

    /// Clear filter memory
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.y1 = 0.0;
    }
}
