// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Amplitude envelopes and envelope followers.

/// Attack-decay-sustain-release envelope, evaluated as a function of time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adsr {
    /// Attack time in seconds
    pub attack: f64,
    /// Decay time in seconds
    pub decay: f64,
    /// Sustain level (0.0 - 1.0)
    pub sustain: f64,
    /// Release time in seconds
    pub release: f64,
}

impl Adsr {
    pub const fn new(attack: f64, decay: f64, sustain: f64, release: f64) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }

    /// Level while the note is held
    fn held(&self, t: f64) -> f64 {
        if t < self.attack {
            return t / self.attack;
        }
        let t = t - self.attack;
        if t < self.decay {
            return 1.0 - (1.0 - self.sustain) * (t / self.decay);
        }
        self.sustain
    }

    /// Level at `t` seconds into a note held for `duration` seconds
    pub fn level(&self, t: f64, duration: f64) -> f64 {
        if t < 0.0 {
            return 0.0;
        }
        if t <= duration {
            return self.held(t).clamp(0.0, 1.0);
        }
        let released = t - duration;
        if released >= self.release {
            return 0.0;
        }
        let start = self.held(duration).clamp(0.0, 1.0);
        start * (1.0 - released / self.release)
    }

    /// Seconds after note-off until silence
    pub fn release_time(&self) -> f64 {
        self.release
    }
}

/// Peak follower with separate attack and release smoothing
#[derive(Debug, Clone)]
pub struct EnvelopeFollower {
    attack_coeff: f64,
    release_coeff: f64,
    level: f64,
}

impl EnvelopeFollower {
    /// Create a follower with attack/release times in seconds
    pub fn new(attack: f64, release: f64, sample_rate: f64) -> Self {
        let coeff = |time: f64| (-1.0 / (time.max(1e-5) * sample_rate)).exp();
        Self {
            attack_coeff: coeff(attack),
            release_coeff: coeff(release),
            level: 0.0,
        }
    }

    /// Track one sample, returning the current envelope
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let x = input.abs();
        let coeff = if x > self.level {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.level = x + coeff * (self.level - x);
        self.level
    }

    /// Current envelope
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Clear state
    pub fn reset(&mut self) {
        self.level = 0.0;
    }
}
