// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Biquad and one-pole filters.
//!
//! Biquad coefficients follow the Audio EQ Cookbook and are only
//! recomputed when the requested kind, cutoff or Q actually changes.

use std::f64::consts::PI;

/// Biquad response type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Lowpass,
    Highpass,
    /// Band-pass with 0 dB peak gain
    Bandpass,
}

/// Normalized biquad coefficients
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    /// Pass-through
    pub const IDENTITY: BiquadCoeffs = BiquadCoeffs {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Compute coefficients for a response
    pub fn new(kind: FilterKind, cutoff: f64, q: f64, sample_rate: f64) -> Self {
        let q = q.max(0.5);
        let omega = 2.0 * PI * cutoff / sample_rate;
        let (sin_omega, cos_omega) = omega.sin_cos();
        let alpha = sin_omega / (2.0 * q);

        let (b0, b1, b2) = match kind {
            FilterKind::Lowpass => ((1.0 - cos_omega) / 2.0, 1.0 - cos_omega, (1.0 - cos_omega) / 2.0),
            FilterKind::Highpass => ((1.0 + cos_omega) / 2.0, -(1.0 + cos_omega), (1.0 + cos_omega) / 2.0),
            FilterKind::Bandpass => (alpha, 0.0, -alpha),
        };
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

/// Direct-form I biquad with cached parameters
#[derive(Debug, Clone)]
pub struct Biquad {
    sample_rate: f64,
    coeffs: BiquadCoeffs,
    kind: Option<FilterKind>,
    cutoff: f64,
    q: f64,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl Biquad {
    /// Create a pass-through filter
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            coeffs: BiquadCoeffs::IDENTITY,
            kind: None,
            cutoff: 0.0,
            q: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Set the response; coefficients are recomputed only on change
    pub fn set(&mut self, kind: FilterKind, cutoff: f64, q: f64) {
        let nyquist_guard = self.sample_rate * 0.45;
        let cutoff = if cutoff.is_finite() {
            cutoff.clamp(10.0, nyquist_guard)
        } else {
            nyquist_guard
        };
        let q = if q.is_finite() { q } else { 0.707 };

        let changed = self.kind != Some(kind)
            || (cutoff - self.cutoff).abs() > 1e-3
            || (q - self.q).abs() > 1e-6;
        if changed {
            self.kind = Some(kind);
            self.cutoff = cutoff;
            self.q = q;
            self.coeffs = BiquadCoeffs::new(kind, cutoff, q, self.sample_rate);
        }
    }

    /// Current cutoff (0 when unset)
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Current coefficients
    pub fn coeffs(&self) -> BiquadCoeffs {
        self.coeffs
    }

    /// Process one sample
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let c = &self.coeffs;
        let mut output = c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;
        if !output.is_finite() {
            self.reset();
            output = 0.0;
        }
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;
        output
    }

    /// Clear delay lines and cached parameters
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    /// Copy delay-line state from another filter (parameters untouched)
    pub fn copy_state(&mut self, other: &Biquad) {
        self.x1 = other.x1;
        self.x2 = other.x2;
        self.y1 = other.y1;
        self.y2 = other.y2;
    }
}

/// One-pole smoothing filter
#[derive(Debug, Clone)]
pub struct OnePole {
    sample_rate: f64,
    coeff: f64,
    cutoff: f64,
    state: f64,
}

impl OnePole {
    /// Create a one-pole low-pass at `cutoff` Hz
    pub fn new(cutoff: f64, sample_rate: f64) -> Self {
        let mut filter = Self {
            sample_rate,
            coeff: 1.0,
            cutoff: 0.0,
            state: 0.0,
        };
        filter.set_cutoff(cutoff);
        filter
    }

    /// Change cutoff; no work when unchanged
    pub fn set_cutoff(&mut self, cutoff: f64) {
        let cutoff = cutoff.clamp(1.0, self.sample_rate * 0.45);
        if (cutoff - self.cutoff).abs() > 1e-3 {
            self.cutoff = cutoff;
            self.coeff = 1.0 - (-2.0 * PI * cutoff / self.sample_rate).exp();
        }
    }

    /// Low-pass output
    #[inline]
    pub fn lowpass(&mut self, input: f64) -> f64 {
        self.state += self.coeff * (input - self.state);
        self.state
    }

    /// High-pass output (input minus the low-passed signal)
    #[inline]
    pub fn highpass(&mut self, input: f64) -> f64 {
        input - self.lowpass(input)
    }

    /// Clear state
    pub fn reset(&mut self) {
        self.state = 0.0;
    }
}

/// A formant: band-pass at a centre frequency with a given bandwidth
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Formant {
    /// Centre frequency in Hz
    pub center: f64,
    /// Bandwidth in Hz
    pub bandwidth: f64,
}

impl Formant {
    pub const fn new(center: f64, bandwidth: f64) -> Self {
        Self { center, bandwidth }
    }

    /// Equivalent Q
    pub fn q(&self) -> f64 {
        self.center / self.bandwidth.max(1.0)
    }
}

/// Two parallel band-pass filters shaping a vowel
#[derive(Debug, Clone)]
pub struct FormantBank {
    filters: [Biquad; 2],
    gains: [f64; 2],
}

impl FormantBank {
    /// Create an unconfigured bank
    pub fn new(sample_rate: f64) -> Self {
        Self {
            filters: [Biquad::new(sample_rate), Biquad::new(sample_rate)],
            gains: [1.0, 0.7],
        }
    }

    /// Tune both formants
    pub fn set(&mut self, first: Formant, second: Formant) {
        self.filters[0].set(FilterKind::Bandpass, first.center, first.q());
        self.filters[1].set(FilterKind::Bandpass, second.center, second.q());
    }

    /// Process one sample
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let a = self.filters[0].process(input) * self.gains[0];
        let b = self.filters[1].process(input) * self.gains[1];
        (a + b) / (self.gains[0] + self.gains[1])
    }

    /// Take over another bank's filter memory
    pub fn copy_state(&mut self, other: &FormantBank) {
        for (mine, theirs) in self.filters.iter_mut().zip(other.filters.iter()) {
            mine.copy_state(theirs);
        }
    }

    /// Clear state
    pub fn reset(&mut self) {
        for filter in &mut self.filters {
            filter.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 44100.0;

    fn sine_rms(filter: &mut Biquad, freq: f64) -> f64 {
        let n = 8820;
        let mut sum = 0.0;
        for i in 0..n {
            let x = (2.0 * PI * freq * i as f64 / SR).sin();
            let y = filter.process(x);
            if i > n / 2 {
                sum += y * y;
            }
        }
        (sum / (n / 2) as f64).sqrt()
    }

    #[test]
    fn test_lowpass_attenuates_highs() {
        let mut low = Biquad::new(SR);
        low.set(FilterKind::Lowpass, 500.0, 0.707);
        let mut high = low.clone();
        assert!(sine_rms(&mut low, 100.0) > 0.6);
        assert!(sine_rms(&mut high, 8000.0) < 0.05);
    }

    #[test]
    fn test_highpass_attenuates_lows() {
        let mut filter = Biquad::new(SR);
        filter.set(FilterKind::Highpass, 2000.0, 0.707);
        assert!(sine_rms(&mut filter, 100.0) < 0.05);
    }

    #[test]
    fn test_bandpass_peak_is_unity() {
        let mut filter = Biquad::new(SR);
        filter.set(FilterKind::Bandpass, 1000.0, 4.0);
        let rms = sine_rms(&mut filter, 1000.0);
        assert!((rms - std::f64::consts::FRAC_1_SQRT_2).abs() < 0.05);
    }

    #[test]
    fn test_coefficients_cached() {
        let mut filter = Biquad::new(SR);
        filter.set(FilterKind::Lowpass, 1000.0, 0.707);
        let before = filter.coeffs();
        filter.set(FilterKind::Lowpass, 1000.0 + 1e-6, 0.707);
        assert_eq!(filter.coeffs(), before);
        filter.set(FilterKind::Lowpass, 2000.0, 0.707);
        assert_ne!(filter.coeffs(), before);
    }

    #[test]
    fn test_cutoff_clamped_below_nyquist() {
        let mut filter = Biquad::new(SR);
        filter.set(FilterKind::Lowpass, 1e9, 0.707);
        assert!(filter.cutoff() <= SR * 0.45);
        filter.set(FilterKind::Lowpass, f64::NAN, 0.707);
        assert!(filter.cutoff().is_finite());
    }

    #[test]
    fn test_one_pole_converges() {
        let mut filter = OnePole::new(50.0, SR);
        let mut y = 0.0;
        for _ in 0..44100 {
            y = filter.lowpass(1.0);
        }
        assert!((y - 1.0).abs() < 1e-6);
        assert!(filter.highpass(1.0).abs() < 1e-6);
    }

    #[test]
    fn test_formant_bank_copy_state() {
        let mut a = FormantBank::new(SR);
        a.set(Formant::new(700.0, 110.0), Formant::new(1220.0, 120.0));
        for i in 0..100 {
            a.process((i as f64 * 0.1).sin());
        }
        let mut b = FormantBank::new(SR);
        b.set(Formant::new(700.0, 110.0), Formant::new(1220.0, 120.0));
        b.copy_state(&a);
        assert_eq!(a.process(0.0), b.process(0.0));
    }
}
