// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Per-part effects: soft-clip distortion and a delay-feedback reverb.
//!
//! Each part owns its own instances. Both process one sample at a time
//! and never allocate after construction.

use super::filter::OnePole;

/// Longest reverb delay the buffer is sized for (seconds)
pub const MAX_REVERB_DELAY: f64 = 1.0;

/// Soft-clip distortion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distortion {
    drive: f64,
    threshold: f64,
}

impl Distortion {
    /// Create with input gain and knee threshold (0.05 - 1.0)
    pub fn new(drive: f64, threshold: f64) -> Self {
        let drive = if drive.is_finite() { drive.clamp(1.0, 50.0) } else { 1.0 };
        let threshold = if threshold.is_finite() {
            threshold.clamp(0.05, 1.0)
        } else {
            1.0
        };
        Self { drive, threshold }
    }

    /// Shape one sample; output magnitude never exceeds 1.0
    #[inline]
    pub fn process(&self, input: f64) -> f64 {
        let x = input * self.drive;
        let magnitude = x.abs();
        if magnitude <= self.threshold {
            return x;
        }
        let headroom = 1.0 - self.threshold;
        let shaped = if headroom <= 0.0 {
            self.threshold
        } else {
            self.threshold + headroom * ((magnitude - self.threshold) / headroom).tanh()
        };
        shaped.copysign(x)
    }
}

/// Feedback delay with damping in the loop
#[derive(Debug, Clone)]
pub struct DelayReverb {
    buffer: Vec<f64>,
    write: usize,
    delay_samples: usize,
    decay: f64,
    mix_factor: f64,
    damping: OnePole,
}

impl DelayReverb {
    /// Allocate the delay line for `MAX_REVERB_DELAY` seconds
    pub fn new(delay: f64, decay: f64, mix_factor: f64, sample_rate: f64) -> Self {
        let capacity = (MAX_REVERB_DELAY * sample_rate).ceil().max(2.0) as usize;
        let mut reverb = Self {
            buffer: vec![0.0; capacity],
            write: 0,
            delay_samples: 1,
            decay: 0.0,
            mix_factor: 0.0,
            damping: OnePole::new(5000.0, sample_rate),
        };
        reverb.configure(delay, decay, mix_factor, sample_rate);
        reverb
    }

    /// Change parameters without reallocating
    pub fn configure(&mut self, delay: f64, decay: f64, mix_factor: f64, sample_rate: f64) {
        let delay = if delay.is_finite() { delay } else { 0.25 };
        let samples = (delay * sample_rate).round() as usize;
        self.delay_samples = samples.clamp(1, self.buffer.len() - 1);
        self.decay = if decay.is_finite() { decay.clamp(0.0, 0.95) } else { 0.0 };
        self.mix_factor = if mix_factor.is_finite() {
            mix_factor.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    /// Process one sample with a send level (0.0 - 1.0)
    #[inline]
    pub fn process(&mut self, input: f64, send: f64) -> f64 {
        let len = self.buffer.len();
        let read = (self.write + len - self.delay_samples) % len;
        let delayed = self.buffer[read];
        let fed_back = self.damping.lowpass(input + delayed * self.decay);
        self.buffer[self.write] = if fed_back.is_finite() { fed_back } else { 0.0 };
        self.write = (self.write + 1) % len;
        input + delayed * self.mix_factor * send.clamp(0.0, 1.0)
    }

    /// Whether the delay line still holds audible signal
    pub fn is_ringing(&self) -> bool {
        self.buffer.iter().any(|x| x.abs() > 1e-5)
    }

    /// Clear the delay line
    pub fn reset(&mut self) {
        self.buffer.iter_mut().for_each(|x| *x = 0.0);
        self.damping.reset();
        self.write = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distortion_is_bounded() {
        let dist = Distortion::new(20.0, 0.5);
        for i in -100..=100 {
            let y = dist.process(i as f64 / 10.0);
            assert!(y.abs() <= 1.0);
        }
        assert_eq!(dist.process(0.0), 0.0);
        assert!(dist.process(0.01) > 0.0);
        assert!(dist.process(-0.01) < 0.0);
    }

    #[test]
    fn test_distortion_linear_below_threshold() {
        let dist = Distortion::new(1.0, 0.8);
        assert!((dist.process(0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_reverb_echo_arrives_after_delay() {
        let sr = 1000.0;
        let mut reverb = DelayReverb::new(0.1, 0.5, 1.0, sr);
        let first = reverb.process(1.0, 1.0);
        assert_eq!(first, 1.0);
        let mut echo_at = None;
        for i in 1..200 {
            if reverb.process(0.0, 1.0).abs() > 1e-3 {
                echo_at = Some(i);
                break;
            }
        }
        assert_eq!(echo_at, Some(100));
    }

    #[test]
    fn test_reverb_dry_when_send_zero() {
        let mut reverb = DelayReverb::new(0.01, 0.9, 1.0, 1000.0);
        for i in 0..100 {
            let x = (i as f64 * 0.3).sin();
            assert_eq!(reverb.process(x, 0.0), x);
        }
        assert!(reverb.is_ringing());
        reverb.reset();
        assert!(!reverb.is_ringing());
    }

    #[test]
    fn test_reverb_delay_clamped_to_buffer() {
        let mut reverb = DelayReverb::new(10.0, 0.5, 0.5, 100.0);
        for _ in 0..500 {
            assert!(reverb.process(0.5, 1.0).is_finite());
        }
    }
}
