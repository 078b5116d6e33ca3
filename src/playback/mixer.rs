// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Eight-channel spatial bus.
//!
//! Channel order is `[L, R, C, LFE, Ls, Rs, Lsb, Rsb]`. Parts are spread
//! onto the bus by constant-power pan gains weighted by their
//! instrument's spatial class; the master stage applies the song-wide
//! fades and clamps, and stereo sinks receive a fixed downmix.

use std::f64::consts::FRAC_PI_4;

use crate::synth::SpatialClass;

/// Bus channel count
pub const BUS_CHANNELS: usize = 8;

/// Master fade length at the start and end of a song (seconds)
pub const MASTER_FADE: f64 = 5.0;

/// Bus channel indices
pub const LEFT: usize = 0;
pub const RIGHT: usize = 1;
pub const CENTER: usize = 2;
pub const LFE: usize = 3;
pub const SIDE_LEFT: usize = 4;
pub const SIDE_RIGHT: usize = 5;
pub const BACK_LEFT: usize = 6;
pub const BACK_RIGHT: usize = 7;

const DOWNMIX_CENTER: f32 = 0.707;
const DOWNMIX_SURROUND: f32 = 0.5;

/// One frame of the bus
pub type BusFrame = [f32; BUS_CHANNELS];

/// Constant-power gains for a pan position in -1.0 (left) ..= 1.0 (right)
#[inline]
pub fn pan_gains(pan: f64) -> (f64, f64) {
    let pan = if pan.is_finite() { pan.clamp(-1.0, 1.0) } else { 0.0 };
    let angle = (pan + 1.0) * FRAC_PI_4;
    (angle.cos(), angle.sin())
}

/// Add a mono sample onto a bus frame
#[inline]
pub fn spread(frame: &mut [f32], sample: f64, pan: f64, class: SpatialClass) {
    let (l, r) = pan_gains(pan);
    let mut add = |channel: usize, gain: f64| frame[channel] += (sample * gain) as f32;
    match class {
        SpatialClass::Front => {
            add(LEFT, l);
            add(RIGHT, r);
        }
        SpatialClass::Center => {
            add(CENTER, 0.8);
            add(LEFT, 0.3 * l);
            add(RIGHT, 0.3 * r);
        }
        SpatialClass::Low => {
            add(LFE, 0.7);
            add(LEFT, 0.6 * l);
            add(RIGHT, 0.6 * r);
        }
        SpatialClass::Wide => {
            add(LEFT, 0.7 * l);
            add(RIGHT, 0.7 * r);
            add(SIDE_LEFT, 0.5 * l);
            add(SIDE_RIGHT, 0.5 * r);
            add(BACK_LEFT, 0.35 * l);
            add(BACK_RIGHT, 0.35 * r);
        }
    }
}

/// Song-wide gain: linear fade in over the first and out over the last `MASTER_FADE` seconds
#[inline]
pub fn master_gain(t: f64, duration: f64) -> f64 {
    if !t.is_finite() || t <= 0.0 || t >= duration {
        return 0.0;
    }
    (t / MASTER_FADE).min((duration - t) / MASTER_FADE).min(1.0)
}

/// Fold a bus frame down to stereo; channels are clamped before and after the fold
#[inline]
pub fn downmix_stereo(frame: &BusFrame) -> (f32, f32) {
    let frame = frame.map(|s| s.clamp(-1.0, 1.0));
    let shared = DOWNMIX_CENTER * frame[CENTER] + DOWNMIX_CENTER * frame[LFE];
    let left = frame[LEFT] + shared + DOWNMIX_SURROUND * (frame[SIDE_LEFT] + frame[BACK_LEFT]);
    let right = frame[RIGHT] + shared + DOWNMIX_SURROUND * (frame[SIDE_RIGHT] + frame[BACK_RIGHT]);
    (left.clamp(-1.0, 1.0), right.clamp(-1.0, 1.0))
}

/// Write a clamped bus frame into an interleaved output frame of any width
#[inline]
pub fn write_frame(frame: &BusFrame, out: &mut [f32]) {
    match out.len() {
        BUS_CHANNELS => {
            for (o, s) in out.iter_mut().zip(frame.iter()) {
                *o = s.clamp(-1.0, 1.0);
            }
        }
        2 => {
            let (l, r) = downmix_stereo(frame);
            out[0] = l;
            out[1] = r;
        }
        1 => {
            let (l, r) = downmix_stereo(frame);
            out[0] = 0.5 * (l + r);
        }
        _ => {
            for (i, o) in out.iter_mut().enumerate() {
                *o = frame.get(i).map_or(0.0, |s| s.clamp(-1.0, 1.0));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pan_is_constant_power() {
        for pan in [-1.0, -0.5, 0.0, 0.3, 1.0] {
            let (l, r) = pan_gains(pan);
            assert!((l * l + r * r - 1.0).abs() < 1e-12);
        }
        let (l, r) = pan_gains(-1.0);
        assert!((l - 1.0).abs() < 1e-12 && r.abs() < 1e-12);
        assert_eq!(pan_gains(f64::NAN), pan_gains(0.0));
    }

    #[test]
    fn test_spread_by_spatial_class() {
        let mut frame = [0.0f32; BUS_CHANNELS];
        spread(&mut frame, 1.0, 0.0, SpatialClass::Center);
        assert!(frame[CENTER] > frame[LEFT]);
        assert_eq!(frame[LFE], 0.0);

        let mut frame = [0.0f32; BUS_CHANNELS];
        spread(&mut frame, 1.0, 0.0, SpatialClass::Low);
        assert!(frame[LFE] > 0.0);
        assert_eq!(frame[SIDE_LEFT], 0.0);

        let mut frame = [0.0f32; BUS_CHANNELS];
        spread(&mut frame, 1.0, -1.0, SpatialClass::Wide);
        assert!(frame[SIDE_LEFT] > 0.0 && frame[BACK_LEFT] > 0.0);
        assert!(frame[SIDE_RIGHT].abs() < 1e-6);

        let mut frame = [0.0f32; BUS_CHANNELS];
        spread(&mut frame, 1.0, 1.0, SpatialClass::Front);
        assert!(frame[LEFT].abs() < 1e-6 && (frame[RIGHT] - 1.0).abs() < 1e-6);
        assert!(frame[2..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_master_gain_fades() {
        assert_eq!(master_gain(0.0, 60.0), 0.0);
        assert!((master_gain(2.5, 60.0) - 0.5).abs() < 1e-12);
        assert_eq!(master_gain(30.0, 60.0), 1.0);
        assert!((master_gain(57.5, 60.0) - 0.5).abs() < 1e-12);
        assert_eq!(master_gain(60.0, 60.0), 0.0);
        assert_eq!(master_gain(70.0, 60.0), 0.0);
        // short songs never reach full level
        assert!(master_gain(3.0, 6.0) <= 0.6 + 1e-12);
    }

    #[test]
    fn test_downmix_coefficients() {
        let mut frame = [0.0f32; BUS_CHANNELS];
        frame[CENTER] = 0.2;
        frame[LFE] = 0.1;
        frame[SIDE_LEFT] = 0.2;
        frame[BACK_RIGHT] = 0.4;
        let (l, r) = downmix_stereo(&frame);
        assert!((l - (0.707 * 0.3 + 0.1)).abs() < 1e-6);
        assert!((r - (0.707 * 0.3 + 0.2)).abs() < 1e-6);

        let loud = [1.0f32; BUS_CHANNELS];
        assert_eq!(downmix_stereo(&loud), (1.0, 1.0));
    }

    #[test]
    fn test_downmix_clamps_bus_before_folding() {
        let mut frame = [0.0f32; BUS_CHANNELS];
        frame[LEFT] = 2.0;
        frame[SIDE_LEFT] = -1.0;
        let (l, r) = downmix_stereo(&frame);
        assert!((l - 0.5).abs() < 1e-6);
        assert_eq!(r, 0.0);

        let mut stereo = [0.0f32; 2];
        write_frame(&frame, &mut stereo);
        assert!((stereo[0] - 0.5).abs() < 1e-6);

        frame[CENTER] = -3.0;
        frame[RIGHT] = 4.0;
        let (_, r) = downmix_stereo(&frame);
        assert!((r - (1.0 - 0.707)).abs() < 1e-6);
    }

    #[test]
    fn test_write_frame_widths() {
        let mut frame = [0.0f32; BUS_CHANNELS];
        frame[LEFT] = 2.0;
        frame[BACK_RIGHT] = -0.5;

        let mut eight = [0.0f32; 8];
        write_frame(&frame, &mut eight);
        assert_eq!(eight[LEFT], 1.0);
        assert_eq!(eight[BACK_RIGHT], -0.5);

        let mut stereo = [0.0f32; 2];
        write_frame(&frame, &mut stereo);
        assert_eq!(stereo[0], 1.0);
        assert!((stereo[1] + 0.25).abs() < 1e-6);

        let mut six = [9.0f32; 6];
        write_frame(&frame, &mut six);
        assert_eq!(six[0], 1.0);
        assert_eq!(six[5], 0.0);
    }
}
