// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Shared DSP building blocks for the instruments and part effects.

pub mod effects;
pub mod envelope;
pub mod filter;
pub mod noise;
pub mod protector;

pub use effects::{DelayReverb, Distortion, MAX_REVERB_DELAY};
pub use envelope::{Adsr, EnvelopeFollower};
pub use filter::{Biquad, BiquadCoeffs, FilterKind, Formant, FormantBank, OnePole};
pub use noise::{Noise, NoiseColor};
pub use protector::{Protector, END_FADE};
