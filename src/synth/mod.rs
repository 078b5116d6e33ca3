// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Synthesis engine.
//!
//! `wave` is the single entry point: it clamps the frequency to the
//! instrument's range, evaluates the instrument's raw sample and runs
//! it through the voice's protector. Whole-note rendering and the
//! sample cache are built on top of it.

pub mod cache;
pub mod discovery;
pub mod dsp;
pub mod instruments;
pub mod voice;

pub use cache::SampleCache;
pub use discovery::discover_instruments;
pub use instruments::{Instrument, InstrumentSpec, Role, SpatialClass};
pub use voice::Voice;

/// Output sample rate
pub const DEFAULT_SAMPLE_RATE: f64 = 44100.0;

/// Synthesize one sample, `t` seconds into a note.
///
/// Returns 0 outside `[0, duration + tail)` and for non-finite input;
/// otherwise the result lies within the instrument's max gain.
pub fn wave(instrument: &dyn Instrument, voice: &mut Voice, t: f64, freq: f64, duration: f64) -> f32 {
    let spec = instrument.spec();
    if !t.is_finite() || !duration.is_finite() || duration <= 0.0 {
        return 0.0;
    }
    let total = duration + spec.tail;
    if t < 0.0 || t >= total {
        return 0.0;
    }
    let freq = spec.clamp_freq(freq);
    let raw = instrument.raw(voice, t, freq, duration);
    voice.protector.process(raw, t, total, spec.max_gain) as f32
}

/// Render a whole note (duration plus tail) into a new buffer
pub fn render_note(
    instrument: &dyn Instrument,
    freq: f64,
    duration: f64,
    phoneme: Option<u8>,
    open: bool,
    sample_rate: f64,
) -> Vec<f32> {
    if !duration.is_finite() || duration <= 0.0 {
        return Vec::new();
    }
    let mut voice = Voice::new(sample_rate, note_seed(freq, duration));
    voice.start(note_seed(freq, duration), phoneme, open);
    let dt = voice.dt();
    let frames = ((duration + instrument.spec().tail) / dt).ceil() as usize;
    (0..frames)
        .map(|i| wave(instrument, &mut voice, i as f64 * dt, freq, duration))
        .collect()
}

/// Deterministic noise seed derived from note parameters
pub fn note_seed(freq: f64, duration: f64) -> u64 {
    freq.to_bits() ^ duration.to_bits().rotate_left(17)
}
