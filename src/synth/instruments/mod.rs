// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Instrument table.
//!
//! Every instrument declares its playable range, release tail, spatial
//! class and peak gain, and implements `Instrument::raw`, the
//! unprotected sample function. Three families cover the set:
//! - tonal: additive partial stacks with envelopes, pitch modulation,
//!   noise layers and follower-driven filters
//! - percussion: swept sines and filtered noise bursts
//! - vocal: band-limited sawtooth through a formant bank

pub mod percussion;
pub mod tonal;
pub mod vocal;

use std::fmt;
use std::sync::OnceLock;

use super::voice::Voice;

/// Musical function of an instrument, selects its part generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Melody,
    Bass,
    Harmony,
    Arpeggio,
    Rhythm,
    Vocal,
}

impl Role {
    /// All roles
    pub const ALL: [Role; 6] = [
        Role::Melody,
        Role::Bass,
        Role::Harmony,
        Role::Arpeggio,
        Role::Rhythm,
        Role::Vocal,
    ];

    /// Lowercase name
    pub fn name(self) -> &'static str {
        match self {
            Role::Melody => "melody",
            Role::Bass => "bass",
            Role::Harmony => "harmony",
            Role::Arpeggio => "arpeggio",
            Role::Rhythm => "rhythm",
            Role::Vocal => "vocal",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where an instrument sits on the 8-channel bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpatialClass {
    /// Front left/right only
    Front,
    /// Biased to the centre channel
    Center,
    /// Biased to the LFE channel
    Low,
    /// Spread onto side and back channels
    Wide,
}

/// Static description of an instrument
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstrumentSpec {
    /// Lowercase name used in `.song` files
    pub name: &'static str,
    /// Part generator role
    pub role: Role,
    /// Lowest playable frequency (Hz)
    pub low: f64,
    /// Highest playable frequency (Hz)
    pub high: f64,
    /// Frequency used when the generator does not pick pitches
    pub nominal: f64,
    /// Seconds the instrument keeps sounding after note-off
    pub tail: f64,
    /// Bus placement
    pub spatial: SpatialClass,
    /// Peak output gain (0.0 - 1.0)
    pub max_gain: f64,
    /// Whether part distortion may be enabled
    pub distortable: bool,
}

impl InstrumentSpec {
    /// Clamp a frequency into the playable range
    pub fn clamp_freq(&self, freq: f64) -> f64 {
        if freq.is_finite() {
            freq.clamp(self.low, self.high)
        } else {
            self.nominal
        }
    }

    /// Whether a frequency is playable
    pub fn in_range(&self, freq: f64) -> bool {
        freq.is_finite() && freq >= self.low && freq <= self.high
    }
}

/// A synthesizable instrument
pub trait Instrument: Send + Sync {
    /// Static description
    fn spec(&self) -> &InstrumentSpec;

    /// Raw sample at `t` seconds into a note of `duration` seconds.
    ///
    /// Called once per sample in increasing `t`; state lives in `voice`.
    /// The result is passed through the protector by `synth::wave`.
    fn raw(&self, voice: &mut Voice, t: f64, freq: f64, duration: f64) -> f64;
}

static REGISTRY: OnceLock<Vec<Box<dyn Instrument>>> = OnceLock::new();

fn build() -> Vec<Box<dyn Instrument>> {
    let mut instruments: Vec<Box<dyn Instrument>> = Vec::new();
    for instrument in tonal::all() {
        instruments.push(Box::new(instrument));
    }
    for instrument in percussion::all() {
        instruments.push(Box::new(instrument));
    }
    instruments.push(Box::new(vocal::Vocal::new()));
    instruments
}

/// All built-in instruments
pub fn all() -> &'static [Box<dyn Instrument>] {
    REGISTRY.get_or_init(build)
}

/// Find an instrument by name (case-insensitive)
pub fn lookup(name: &str) -> Option<&'static dyn Instrument> {
    let name = name.trim();
    all()
        .iter()
        .find(|i| i.spec().name.eq_ignore_ascii_case(name))
        .map(|i| i.as_ref())
}

/// Spec for a name
pub fn spec(name: &str) -> Option<&'static InstrumentSpec> {
    lookup(name).map(|i| i.spec())
}

/// Role for a name
pub fn role_of(name: &str) -> Option<Role> {
    spec(name).map(|s| s.role)
}

/// Names of every built-in instrument
pub fn builtin_names() -> Vec<&'static str> {
    all().iter().map(|i| i.spec().name).collect()
}

/// Longest release tail of any instrument
pub fn max_tail() -> f64 {
    all().iter().map(|i| i.spec().tail).fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_every_instrument() {
        let expected = [
            ("piano", Role::Harmony),
            ("electric_piano", Role::Harmony),
            ("organ", Role::Harmony),
            ("pad", Role::Harmony),
            ("acoustic_guitar", Role::Arpeggio),
            ("synth_arp", Role::Arpeggio),
            ("electric_guitar", Role::Harmony),
            ("bass", Role::Bass),
            ("synth_bass", Role::Bass),
            ("violin", Role::Melody),
            ("cello", Role::Melody),
            ("flute", Role::Melody),
            ("saxophone", Role::Melody),
            ("trumpet", Role::Melody),
            ("synth_lead", Role::Melody),
            ("kick", Role::Rhythm),
            ("snare", Role::Rhythm),
            ("hihat", Role::Rhythm),
            ("clap", Role::Rhythm),
            ("tom", Role::Rhythm),
            ("crash", Role::Rhythm),
            ("vocal", Role::Vocal),
        ];
        for (name, role) in expected {
            assert_eq!(role_of(name), Some(role), "{}", name);
        }
        assert_eq!(builtin_names().len(), expected.len());
    }

    #[test]
    fn test_specs_are_sane() {
        for instrument in all() {
            let s = instrument.spec();
            assert!(s.low > 0.0 && s.low < s.high, "{}", s.name);
            assert!(s.in_range(s.nominal), "{}", s.name);
            assert!(s.tail > 0.0, "{}", s.name);
            assert!(s.max_gain > 0.0 && s.max_gain <= 1.0, "{}", s.name);
        }
    }

    #[test]
    fn test_lookup_case_insensitive() {
        assert!(lookup("Piano").is_some());
        assert!(lookup("theremin").is_none());
    }

    #[test]
    fn test_clamp_freq() {
        let bass = spec("bass").unwrap();
        assert_eq!(bass.clamp_freq(10.0), bass.low);
        assert_eq!(bass.clamp_freq(1e6), bass.high);
        assert_eq!(bass.clamp_freq(f64::NAN), bass.nominal);
    }

    #[test]
    fn test_max_tail() {
        assert!(max_tail() >= spec("pad").unwrap().tail);
    }
}
