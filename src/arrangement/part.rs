// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Parts: one instrument's notes, effects and automation within a section.

use thiserror::Error;

/// Rejected note or section values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A field is NaN or infinite
    #[error("non-finite {field}")]
    NonFinite { field: &'static str },
    /// Frequency is zero or negative
    #[error("frequency {0} Hz must be positive")]
    BadFrequency(f64),
    /// Duration is zero or negative
    #[error("duration {0} s must be positive")]
    BadDuration(f64),
    /// Start time before the song start
    #[error("start time {0} s is negative")]
    NegativeStart(f64),
    /// Section end not after its start
    #[error("section span {start}..{end} is empty")]
    EmptySection { start: f64, end: f64 },
    /// Note runs past the end of its section
    #[error("note ends at {end} s, past section end {limit} s")]
    PastSectionEnd { end: f64, limit: f64 },
}

/// A single synthesized note
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    /// Frequency in Hz
    pub freq: f64,
    /// Length in seconds
    pub duration: f64,
    /// Onset in seconds from song start
    pub start_time: f64,
    /// Vowel index for the vocal instrument (8-15 = second register)
    pub phoneme: Option<u8>,
    /// Open articulation (hi-hats)
    pub open: bool,
    /// Note volume (0.0 - 1.0)
    pub volume: f64,
    /// Strike velocity (0.0 - 1.0)
    pub velocity: f64,
}

impl Note {
    /// Create a full-volume note
    pub fn new(freq: f64, duration: f64, start_time: f64) -> Self {
        Self {
            freq,
            duration,
            start_time,
            phoneme: None,
            open: false,
            volume: 1.0,
            velocity: 1.0,
        }
    }

    /// Builder: set volume
    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }

    /// Builder: set velocity
    pub fn with_velocity(mut self, velocity: f64) -> Self {
        self.velocity = velocity.clamp(0.0, 1.0);
        self
    }

    /// Builder: set phoneme
    pub fn with_phoneme(mut self, phoneme: u8) -> Self {
        self.phoneme = Some(phoneme);
        self
    }

    /// Builder: set open articulation
    pub fn with_open(mut self, open: bool) -> Self {
        self.open = open;
        self
    }

    /// Time the note stops sounding (before any release tail)
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Check that the note is playable
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("frequency", self.freq),
            ("duration", self.duration),
            ("start time", self.start_time),
            ("volume", self.volume),
            ("velocity", self.velocity),
        ] {
            if !value.is_finite() {
                return Err(ValidationError::NonFinite { field });
            }
        }
        if self.freq <= 0.0 {
            return Err(ValidationError::BadFrequency(self.freq));
        }
        if self.duration <= 0.0 {
            return Err(ValidationError::BadDuration(self.duration));
        }
        if self.start_time < 0.0 {
            return Err(ValidationError::NegativeStart(self.start_time));
        }
        Ok(())
    }

    /// Check validity and that the note ends by `limit` (+ epsilon)
    pub fn validate_within(&self, limit: f64) -> Result<(), ValidationError> {
        self.validate()?;
        if self.end_time() > limit + super::song::TIME_EPSILON {
            return Err(ValidationError::PastSectionEnd {
                end: self.end_time(),
                limit,
            });
        }
        Ok(())
    }
}

/// Keyframed parameter curve with linear interpolation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Automation {
    points: Vec<(f64, f64)>,
}

impl Automation {
    /// Create an empty curve
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from keyframes; non-finite points are dropped and the rest sorted
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let mut curve = Self::new();
        for (time, value) in points {
            curve.add(time, value);
        }
        curve
    }

    /// Insert a keyframe, keeping time order (after existing equal times)
    pub fn add(&mut self, time: f64, value: f64) {
        if !time.is_finite() || !value.is_finite() {
            return;
        }
        let index = self.points.partition_point(|&(t, _)| t <= time);
        self.points.insert(index, (time, value));
    }

    /// Keyframes in time order
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Number of keyframes
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the curve has no keyframes
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Value at a time; `default` when the curve is empty
    pub fn value_at(&self, time: f64, default: f64) -> f64 {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return default,
        };
        if time <= first.0 {
            return first.1;
        }
        if time >= last.0 {
            return last.1;
        }

        // First keyframe strictly after `time`; guaranteed in 1..len
        let upper = self.points.partition_point(|&(t, _)| t <= time);
        let (t0, v0) = self.points[upper - 1];
        let (t1, v1) = self.points[upper];
        let span = t1 - t0;
        if span <= 0.0 {
            return v1;
        }
        v0 + (v1 - v0) * (time - t0) / span
    }

    /// Multiply every value by `factor`
    pub fn scale_values(&mut self, factor: f64) {
        for point in &mut self.points {
            point.1 *= factor;
        }
    }

    /// Clamp every value into a range
    pub fn clamp_values(&mut self, low: f64, high: f64) {
        for point in &mut self.points {
            point.1 = point.1.clamp(low, high);
        }
    }
}

/// Per-part effect settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Effects {
    /// Enable the delay reverb
    pub use_reverb: bool,
    /// Reverb delay time in seconds
    pub reverb_delay: f64,
    /// Reverb feedback (0.0 - 1.0)
    pub reverb_decay: f64,
    /// Wet level multiplier
    pub reverb_mix_factor: f64,
    /// Enable soft-clip distortion
    pub use_distortion: bool,
    /// Distortion input gain
    pub distortion_drive: f64,
    /// Distortion clip threshold
    pub distortion_threshold: f64,
}

impl Default for Effects {
    fn default() -> Self {
        Self {
            use_reverb: false,
            reverb_delay: 0.25,
            reverb_decay: 0.4,
            reverb_mix_factor: 0.5,
            use_distortion: false,
            distortion_drive: 2.0,
            distortion_threshold: 0.6,
        }
    }
}

/// One instrument's material for one section
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    /// Name of the owning section
    pub section: String,
    /// Instrument name
    pub instrument: String,
    /// Notes in start-time order
    pub notes: Vec<Note>,
    /// Static pan (-1.0 left, 1.0 right)
    pub pan: f64,
    /// Static reverb send (0.0 - 1.0)
    pub reverb_mix: f64,
    /// Effect settings
    pub effects: Effects,
    /// Pan curve
    pub pan_automation: Automation,
    /// Volume curve
    pub volume_automation: Automation,
    /// Reverb send curve
    pub reverb_automation: Automation,
}

impl Part {
    /// Create an empty part
    pub fn new(section: impl Into<String>, instrument: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            instrument: instrument.into(),
            notes: Vec::new(),
            pan: 0.0,
            reverb_mix: 0.0,
            effects: Effects::default(),
            pan_automation: Automation::new(),
            volume_automation: Automation::new(),
            reverb_automation: Automation::new(),
        }
    }

    /// Builder: set pan
    pub fn with_pan(mut self, pan: f64) -> Self {
        self.set_pan(pan);
        self
    }

    /// Builder: set reverb send
    pub fn with_reverb_mix(mut self, mix: f64) -> Self {
        self.set_reverb_mix(mix);
        self
    }

    /// Set pan (clamped to -1.0 - 1.0)
    pub fn set_pan(&mut self, pan: f64) {
        self.pan = if pan.is_finite() { pan.clamp(-1.0, 1.0) } else { 0.0 };
    }

    /// Set reverb send (clamped to 0.0 - 1.0)
    pub fn set_reverb_mix(&mut self, mix: f64) {
        self.reverb_mix = if mix.is_finite() { mix.clamp(0.0, 1.0) } else { 0.0 };
    }

    /// Sort notes by start time
    pub fn sort_notes(&mut self) {
        self.notes.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
    }

    /// End of the last note
    pub fn end_time(&self) -> f64 {
        self.notes.iter().map(|n| n.end_time()).fold(0.0, f64::max)
    }

    /// Pan at a time (curve, falling back to the static pan)
    pub fn pan_at(&self, time: f64) -> f64 {
        self.pan_automation.value_at(time, self.pan).clamp(-1.0, 1.0)
    }

    /// Volume multiplier at a time (1.0 without a curve)
    pub fn volume_at(&self, time: f64) -> f64 {
        self.volume_automation.value_at(time, 1.0).clamp(0.0, 1.0)
    }

    /// Reverb send at a time
    pub fn reverb_mix_at(&self, time: f64) -> f64 {
        self.reverb_automation
            .value_at(time, self.reverb_mix)
            .clamp(0.0, 1.0)
    }

    /// Drop invalid notes and notes starting at or after `song_end`; returns the count dropped
    pub fn retain_valid_notes(&mut self, song_end: f64) -> usize {
        let before = self.notes.len();
        self.notes
            .retain(|n| n.validate().is_ok() && n.start_time < song_end);
        before - self.notes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_validation() {
        assert!(Note::new(440.0, 0.5, 0.0).validate().is_ok());
        assert_eq!(
            Note::new(0.0, 0.5, 0.0).validate(),
            Err(ValidationError::BadFrequency(0.0))
        );
        assert_eq!(
            Note::new(440.0, 0.0, 0.0).validate(),
            Err(ValidationError::BadDuration(0.0))
        );
        assert!(Note::new(f64::NAN, 0.5, 0.0).validate().is_err());
        assert!(Note::new(440.0, 0.5, -1.0).validate().is_err());
    }

    #[test]
    fn test_note_within_section() {
        let note = Note::new(440.0, 1.0, 9.0);
        assert!(note.validate_within(10.0).is_ok());
        assert!(note.validate_within(10.0 - 1e-9).is_ok());
        assert!(note.validate_within(9.5).is_err());
    }

    #[test]
    fn test_note_builders_clamp() {
        let note = Note::new(440.0, 1.0, 0.0).with_volume(1.5).with_velocity(-0.2);
        assert_eq!(note.volume, 1.0);
        assert_eq!(note.velocity, 0.0);
    }

    #[test]
    fn test_automation_empty_default() {
        let curve = Automation::new();
        assert_eq!(curve.value_at(3.0, 0.7), 0.7);
    }

    #[test]
    fn test_automation_interpolation() {
        let curve = Automation::from_points([(0.0, 0.0), (10.0, 1.0)]);
        assert_eq!(curve.value_at(-5.0, 9.0), 0.0);
        assert!((curve.value_at(2.5, 9.0) - 0.25).abs() < 1e-12);
        assert_eq!(curve.value_at(20.0, 9.0), 1.0);
    }

    #[test]
    fn test_automation_keeps_order() {
        let mut curve = Automation::new();
        curve.add(5.0, 0.5);
        curve.add(1.0, 0.1);
        curve.add(f64::NAN, 1.0);
        curve.add(3.0, 0.3);
        let times: Vec<f64> = curve.points().iter().map(|p| p.0).collect();
        assert_eq!(times, vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_automation_scale_and_clamp() {
        let mut curve = Automation::from_points([(0.0, 0.5), (4.0, 0.8)]);
        curve.scale_values(1.5);
        curve.clamp_values(0.0, 1.0);
        assert!((curve.value_at(0.0, 0.0) - 0.75).abs() < 1e-12);
        assert_eq!(curve.value_at(4.0, 0.0), 1.0);
    }

    #[test]
    fn test_automation_step_at_equal_times() {
        let curve = Automation::from_points([(0.0, 0.0), (5.0, 0.2), (5.0, 0.8), (10.0, 1.0)]);
        assert!((curve.value_at(5.0, 0.0) - 0.8).abs() < 1e-12);
        assert!((curve.value_at(2.5, 0.0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_part_retain_valid_notes() {
        let mut part = Part::new("Verse", "piano");
        part.notes.push(Note::new(440.0, 1.0, 0.0));
        part.notes.push(Note::new(f64::NAN, 1.0, 1.0));
        part.notes.push(Note::new(440.0, 1.0, 30.0));
        let dropped = part.retain_valid_notes(30.0);
        assert_eq!(dropped, 2);
        assert_eq!(part.notes.len(), 1);
    }

    #[test]
    fn test_part_automation_fallbacks() {
        let part = Part::new("Verse", "piano").with_pan(0.4).with_reverb_mix(0.2);
        assert_eq!(part.pan_at(1.0), 0.4);
        assert_eq!(part.volume_at(1.0), 1.0);
        assert_eq!(part.reverb_mix_at(1.0), 0.2);
    }
}
