// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Song document: global parameters, ordered sections and parts.
//!
//! The composer builds a `Song` section by section; once written to disk
//! it is treated as immutable and shared read-only by playback.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::part::{Part, ValidationError};

/// Tolerance when checking note ends against section ends (seconds)
pub const TIME_EPSILON: f64 = 1e-6;

/// Section kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionTemplate {
    Intro,
    Verse,
    Chorus,
    Bridge,
    Break,
    Solo,
    Drop,
    Head,
    Outro,
}

impl SectionTemplate {
    /// All templates
    pub const ALL: [SectionTemplate; 9] = [
        SectionTemplate::Intro,
        SectionTemplate::Verse,
        SectionTemplate::Chorus,
        SectionTemplate::Bridge,
        SectionTemplate::Break,
        SectionTemplate::Solo,
        SectionTemplate::Drop,
        SectionTemplate::Head,
        SectionTemplate::Outro,
    ];

    /// Name as written in `.song` files
    pub fn name(self) -> &'static str {
        match self {
            SectionTemplate::Intro => "Intro",
            SectionTemplate::Verse => "Verse",
            SectionTemplate::Chorus => "Chorus",
            SectionTemplate::Bridge => "Bridge",
            SectionTemplate::Break => "Break",
            SectionTemplate::Solo => "Solo",
            SectionTemplate::Drop => "Drop",
            SectionTemplate::Head => "Head",
            SectionTemplate::Outro => "Outro",
        }
    }

    /// Parse a template name (case-insensitive)
    pub fn from_name(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(s))
    }

    /// Whether generated material for this template is cached and reused
    pub fn is_reusable(self) -> bool {
        matches!(
            self,
            SectionTemplate::Verse
                | SectionTemplate::Chorus
                | SectionTemplate::Drop
                | SectionTemplate::Head
                | SectionTemplate::Solo
        )
    }

    /// Whether this template is a song climax (played with more intensity)
    pub fn is_climactic(self) -> bool {
        matches!(self, SectionTemplate::Chorus | SectionTemplate::Drop)
    }

    /// Intro and Outro frame the song
    pub fn is_framing(self) -> bool {
        matches!(self, SectionTemplate::Intro | SectionTemplate::Outro)
    }
}

impl fmt::Display for SectionTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// English ordinal ("2nd", "3rd", "11th")
pub fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

/// A time span of the song
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// Display name ("Chorus", "2nd Chorus")
    name: String,
    /// Section kind
    template: SectionTemplate,
    /// Start time in seconds
    start_time: f64,
    /// End time in seconds
    end_time: f64,
    /// Position of the section midpoint within the song (0.0 - 1.0)
    progress: f64,
}

impl Section {
    /// Create a section; rejects empty or non-finite spans
    pub fn new(
        name: impl Into<String>,
        template: SectionTemplate,
        start_time: f64,
        end_time: f64,
    ) -> Result<Self, ValidationError> {
        if !start_time.is_finite() || !end_time.is_finite() {
            return Err(ValidationError::NonFinite { field: "section time" });
        }
        if start_time < 0.0 {
            return Err(ValidationError::NegativeStart(start_time));
        }
        if end_time <= start_time {
            return Err(ValidationError::EmptySection {
                start: start_time,
                end: end_time,
            });
        }
        Ok(Self {
            name: name.into(),
            template,
            start_time,
            end_time,
            progress: 0.0,
        })
    }

    /// Builder: set progress
    pub fn with_progress(mut self, progress: f64) -> Self {
        self.set_progress(progress);
        self
    }

    /// Get name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get template
    pub fn template(&self) -> SectionTemplate {
        self.template
    }

    /// Get start time
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Get end time
    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    /// Length in seconds
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Midpoint in seconds
    pub fn midpoint(&self) -> f64 {
        (self.start_time + self.end_time) * 0.5
    }

    /// Get progress
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Set progress (clamped to 0.0 - 1.0)
    pub fn set_progress(&mut self, progress: f64) {
        self.progress = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    /// Whether a time falls inside the section (end exclusive)
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start_time && time < self.end_time
    }

    /// Whether this is a repeat of an earlier section ("2nd Chorus")
    pub fn is_repeat(&self) -> bool {
        self.name
            .chars()
            .next()
            .map(|c| c.is_ascii_digit())
            .unwrap_or(false)
    }
}

/// A complete generated song
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    title: String,
    genre: String,
    bpm: f64,
    scale_name: String,
    root_freq: f64,
    duration: f64,
    channel_count: u16,
    sections: Vec<Section>,
    parts: Vec<Part>,
}

impl Song {
    /// Create an empty song
    pub fn new(title: impl Into<String>, genre: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            genre: genre.into(),
            bpm: 120.0,
            scale_name: "major".to_string(),
            root_freq: 220.0,
            duration: 0.0,
            channel_count: 8,
            sections: Vec::new(),
            parts: Vec::new(),
        }
    }

    /// Builder: set tempo
    pub fn with_bpm(mut self, bpm: f64) -> Self {
        self.set_bpm(bpm);
        self
    }

    /// Builder: set scale and root
    pub fn with_scale(mut self, scale_name: impl Into<String>, root_freq: f64) -> Self {
        self.scale_name = scale_name.into();
        self.set_root_freq(root_freq);
        self
    }

    /// Builder: set duration
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.set_duration(duration);
        self
    }

    /// Builder: add a section
    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Builder: add a part
    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// Get title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Set title
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Get genre
    pub fn genre(&self) -> &str {
        &self.genre
    }

    /// Get tempo in BPM
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Set tempo (non-positive or non-finite values are ignored)
    pub fn set_bpm(&mut self, bpm: f64) {
        if bpm.is_finite() && bpm > 0.0 {
            self.bpm = bpm;
        }
    }

    /// Get scale name
    pub fn scale_name(&self) -> &str {
        &self.scale_name
    }

    /// Set scale name
    pub fn set_scale_name(&mut self, name: impl Into<String>) {
        self.scale_name = name.into();
    }

    /// Get root frequency
    pub fn root_freq(&self) -> f64 {
        self.root_freq
    }

    /// Set root frequency (non-positive or non-finite values are ignored)
    pub fn set_root_freq(&mut self, freq: f64) {
        if freq.is_finite() && freq > 0.0 {
            self.root_freq = freq;
        }
    }

    /// Get duration in seconds
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Set duration (non-positive or non-finite values are ignored)
    pub fn set_duration(&mut self, duration: f64) {
        if duration.is_finite() && duration > 0.0 {
            self.duration = duration;
        }
    }

    /// Get output channel count (2 or 8)
    pub fn channel_count(&self) -> u16 {
        self.channel_count
    }

    /// Set output channel count; anything but 2 means 8
    pub fn set_channel_count(&mut self, channels: u16) {
        self.channel_count = if channels == 2 { 2 } else { 8 };
    }

    /// Get sections
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Get sections mutably
    pub fn sections_mut(&mut self) -> &mut Vec<Section> {
        &mut self.sections
    }

    /// Add a section
    pub fn add_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Find a section by name
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name() == name)
    }

    /// Section playing at a time
    pub fn section_at(&self, time: f64) -> Option<&Section> {
        self.sections.iter().find(|s| s.contains(time))
    }

    /// Get parts
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Get parts mutably
    pub fn parts_mut(&mut self) -> &mut Vec<Part> {
        &mut self.parts
    }

    /// Add a part
    pub fn add_part(&mut self, part: Part) {
        self.parts.push(part);
    }

    /// Total notes across all parts
    pub fn note_count(&self) -> usize {
        self.parts.iter().map(|p| p.notes.len()).sum()
    }

    /// End of the last section, or of the last note when there are no sections
    pub fn derived_duration(&self) -> f64 {
        let section_end = self
            .sections
            .iter()
            .map(|s| s.end_time())
            .fold(0.0, f64::max);
        if section_end > 0.0 {
            return section_end;
        }
        self.parts
            .iter()
            .flat_map(|p| p.notes.iter())
            .map(|n| n.end_time())
            .filter(|t| t.is_finite())
            .fold(0.0, f64::max)
    }

    /// Recompute progress values from section midpoints
    pub fn update_progress(&mut self) {
        let duration = self.duration;
        for section in &mut self.sections {
            let progress = if duration > 0.0 {
                section.midpoint() / duration
            } else {
                0.0
            };
            section.set_progress(progress);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrangement::Note;

    #[test]
    fn test_template_names() {
        for template in SectionTemplate::ALL {
            assert_eq!(SectionTemplate::from_name(template.name()), Some(template));
        }
        assert_eq!(SectionTemplate::from_name("chorus"), Some(SectionTemplate::Chorus));
        assert_eq!(SectionTemplate::from_name("Coda"), None);
    }

    #[test]
    fn test_reusable_templates() {
        assert!(SectionTemplate::Verse.is_reusable());
        assert!(SectionTemplate::Head.is_reusable());
        assert!(!SectionTemplate::Intro.is_reusable());
        assert!(!SectionTemplate::Bridge.is_reusable());
    }

    #[test]
    fn test_ordinal() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(4), "4th");
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(12), "12th");
        assert_eq!(ordinal(22), "22nd");
    }

    #[test]
    fn test_section_validation() {
        assert!(Section::new("Verse", SectionTemplate::Verse, 0.0, 30.0).is_ok());
        assert!(Section::new("Verse", SectionTemplate::Verse, 30.0, 30.0).is_err());
        assert!(Section::new("Verse", SectionTemplate::Verse, -1.0, 30.0).is_err());
        assert!(Section::new("Verse", SectionTemplate::Verse, 0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_section_repeat() {
        let first = Section::new("Chorus", SectionTemplate::Chorus, 0.0, 10.0).unwrap();
        let second = Section::new("2nd Chorus", SectionTemplate::Chorus, 10.0, 20.0).unwrap();
        assert!(!first.is_repeat());
        assert!(second.is_repeat());
    }

    #[test]
    fn test_song_lookup_and_progress() {
        let mut song = Song::new("Test", "pop")
            .with_duration(40.0)
            .with_section(Section::new("Intro", SectionTemplate::Intro, 0.0, 10.0).unwrap())
            .with_section(Section::new("Verse", SectionTemplate::Verse, 10.0, 40.0).unwrap());
        song.update_progress();

        assert_eq!(song.section_at(5.0).map(|s| s.name()), Some("Intro"));
        assert_eq!(song.section_at(10.0).map(|s| s.name()), Some("Verse"));
        assert!(song.section_at(40.0).is_none());
        assert!((song.sections()[0].progress() - 0.125).abs() < 1e-12);
        assert!((song.sections()[1].progress() - 0.625).abs() < 1e-12);
    }

    #[test]
    fn test_derived_duration() {
        let mut part = Part::new("Verse", "piano");
        part.notes.push(Note::new(440.0, 2.0, 3.0));
        let song = Song::new("Test", "pop").with_part(part);
        assert!((song.derived_duration() - 5.0).abs() < 1e-12);

        let song = song.with_section(Section::new("Verse", SectionTemplate::Verse, 0.0, 12.0).unwrap());
        assert!((song.derived_duration() - 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_setters_ignore_invalid() {
        let mut song = Song::new("Test", "pop");
        song.set_bpm(-5.0);
        song.set_root_freq(f64::INFINITY);
        song.set_duration(0.0);
        assert_eq!(song.bpm(), 120.0);
        assert_eq!(song.root_freq(), 220.0);
        assert_eq!(song.duration(), 0.0);

        song.set_channel_count(5);
        assert_eq!(song.channel_count(), 8);
        song.set_channel_count(2);
        assert_eq!(song.channel_count(), 2);
    }
}
