// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Line-oriented `.song` text format.
//!
//! Each line is `Key: value [Key: value ...]`. The reader is lenient:
//! unknown keys and bad records are skipped with a diagnostic carrying
//! the line number, and a file without sections still loads with one
//! section spanning the whole song.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, warn};

use super::part::{Automation, Note, Part, ValidationError};
use super::song::{Section, SectionTemplate, Song};

/// File extension for song documents
pub const SONG_EXTENSION: &str = "song";

/// A record the reader could not use
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// Wrong number of fields or unparsable value
    #[error("line {line}: malformed {record}: {reason}")]
    Malformed {
        line: usize,
        record: &'static str,
        reason: String,
    },
    /// Parsed but out of range
    #[error("line {line}: invalid {record}: {source}")]
    Invalid {
        line: usize,
        record: &'static str,
        #[source]
        source: ValidationError,
    },
    /// Part field before any `Part:` line
    #[error("line {line}: {record} outside of a part")]
    Orphan { line: usize, record: &'static str },
    /// Key the reader does not know
    #[error("line {line}: unknown key {key:?}")]
    UnknownKey { line: usize, key: String },
}

impl ParseError {
    /// Line number the error refers to
    pub fn line(&self) -> usize {
        match self {
            ParseError::Malformed { line, .. }
            | ParseError::Invalid { line, .. }
            | ParseError::Orphan { line, .. }
            | ParseError::UnknownKey { line, .. } => *line,
        }
    }
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

fn write_curve(out: &mut String, header: &str, point: &str, curve: &Automation) {
    let _ = writeln!(out, "{}: {}", header, curve.len());
    for (t, v) in curve.points() {
        let _ = writeln!(out, "{}: {} {}", point, t, v);
    }
}

/// Serialize a song to `.song` text
pub fn write_song(song: &Song) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "Song: {}", song.title());
    let _ = writeln!(out, "Genre: {}", song.genre());
    let _ = writeln!(out, "BPM: {}", song.bpm());
    let _ = writeln!(out, "Scale: {}", song.scale_name());
    let _ = writeln!(out, "RootFrequency: {}", song.root_freq());
    let _ = writeln!(out, "Duration: {}", song.duration());
    let _ = writeln!(out, "Channels: {}", song.channel_count());

    let _ = writeln!(out, "Sections: {}", song.sections().len());
    for s in song.sections() {
        let _ = writeln!(
            out,
            "Section: {} {} {} Progress: {} Template: {}",
            s.name(),
            s.start_time(),
            s.end_time(),
            s.progress(),
            s.template()
        );
    }

    let _ = writeln!(out, "Parts: {}", song.parts().len());
    for part in song.parts() {
        let fx = &part.effects;
        let _ = writeln!(out, "Part: {}", part.section);
        let _ = writeln!(out, "Instrument: {}", part.instrument);
        let _ = writeln!(
            out,
            "Pan: {} ReverbMix: {} UseReverb: {}",
            part.pan, part.reverb_mix, fx.use_reverb
        );
        let _ = writeln!(
            out,
            "ReverbDelay: {} ReverbDecay: {} ReverbMixFactor: {}",
            fx.reverb_delay, fx.reverb_decay, fx.reverb_mix_factor
        );
        let _ = writeln!(
            out,
            "UseDistortion: {} DistortionDrive: {} DistortionThreshold: {}",
            fx.use_distortion, fx.distortion_drive, fx.distortion_threshold
        );

        let _ = writeln!(out, "Notes: {}", part.notes.len());
        for n in &part.notes {
            let phoneme = n.phoneme.map(i32::from).unwrap_or(-1);
            let _ = writeln!(
                out,
                "Note: {} {} {} Phoneme: {} Open: {} Volume: {} Velocity: {}",
                n.freq, n.duration, n.start_time, phoneme, n.open, n.volume, n.velocity
            );
        }

        write_curve(&mut out, "PanAutomation", "PanPoint", &part.pan_automation);
        write_curve(&mut out, "VolumeAutomation", "VolumePoint", &part.volume_automation);
        write_curve(&mut out, "ReverbMixAutomation", "ReverbMixPoint", &part.reverb_automation);
    }

    out
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Values following a key: leading positional tokens, then `Name: value` pairs
struct Fields<'a> {
    positional: Vec<&'a str>,
    named: Vec<(&'a str, &'a str)>,
}

impl<'a> Fields<'a> {
    fn parse(text: &'a str) -> Self {
        let mut positional = Vec::new();
        let mut named = Vec::new();
        let mut tokens = text.split_whitespace();
        while let Some(token) = tokens.next() {
            match token.strip_suffix(':') {
                Some(key) if !key.is_empty() => {
                    let value = tokens.next().unwrap_or("");
                    named.push((key, value));
                }
                _ if named.is_empty() => positional.push(token),
                _ => {}
            }
        }
        Self { positional, named }
    }

    fn get(&self, key: &str) -> Option<&'a str> {
        self.named.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }
}

fn parse_f64(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// `Some(None)` for no phoneme (`none` or `-1`), `None` when unreadable
fn parse_phoneme(value: &str) -> Option<Option<u8>> {
    if value.eq_ignore_ascii_case("none") {
        return Some(None);
    }
    match value.parse::<i64>().ok()? {
        -1 => Some(None),
        v => u8::try_from(v).ok().map(Some),
    }
}

/// Section template from an explicit token or from the section name
fn template_for(name: &str, token: Option<&str>) -> SectionTemplate {
    token
        .and_then(SectionTemplate::from_name)
        .or_else(|| name.split_whitespace().last().and_then(SectionTemplate::from_name))
        .unwrap_or(SectionTemplate::Verse)
}

#[derive(Default)]
struct Reader {
    title: Option<String>,
    genre: Option<String>,
    bpm: Option<f64>,
    scale: Option<String>,
    root_freq: Option<f64>,
    duration: Option<f64>,
    channels: Option<u16>,
    sections: Vec<(Section, bool)>,
    parts: Vec<Part>,
    current: Option<Part>,
    errors: Vec<ParseError>,
}

impl Reader {
    fn malformed(&mut self, line: usize, record: &'static str, reason: impl Into<String>) {
        self.errors.push(ParseError::Malformed {
            line,
            record,
            reason: reason.into(),
        });
    }

    fn part(&mut self, line: usize, record: &'static str) -> Option<&mut Part> {
        if self.current.is_none() {
            self.errors.push(ParseError::Orphan { line, record });
        }
        self.current.as_mut()
    }

    fn finish_part(&mut self) {
        if let Some(mut part) = self.current.take() {
            part.sort_notes();
            self.parts.push(part);
        }
    }

    fn scalar_f64(&mut self, line: usize, record: &'static str, rest: &str) -> Option<f64> {
        let value = parse_f64(rest.trim());
        if value.is_none() {
            self.malformed(line, record, format!("expected a number, got {:?}", rest.trim()));
        }
        value
    }

    fn read_section(&mut self, line: usize, rest: &str) {
        let fields = Fields::parse(rest);
        let n = fields.positional.len();
        if n < 3 {
            self.malformed(line, "Section", "expected <name> <start> <end>");
            return;
        }
        let name = fields.positional[..n - 2].join(" ");
        let (Some(start), Some(end)) = (
            parse_f64(fields.positional[n - 2]),
            parse_f64(fields.positional[n - 1]),
        ) else {
            self.malformed(line, "Section", "start and end must be numbers");
            return;
        };
        let template = template_for(&name, fields.get("Template"));
        match Section::new(name, template, start, end) {
            Ok(section) => match fields.get("Progress").and_then(parse_f64) {
                Some(p) => self.sections.push((section.with_progress(p), true)),
                None => self.sections.push((section, false)),
            },
            Err(source) => self.errors.push(ParseError::Invalid {
                line,
                record: "Section",
                source,
            }),
        }
    }

    fn read_note(&mut self, line: usize, rest: &str) {
        let fields = Fields::parse(rest);
        let numbers: Vec<Option<f64>> = fields.positional.iter().map(|t| parse_f64(t)).collect();
        let (freq, duration, start) = match numbers.as_slice() {
            [Some(f), Some(d), Some(s), ..] => (*f, *d, *s),
            _ => {
                self.malformed(line, "Note", "expected <freq> <duration> <start>");
                return;
            }
        };

        let mut note = Note::new(freq, duration, start);
        let mut unreadable = Vec::new();
        if let Some(raw) = fields.get("Phoneme") {
            match parse_phoneme(raw) {
                Some(phoneme) => note.phoneme = phoneme,
                None => unreadable.push(("Phoneme", raw)),
            }
        }
        if let Some(raw) = fields.get("Open") {
            match parse_bool(raw) {
                Some(open) => note.open = open,
                None => unreadable.push(("Open", raw)),
            }
        }
        if let Some(raw) = fields.get("Volume") {
            match parse_f64(raw) {
                Some(v) => note = note.with_volume(v),
                None => unreadable.push(("Volume", raw)),
            }
        }
        if let Some(raw) = fields.get("Velocity") {
            match parse_f64(raw) {
                Some(v) => note = note.with_velocity(v),
                None => unreadable.push(("Velocity", raw)),
            }
        }
        if !unreadable.is_empty() {
            let reason = unreadable
                .iter()
                .map(|(key, raw)| format!("{} {:?}", key, raw))
                .collect::<Vec<_>>()
                .join(", ");
            self.malformed(line, "Note", format!("unreadable {}", reason));
            return;
        }

        if let Err(source) = note.validate() {
            self.errors.push(ParseError::Invalid {
                line,
                record: "Note",
                source,
            });
            return;
        }
        if let Some(part) = self.part(line, "Note") {
            part.notes.push(note);
        }
    }

    fn read_point(&mut self, line: usize, record: &'static str, rest: &str) {
        let values: Vec<Option<f64>> = rest.split_whitespace().map(parse_f64).collect();
        let (t, v) = match values.as_slice() {
            [Some(t), Some(v)] => (*t, *v),
            _ => {
                self.malformed(line, record, "expected <time> <value>");
                return;
            }
        };
        if let Some(part) = self.part(line, record) {
            let curve = match record {
                "PanPoint" => &mut part.pan_automation,
                "VolumePoint" => &mut part.volume_automation,
                _ => &mut part.reverb_automation,
            };
            curve.add(t, v);
        }
    }

    fn read_part_fields(&mut self, line: usize, record: &'static str, rest: &str) {
        let Some(part) = self.current.as_mut() else {
            self.errors.push(ParseError::Orphan { line, record });
            return;
        };
        let fields = Fields::parse(rest);
        let lead = fields.positional.first().copied().unwrap_or("");
        let values = std::iter::once((record, lead)).chain(fields.named.iter().copied());

        let mut bad = Vec::new();
        for (name, value) in values {
            let ok = match name {
                "Pan" => parse_f64(value).map(|v| part.set_pan(v)).is_some(),
                "ReverbMix" => parse_f64(value).map(|v| part.set_reverb_mix(v)).is_some(),
                "UseReverb" => parse_bool(value).map(|v| part.effects.use_reverb = v).is_some(),
                "ReverbDelay" => parse_f64(value).map(|v| part.effects.reverb_delay = v).is_some(),
                "ReverbDecay" => parse_f64(value).map(|v| part.effects.reverb_decay = v).is_some(),
                "ReverbMixFactor" => parse_f64(value)
                    .map(|v| part.effects.reverb_mix_factor = v)
                    .is_some(),
                "UseDistortion" => parse_bool(value)
                    .map(|v| part.effects.use_distortion = v)
                    .is_some(),
                "DistortionDrive" => parse_f64(value)
                    .map(|v| part.effects.distortion_drive = v)
                    .is_some(),
                "DistortionThreshold" => parse_f64(value)
                    .map(|v| part.effects.distortion_threshold = v)
                    .is_some(),
                _ => {
                    debug!(line, key = name, "ignoring unknown part field");
                    true
                }
            };
            if !ok {
                bad.push(format!("{}={:?}", name, value));
            }
        }
        if !bad.is_empty() {
            self.malformed(line, record, bad.join(", "));
        }
    }

    fn read_line(&mut self, line: usize, text: &str) {
        let text = text.trim();
        if text.is_empty() || text.starts_with('#') {
            return;
        }
        let Some((key, rest)) = text.split_once(':') else {
            self.errors.push(ParseError::UnknownKey {
                line,
                key: text.to_string(),
            });
            return;
        };
        let key = key.trim();
        let rest = rest.trim();

        match key {
            "Song" => self.title = Some(rest.to_string()).filter(|t| !t.is_empty()),
            "Genre" => self.genre = Some(rest.to_string()).filter(|g| !g.is_empty()),
            "BPM" => self.bpm = self.scalar_f64(line, "BPM", rest).filter(|b| *b > 0.0),
            "Scale" => self.scale = Some(rest.to_string()).filter(|s| !s.is_empty()),
            "RootFrequency" => {
                self.root_freq = self.scalar_f64(line, "RootFrequency", rest).filter(|f| *f > 0.0)
            }
            "Duration" => {
                self.duration = self.scalar_f64(line, "Duration", rest).filter(|d| *d > 0.0)
            }
            "Channels" => match rest.parse::<u16>() {
                Ok(c) => self.channels = Some(c),
                Err(_) => self.malformed(line, "Channels", format!("expected 2 or 8, got {:?}", rest)),
            },
            "Section" => self.read_section(line, rest),
            "Part" => {
                self.finish_part();
                self.current = Some(Part::new(rest, ""));
            }
            "Instrument" => {
                if let Some(part) = self.part(line, "Instrument") {
                    part.instrument = rest.to_lowercase();
                }
            }
            "Pan" => self.read_part_fields(line, "Pan", rest),
            "ReverbDelay" => self.read_part_fields(line, "ReverbDelay", rest),
            "UseDistortion" => self.read_part_fields(line, "UseDistortion", rest),
            "Note" => self.read_note(line, rest),
            "PanPoint" => self.read_point(line, "PanPoint", rest),
            "VolumePoint" => self.read_point(line, "VolumePoint", rest),
            "ReverbMixPoint" => self.read_point(line, "ReverbMixPoint", rest),
            // Counts are informational; the records themselves are authoritative
            "Sections" | "Parts" | "Notes" | "PanAutomation" | "VolumeAutomation"
            | "ReverbMixAutomation" => {}
            _ => self.errors.push(ParseError::UnknownKey {
                line,
                key: key.to_string(),
            }),
        }
    }

    fn into_song(mut self) -> (Song, Vec<ParseError>) {
        self.finish_part();

        let mut song = Song::new(
            self.title.unwrap_or_else(|| "Untitled".to_string()),
            self.genre.unwrap_or_else(|| "unknown".to_string()),
        );
        if let Some(bpm) = self.bpm {
            song.set_bpm(bpm);
        }
        if let Some(scale) = self.scale {
            song.set_scale_name(scale);
        }
        if let Some(root) = self.root_freq {
            song.set_root_freq(root);
        }
        if let Some(channels) = self.channels {
            song.set_channel_count(channels);
        }

        let missing_progress = self.sections.iter().any(|(_, has)| !has);
        for (section, _) in self.sections {
            song.add_section(section);
        }
        for part in self.parts {
            song.add_part(part);
        }

        let duration = match self.duration {
            Some(d) => d,
            None => {
                let derived = song.derived_duration();
                debug!(derived, "duration missing, derived from content");
                if derived > 0.0 { derived } else { 1.0 }
            }
        };
        song.set_duration(duration);

        if song.sections().is_empty() {
            debug!(duration, "no sections, using one section for the whole song");
            if let Ok(section) = Section::new("Verse", SectionTemplate::Verse, 0.0, duration) {
                song.add_section(section);
            }
            song.update_progress();
        } else if missing_progress {
            song.update_progress();
        }

        (song, self.errors)
    }
}

/// Parse `.song` text, returning the song and every skipped record
pub fn parse_song_with_diagnostics(text: &str) -> (Song, Vec<ParseError>) {
    let mut reader = Reader::default();
    for (index, line) in text.lines().enumerate() {
        reader.read_line(index + 1, line);
    }
    reader.into_song()
}

/// Parse `.song` text, logging skipped records
pub fn parse_song(text: &str) -> Song {
    let (song, errors) = parse_song_with_diagnostics(text);
    for error in &errors {
        warn!("{}", error);
    }
    song
}

impl Song {
    /// Write to a `.song` file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path.as_ref(), write_song(self))
            .with_context(|| format!("Failed to write song file: {:?}", path.as_ref()))
    }

    /// Read a `.song` file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Song> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read song file: {:?}", path.as_ref()))?;
        Ok(parse_song(&contents))
    }
}

/// First `songN.song` in `dir` that does not exist yet (N starts at 1)
pub fn next_song_path<P: AsRef<Path>>(dir: P) -> PathBuf {
    let dir = dir.as_ref();
    (1u32..)
        .map(|n| dir.join(format!("song{}.{}", n, SONG_EXTENSION)))
        .find(|path| !path.exists())
        .unwrap_or_else(|| dir.join(format!("song.{}", SONG_EXTENSION)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_song() -> Song {
        let mut part = Part::new("2nd Chorus", "vocal").with_pan(-0.25).with_reverb_mix(0.3);
        part.effects.use_reverb = true;
        part.effects.reverb_mix_factor = 0.65;
        part.notes.push(Note::new(261.6255653005986, 0.375, 30.125).with_phoneme(9).with_volume(0.8));
        part.notes.push(Note::new(293.6647679174076, 0.5, 30.5).with_velocity(0.55));
        part.pan_automation.add(30.0, -0.2);
        part.pan_automation.add(40.0, 0.1);
        part.volume_automation.add(0.0, 0.0);
        part.volume_automation.add(5.0, 1.0);
        part.reverb_automation.add(35.0, 0.4);

        let mut drums = Part::new("Intro", "hihat");
        drums.notes.push(Note::new(8000.0, 0.1, 0.0).with_open(true));

        let mut song = Song::new("Velvet Harbor", "pop")
            .with_bpm(112.5)
            .with_scale("natural_minor", 146.8323839587038)
            .with_duration(60.0)
            .with_section(Section::new("Intro", SectionTemplate::Intro, 0.0, 30.0).unwrap())
            .with_section(Section::new("2nd Chorus", SectionTemplate::Chorus, 30.0, 60.0).unwrap())
            .with_part(drums)
            .with_part(part);
        song.update_progress();
        song
    }

    #[test]
    fn test_round_trip() {
        let song = sample_song();
        let text = write_song(&song);
        let (parsed, errors) = parse_song_with_diagnostics(&text);

        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(parsed, song);
    }

    #[test]
    fn test_writer_format() {
        let text = write_song(&sample_song());
        assert!(text.contains("Section: 2nd Chorus 30 60 Progress: 0.75 Template: Chorus"));
        assert!(text.contains("ReverbMixFactor: 0.65"));
        assert!(text.contains("Phoneme: -1"));
        assert!(text.contains("Phoneme: 9"));
        assert!(text.contains("Open: true"));
    }

    #[test]
    fn test_missing_sections_gives_one_section() {
        let text = "Song: Lonely\nGenre: jazz\nBPM: 100\nDuration: 42.5\nParts: 0\n";
        let song = parse_song(text);
        assert_eq!(song.sections().len(), 1);
        assert_eq!(song.sections()[0].start_time(), 0.0);
        assert_eq!(song.sections()[0].end_time(), 42.5);
    }

    #[test]
    fn test_missing_header_defaults() {
        let song = parse_song("Part: Verse\nInstrument: Piano\nNote: 440 1 2\n");
        assert_eq!(song.title(), "Untitled");
        assert_eq!(song.genre(), "unknown");
        assert_eq!(song.duration(), 3.0);
        assert_eq!(song.parts()[0].instrument, "piano");

        let note = song.parts()[0].notes[0];
        assert_eq!(note.phoneme, None);
        assert_eq!(note.volume, 1.0);
    }

    #[test]
    fn test_bad_records_dropped_with_line_numbers() {
        let text = "\
Song: Broken
Duration: 10
Section: Verse 5 2 Progress: 0.5 Template: Verse
Part: Verse
Instrument: piano
Note: 440 -1 0
Note: abc 1 0
Note: 440 1 0 Phoneme: none
Bogus: 12
Note: 440 1 0 Phoneme: x Open: maybe Volume: loud Velocity: NaN
Note: 330 1 1 Phoneme: 300
Note: 220 1 2 Phoneme: -1 Volume: 0.5
";
        let (song, errors) = parse_song_with_diagnostics(text);
        let lines: Vec<usize> = errors.iter().map(|e| e.line()).collect();
        assert_eq!(lines, vec![3, 6, 7, 9, 10, 11]);
        assert!(matches!(errors[0], ParseError::Invalid { record: "Section", .. }));
        assert!(matches!(errors[3], ParseError::UnknownKey { .. }));
        assert!(matches!(errors[4], ParseError::Malformed { record: "Note", .. }));
        assert!(matches!(errors[5], ParseError::Malformed { record: "Note", .. }));
        let reason = errors[4].to_string();
        for key in ["Phoneme", "Open", "Volume", "Velocity"] {
            assert!(reason.contains(key), "{}", reason);
        }

        assert_eq!(song.sections().len(), 1);
        let notes = &song.parts()[0].notes;
        assert_eq!(notes.len(), 2);
        assert!(notes.iter().all(|n| n.phoneme.is_none()));
        assert_eq!(notes[1].volume, 0.5);
    }

    #[test]
    fn test_orphan_records() {
        let (song, errors) = parse_song_with_diagnostics("Duration: 5\nNote: 440 1 0\nPanPoint: 0 0.5\n");
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| matches!(e, ParseError::Orphan { .. })));
        assert!(song.parts().is_empty());
    }

    #[test]
    fn test_comments_and_whitespace() {
        let text = "# generated\n\n   Song: Spaced Out   \n  Duration: 8\n";
        let song = parse_song(text);
        assert_eq!(song.title(), "Spaced Out");
        assert_eq!(song.duration(), 8.0);
    }

    #[test]
    fn test_section_progress_filled_in() {
        let song = parse_song("Duration: 20\nSection: Intro 0 10\nSection: Outro 10 20\n");
        assert_eq!(song.sections()[1].template(), SectionTemplate::Outro);
        assert!((song.sections()[0].progress() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_save_load_and_next_path() {
        let dir = tempfile::tempdir().unwrap();
        let first = next_song_path(dir.path());
        assert_eq!(first.file_name().unwrap(), "song1.song");

        let song = sample_song();
        song.save(&first).unwrap();
        assert_eq!(next_song_path(dir.path()).file_name().unwrap(), "song2.song");

        let loaded = Song::load(&first).unwrap();
        assert_eq!(loaded, song);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Song::load(dir.path().join("absent.song")).is_err());
    }
}
