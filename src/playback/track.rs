// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Per-part playback state.
//!
//! A `PartTrack` walks one part's notes with a monotonic cursor, keeps
//! up to `MAX_ACTIVE_NOTES` sounding voices, runs the part's private
//! distortion and reverb and spreads the result onto its own bus buffer.
//! Everything is allocated in `new`; `render` never allocates.

use std::sync::Arc;

use tracing::warn;

use super::mixer::{self, BUS_CHANNELS};
use crate::arrangement::{Note, Part, Song};
use crate::synth::dsp::{DelayReverb, Distortion};
use crate::synth::{self, instruments, Instrument, Voice};

/// Most notes one part may sound at once
pub const MAX_ACTIVE_NOTES: usize = 16;

/// One active-note slot
#[derive(Debug, Clone)]
struct Slot {
    active: bool,
    note_index: usize,
    start: f64,
    /// Note end plus the instrument's tail
    end: f64,
    voice: Voice,
}

impl Slot {
    fn new(sample_rate: f64) -> Self {
        Self {
            active: false,
            note_index: 0,
            start: 0.0,
            end: 0.0,
            voice: Voice::new(sample_rate, 0),
        }
    }
}

/// Playback state for one part
pub struct PartTrack {
    song: Arc<Song>,
    part_index: usize,
    instrument: &'static dyn Instrument,
    /// Note indices in start order
    order: Vec<usize>,
    next_note: usize,
    slots: Vec<Slot>,
    /// Slot of the most recently started vocal note
    last_vocal: Option<usize>,
    distortion: Option<Distortion>,
    reverb: Option<DelayReverb>,
    sample_rate: f64,
    /// Interleaved bus frames, `capacity * BUS_CHANNELS` long
    buffer: Vec<f32>,
    overloads: u64,
}

impl PartTrack {
    /// Build the track for `song.parts()[part_index]`.
    ///
    /// Returns `None` when the part's instrument has no model.
    pub fn new(song: Arc<Song>, part_index: usize, sample_rate: f64, capacity: usize) -> Option<Self> {
        let part = song.parts().get(part_index)?;
        let Some(instrument) = instruments::lookup(&part.instrument) else {
            warn!("Part {} uses unknown instrument '{}', skipping", part_index, part.instrument);
            return None;
        };

        let mut order: Vec<usize> = (0..part.notes.len()).collect();
        order.sort_by(|&a, &b| part.notes[a].start_time.total_cmp(&part.notes[b].start_time));

        let effects = &part.effects;
        let distortion = effects
            .use_distortion
            .then(|| Distortion::new(effects.distortion_drive, effects.distortion_threshold));
        let reverb = effects.use_reverb.then(|| {
            DelayReverb::new(
                effects.reverb_delay,
                effects.reverb_decay,
                effects.reverb_mix_factor,
                sample_rate,
            )
        });

        Some(Self {
            part_index,
            instrument,
            order,
            next_note: 0,
            slots: (0..MAX_ACTIVE_NOTES).map(|_| Slot::new(sample_rate)).collect(),
            last_vocal: None,
            distortion,
            reverb,
            sample_rate,
            buffer: vec![0.0; capacity * BUS_CHANNELS],
            overloads: 0,
            song,
        })
    }

    /// Index of the part in the song
    pub fn part_index(&self) -> usize {
        self.part_index
    }

    /// The part being played
    pub fn part(&self) -> &Part {
        &self.song.parts()[self.part_index]
    }

    /// Notes skipped because every slot was busy
    pub fn overloads(&self) -> u64 {
        self.overloads
    }

    /// Currently sounding notes
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.active).count()
    }

    /// Notes not yet started
    pub fn pending(&self) -> usize {
        self.order.len() - self.next_note
    }

    /// Frames the buffer can hold
    pub fn capacity(&self) -> usize {
        self.buffer.len() / BUS_CHANNELS
    }

    /// The last rendered frames, interleaved on the bus layout
    pub fn buffer(&self, frames: usize) -> &[f32] {
        &self.buffer[..frames * BUS_CHANNELS]
    }

    /// Render `frames` bus frames starting at absolute sample `start_frame`
    pub fn render(&mut self, start_frame: u64, frames: usize) {
        let frames = frames.min(self.capacity());
        for i in 0..frames {
            let t = (start_frame + i as u64) as f64 / self.sample_rate;
            let sample = self.tick(t);
            let out = &mut self.buffer[i * BUS_CHANNELS..(i + 1) * BUS_CHANNELS];
            out.fill(0.0);
            if sample != 0.0 {
                let part = &self.song.parts()[self.part_index];
                mixer::spread(out, sample, part.pan_at(t), self.instrument.spec().spatial);
            }
        }
    }

    /// One mono sample of the part at time `t`
    fn tick(&mut self, t: f64) -> f64 {
        self.activate(t);

        let part = &self.song.parts()[self.part_index];
        let volume = part.volume_at(t);
        let mut sum = 0.0;
        for slot in self.slots.iter_mut().filter(|s| s.active) {
            if t >= slot.end {
                slot.active = false;
                continue;
            }
            let note = &part.notes[slot.note_index];
            let s = synth::wave(self.instrument, &mut slot.voice, t - slot.start, note.freq, note.duration);
            sum += s as f64 * note.volume * note.velocity * volume;
        }

        if let Some(distortion) = &self.distortion {
            sum = distortion.process(sum);
        }
        if let Some(reverb) = &mut self.reverb {
            sum = reverb.process(sum, part.reverb_mix_at(t));
        }
        if sum.is_finite() {
            sum
        } else {
            0.0
        }
    }

    /// Start every note whose onset has been reached
    fn activate(&mut self, t: f64) {
        let tail = self.instrument.spec().tail;
        while self.next_note < self.order.len() {
            let index = self.order[self.next_note];
            let note = self.song.parts()[self.part_index].notes[index];
            if note.start_time > t {
                break;
            }
            self.next_note += 1;

            let end = note.end_time() + tail;
            if t >= end {
                continue;
            }
            let Some(slot) = self.slots.iter().position(|s| !s.active) else {
                self.overloads += 1;
                continue;
            };
            self.start_slot(slot, index, &note, end);
        }
    }

    fn start_slot(&mut self, slot: usize, note_index: usize, note: &Note, end: f64) {
        let seed = synth::note_seed(note.freq, note.duration) ^ note_index as u64;
        self.slots[slot].voice.start(seed, note.phoneme, note.open);

        if note.phoneme.is_some() {
            if let Some(previous) = self.last_vocal.filter(|&p| p != slot) {
                let (target, source) = pair_mut(&mut self.slots, slot, previous);
                target.voice.inherit_formants(&source.voice);
            }
            self.last_vocal = Some(slot);
        }

        let target = &mut self.slots[slot];
        target.active = true;
        target.note_index = note_index;
        target.start = note.start_time;
        target.end = end;
    }
}

/// Mutable access to `slots[a]` alongside shared access to `slots[b]`; `a != b`
fn pair_mut(slots: &mut [Slot], a: usize, b: usize) -> (&mut Slot, &Slot) {
    if a < b {
        let (left, right) = slots.split_at_mut(b);
        (&mut left[a], &right[0])
    } else {
        let (left, right) = slots.split_at_mut(a);
        (&mut right[0], &left[b])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrangement::Part;

    const SR: f64 = 8000.0;

    fn song_with(part: Part, duration: f64) -> Arc<Song> {
        Arc::new(Song::new("Test", "pop").with_duration(duration).with_part(part))
    }

    #[test]
    fn test_unknown_instrument_has_no_track() {
        let song = song_with(Part::new("Verse", "kazoo"), 4.0);
        assert!(PartTrack::new(song, 0, SR, 64).is_none());
    }

    #[test]
    fn test_empty_part_is_silent() {
        let song = song_with(Part::new("Verse", "piano"), 4.0);
        let mut track = PartTrack::new(song, 0, SR, 256).unwrap();
        track.render(0, 256);
        assert!(track.buffer(256).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_note_sounds_then_expires() {
        let mut part = Part::new("Verse", "piano");
        part.notes.push(Note::new(440.0, 0.05, 0.0));
        let song = song_with(part, 4.0);
        let tail = instruments::spec("piano").unwrap().tail;
        let mut track = PartTrack::new(song, 0, SR, 1024).unwrap();

        track.render(0, 400);
        assert_eq!(track.active_count(), 1);
        assert_eq!(track.pending(), 0);
        assert!(track.buffer(400).iter().any(|&s| s != 0.0));

        let after = ((0.05 + tail) * SR).ceil() as u64 + 1;
        track.render(after, 16);
        assert_eq!(track.active_count(), 0);
    }

    #[test]
    fn test_active_note_cap_counts_overloads() {
        let mut part = Part::new("Verse", "pad");
        for i in 0..(MAX_ACTIVE_NOTES + 3) {
            part.notes.push(Note::new(200.0 + i as f64, 1.0, 0.0));
        }
        let song = song_with(part, 4.0);
        let mut track = PartTrack::new(song, 0, SR, 64).unwrap();
        track.render(0, 8);
        assert_eq!(track.active_count(), MAX_ACTIVE_NOTES);
        assert_eq!(track.overloads(), 3);
    }

    #[test]
    fn test_late_start_skips_finished_notes() {
        let mut part = Part::new("Verse", "kick");
        part.notes.push(Note::new(60.0, 0.1, 0.0));
        part.notes.push(Note::new(60.0, 0.1, 3.0));
        let song = song_with(part, 4.0);
        let mut track = PartTrack::new(song, 0, SR, 64).unwrap();
        track.render((2.0 * SR) as u64, 8);
        assert_eq!(track.active_count(), 0);
        assert_eq!(track.overloads(), 0);
        assert_eq!(track.pending(), 1);
    }

    #[test]
    fn test_unsorted_notes_start_in_time_order() {
        let mut part = Part::new("Verse", "piano");
        part.notes.push(Note::new(440.0, 0.5, 1.0));
        part.notes.push(Note::new(330.0, 0.5, 0.0));
        let song = song_with(part, 4.0);
        let mut track = PartTrack::new(song, 0, SR, 64).unwrap();
        track.render(0, 4);
        assert_eq!(track.active_count(), 1);
        assert_eq!(track.pending(), 1);
    }

    #[test]
    fn test_pair_mut_either_order() {
        let mut slots: Vec<Slot> = (0..3).map(|_| Slot::new(SR)).collect();
        slots[2].note_index = 7;
        let (a, b) = pair_mut(&mut slots, 0, 2);
        a.note_index = b.note_index;
        assert_eq!(slots[0].note_index, 7);
        let (a, b) = pair_mut(&mut slots, 2, 1);
        a.note_index = b.note_index;
        assert_eq!(slots[2].note_index, 0);
    }
}
