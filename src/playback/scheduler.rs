// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Real-time render scheduler.
//!
//! Each audio callback asks for a block of frames. Parts render their
//! block in parallel on a long-lived worker pool, each into its own
//! pre-allocated buffer; the calling thread then sums the buffers in
//! part order, applies the master fades and writes the sink's channel
//! layout. Summation order never depends on the worker count.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info};

use super::mixer::{self, BusFrame, BUS_CHANNELS};
use super::track::PartTrack;
use super::PlaybackError;
use crate::arrangement::Song;
use crate::synth::instruments;

/// Largest block a callback may request by default
pub const DEFAULT_CAPACITY: usize = 8192;

/// Cancels playback from any thread
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Create a new, un-stopped handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop; the next callback emits silence
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop was requested
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counters written by the audio thread and read by the control loop
#[derive(Debug, Default)]
pub struct PlaybackStats {
    frames: AtomicU64,
    callbacks: AtomicU64,
    overloads: AtomicU64,
    fatal: AtomicBool,
    finished: AtomicBool,
}

impl PlaybackStats {
    /// Frames rendered so far
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Callbacks served
    pub fn callbacks(&self) -> u64 {
        self.callbacks.load(Ordering::Relaxed)
    }

    /// Notes skipped because a part's active table was full
    pub fn overloads(&self) -> u64 {
        self.overloads.load(Ordering::Relaxed)
    }

    /// A callback requested more frames than were pre-allocated
    pub fn is_fatal(&self) -> bool {
        self.fatal.load(Ordering::Acquire)
    }

    /// The song and its longest tail have played out
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Count frames written by a callback that bypasses the scheduler
    pub(crate) fn advance(&self, frames: u64) {
        self.frames.fetch_add(frames, Ordering::Relaxed);
        self.callbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn finish(&self) {
        self.finished.store(true, Ordering::Release);
    }
}

/// Renders a song block by block
pub struct Scheduler {
    song: Arc<Song>,
    tracks: Vec<PartTrack>,
    pool: ThreadPool,
    sample_rate: f64,
    capacity: usize,
    /// Next absolute frame to render
    cursor: u64,
    /// Song duration plus the longest instrument tail
    end_time: f64,
    stop: StopHandle,
    stats: Arc<PlaybackStats>,
}

impl Scheduler {
    /// Prepare playback of `song`.
    ///
    /// `capacity` is the largest block a callback may request; `workers`
    /// of 0 means one per hardware thread. The pool never has more
    /// threads than the song has parts.
    pub fn new(song: Arc<Song>, sample_rate: f64, capacity: usize, workers: usize) -> Result<Self, PlaybackError> {
        let tracks: Vec<PartTrack> = (0..song.parts().len())
            .filter_map(|i| PartTrack::new(Arc::clone(&song), i, sample_rate, capacity))
            .collect();

        let hardware = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        let requested = if workers == 0 { hardware } else { workers };
        let threads = requested.min(tracks.len()).max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("tunesmith-mix-{}", i))
            .build()?;

        let end_time = song.duration() + instruments::max_tail();
        info!(
            "Playback ready: '{}' {:.1}s, {} parts on {} workers",
            song.title(),
            song.duration(),
            tracks.len(),
            threads
        );

        Ok(Self {
            song,
            tracks,
            pool,
            sample_rate,
            capacity,
            cursor: 0,
            end_time,
            stop: StopHandle::new(),
            stats: Arc::new(PlaybackStats::default()),
        })
    }

    /// Use an existing stop handle
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    /// Report into existing counters
    pub fn with_stats(mut self, stats: Arc<PlaybackStats>) -> Self {
        self.stats = stats;
        self
    }

    /// Handle that stops this scheduler
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Shared counters
    pub fn stats(&self) -> Arc<PlaybackStats> {
        Arc::clone(&self.stats)
    }

    /// Song being played
    pub fn song(&self) -> &Song {
        &self.song
    }

    /// Worker threads in the pool
    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Current position (seconds)
    pub fn position(&self) -> f64 {
        self.cursor as f64 / self.sample_rate
    }

    /// Largest block a callback may request
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the song and its tails have played out
    pub fn is_finished(&self) -> bool {
        self.position() > self.end_time
    }

    /// Fill `out` (interleaved, `channels` wide) with the next block.
    ///
    /// Returns the frames rendered: 0 once stopped or finished, when the
    /// block is silence.
    pub fn render(&mut self, out: &mut [f32], channels: usize) -> Result<usize, PlaybackError> {
        if channels == 0 {
            out.fill(0.0);
            return Err(PlaybackError::NoChannels);
        }
        let frames = out.len() / channels;
        self.stats.callbacks.fetch_add(1, Ordering::Relaxed);

        if self.stop.is_stopped() {
            out.fill(0.0);
            return Ok(0);
        }
        if frames > self.capacity {
            out.fill(0.0);
            self.stats.fatal.store(true, Ordering::Release);
            return Err(PlaybackError::BufferTooLarge {
                requested: frames,
                capacity: self.capacity,
            });
        }
        if self.is_finished() {
            out.fill(0.0);
            self.stats.finished.store(true, Ordering::Release);
            return Ok(0);
        }

        let start = self.cursor;
        let tracks = &mut self.tracks;
        self.pool
            .install(|| tracks.par_iter_mut().for_each(|track| track.render(start, frames)));

        let duration = self.song.duration();
        for (i, frame_out) in out.chunks_exact_mut(channels).enumerate() {
            let mut bus: BusFrame = [0.0; BUS_CHANNELS];
            let offset = i * BUS_CHANNELS;
            for track in &self.tracks {
                let frame = &track.buffer(frames)[offset..offset + BUS_CHANNELS];
                for (b, s) in bus.iter_mut().zip(frame) {
                    *b += s;
                }
            }
            let t = (start + i as u64) as f64 / self.sample_rate;
            let gain = mixer::master_gain(t, duration) as f32;
            for b in &mut bus {
                *b *= gain;
            }
            mixer::write_frame(&bus, frame_out);
        }
        out[frames * channels..].fill(0.0);

        self.cursor += frames as u64;
        let overloads: u64 = self.tracks.iter().map(|t| t.overloads()).sum();
        self.stats.frames.store(self.cursor, Ordering::Relaxed);
        self.stats.overloads.store(overloads, Ordering::Relaxed);
        if self.is_finished() {
            self.stats.finished.store(true, Ordering::Release);
        }
        Ok(frames)
    }

    /// Render the whole song offline in blocks of `block` frames
    pub fn render_to_end(&mut self, channels: usize, block: usize) -> Result<Vec<f32>, PlaybackError> {
        let block = block.clamp(1, self.capacity.max(1));
        let mut chunk = vec![0.0f32; block * channels];
        let mut rendered = Vec::new();
        while !self.is_finished() && !self.stop.is_stopped() {
            let frames = self.render(&mut chunk, channels)?;
            if frames == 0 {
                break;
            }
            rendered.extend_from_slice(&chunk[..frames * channels]);
        }
        debug!("Rendered {} frames offline", rendered.len() / channels.max(1));
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrangement::{Automation, Note, Part};

    const SR: f64 = 8000.0;

    fn busy_song() -> Arc<Song> {
        let mut song = Song::new("Busy", "rock").with_duration(2.0);
        for (i, name) in ["piano", "bass", "kick", "hihat", "vocal", "electric_guitar"].iter().enumerate() {
            let mut part = Part::new("Verse", *name).with_pan(-0.6 + 0.25 * i as f64);
            for k in 0..8 {
                let note = Note::new(110.0 * (1.0 + i as f64 * 0.5), 0.2, k as f64 * 0.25).with_velocity(0.8);
                part.notes.push(if *name == "vocal" { note.with_phoneme(k as u8) } else { note });
            }
            part.effects.use_reverb = i % 2 == 0;
            part.effects.reverb_delay = 0.1;
            part.effects.reverb_decay = 0.4;
            part.effects.reverb_mix_factor = 0.5;
            part.effects.use_distortion = *name == "electric_guitar";
            part.effects.distortion_drive = 4.0;
            part.effects.distortion_threshold = 0.5;
            part.volume_automation = Automation::from_points([(0.0, 0.5), (2.0, 1.0)]);
            song.add_part(part);
        }
        Arc::new(song)
    }

    #[test]
    fn test_zero_note_song_is_silent() {
        let song = Arc::new(Song::new("Quiet", "pop").with_duration(1.0).with_part(Part::new("Verse", "piano")));
        let mut scheduler = Scheduler::new(song, SR, 256, 2).unwrap();
        let out = scheduler.render_to_end(2, 256).unwrap();
        assert!(!out.is_empty());
        assert!(out.iter().all(|&s| s == 0.0));
        assert!(scheduler.stats().is_finished());
    }

    #[test]
    fn test_worker_count_is_bit_identical() {
        let mut single = Scheduler::new(busy_song(), SR, 512, 1).unwrap();
        let mut many = Scheduler::new(busy_song(), SR, 512, 4).unwrap();
        assert_eq!(single.workers(), 1);
        assert!(many.workers() >= 1);

        let a = single.render_to_end(BUS_CHANNELS, 512).unwrap();
        let b = many.render_to_end(BUS_CHANNELS, 512).unwrap();
        assert_eq!(a.len(), b.len());
        assert!(a.iter().zip(&b).all(|(x, y)| x.to_bits() == y.to_bits()));
        assert!(a.iter().any(|&s| s != 0.0));
        assert!(a.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn test_stop_emits_silence_and_freezes_cursor() {
        let mut scheduler = Scheduler::new(busy_song(), SR, 256, 2).unwrap();
        let mut out = vec![0.0f32; 256 * 2];
        scheduler.render(&mut out, 2).unwrap();
        let position = scheduler.position();

        scheduler.stop_handle().stop();
        out.fill(1.0);
        assert_eq!(scheduler.render(&mut out, 2).unwrap(), 0);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(scheduler.position(), position);
    }

    #[test]
    fn test_oversized_block_is_fatal() {
        let mut scheduler = Scheduler::new(busy_song(), SR, 128, 1).unwrap();
        let mut out = vec![1.0f32; 129 * 2];
        let result = scheduler.render(&mut out, 2);
        assert!(matches!(
            result,
            Err(PlaybackError::BufferTooLarge { requested: 129, capacity: 128 })
        ));
        assert!(scheduler.stats().is_fatal());
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(scheduler.position(), 0.0);
    }

    #[test]
    fn test_playback_finishes_after_tails() {
        let mut scheduler = Scheduler::new(busy_song(), SR, 256, 2).unwrap();
        let out = scheduler.render_to_end(1, 256).unwrap();
        let seconds = out.len() as f64 / SR;
        assert!(seconds > 2.0 + instruments::max_tail());
        assert!(seconds < 2.0 + instruments::max_tail() + 256.0 / SR + 1e-9);

        let mut more = vec![1.0f32; 64];
        assert_eq!(scheduler.render(&mut more, 1).unwrap(), 0);
        assert!(more.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_master_fade_starts_silent() {
        let mut scheduler = Scheduler::new(busy_song(), SR, 256, 1).unwrap();
        let mut out = vec![1.0f32; 4 * BUS_CHANNELS];
        scheduler.render(&mut out, BUS_CHANNELS).unwrap();
        assert!(out[..BUS_CHANNELS].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_zero_channels_rejected() {
        let mut scheduler = Scheduler::new(busy_song(), SR, 256, 1).unwrap();
        let mut out = vec![0.0f32; 16];
        assert!(matches!(scheduler.render(&mut out, 0), Err(PlaybackError::NoChannels)));
    }
}
