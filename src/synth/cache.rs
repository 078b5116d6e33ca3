// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Rendered-note memoization.
//!
//! Sits in front of `render_note`: identical (instrument, frequency,
//! duration, articulation) requests share one buffer. Entries are evicted
//! first-in first-out once the entry limit is reached.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tracing::debug;

use super::instruments::Instrument;
use super::render_note;

/// Default maximum number of cached notes
pub const DEFAULT_CACHE_ENTRIES: usize = 256;

/// Frequency quantization step (Hz)
const FREQ_QUANTUM: f64 = 0.01;

/// Duration quantization step (seconds)
const DURATION_QUANTUM: f64 = 0.001;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    instrument: &'static str,
    freq: i64,
    duration: i64,
    phoneme: Option<u8>,
    open: bool,
}

/// Bounded cache of whole rendered notes
#[derive(Debug)]
pub struct SampleCache {
    sample_rate: f64,
    max_entries: usize,
    entries: HashMap<CacheKey, Arc<Vec<f32>>>,
    order: VecDeque<CacheKey>,
    hits: u64,
    misses: u64,
}

impl SampleCache {
    /// Create a cache holding at most `max_entries` notes (at least 1)
    pub fn new(sample_rate: f64, max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            sample_rate,
            max_entries,
            entries: HashMap::with_capacity(max_entries),
            order: VecDeque::with_capacity(max_entries),
            hits: 0,
            misses: 0,
        }
    }

    /// Sample rate notes are rendered at
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Rendered samples for a note, rendering on a miss
    pub fn get_or_render(
        &mut self,
        instrument: &'static dyn Instrument,
        freq: f64,
        duration: f64,
        phoneme: Option<u8>,
        open: bool,
    ) -> Arc<Vec<f32>> {
        let key = CacheKey {
            instrument: instrument.spec().name,
            freq: (freq / FREQ_QUANTUM).round() as i64,
            duration: (duration / DURATION_QUANTUM).round() as i64,
            phoneme,
            open,
        };
        if let Some(samples) = self.entries.get(&key) {
            self.hits += 1;
            return Arc::clone(samples);
        }

        self.misses += 1;
        let samples = Arc::new(render_note(
            instrument,
            key.freq as f64 * FREQ_QUANTUM,
            key.duration as f64 * DURATION_QUANTUM,
            phoneme,
            open,
            self.sample_rate,
        ));

        if self.entries.len() >= self.max_entries {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
                debug!("Evicted cached {} note", oldest.instrument);
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, Arc::clone(&samples));
        samples
    }

    /// Number of cached notes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry limit
    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    /// Cache hits so far
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Cache misses so far
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Drop every entry and reset the counters
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

impl Default for SampleCache {
    fn default() -> Self {
        Self::new(super::DEFAULT_SAMPLE_RATE, DEFAULT_CACHE_ENTRIES)
    }
}
