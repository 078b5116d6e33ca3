// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Performance benchmarks for tunesmith
//!
//! Run with: cargo bench
//!
//! These benchmarks measure:
//! - Per-sample synthesis cost by instrument
//! - The audio callback: one block across every part
//! - `.song` serialization and parsing
//! - Whole-song composition

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use tunesmith::arrangement::{parse_song, write_song, Song};
use tunesmith::composition::Planner;
use tunesmith::playback::{Scheduler, BUS_CHANNELS};
use tunesmith::style::StyleBook;
use tunesmith::synth::{self, instruments, Voice, DEFAULT_SAMPLE_RATE};

const BLOCK: usize = 1024;

fn generated_song() -> Song {
    let book = StyleBook::builtin();
    Planner::new(&book).compose_seeded("rock", 42)
}

/// Benchmark one block of samples for a few representative instruments
fn bench_synthesis(c: &mut Criterion) {
    let mut group = c.benchmark_group("wave");
    for name in ["piano", "pad", "electric_guitar", "snare", "vocal"] {
        let instrument = match instruments::lookup(name) {
            Some(instrument) => instrument,
            None => continue,
        };
        group.bench_with_input(BenchmarkId::new("block", name), &instrument, |b, &instrument| {
            let mut voice = Voice::new(DEFAULT_SAMPLE_RATE, 1);
            let dt = voice.dt();
            b.iter(|| {
                voice.start(1, Some(3), false);
                let mut sum = 0.0f32;
                for i in 0..BLOCK {
                    sum += synth::wave(instrument, &mut voice, i as f64 * dt, black_box(220.0), 0.5);
                }
                black_box(sum)
            })
        });
    }
    group.finish();
}

/// Benchmark the render callback at several worker counts
fn bench_mixing_callback(c: &mut Criterion) {
    let song = Arc::new(generated_song());
    let mut group = c.benchmark_group("callback");
    for workers in [1usize, 2, 4] {
        group.bench_with_input(BenchmarkId::new("workers", workers), &workers, |b, &workers| {
            let mut scheduler = match Scheduler::new(Arc::clone(&song), DEFAULT_SAMPLE_RATE, BLOCK, workers) {
                Ok(scheduler) => scheduler,
                Err(_) => return,
            };
            let mut out = vec![0.0f32; BLOCK * BUS_CHANNELS];
            b.iter(|| {
                let frames = scheduler.render(&mut out, BUS_CHANNELS).unwrap_or(0);
                black_box(frames)
            })
        });
    }
    group.finish();
}

/// Benchmark writing and reading a generated song
fn bench_codec(c: &mut Criterion) {
    let song = generated_song();
    let text = write_song(&song);

    c.bench_function("codec_write", |b| b.iter(|| black_box(write_song(black_box(&song)))));
    c.bench_function("codec_parse", |b| b.iter(|| black_box(parse_song(black_box(&text)))));
}

/// Benchmark composing a full song
fn bench_generation(c: &mut Criterion) {
    let book = StyleBook::builtin();
    let planner = Planner::new(&book);
    let mut group = c.benchmark_group("compose");
    group.sample_size(20);
    for genre in ["pop", "jazz", "electronic"] {
        group.bench_with_input(BenchmarkId::from_parameter(genre), &genre, |b, &genre| {
            let mut seed = 0u64;
            b.iter(|| {
                seed += 1;
                black_box(planner.compose_seeded(genre, seed))
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_synthesis,
    bench_mixing_callback,
    bench_codec,
    bench_generation,
);

criterion_main!(benches);
