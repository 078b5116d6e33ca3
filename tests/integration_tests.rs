// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Integration tests for tunesmith
//!
//! These tests verify that multiple components work together correctly.

use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

use tunesmith::arrangement::{
    next_song_path, parse_song, parse_song_with_diagnostics, write_song, Note, Part, Song, TIME_EPSILON,
};
use tunesmith::composition::planner::{pick_bpm, pick_scale};
use tunesmith::composition::{Planner, PlannerConfig};
use tunesmith::config::AppConfig;
use tunesmith::generators::{finalize, MAX_PART_NOTES, MAX_SONG_NOTES};
use tunesmith::playback::{Scheduler, BUS_CHANNELS};
use tunesmith::style::StyleBook;
use tunesmith::synth::instruments;

const SR: f64 = 8000.0;

/// Generated songs survive serialization unchanged
#[test]
fn test_generated_song_round_trip() {
    let book = StyleBook::builtin();
    let song = Planner::new(&book).compose_seeded("pop", 7);
    assert!(song.note_count() > 0);

    let text = write_song(&song);
    let (parsed, errors) = parse_song_with_diagnostics(&text);
    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(parsed.sections().len(), song.sections().len());
    assert_eq!(parsed.parts().len(), song.parts().len());
    assert_eq!(parsed, song);
}

/// Generate, save into a configured directory and load back
#[test]
fn test_generate_save_load_pipeline() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("tunesmith.toml");
    std::fs::write(
        &config_path,
        format!(
            "[generation]\noutput_dir = {:?}\nmax_instruments_per_section = 3\nseed = 5\n[audio]\nchannels = 2\n",
            dir.path().join("songs")
        ),
    )
    .unwrap();
    let config = AppConfig::load(&config_path).unwrap();

    let book = StyleBook::builtin();
    let planner = Planner::new(&book).with_config(config.planner_config());
    let song = planner.compose_seeded("rock", config.generation.seed.unwrap());
    assert_eq!(song.channel_count(), 2);

    let mut per_section: HashMap<&str, usize> = HashMap::new();
    for part in song.parts() {
        *per_section.entry(part.section.as_str()).or_default() += 1;
    }
    assert!(per_section.values().all(|&n| (1..=3).contains(&n)));

    std::fs::create_dir_all(&config.generation.output_dir).unwrap();
    let first = next_song_path(&config.generation.output_dir);
    assert!(first.ends_with("song1.song"));
    song.save(&first).unwrap();
    assert!(next_song_path(&config.generation.output_dir).ends_with("song2.song"));

    let loaded = Song::load(&first).unwrap();
    assert_eq!(loaded, song);
}

/// A file without a Sections block gets one section spanning the song
#[test]
fn test_missing_sections_block() {
    let text = "Song: Bare\nGenre: ambient\nBPM: 90\nDuration: 75\nParts: 1\n\
                Part: Verse\nInstrument: pad\nNotes: 1\nNote: 220 4 0\n";
    let song = parse_song(text);
    assert_eq!(song.sections().len(), 1);
    assert_eq!(song.sections()[0].start_time(), 0.0);
    assert_eq!(song.sections()[0].end_time(), 75.0);
    assert_eq!(song.parts().len(), 1);
    assert_eq!(song.parts()[0].notes.len(), 1);
}

/// Jazz tempos stay in range and scales follow the weights
#[test]
fn test_jazz_tempo_and_scale_distribution() {
    let book = StyleBook::builtin();
    let jazz = book.profile("jazz");
    let mut rng = StdRng::seed_from_u64(2024);
    let trials = 200;

    let mut counts: HashMap<String, usize> = HashMap::new();
    for _ in 0..trials {
        let bpm = pick_bpm(jazz, &mut rng);
        assert!((80.0..=160.0).contains(&bpm), "bpm {}", bpm);
        *counts.entry(pick_scale(jazz, &mut rng)).or_default() += 1;
    }

    let total_weight: f64 = jazz.scales.iter().map(|w| w.weight).sum();
    for name in counts.keys() {
        assert!(jazz.has_scale(name), "unexpected scale {}", name);
    }
    for scale in &jazz.scales {
        let observed = *counts.get(&scale.name).unwrap_or(&0) as f64 / trials as f64;
        let expected = scale.weight / total_weight;
        assert!(
            (observed - expected).abs() < 0.12,
            "{}: observed {:.3}, expected {:.3}",
            scale.name,
            observed,
            expected
        );
    }

    let planner = Planner::new(&book);
    for seed in 0..3 {
        let song = planner.compose_seeded("jazz", seed);
        assert!((80.0..=160.0).contains(&song.bpm()));
        assert!(jazz.has_scale(song.scale_name()));
        assert_eq!(song.genre(), "jazz");
    }
}

/// The post-pass enforces the song and part note ceilings
#[test]
fn test_note_ceiling_truncation() {
    let mut song = Song::new("Dense", "pop").with_duration(300.0);
    for p in 0..6 {
        let mut part = Part::new("Verse", if p % 2 == 0 { "piano" } else { "hihat" });
        for i in 0..1000 {
            part.notes.push(Note::new(440.0, 0.1, i as f64 * 0.25));
        }
        song.add_part(part);
    }
    assert_eq!(song.note_count(), 6000);

    finalize(&mut song);
    assert!(song.note_count() <= MAX_SONG_NOTES);
    assert!(song.parts().iter().all(|p| p.notes.len() <= MAX_PART_NOTES));

    let mut single = Song::new("Solo", "pop").with_duration(300.0);
    let mut part = Part::new("Verse", "piano");
    for i in 0..6000 {
        part.notes.push(Note::new(440.0, 0.02, i as f64 * 0.04));
    }
    single.add_part(part);
    finalize(&mut single);
    assert_eq!(single.parts()[0].notes.len(), MAX_PART_NOTES);
}

/// Every generated note is playable and stays inside its section
#[test]
fn test_generated_note_invariants() {
    let book = StyleBook::builtin();
    let planner = Planner::new(&book).with_config(PlannerConfig::default());
    for genre in ["pop", "metal", "electronic", "classical", "hiphop"] {
        let song = planner.compose_seeded(genre, 11);
        assert!(song.note_count() <= MAX_SONG_NOTES);
        for part in song.parts() {
            let spec = instruments::spec(&part.instrument).unwrap();
            let section = song.section(&part.section).unwrap();
            for note in &part.notes {
                assert!(note.duration > 0.0);
                assert!(note.freq.is_finite());
                assert!(spec.in_range(note.freq), "{} {} Hz", part.instrument, note.freq);
                assert!(note.start_time >= section.start_time() - TIME_EPSILON);
                assert!(note.end_time() <= section.end_time() + TIME_EPSILON);
                assert!((0.0..=1.0).contains(&note.volume));
            }
        }
    }
}

/// A song with no notes renders digital silence
#[test]
fn test_zero_note_song_renders_silence() {
    let song = Song::new("Empty", "ambient")
        .with_duration(1.5)
        .with_part(Part::new("Verse", "pad"))
        .with_part(Part::new("Verse", "kick"));
    let mut scheduler = Scheduler::new(Arc::new(song), SR, 1024, 0).unwrap();
    let out = scheduler.render_to_end(2, 1024).unwrap();
    assert!(out.len() >= (1.5 * SR) as usize * 2);
    assert!(out.iter().all(|&s| s == 0.0));
}

fn render_blocks(song: Arc<Song>, workers: usize, blocks: usize) -> Vec<f32> {
    let mut scheduler = Scheduler::new(song, SR, 512, workers).unwrap();
    let mut out = Vec::new();
    let mut block = vec![0.0f32; 512 * BUS_CHANNELS];
    for _ in 0..blocks {
        scheduler.render(&mut block, BUS_CHANNELS).unwrap();
        out.extend_from_slice(&block);
    }
    out
}

/// Mixing output does not depend on the worker count
#[test]
fn test_worker_count_does_not_change_output() {
    let book = StyleBook::builtin();
    let generated = Arc::new(Planner::new(&book).compose_seeded("electronic", 3));
    let a = render_blocks(Arc::clone(&generated), 1, 32);
    let b = render_blocks(Arc::clone(&generated), 5, 32);
    assert!(a.iter().zip(&b).all(|(x, y)| x.to_bits() == y.to_bits()));

    let mut busy = Song::new("Busy", "pop").with_duration(3.0);
    for (i, name) in ["bass", "piano", "snare", "pad"].iter().enumerate() {
        let mut part = Part::new("Verse", *name).with_pan(i as f64 * 0.3 - 0.45);
        part.effects.use_reverb = true;
        part.effects.reverb_delay = 0.05;
        part.effects.reverb_decay = 0.5;
        part.effects.reverb_mix_factor = 0.4;
        for k in 0..12 {
            part.notes.push(Note::new(130.0 + 20.0 * i as f64, 0.2, k as f64 * 0.25));
        }
        busy.add_part(part);
    }
    let busy = Arc::new(busy);
    let a = render_blocks(Arc::clone(&busy), 1, 20);
    let b = render_blocks(Arc::clone(&busy), 4, 20);
    assert!(a.iter().any(|&s| s != 0.0));
    assert!(a.iter().zip(&b).all(|(x, y)| x.to_bits() == y.to_bits()));
}
