// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use rand::Rng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tunesmith::arrangement::{next_song_path, Song};
use tunesmith::audio::{scale_preview, AudioEngine, PlaybackHandle};
use tunesmith::composition::Planner;
use tunesmith::config::AppConfig;
use tunesmith::style::StyleBook;
use tunesmith::synth::{discover_instruments, instruments, SampleCache};

/// Parsed command line
#[derive(Debug, PartialEq)]
enum Command {
    Generate { genre: String, seed: Option<u64> },
    Play { path: PathBuf },
    Audition { instrument: String },
    Instruments,
    Help,
}

fn print_usage() {
    println!("tunesmith - genre-driven song generator");
    println!();
    println!("Usage: tunesmith [--config <file>] <command>");
    println!();
    println!("Commands:");
    println!("  generate <genre> [--seed N]  Compose a song and write the next songN.song");
    println!("  play <file.song>             Play a song until it ends or Ctrl+C");
    println!("  audition <instrument>        Play a one-octave scale on an instrument");
    println!("  instruments                  List built-in and discovered instruments");
    println!("  --help                       Show this help message");
}

fn parse_args(args: &[String]) -> Result<(Command, Option<PathBuf>)> {
    let mut config = None;
    let mut seed = None;
    let mut positional = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok((Command::Help, config)),
            "--config" => {
                let path = iter.next().ok_or_else(|| anyhow!("--config requires a path"))?;
                config = Some(PathBuf::from(path));
            }
            "--seed" => {
                let value = iter.next().ok_or_else(|| anyhow!("--seed requires a number"))?;
                seed = Some(value.parse().map_err(|_| anyhow!("Invalid seed: {}", value))?);
            }
            other if other.starts_with("--") => bail!("Unknown option: {}", other),
            other => positional.push(other.to_string()),
        }
    }

    let command = match positional.first().map(String::as_str) {
        None => Command::Help,
        Some("generate") => Command::Generate {
            genre: positional.get(1).cloned().ok_or_else(|| anyhow!("generate requires a genre"))?,
            seed,
        },
        Some("play") => Command::Play {
            path: positional.get(1).map(PathBuf::from).ok_or_else(|| anyhow!("play requires a file"))?,
        },
        Some("audition") => Command::Audition {
            instrument: positional
                .get(1)
                .cloned()
                .ok_or_else(|| anyhow!("audition requires an instrument"))?,
        },
        Some("instruments") => Command::Instruments,
        Some(other) => bail!("Unknown command: {}", other),
    };
    Ok((command, config))
}

/// Built-in genres with configured overrides, checked against available instruments
fn load_styles(config: &AppConfig) -> Result<StyleBook> {
    let mut book = StyleBook::builtin();
    if let Some(path) = &config.paths.styles {
        let count = book.load_overrides(path)?;
        info!("Loaded {} style overrides from {:?}", count, path);
    }
    book.validate(&discover_instruments(&config.paths.instrument_dir));
    Ok(book)
}

fn generate(config: &AppConfig, genre: &str, seed: Option<u64>) -> Result<()> {
    let book = load_styles(config)?;
    let seed = seed
        .or(config.generation.seed)
        .unwrap_or_else(|| rand::thread_rng().gen());
    info!("Composing {} song with seed {}", genre, seed);

    let planner = Planner::new(&book).with_config(config.planner_config());
    let song = planner.compose_seeded(genre, seed);

    let dir = &config.generation.output_dir;
    fs::create_dir_all(dir).with_context(|| format!("Failed to create output directory: {:?}", dir))?;
    let path = next_song_path(dir);
    song.save(&path)?;

    println!(
        "Wrote {} - \"{}\" ({}, {:.0} BPM, {:.0}s, {} sections, {} notes)",
        path.display(),
        song.title(),
        song.scale_name(),
        song.bpm(),
        song.duration(),
        song.sections().len(),
        song.note_count()
    );
    Ok(())
}

async fn play(config: &AppConfig, path: &Path) -> Result<()> {
    let song = Song::load(path)?;
    info!(
        "Loaded '{}': {} sections, {} parts, {} notes",
        song.title(),
        song.sections().len(),
        song.parts().len(),
        song.note_count()
    );
    let engine = AudioEngine::with_config(config.audio_config()).with_workers(config.audio.workers);
    let handle = engine.play(Arc::new(song))?;
    wait_for(handle).await
}

async fn audition(config: &AppConfig, name: &str) -> Result<()> {
    let instrument = instruments::lookup(name).ok_or_else(|| {
        anyhow!(
            "Unknown instrument '{}'; available: {}",
            name,
            instruments::builtin_names().join(", ")
        )
    })?;
    let mut cache = SampleCache::new(config.audio.sample_rate as f64, 16);
    let samples = scale_preview(&mut cache, instrument);
    info!("Auditioning {} ({:.1}s)", instrument.spec().name, samples.len() as f64 / cache.sample_rate());

    let engine = AudioEngine::with_config(config.audio_config());
    let handle = engine.preview(samples)?;
    wait_for(handle).await
}

fn list_instruments(config: &AppConfig) {
    println!("Built-in instruments:");
    for instrument in instruments::all() {
        let spec = instrument.spec();
        println!(
            "  {:<16} {:<9} {:>7.1} - {:>7.1} Hz",
            spec.name,
            spec.role.name(),
            spec.low,
            spec.high
        );
    }

    let dir = &config.paths.instrument_dir;
    let extra: Vec<String> = discover_instruments(dir)
        .into_iter()
        .filter(|name| instruments::lookup(name).is_none())
        .collect();
    if !extra.is_empty() {
        println!();
        println!("Found in {:?} without a model:", dir);
        for name in extra {
            println!("  {}", name);
        }
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(_) => std::future::pending::<()>().await,
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await
}

/// Poll playback until it finishes, fails or a signal arrives
async fn wait_for(handle: PlaybackHandle) -> Result<()> {
    let latency = Duration::from_secs_f64(handle.config().latency_ms() / 1000.0);
    let mut ticker = tokio::time::interval(Duration::from_millis(250));
    let mut reported_overloads = 0;

    let ctrl_c = tokio::signal::ctrl_c();
    let sigterm = terminate();
    tokio::pin!(ctrl_c, sigterm);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted, stopping");
                break;
            }
            _ = &mut sigterm => {
                info!("Terminated, stopping");
                break;
            }
            _ = ticker.tick() => {
                if handle.is_fatal() {
                    handle.stop();
                    bail!("Audio device requested a larger buffer than playback can render; aborting");
                }
                let overloads = handle.stats().overloads();
                if overloads > reported_overloads {
                    warn!("{} notes skipped: too many simultaneous notes in a part", overloads - reported_overloads);
                    reported_overloads = overloads;
                }
                if handle.is_finished() {
                    info!("Playback finished at {:.1}s", handle.position());
                    break;
                }
            }
        }
    }

    // Let the silent block reach the device before the stream closes
    handle.stop();
    tokio::time::sleep(latency * 2).await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (command, config_path) = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            std::process::exit(1);
        }
    };
    if command == Command::Help {
        print_usage();
        return Ok(());
    }

    let config = AppConfig::discover(config_path.as_deref())?;
    match command {
        Command::Generate { genre, seed } => generate(&config, &genre, seed)?,
        Command::Play { path } => play(&config, &path).await?,
        Command::Audition { instrument } => audition(&config, &instrument).await?,
        Command::Instruments => list_instruments(&config),
        Command::Help => print_usage(),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_generate_with_seed() {
        let (command, config) = parse_args(&args(&["generate", "jazz", "--seed", "42"])).unwrap();
        assert_eq!(
            command,
            Command::Generate {
                genre: "jazz".into(),
                seed: Some(42)
            }
        );
        assert!(config.is_none());
    }

    #[test]
    fn test_parse_config_and_play() {
        let (command, config) = parse_args(&args(&["--config", "my.toml", "play", "song1.song"])).unwrap();
        assert_eq!(command, Command::Play { path: "song1.song".into() });
        assert_eq!(config, Some(PathBuf::from("my.toml")));
    }

    #[test]
    fn test_parse_help_and_empty() {
        assert_eq!(parse_args(&args(&[])).unwrap().0, Command::Help);
        assert_eq!(parse_args(&args(&["play", "--help"])).unwrap().0, Command::Help);
        assert_eq!(parse_args(&args(&["instruments"])).unwrap().0, Command::Instruments);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(&args(&["generate"])).is_err());
        assert!(parse_args(&args(&["generate", "pop", "--seed", "x"])).is_err());
        assert!(parse_args(&args(&["dance"])).is_err());
        assert!(parse_args(&args(&["--verbose"])).is_err());
        assert!(parse_args(&args(&["--config"])).is_err());
    }
}
