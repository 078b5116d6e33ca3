// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Application settings.
//!
//! Settings come from an optional `tunesmith.toml`. Every field has a
//! default, so an empty or missing file yields a working configuration.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::audio::{AudioConfig, MAX_BUFFER_SIZE, MIN_BUFFER_SIZE};
use crate::composition::PlannerConfig;

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "tunesmith.toml";

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Output device settings
    pub audio: AudioSettings,
    /// Song generation settings
    pub generation: GenerationSettings,
    /// Filesystem locations
    pub paths: PathSettings,
}

/// Output device settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioSettings {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Frames per callback (clamped to 64..=8192)
    pub buffer_size: u32,
    /// Output channels, 8 or 2
    pub channels: u16,
    /// Mixing worker threads (0 = hardware threads)
    pub workers: usize,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            buffer_size: 1024,
            channels: 8,
            workers: 0,
        }
    }
}

/// Song generation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationSettings {
    /// Directory receiving `songN.song` files
    pub output_dir: PathBuf,
    /// Most instruments sounding in one section
    pub max_instruments_per_section: usize,
    /// Fixed seed; a fresh one is drawn when absent
    pub seed: Option<u64>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            max_instruments_per_section: 6,
            seed: None,
        }
    }
}

/// Filesystem locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathSettings {
    /// Directory scanned for instrument names
    pub instrument_dir: PathBuf,
    /// Optional YAML file of genre overrides
    pub styles: Option<PathBuf>,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            instrument_dir: PathBuf::from("instruments"),
            styles: None,
        }
    }
}

impl AppConfig {
    /// Load from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config = Self::from_toml(&contents)
            .with_context(|| format!("Invalid config file: {:?}", path.as_ref()))?;
        info!("Loaded configuration from {:?}", path.as_ref());
        Ok(config)
    }

    /// Load an explicit file, or `tunesmith.toml` if present, or defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            Self::load(fallback)
        } else {
            debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
            Ok(Self::default())
        }
    }

    /// Parse from a TOML string, clamping out-of-range values
    pub fn from_toml(text: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(text).context("Failed to parse TOML configuration")?;
        config.sanitize();
        Ok(config)
    }

    /// Serialize to a TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }

    /// Save to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let text = self.to_toml()?;
        fs::write(path.as_ref(), text)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    fn sanitize(&mut self) {
        self.audio.buffer_size = self.audio.buffer_size.clamp(MIN_BUFFER_SIZE, MAX_BUFFER_SIZE);
        if self.audio.channels != 2 {
            self.audio.channels = 8;
        }
        self.generation.max_instruments_per_section = self.generation.max_instruments_per_section.max(1);
    }

    /// Output stream settings
    pub fn audio_config(&self) -> AudioConfig {
        AudioConfig {
            sample_rate: self.audio.sample_rate,
            buffer_size: self.audio.buffer_size,
            channels: self.audio.channels,
        }
    }

    /// Planner settings
    pub fn planner_config(&self) -> PlannerConfig {
        PlannerConfig {
            max_instruments_per_section: self.generation.max_instruments_per_section,
            channel_count: self.audio.channels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let text = r#"
[audio]
sample_rate = 48000
buffer_size = 512
channels = 2
workers = 3

[generation]
output_dir = "songs"
max_instruments_per_section = 4
seed = 1234

[paths]
instrument_dir = "voices"
styles = "styles.yaml"
"#;
        let config = AppConfig::from_toml(text).unwrap();
        assert_eq!(config.audio.sample_rate, 48000);
        assert_eq!(config.audio.buffer_size, 512);
        assert_eq!(config.audio.channels, 2);
        assert_eq!(config.audio.workers, 3);
        assert_eq!(config.generation.output_dir, PathBuf::from("songs"));
        assert_eq!(config.generation.max_instruments_per_section, 4);
        assert_eq!(config.generation.seed, Some(1234));
        assert_eq!(config.paths.instrument_dir, PathBuf::from("voices"));
        assert_eq!(config.paths.styles, Some(PathBuf::from("styles.yaml")));

        let planner = config.planner_config();
        assert_eq!(planner.max_instruments_per_section, 4);
        assert_eq!(planner.channel_count, 2);
    }

    #[test]
    fn test_default_values() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.audio.sample_rate, 44100);
        assert_eq!(config.audio.buffer_size, 1024);
        assert_eq!(config.audio.channels, 8);
        assert_eq!(config.generation.max_instruments_per_section, 6);
        assert_eq!(config.generation.seed, None);
        assert_eq!(config.paths.styles, None);

        let partial = AppConfig::from_toml("[audio]\nworkers = 2\n").unwrap();
        assert_eq!(partial.audio.workers, 2);
        assert_eq!(partial.audio.buffer_size, 1024);
    }

    #[test]
    fn test_out_of_range_values_clamped() {
        let config = AppConfig::from_toml("[audio]\nbuffer_size = 16\nchannels = 5\n").unwrap();
        assert_eq!(config.audio.buffer_size, 64);
        assert_eq!(config.audio.channels, 8);

        let config = AppConfig::from_toml("[audio]\nbuffer_size = 100000\n").unwrap();
        assert_eq!(config.audio.buffer_size, 8192);
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        assert!(AppConfig::from_toml("[audio\nsample_rate = ").is_err());
        assert!(AppConfig::from_toml("[audio]\nsample_rate = \"fast\"\n").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tunesmith.toml");
        let mut config = AppConfig::default();
        config.generation.seed = Some(99);
        config.paths.styles = Some(PathBuf::from("extra.yaml"));
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert!(AppConfig::discover(Some(&path)).is_ok());
        assert!(AppConfig::load(dir.path().join("missing.toml")).is_err());
    }
}
