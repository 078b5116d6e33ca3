// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Instrument discovery.
//!
//! Each file in the instrument directory names an available instrument by
//! its stem (`piano.toml`, `Kick.wav`, ...). A missing or unreadable
//! directory means every built-in instrument is available.

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use super::instruments;

/// Names of the instruments available for generation.
///
/// Returns lower-cased file stems, sorted and de-duplicated.
pub fn discover_instruments(dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            info!(
                "Instrument directory {} not available ({}), using built-in instruments",
                dir.display(),
                e
            );
            return builtin();
        }
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                warn!("Failed to read instrument entry: {}", e);
                None
            }
        })
        .filter(|path| path.is_file())
        .filter_map(|path| {
            path.file_stem()
                .and_then(|stem| stem.to_str())
                .map(|stem| stem.trim().to_lowercase())
        })
        .filter(|name| !name.is_empty() && !name.starts_with('.'))
        .collect();
    names.sort();
    names.dedup();

    for name in &names {
        if instruments::lookup(name).is_none() {
            debug!("Discovered instrument '{}' has no synthesis model", name);
        }
    }
    info!("Discovered {} instruments in {}", names.len(), dir.display());
    names
}

fn builtin() -> Vec<String> {
    let mut names: Vec<String> = instruments::builtin_names()
        .into_iter()
        .map(String::from)
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    #[test]
    fn test_missing_directory_uses_builtins() {
        let dir = TempDir::new().unwrap();
        let names = discover_instruments(&dir.path().join("nope"));
        assert_eq!(names.len(), instruments::builtin_names().len());
        assert!(names.contains(&"vocal".to_string()));
    }

    #[test]
    fn test_scan_stems() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("Piano.toml")).unwrap();
        File::create(dir.path().join("kick.wav")).unwrap();
        File::create(dir.path().join("piano")).unwrap();
        File::create(dir.path().join(".hidden")).unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();

        let names = discover_instruments(dir.path());
        assert_eq!(names, vec!["kick".to_string(), "piano".to_string()]);
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        assert!(discover_instruments(dir.path()).is_empty());
    }
}
