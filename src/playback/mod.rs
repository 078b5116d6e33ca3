// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Song playback.
//!
//! This module turns a loaded song into audio blocks:
//! - Part tracks with active-note tables and private effect chains
//! - An eight-channel spatial bus with master fades and stereo downmix
//! - A block scheduler running parts on a long-lived worker pool

pub mod mixer;
pub mod scheduler;
pub mod track;

use thiserror::Error;

pub use mixer::{BusFrame, BUS_CHANNELS, MASTER_FADE};
pub use scheduler::{PlaybackStats, Scheduler, StopHandle, DEFAULT_CAPACITY};
pub use track::{PartTrack, MAX_ACTIVE_NOTES};

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// A callback asked for more frames than were pre-allocated
    #[error("requested {requested} frames but buffers hold {capacity}")]
    BufferTooLarge { requested: usize, capacity: usize },
    /// Output with no channels
    #[error("output has no channels")]
    NoChannels,
    /// Worker pool could not start
    #[error("failed to start mixing workers: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}
