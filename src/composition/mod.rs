// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Song composition: the planner and its per-run session caches.

pub mod planner;
pub mod session;

pub use planner::{Planner, PlannerConfig, Stage};
pub use session::Session;
