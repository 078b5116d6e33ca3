// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Per-generation caches.
//!
//! A `Session` lives for exactly one composition. It remembers the notes
//! generated for each reusable (instrument, section template) pair and the
//! chord progression picked for each template, so a second chorus sounds
//! like the first.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::Rng;
use tracing::debug;

use crate::arrangement::{Note, SectionTemplate};
use crate::style::StyleProfile;

/// Notes remembered for a reusable section
#[derive(Debug, Clone, PartialEq)]
pub struct SectionTemplateNotes {
    /// Start of the section the notes were generated for
    pub origin: f64,
    /// End of that section
    pub end: f64,
    /// Notes in absolute song time
    pub notes: Vec<Note>,
}

impl SectionTemplateNotes {
    /// Length of the source section
    pub fn length(&self) -> f64 {
        self.end - self.origin
    }
}

/// Caches scoped to one generation run
#[derive(Debug, Default)]
pub struct Session {
    templates: HashMap<(String, SectionTemplate), SectionTemplateNotes>,
    progressions: HashMap<SectionTemplate, Vec<i32>>,
}

impl Session {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored notes for an instrument in a section template
    pub fn template(&self, instrument: &str, template: SectionTemplate) -> Option<&SectionTemplateNotes> {
        self.templates.get(&(instrument.to_string(), template))
    }

    /// Remember the notes generated for a reusable section
    pub fn store_template(
        &mut self,
        instrument: &str,
        template: SectionTemplate,
        origin: f64,
        end: f64,
        notes: Vec<Note>,
    ) {
        if !template.is_reusable() {
            return;
        }
        debug!("Storing {} template for {} ({} notes)", template, instrument, notes.len());
        self.templates.insert(
            (instrument.to_string(), template),
            SectionTemplateNotes { origin, end, notes },
        );
    }

    /// Chord progression for a section template, picked on first use
    pub fn progression(&mut self, template: SectionTemplate, style: &StyleProfile, rng: &mut StdRng) -> Vec<i32> {
        self.progressions
            .entry(template)
            .or_insert_with(|| {
                if style.progressions.is_empty() {
                    vec![0]
                } else {
                    let idx = rng.gen_range(0..style.progressions.len());
                    let progression = style.progressions[idx].clone();
                    if progression.is_empty() {
                        vec![0]
                    } else {
                        progression
                    }
                }
            })
            .clone()
    }

    /// Number of stored section templates
    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.templates.clear();
        self.progressions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_progression_is_stable_per_template() {
        let style = StyleProfile::default();
        let mut rng = StdRng::seed_from_u64(7);
        let mut session = Session::new();
        let first = session.progression(SectionTemplate::Chorus, &style, &mut rng);
        for _ in 0..10 {
            assert_eq!(session.progression(SectionTemplate::Chorus, &style, &mut rng), first);
        }
        assert!(style.progressions.contains(&first));
    }

    #[test]
    fn test_empty_progressions_fall_back_to_tonic() {
        let style = StyleProfile {
            progressions: Vec::new(),
            ..StyleProfile::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let mut session = Session::new();
        assert_eq!(session.progression(SectionTemplate::Verse, &style, &mut rng), vec![0]);
    }

    #[test]
    fn test_only_reusable_templates_are_stored() {
        let mut session = Session::new();
        let notes = vec![Note::new(440.0, 0.5, 10.0)];
        session.store_template("piano", SectionTemplate::Intro, 0.0, 8.0, notes.clone());
        session.store_template("piano", SectionTemplate::Chorus, 10.0, 40.0, notes);
        assert_eq!(session.template_count(), 1);
        assert!(session.template("piano", SectionTemplate::Intro).is_none());
        let stored = session.template("piano", SectionTemplate::Chorus).unwrap();
        assert_eq!(stored.length(), 30.0);

        session.clear();
        assert_eq!(session.template_count(), 0);
    }
}
