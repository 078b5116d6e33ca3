// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Built-in genre table.

use super::{Boost, DrumPattern, StyleProfile, Weighted};
use crate::arrangement::SectionTemplate::{self, *};
use crate::music::ChordStyle;

fn weighted(entries: &[(&str, f64)]) -> Vec<Weighted> {
    entries.iter().map(|&(n, w)| Weighted::new(n, w)).collect()
}

fn boosts(entries: &[(&str, &str, f64)]) -> Vec<Boost> {
    entries
        .iter()
        .map(|&(when, raise, amount)| Boost {
            when: when.to_string(),
            raise: raise.to_string(),
            amount,
        })
        .collect()
}

fn pattern(instrument: &str, steps: &[u8], every_bars: u32, fill_steps: &[u8]) -> DrumPattern {
    DrumPattern {
        instrument: instrument.to_string(),
        steps: steps.to_vec(),
        every_bars,
        fill_steps: fill_steps.to_vec(),
    }
}

fn plans(entries: &[&[SectionTemplate]]) -> Vec<Vec<SectionTemplate>> {
    entries.iter().map(|p| p.to_vec()).collect()
}

fn progressions(entries: &[&[i32]]) -> Vec<Vec<i32>> {
    entries.iter().map(|p| p.to_vec()).collect()
}

const EIGHTHS: [u8; 8] = [0, 2, 4, 6, 8, 10, 12, 14];
const SIXTEENTHS: [u8; 16] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];
const TOM_FILL: [u8; 4] = [12, 13, 14, 15];

/// Every built-in genre
pub(super) fn all() -> Vec<StyleProfile> {
    vec![
        pop(),
        rock(),
        jazz(),
        blues(),
        electronic(),
        hiphop(),
        metal(),
        classical(),
        ambient(),
        funk(),
    ]
}

pub(super) fn pop() -> StyleProfile {
    StyleProfile {
        genre: "pop".into(),
        bpm_range: (95.0, 130.0),
        scales: weighted(&[
            ("major", 0.5),
            ("natural_minor", 0.2),
            ("mixolydian", 0.1),
            ("major_pentatonic", 0.2),
        ]),
        instruments: weighted(&[
            ("kick", 0.9),
            ("snare", 0.6),
            ("hihat", 0.6),
            ("bass", 0.9),
            ("piano", 0.6),
            ("acoustic_guitar", 0.4),
            ("vocal", 0.7),
            ("pad", 0.3),
            ("synth_lead", 0.3),
            ("synth_arp", 0.15),
            ("clap", 0.2),
            ("violin", 0.15),
            ("crash", 0.2),
        ]),
        boosts: boosts(&[
            ("kick", "snare", 0.3),
            ("snare", "hihat", 0.25),
            ("vocal", "pad", 0.15),
            ("synth_lead", "synth_arp", 0.3),
        ]),
        section_plans: plans(&[
            &[Intro, Verse, Chorus, Verse, Chorus, Bridge, Chorus, Outro],
            &[Intro, Verse, Verse, Chorus, Verse, Chorus, Outro],
            &[Intro, Chorus, Verse, Chorus, Bridge, Chorus, Chorus, Outro],
        ]),
        vocabulary: vec![Verse, Chorus, Bridge, Break],
        duration_weights: [0.05, 0.3, 0.05, 0.3, 0.1, 0.15, 0.03, 0.02],
        rest_probability: 0.15,
        step_weights: [0.5, 0.3, 0.15, 0.05],
        chromatic_probability: 0.03,
        chord_tone_probability: 0.25,
        motif_probability: 0.2,
        chord_style: ChordStyle::Triad,
        progressions: progressions(&[&[0, 4, 5, 3], &[0, 5, 3, 4], &[0, 3, 4, 4], &[5, 3, 0, 4]]),
        bars_per_chord: 1,
        swing: 0.0,
        syncopation: 0.1,
        drum_patterns: vec![
            pattern("kick", &[0, 6, 8], 1, &[]),
            pattern("snare", &[4, 12], 1, &[13, 14, 15]),
            pattern("hihat", &EIGHTHS, 1, &[]),
            pattern("clap", &[4, 12], 1, &[]),
            pattern("crash", &[0], 4, &[]),
            pattern("tom", &[], 1, &TOM_FILL),
        ],
        open_hat_steps: vec![14],
        chord_range: (130.0, 800.0),
        walking_bass: false,
        arp_rate: 2,
        distortion: 0.0,
        reverb_amount: 0.3,
    }
}

fn rock() -> StyleProfile {
    StyleProfile {
        genre: "rock".into(),
        bpm_range: (100.0, 150.0),
        scales: weighted(&[
            ("natural_minor", 0.35),
            ("major", 0.3),
            ("mixolydian", 0.15),
            ("minor_pentatonic", 0.2),
        ]),
        instruments: weighted(&[
            ("kick", 0.95),
            ("snare", 0.9),
            ("hihat", 0.6),
            ("electric_guitar", 0.9),
            ("bass", 0.9),
            ("vocal", 0.6),
            ("crash", 0.4),
            ("tom", 0.3),
            ("organ", 0.2),
            ("piano", 0.15),
            ("synth_lead", 0.15),
        ]),
        boosts: boosts(&[
            ("electric_guitar", "bass", 0.2),
            ("kick", "crash", 0.15),
            ("vocal", "electric_guitar", 0.1),
        ]),
        section_plans: plans(&[
            &[Intro, Verse, Chorus, Verse, Chorus, Solo, Chorus, Outro],
            &[Intro, Verse, Verse, Chorus, Bridge, Chorus, Outro],
            &[Intro, Verse, Chorus, Verse, Chorus, Break, Chorus, Outro],
        ]),
        vocabulary: vec![Verse, Chorus, Solo, Bridge],
        duration_weights: [0.1, 0.35, 0.05, 0.25, 0.08, 0.12, 0.03, 0.02],
        rest_probability: 0.12,
        step_weights: [0.45, 0.3, 0.15, 0.1],
        chromatic_probability: 0.05,
        chord_tone_probability: 0.3,
        motif_probability: 0.25,
        chord_style: ChordStyle::Power,
        progressions: progressions(&[&[0, 5, 3, 4], &[0, 3, 4, 3], &[0, 6, 5, 4]]),
        bars_per_chord: 1,
        swing: 0.0,
        syncopation: 0.1,
        drum_patterns: vec![
            pattern("kick", &[0, 8, 10], 1, &[]),
            pattern("snare", &[4, 12], 1, &[14, 15]),
            pattern("hihat", &EIGHTHS, 1, &[]),
            pattern("crash", &[0], 4, &[]),
            pattern("tom", &[], 1, &TOM_FILL),
        ],
        open_hat_steps: vec![6, 14],
        chord_range: (82.0, 660.0),
        walking_bass: false,
        arp_rate: 2,
        distortion: 0.6,
        reverb_amount: 0.25,
    }
}

fn jazz() -> StyleProfile {
    StyleProfile {
        genre: "jazz".into(),
        bpm_range: (80.0, 160.0),
        scales: weighted(&[
            ("dorian", 0.35),
            ("mixolydian", 0.2),
            ("major", 0.2),
            ("melodic_minor", 0.1),
            ("blues", 0.15),
        ]),
        instruments: weighted(&[
            ("bass", 0.95),
            ("piano", 0.9),
            ("hihat", 0.8),
            ("snare", 0.5),
            ("kick", 0.4),
            ("saxophone", 0.6),
            ("trumpet", 0.45),
            ("electric_piano", 0.2),
            ("flute", 0.15),
            ("vocal", 0.3),
            ("violin", 0.1),
        ]),
        boosts: boosts(&[
            ("saxophone", "trumpet", 0.15),
            ("hihat", "snare", 0.2),
            ("piano", "bass", 0.05),
        ]),
        section_plans: plans(&[
            &[Intro, Head, Solo, Solo, Head, Outro],
            &[Head, Solo, Bridge, Solo, Head, Outro],
            &[Intro, Head, Solo, Head, Outro],
        ]),
        vocabulary: vec![Solo, Head, Bridge],
        duration_weights: [0.05, 0.35, 0.1, 0.25, 0.1, 0.1, 0.03, 0.02],
        rest_probability: 0.2,
        step_weights: [0.4, 0.3, 0.2, 0.1],
        chromatic_probability: 0.12,
        chord_tone_probability: 0.3,
        motif_probability: 0.15,
        chord_style: ChordStyle::Extended,
        progressions: progressions(&[&[1, 4, 0, 0], &[0, 5, 1, 4], &[2, 5, 1, 4]]),
        bars_per_chord: 1,
        swing: 0.6,
        syncopation: 0.3,
        drum_patterns: vec![
            pattern("hihat", &[0, 4, 6, 8, 12, 14], 1, &[]),
            pattern("snare", &[7, 15], 1, &[10, 13, 14]),
            pattern("kick", &[0, 10], 1, &[]),
        ],
        open_hat_steps: vec![],
        chord_range: (110.0, 880.0),
        walking_bass: true,
        arp_rate: 2,
        distortion: 0.0,
        reverb_amount: 0.35,
    }
}

fn blues() -> StyleProfile {
    StyleProfile {
        genre: "blues".into(),
        bpm_range: (60.0, 120.0),
        scales: weighted(&[
            ("blues", 0.5),
            ("minor_pentatonic", 0.25),
            ("mixolydian", 0.25),
        ]),
        instruments: weighted(&[
            ("kick", 0.8),
            ("snare", 0.8),
            ("hihat", 0.7),
            ("bass", 0.9),
            ("electric_guitar", 0.7),
            ("piano", 0.6),
            ("organ", 0.4),
            ("vocal", 0.6),
            ("saxophone", 0.3),
        ]),
        boosts: boosts(&[("vocal", "electric_guitar", 0.15), ("organ", "piano", -0.2)]),
        section_plans: plans(&[
            &[Intro, Verse, Verse, Solo, Verse, Outro],
            &[Verse, Chorus, Verse, Solo, Chorus, Outro],
        ]),
        vocabulary: vec![Verse, Solo, Break],
        duration_weights: [0.03, 0.3, 0.12, 0.25, 0.12, 0.12, 0.04, 0.02],
        rest_probability: 0.2,
        step_weights: [0.5, 0.3, 0.15, 0.05],
        chromatic_probability: 0.08,
        chord_tone_probability: 0.3,
        motif_probability: 0.3,
        chord_style: ChordStyle::Seventh,
        progressions: progressions(&[&[0, 0, 0, 0, 3, 3, 0, 0, 4, 3, 0, 4], &[0, 3, 0, 4]]),
        bars_per_chord: 1,
        swing: 0.5,
        syncopation: 0.15,
        drum_patterns: vec![
            pattern("kick", &[0, 8], 1, &[]),
            pattern("snare", &[4, 12], 1, &[14, 15]),
            pattern("hihat", &[0, 2, 4, 6, 8, 10, 12, 14], 1, &[]),
        ],
        open_hat_steps: vec![],
        chord_range: (98.0, 700.0),
        walking_bass: true,
        arp_rate: 2,
        distortion: 0.25,
        reverb_amount: 0.3,
    }
}

fn electronic() -> StyleProfile {
    StyleProfile {
        genre: "electronic".into(),
        bpm_range: (118.0, 140.0),
        scales: weighted(&[
            ("natural_minor", 0.4),
            ("dorian", 0.2),
            ("minor_pentatonic", 0.15),
            ("major", 0.15),
            ("phrygian", 0.1),
        ]),
        instruments: weighted(&[
            ("kick", 1.0),
            ("hihat", 0.9),
            ("clap", 0.7),
            ("synth_bass", 0.95),
            ("pad", 0.7),
            ("synth_arp", 0.7),
            ("synth_lead", 0.6),
            ("snare", 0.2),
            ("crash", 0.3),
            ("vocal", 0.25),
        ]),
        boosts: boosts(&[("synth_lead", "synth_arp", 0.1), ("pad", "vocal", 0.1)]),
        section_plans: plans(&[
            &[Intro, Break, Drop, Break, Drop, Outro],
            &[Intro, Verse, Drop, Bridge, Drop, Outro],
            &[Intro, Verse, Break, Drop, Drop, Outro],
        ]),
        vocabulary: vec![Drop, Break, Verse],
        duration_weights: [0.25, 0.35, 0.05, 0.15, 0.05, 0.1, 0.03, 0.02],
        rest_probability: 0.1,
        step_weights: [0.4, 0.3, 0.2, 0.1],
        chromatic_probability: 0.02,
        chord_tone_probability: 0.35,
        motif_probability: 0.4,
        chord_style: ChordStyle::Sus,
        progressions: progressions(&[&[0, 5, 2, 6], &[0, 0, 5, 4], &[0, 3, 5, 4]]),
        bars_per_chord: 2,
        swing: 0.0,
        syncopation: 0.05,
        drum_patterns: vec![
            pattern("kick", &[0, 4, 8, 12], 1, &[]),
            pattern("clap", &[4, 12], 1, &[]),
            pattern("hihat", &[2, 6, 10, 14], 1, &[]),
            pattern("snare", &[], 1, &SIXTEENTHS[8..]),
            pattern("crash", &[0], 8, &[]),
        ],
        open_hat_steps: vec![2, 10],
        chord_range: (110.0, 880.0),
        walking_bass: false,
        arp_rate: 1,
        distortion: 0.2,
        reverb_amount: 0.4,
    }
}

fn hiphop() -> StyleProfile {
    StyleProfile {
        genre: "hiphop".into(),
        bpm_range: (80.0, 100.0),
        scales: weighted(&[
            ("natural_minor", 0.4),
            ("dorian", 0.3),
            ("minor_pentatonic", 0.2),
            ("phrygian", 0.1),
        ]),
        instruments: weighted(&[
            ("kick", 0.95),
            ("snare", 0.9),
            ("hihat", 0.9),
            ("clap", 0.3),
            ("synth_bass", 0.6),
            ("bass", 0.35),
            ("electric_piano", 0.5),
            ("piano", 0.35),
            ("pad", 0.3),
            ("vocal", 0.6),
            ("synth_lead", 0.15),
        ]),
        boosts: boosts(&[("synth_bass", "bass", -0.3), ("electric_piano", "pad", 0.1)]),
        section_plans: plans(&[
            &[Intro, Verse, Chorus, Verse, Chorus, Verse, Chorus, Outro],
            &[Intro, Verse, Chorus, Break, Verse, Chorus, Outro],
        ]),
        vocabulary: vec![Verse, Chorus, Break],
        duration_weights: [0.2, 0.35, 0.1, 0.2, 0.05, 0.06, 0.02, 0.02],
        rest_probability: 0.2,
        step_weights: [0.5, 0.25, 0.15, 0.1],
        chromatic_probability: 0.04,
        chord_tone_probability: 0.3,
        motif_probability: 0.35,
        chord_style: ChordStyle::Seventh,
        progressions: progressions(&[&[0, 5, 3, 4], &[0, 3, 0, 4], &[0, 6, 5, 6]]),
        bars_per_chord: 2,
        swing: 0.35,
        syncopation: 0.2,
        drum_patterns: vec![
            pattern("kick", &[0, 7, 10], 1, &[]),
            pattern("snare", &[4, 12], 1, &[15]),
            pattern("hihat", &SIXTEENTHS, 1, &[]),
            pattern("clap", &[4, 12], 1, &[]),
        ],
        open_hat_steps: vec![],
        chord_range: (110.0, 700.0),
        walking_bass: false,
        arp_rate: 2,
        distortion: 0.1,
        reverb_amount: 0.25,
    }
}

fn metal() -> StyleProfile {
    StyleProfile {
        genre: "metal".into(),
        bpm_range: (120.0, 190.0),
        scales: weighted(&[
            ("natural_minor", 0.35),
            ("phrygian", 0.3),
            ("harmonic_minor", 0.2),
            ("diminished", 0.1),
            ("locrian", 0.05),
        ]),
        instruments: weighted(&[
            ("kick", 1.0),
            ("snare", 0.95),
            ("electric_guitar", 1.0),
            ("bass", 0.9),
            ("crash", 0.6),
            ("hihat", 0.5),
            ("tom", 0.4),
            ("vocal", 0.5),
            ("synth_lead", 0.15),
            ("organ", 0.1),
        ]),
        boosts: boosts(&[("tom", "crash", 0.2)]),
        section_plans: plans(&[
            &[Intro, Verse, Chorus, Verse, Chorus, Solo, Break, Chorus, Outro],
            &[Intro, Verse, Verse, Chorus, Solo, Chorus, Outro],
        ]),
        vocabulary: vec![Verse, Chorus, Solo, Break],
        duration_weights: [0.35, 0.3, 0.05, 0.15, 0.05, 0.06, 0.02, 0.02],
        rest_probability: 0.08,
        step_weights: [0.5, 0.25, 0.15, 0.1],
        chromatic_probability: 0.06,
        chord_tone_probability: 0.35,
        motif_probability: 0.35,
        chord_style: ChordStyle::Power,
        progressions: progressions(&[&[0, 5, 6, 0], &[0, 1, 0, 6], &[0, 3, 5, 4]]),
        bars_per_chord: 1,
        swing: 0.0,
        syncopation: 0.05,
        drum_patterns: vec![
            pattern("kick", &EIGHTHS, 1, &[]),
            pattern("snare", &[4, 12], 1, &[13, 14, 15]),
            pattern("hihat", &[0, 4, 8, 12], 1, &[]),
            pattern("crash", &[0, 8], 2, &[]),
            pattern("tom", &[], 1, &[8, 10, 12, 13, 14, 15]),
        ],
        open_hat_steps: vec![],
        chord_range: (60.0, 500.0),
        walking_bass: false,
        arp_rate: 1,
        distortion: 0.9,
        reverb_amount: 0.2,
    }
}

fn classical() -> StyleProfile {
    StyleProfile {
        genre: "classical".into(),
        bpm_range: (60.0, 120.0),
        scales: weighted(&[
            ("major", 0.4),
            ("natural_minor", 0.25),
            ("harmonic_minor", 0.2),
            ("melodic_minor", 0.1),
            ("lydian", 0.05),
        ]),
        instruments: weighted(&[
            ("violin", 0.9),
            ("cello", 0.8),
            ("piano", 0.7),
            ("flute", 0.6),
            ("pad", 0.2),
            ("trumpet", 0.2),
            ("bass", 0.2),
            ("vocal", 0.15),
        ]),
        boosts: boosts(&[("violin", "cello", 0.15), ("trumpet", "flute", 0.1)]),
        section_plans: plans(&[
            &[Intro, Verse, Bridge, Verse, Chorus, Outro],
            &[Intro, Verse, Chorus, Verse, Chorus, Outro],
            &[Verse, Bridge, Verse, Solo, Verse, Outro],
        ]),
        vocabulary: vec![Verse, Bridge, Solo],
        duration_weights: [0.05, 0.25, 0.05, 0.3, 0.1, 0.15, 0.05, 0.05],
        rest_probability: 0.1,
        step_weights: [0.6, 0.25, 0.1, 0.05],
        chromatic_probability: 0.04,
        chord_tone_probability: 0.3,
        motif_probability: 0.3,
        chord_style: ChordStyle::Triad,
        progressions: progressions(&[&[0, 3, 4, 0], &[0, 5, 1, 4], &[0, 4, 5, 3]]),
        bars_per_chord: 1,
        swing: 0.0,
        syncopation: 0.0,
        drum_patterns: vec![],
        open_hat_steps: vec![],
        chord_range: (130.0, 1050.0),
        walking_bass: false,
        arp_rate: 2,
        distortion: 0.0,
        reverb_amount: 0.5,
    }
}

fn ambient() -> StyleProfile {
    StyleProfile {
        genre: "ambient".into(),
        bpm_range: (60.0, 90.0),
        scales: weighted(&[
            ("lydian", 0.25),
            ("major_pentatonic", 0.25),
            ("dorian", 0.2),
            ("major", 0.15),
            ("whole_tone", 0.15),
        ]),
        instruments: weighted(&[
            ("pad", 1.0),
            ("piano", 0.5),
            ("synth_arp", 0.4),
            ("cello", 0.3),
            ("flute", 0.3),
            ("electric_piano", 0.3),
            ("synth_lead", 0.2),
            ("vocal", 0.2),
            ("hihat", 0.1),
        ]),
        boosts: boosts(&[("piano", "cello", 0.1)]),
        section_plans: plans(&[
            &[Intro, Verse, Break, Verse, Outro],
            &[Intro, Verse, Bridge, Verse, Break, Outro],
        ]),
        vocabulary: vec![Verse, Break, Bridge],
        duration_weights: [0.0, 0.05, 0.0, 0.15, 0.1, 0.3, 0.2, 0.2],
        rest_probability: 0.3,
        step_weights: [0.5, 0.3, 0.15, 0.05],
        chromatic_probability: 0.0,
        chord_tone_probability: 0.4,
        motif_probability: 0.2,
        chord_style: ChordStyle::Quartal,
        progressions: progressions(&[&[0, 3], &[0, 4, 3, 0], &[0, 5]]),
        bars_per_chord: 2,
        swing: 0.0,
        syncopation: 0.0,
        drum_patterns: vec![pattern("hihat", &[0, 6, 10], 1, &[])],
        open_hat_steps: vec![10],
        chord_range: (110.0, 880.0),
        walking_bass: false,
        arp_rate: 4,
        distortion: 0.0,
        reverb_amount: 0.7,
    }
}

fn funk() -> StyleProfile {
    StyleProfile {
        genre: "funk".into(),
        bpm_range: (90.0, 120.0),
        scales: weighted(&[
            ("dorian", 0.4),
            ("mixolydian", 0.35),
            ("minor_pentatonic", 0.25),
        ]),
        instruments: weighted(&[
            ("kick", 0.95),
            ("snare", 0.95),
            ("hihat", 0.95),
            ("bass", 0.95),
            ("electric_guitar", 0.7),
            ("electric_piano", 0.5),
            ("organ", 0.4),
            ("trumpet", 0.4),
            ("saxophone", 0.4),
            ("vocal", 0.5),
            ("clap", 0.3),
            ("synth_bass", 0.2),
        ]),
        boosts: boosts(&[("trumpet", "saxophone", 0.2), ("electric_piano", "organ", -0.2)]),
        section_plans: plans(&[
            &[Intro, Verse, Chorus, Verse, Chorus, Break, Chorus, Outro],
            &[Intro, Verse, Verse, Chorus, Solo, Chorus, Outro],
        ]),
        vocabulary: vec![Verse, Chorus, Break, Solo],
        duration_weights: [0.3, 0.35, 0.05, 0.15, 0.05, 0.06, 0.02, 0.02],
        rest_probability: 0.25,
        step_weights: [0.45, 0.3, 0.15, 0.1],
        chromatic_probability: 0.06,
        chord_tone_probability: 0.3,
        motif_probability: 0.4,
        chord_style: ChordStyle::Seventh,
        progressions: progressions(&[&[0, 3], &[0, 0, 3, 4], &[1, 4]]),
        bars_per_chord: 2,
        swing: 0.15,
        syncopation: 0.4,
        drum_patterns: vec![
            pattern("kick", &[0, 3, 10], 1, &[]),
            pattern("snare", &[4, 12], 1, &[7, 14, 15]),
            pattern("hihat", &SIXTEENTHS, 1, &[]),
            pattern("clap", &[12], 1, &[]),
        ],
        open_hat_steps: vec![6, 14],
        chord_range: (130.0, 800.0),
        walking_bass: false,
        arp_rate: 1,
        distortion: 0.1,
        reverb_amount: 0.2,
    }
}
