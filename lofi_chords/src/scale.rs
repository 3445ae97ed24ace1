// Scale tables and the scale-membership constraint.
//
// A scale is an ordered list of pitch-class names with no octave, spelled the
// way `pitch.rs` spells names (`#` sharp, `-` flat). Membership is exact text
// comparison: `D#` is not a member of a scale that lists `E-`. This keeps the
// constraint identical to the one the predictor's vocabulary was collected
// under.
//
// The ten default scales (E/C/G/D/A, major and natural minor) are literal
// data. `ScaleTable` is a plain map so a config file can replace or extend
// it; lookup is case-sensitive and an absent name is `Error::UnknownScale`.
//
// Used by decode.rs to filter predictor output.

use crate::chord::Chord;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scale {
    notes: Vec<String>,
}

impl Scale {
    pub fn new<I, S>(notes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Scale {
            notes: notes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Whether a single pitch-class name belongs to the scale.
    pub fn contains_name(&self, name: &str) -> bool {
        self.notes.iter().any(|n| n == name)
    }

    /// A chord is in scale when every one of its pitch classes is.
    pub fn contains_chord(&self, chord: &Chord) -> bool {
        chord
            .pitches()
            .iter()
            .all(|p| self.contains_name(&p.name()))
    }
}

/// Named scales available to a generation session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScaleTable {
    scales: BTreeMap<String, Scale>,
}

impl ScaleTable {
    pub fn new() -> Self {
        ScaleTable {
            scales: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, scale: Scale) {
        self.scales.insert(name.into(), scale);
    }

    pub fn get(&self, name: &str) -> Result<&Scale> {
        self.scales.get(name).ok_or_else(|| Error::UnknownScale {
            name: name.to_string(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scales.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.scales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }
}

impl Default for ScaleTable {
    /// The built-in major and natural-minor scales on E, C, G, D and A.
    fn default() -> Self {
        const DEFAULTS: [(&str, [&str; 8]); 10] = [
            ("e_major_scale", ["E", "F#", "G#", "A", "B", "C#", "D#", "E"]),
            ("c_major_scale", ["C", "D", "E", "F", "G", "A", "B", "C"]),
            ("g_major_scale", ["G", "A", "B", "C", "D", "E", "F#", "G"]),
            ("d_major_scale", ["D", "E", "F#", "G", "A", "B", "C#", "D"]),
            ("a_major_scale", ["A", "B", "C#", "D", "E", "F#", "G#", "A"]),
            ("e_minor_scale", ["E", "F#", "G", "A", "B", "C", "D", "E"]),
            ("c_minor_scale", ["C", "D", "E-", "F", "G", "A-", "B-", "C"]),
            ("g_minor_scale", ["G", "A", "B-", "C", "D", "E-", "F", "G"]),
            ("d_minor_scale", ["D", "E", "F", "G", "A", "B-", "C", "D"]),
            ("a_minor_scale", ["A", "B", "C", "D", "E", "F", "G", "A"]),
        ];

        let mut table = ScaleTable::new();
        for (name, notes) in DEFAULTS {
            table.insert(name, Scale::new(notes));
        }
        table
    }
}
