// Flat chord descriptions for API-style output.

use crate::chord::Chord;
use crate::pitch::Pitch;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordRecord {
    /// Pitched common name, e.g. `C-major triad`.
    pub chord: String,
    /// Pitch names with octaves, space separated, in written order.
    pub notes: String,
    /// Root pitch with octave.
    pub root: String,
    pub quality: String,
}

pub fn describe(chord: &Chord) -> ChordRecord {
    ChordRecord {
        chord: chord.pitched_common_name(),
        notes: chord
            .pitches()
            .iter()
            .map(Pitch::name_with_octave)
            .collect::<Vec<_>>()
            .join(" "),
        root: chord.root().name_with_octave(),
        quality: chord.quality().label().to_string(),
    }
}

pub fn describe_all(chords: &[Chord]) -> Vec<ChordRecord> {
    chords.iter().map(describe).collect()
}
