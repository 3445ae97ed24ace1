// Chord objects parsed from vocabulary symbols.
//
// A symbol is a list of pitch tokens separated by `.` or whitespace, e.g.
// `A.C#.E`, `4.7.11` or `C4 E4 G4`. Parsing keeps the tokens in their written
// order; analysis (root, quality, common name) works on pitch classes.
//
// Root finding tries each entry of `CHORD_TEMPLATES` in order against every
// candidate root, lowest pitch first, so an inverted triad still reports the
// triad root. Sets that match no template fall back to the pitch with the most
// thirds and fifths stacked above it.

use crate::pitch::{Pitch, PitchError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// A vocabulary symbol that could not be turned into a chord.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed chord symbol '{symbol}': {reason}")]
pub struct MalformedSymbolError {
    pub symbol: String,
    #[source]
    pub reason: PitchError,
}

/// Triad quality derived from the third and fifth above the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Other,
}

impl Quality {
    pub fn label(self) -> &'static str {
        match self {
            Quality::Major => "major",
            Quality::Minor => "minor",
            Quality::Diminished => "diminished",
            Quality::Augmented => "augmented",
            Quality::Other => "other",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// (common name, semitone set above the root). Earlier entries win.
const CHORD_TEMPLATES: &[(&str, &[u8])] = &[
    ("major triad", &[0, 4, 7]),
    ("minor triad", &[0, 3, 7]),
    ("diminished triad", &[0, 3, 6]),
    ("augmented triad", &[0, 4, 8]),
    ("dominant seventh chord", &[0, 4, 7, 10]),
    ("major seventh chord", &[0, 4, 7, 11]),
    ("minor seventh chord", &[0, 3, 7, 10]),
    ("half-diminished seventh chord", &[0, 3, 6, 10]),
    ("diminished seventh chord", &[0, 3, 6, 9]),
    ("minor-major seventh chord", &[0, 3, 7, 11]),
    ("suspended-second triad", &[0, 2, 7]),
    ("suspended-fourth triad", &[0, 5, 7]),
    ("perfect fifth", &[0, 7]),
];

/// One or more pitches. Never empty: `parse` and deserialization both
/// reject an empty pitch list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ChordPitches")]
pub struct Chord {
    pitches: Vec<Pitch>,
}

/// Unchecked serde form of `Chord`.
#[derive(Deserialize)]
struct ChordPitches {
    pitches: Vec<Pitch>,
}

impl TryFrom<ChordPitches> for Chord {
    type Error = PitchError;

    fn try_from(raw: ChordPitches) -> Result<Self, Self::Error> {
        if raw.pitches.is_empty() {
            return Err(PitchError::EmptyToken);
        }
        Ok(Chord {
            pitches: raw.pitches,
        })
    }
}

impl Chord {
    /// Parse a vocabulary symbol.
    pub fn parse(symbol: &str) -> Result<Self, MalformedSymbolError> {
        let malformed = |reason| MalformedSymbolError {
            symbol: symbol.to_string(),
            reason,
        };

        let trimmed = symbol.trim();
        if trimmed.is_empty() {
            return Err(malformed(PitchError::EmptyToken));
        }

        let pitches = trimmed
            .split(|c: char| c == '.' || c.is_whitespace())
            .filter(|t| !t.is_empty() || trimmed.contains('.'))
            .map(Pitch::parse)
            .collect::<Result<Vec<_>, _>>()
            .map_err(malformed)?;

        Ok(Chord { pitches })
    }

    pub fn pitches(&self) -> &[Pitch] {
        &self.pitches
    }

    /// Pitch class names in written order, octave stripped.
    pub fn pitch_class_names(&self) -> Vec<String> {
        self.pitches.iter().map(Pitch::name).collect()
    }

    fn pitch_class_set(&self) -> BTreeSet<u8> {
        self.pitches.iter().map(Pitch::pitch_class).collect()
    }

    /// Pitches sorted low to high, the order in which root candidates are
    /// tried.
    fn by_height(&self) -> Vec<Pitch> {
        let mut sorted = self.pitches.clone();
        sorted.sort_by_key(Pitch::midi);
        sorted
    }

    /// Template match as (template name, root pitch).
    fn template_match(&self) -> Option<(&'static str, Pitch)> {
        let pcs = self.pitch_class_set();
        let candidates = self.by_height();
        for &(name, intervals) in CHORD_TEMPLATES {
            if intervals.len() != pcs.len() {
                continue;
            }
            for candidate in &candidates {
                let root_pc = candidate.pitch_class();
                let matches = pcs
                    .iter()
                    .all(|&pc| intervals.contains(&((pc + 12 - root_pc) % 12)));
                if matches {
                    return Some((name, *candidate));
                }
            }
        }
        None
    }

    /// Root pitch, octave included.
    pub fn root(&self) -> Pitch {
        if let Some((_, root)) = self.template_match() {
            return root;
        }

        let pcs = self.pitch_class_set();
        let candidates = self.by_height();
        let mut best = candidates[0];
        let mut best_score = 0;
        for candidate in &candidates {
            let root_pc = candidate.pitch_class();
            let score = pcs
                .iter()
                .filter(|&&pc| matches!((pc + 12 - root_pc) % 12, 3 | 4 | 7))
                .count();
            if score > best_score {
                best_score = score;
                best = *candidate;
            }
        }
        best
    }

    pub fn quality(&self) -> Quality {
        let root_pc = self.root().pitch_class();
        let above: BTreeSet<u8> = self
            .pitch_class_set()
            .iter()
            .map(|&pc| (pc + 12 - root_pc) % 12)
            .collect();

        let fifth = [7, 6, 8].into_iter().find(|iv| above.contains(iv));
        if above.contains(&4) {
            match fifth {
                None | Some(7) => Quality::Major,
                Some(8) => Quality::Augmented,
                _ => Quality::Other,
            }
        } else if above.contains(&3) {
            match fifth {
                None | Some(7) => Quality::Minor,
                Some(6) => Quality::Diminished,
                _ => Quality::Other,
            }
        } else {
            Quality::Other
        }
    }

    pub fn common_name(&self) -> String {
        if let Some((name, _)) = self.template_match() {
            return name.to_string();
        }
        match self.pitch_class_set().len() {
            1 => "note",
            2 => "dyad",
            3 => "trichord",
            4 => "tetrachord",
            5 => "pentachord",
            6 => "hexachord",
            _ => "chord",
        }
        .to_string()
    }

    /// Common name prefixed by the root, e.g. `A-major triad`. A single pitch
    /// class is named by the pitch alone.
    pub fn pitched_common_name(&self) -> String {
        let root = self.root().name();
        if self.pitch_class_set().len() == 1 {
            root
        } else {
            format!("{root}-{}", self.common_name())
        }
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.pitches.iter().map(Pitch::name_with_octave).collect();
        write!(f, "<{}>", names.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dotted_names() {
        let chord = Chord::parse("A.C#.E").unwrap();
        assert_eq!(chord.pitch_class_names(), vec!["A", "C#", "E"]);
        assert_eq!(chord.root().name(), "A");
        assert_eq!(chord.quality(), Quality::Major);
        assert_eq!(chord.pitched_common_name(), "A-major triad");
    }

    #[test]
    fn parses_pitch_class_numbers() {
        // E minor as normal-order pitch classes.
        let chord = Chord::parse("4.7.11").unwrap();
        assert_eq!(chord.pitch_class_names(), vec!["E", "G", "B"]);
        assert_eq!(chord.quality(), Quality::Minor);
        assert_eq!(chord.root().name_with_octave(), "E4");
    }

    #[test]
    fn parses_space_separated_with_octaves() {
        let chord = Chord::parse("C4 E4 G4").unwrap();
        assert_eq!(chord.pitches().len(), 3);
        assert_eq!(chord.pitched_common_name(), "C-major triad");
    }

    #[test]
    fn inversion_keeps_triad_root() {
        // First-inversion C major: E3 G3 C4.
        let chord = Chord::parse("E3.G3.C4").unwrap();
        assert_eq!(chord.root().name_with_octave(), "C4");
        assert_eq!(chord.quality(), Quality::Major);
    }

    #[test]
    fn seventh_and_diminished_qualities() {
        let g7 = Chord::parse("G.B.D.F").unwrap();
        assert_eq!(g7.common_name(), "dominant seventh chord");
        assert_eq!(g7.quality(), Quality::Major);

        let bdim = Chord::parse("B.D.F").unwrap();
        assert_eq!(bdim.quality(), Quality::Diminished);
        assert_eq!(bdim.pitched_common_name(), "B-diminished triad");
    }

    #[test]
    fn single_note_and_unknown_sets() {
        let single = Chord::parse("7").unwrap();
        assert_eq!(single.common_name(), "note");
        assert_eq!(single.pitched_common_name(), "G");
        assert_eq!(single.quality(), Quality::Other);

        let cluster = Chord::parse("C.C#.D").unwrap();
        assert_eq!(cluster.common_name(), "trichord");
        assert_eq!(cluster.quality(), Quality::Other);
    }

    #[test]
    fn deserialization_rejects_empty_chords() {
        let chord = Chord::parse("D.F#.A").unwrap();
        let json = serde_json::to_string(&chord).unwrap();
        let restored: Chord = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, chord);
        assert!(serde_json::from_str::<Chord>(r#"{"pitches":[]}"#).is_err());
    }

    #[test]
    fn malformed_symbols_are_reported() {
        let err = Chord::parse("C..E").unwrap_err();
        assert_eq!(err.symbol, "C..E");
        assert_eq!(err.reason, PitchError::EmptyToken);

        assert!(Chord::parse("").is_err());
        assert!(Chord::parse("X.Y").is_err());
        assert!(Chord::parse("200").is_err());
    }
}
