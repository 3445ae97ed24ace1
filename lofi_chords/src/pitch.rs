// Pitch spelling and parsing.
//
// A pitch is a step letter, an alteration (sharps positive, flats negative)
// and an octave. Names use `#` for sharps and `-` for flats, so E-flat in
// octave 4 prints as `E-4`. The scale tables are written in the same
// spelling, which makes scale membership a plain text comparison of pitch
// class names.
//
// Corpus tokens come in two shapes: named pitches (`C#`, `B-3`, `Eb5`) and
// integers. An integer below 12 is a bare pitch class placed in octave 4;
// anything from 12 to 127 is a MIDI note number. Integer pitches are spelled
// with the fixed table in `PC_SPELLING`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Octave given to pitches written without one.
pub const IMPLICIT_OCTAVE: i8 = 4;

/// Most sharps or flats a single token may carry.
pub const MAX_ACCIDENTALS: u8 = 4;

/// Spelling used for integer pitch classes 0-11.
const PC_SPELLING: [(char, i8); 12] = [
    ('C', 0),
    ('C', 1),
    ('D', 0),
    ('E', -1),
    ('E', 0),
    ('F', 0),
    ('F', 1),
    ('G', 0),
    ('G', 1),
    ('A', 0),
    ('B', -1),
    ('B', 0),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PitchError {
    #[error("empty pitch token")]
    EmptyToken,
    #[error("'{0}' is not a pitch letter")]
    BadStep(char),
    #[error("unreadable octave in '{0}'")]
    BadOctave(String),
    #[error("pitch number {0} is outside the MIDI range")]
    NumberOutOfRange(u64),
    #[error("'{0}' falls outside the MIDI range")]
    OutOfRange(String),
    #[error("too many accidentals in '{0}'")]
    TooManyAccidentals(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pitch {
    /// Upper-case step letter, `A` through `G`.
    pub step: char,
    /// Semitone alteration: +1 per sharp, -1 per flat.
    pub alter: i8,
    pub octave: i8,
}

impl Pitch {
    /// Spell a MIDI note number (0-127).
    pub fn from_midi(number: u8) -> Self {
        let (step, alter) = PC_SPELLING[(number % 12) as usize];
        Pitch {
            step,
            alter,
            octave: (number / 12) as i8 - 1,
        }
    }

    /// Spell a bare pitch class in the implicit octave.
    pub fn from_pitch_class(pc: u8) -> Self {
        let (step, alter) = PC_SPELLING[(pc % 12) as usize];
        Pitch {
            step,
            alter,
            octave: IMPLICIT_OCTAVE,
        }
    }

    /// Parse one chord-symbol token.
    pub fn parse(token: &str) -> Result<Self, PitchError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(PitchError::EmptyToken);
        }

        if token.bytes().all(|b| b.is_ascii_digit()) {
            let n: u64 = token
                .parse()
                .map_err(|_| PitchError::NumberOutOfRange(u64::MAX))?;
            return match n {
                0..12 => Ok(Pitch::from_pitch_class(n as u8)),
                12..=127 => Ok(Pitch::from_midi(n as u8)),
                _ => Err(PitchError::NumberOutOfRange(n)),
            };
        }

        let mut chars = token.chars();
        let first = chars.next().ok_or(PitchError::EmptyToken)?;
        let step = first.to_ascii_uppercase();
        if !('A'..='G').contains(&step) {
            return Err(PitchError::BadStep(first));
        }

        let rest = chars.as_str();
        let mut alter: i8 = 0;
        let mut accidentals: u8 = 0;
        let mut octave_start = rest.len();
        for (i, c) in rest.char_indices() {
            let delta = match c {
                '#' => 1,
                '-' | 'b' => -1,
                _ => {
                    octave_start = i;
                    break;
                }
            };
            accidentals += 1;
            if accidentals > MAX_ACCIDENTALS {
                return Err(PitchError::TooManyAccidentals(token.to_string()));
            }
            alter += delta;
        }

        let octave_text = &rest[octave_start..];
        let octave = if octave_text.is_empty() {
            IMPLICIT_OCTAVE
        } else if octave_text.bytes().all(|b| b.is_ascii_digit()) {
            octave_text
                .parse::<i8>()
                .map_err(|_| PitchError::BadOctave(token.to_string()))?
        } else {
            return Err(PitchError::BadOctave(token.to_string()));
        };

        let pitch = Pitch {
            step,
            alter,
            octave,
        };
        if !(0..=127).contains(&pitch.midi()) {
            return Err(PitchError::OutOfRange(token.to_string()));
        }
        Ok(pitch)
    }

    /// Pitch name without octave, e.g. `C#` or `B-`.
    pub fn name(&self) -> String {
        let mut name = String::with_capacity(1 + self.alter.unsigned_abs() as usize);
        name.push(self.step);
        let mark = if self.alter > 0 { '#' } else { '-' };
        for _ in 0..self.alter.unsigned_abs() {
            name.push(mark);
        }
        name
    }

    /// Pitch name with octave, e.g. `C#4`.
    pub fn name_with_octave(&self) -> String {
        format!("{}{}", self.name(), self.octave)
    }

    /// MIDI note number. May fall outside 0-127 for hand-built pitches.
    pub fn midi(&self) -> i32 {
        (self.octave as i32 + 1) * 12 + step_semitone(self.step) as i32 + self.alter as i32
    }

    /// Pitch class 0-11, C = 0.
    pub fn pitch_class(&self) -> u8 {
        (step_semitone(self.step) as i32 + self.alter as i32).rem_euclid(12) as u8
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name_with_octave())
    }
}

fn step_semitone(step: char) -> u8 {
    match step {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => 0,
    }
}
