// Rendering accepted chords into a timed event stream.
//
// Each chord independently draws a note value from a weighted table, starts
// where the previous chord ended, and sounds all of its pitches for that
// value. Offsets and durations are in quarter notes. The timeline is the
// input to midi.rs; nothing here touches the filesystem.
//
// Default weights: eighth 0.65, quarter 0.05, half 0.25, sixteenth 0.05.

use crate::chord::Chord;
use crate::pitch::Pitch;
use lofi_prng::ChordRng;
use serde::{Deserialize, Serialize};

/// Note value categories a chord can be assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteValue {
    Eighth,
    Quarter,
    Half,
    Sixteenth,
}

impl NoteValue {
    /// Length in quarter notes.
    pub fn quarter_length(self) -> f64 {
        match self {
            NoteValue::Eighth => 0.5,
            NoteValue::Quarter => 1.0,
            NoteValue::Half => 2.0,
            NoteValue::Sixteenth => 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedValue {
    pub value: NoteValue,
    pub weight: f64,
}

/// Categorical distribution over note values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DurationTable {
    entries: Vec<WeightedValue>,
}

impl DurationTable {
    pub fn new(entries: Vec<WeightedValue>) -> Self {
        DurationTable { entries }
    }

    pub fn entries(&self) -> &[WeightedValue] {
        &self.entries
    }

    /// Weights must be finite and non-negative with a positive sum.
    pub fn is_valid(&self) -> bool {
        self.entries
            .iter()
            .all(|e| e.weight.is_finite() && e.weight >= 0.0)
            && self.entries.iter().map(|e| e.weight).sum::<f64>() > 0.0
    }

    /// Draw one note value. `None` only for a table with no usable weight.
    pub fn sample(&self, rng: &mut ChordRng) -> Option<NoteValue> {
        let weights: Vec<f64> = self.entries.iter().map(|e| e.weight).collect();
        rng.choose_weighted(&weights).map(|i| self.entries[i].value)
    }
}

impl Default for DurationTable {
    fn default() -> Self {
        let entry = |value, weight| WeightedValue { value, weight };
        DurationTable::new(vec![
            entry(NoteValue::Eighth, 0.65),
            entry(NoteValue::Quarter, 0.05),
            entry(NoteValue::Half, 0.25),
            entry(NoteValue::Sixteenth, 0.05),
        ])
    }
}

/// One chord placed in time.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedEvent {
    /// Start, in quarter notes from the beginning.
    pub offset: f64,
    pub value: NoteValue,
    pub pitches: Vec<Pitch>,
}

impl TimedEvent {
    pub fn duration(&self) -> f64 {
        self.value.quarter_length()
    }

    /// The chord split into single notes sharing this event's timing.
    pub fn notes(&self) -> impl Iterator<Item = NoteEvent> + '_ {
        self.pitches.iter().map(|&pitch| NoteEvent {
            pitch,
            offset: self.offset,
            duration: self.duration(),
        })
    }
}

/// A single sounding note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    pub pitch: Pitch,
    pub offset: f64,
    pub duration: f64,
}

/// Events in playback order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    pub events: Vec<TimedEvent>,
}

impl Timeline {
    /// Sum of all event durations, which is also where the next event would
    /// start.
    pub fn total_duration(&self) -> f64 {
        self.events.iter().map(TimedEvent::duration).sum()
    }

    pub fn notes(&self) -> impl Iterator<Item = NoteEvent> + '_ {
        self.events.iter().flat_map(|e| e.notes())
    }
}

/// Lay chords out back to back with sampled note values.
///
/// Falls back to eighth notes if the table has no usable weight; config
/// validation normally rules that out.
pub fn render(chords: &[Chord], durations: &DurationTable, rng: &mut ChordRng) -> Timeline {
    let mut offset = 0.0;
    let mut events = Vec::with_capacity(chords.len());
    for chord in chords {
        let value = durations.sample(rng).unwrap_or(NoteValue::Eighth);
        events.push(TimedEvent {
            offset,
            value,
            pitches: chord.pitches().to_vec(),
        });
        offset += value.quarter_length();
    }
    Timeline { events }
}
