// MIDI output from rendered timelines.
//
// Converts a Timeline into a Standard MIDI File (SMF format 1): track 0
// carries the tempo, track 1 carries every note on one channel with a single
// instrument program. Offsets are in quarter notes, so ticks are simply
// `offset * ticks_per_quarter`.
//
// Uses the `midly` crate for MIDI writing.

use crate::error::{Error, Result};
use crate::render::Timeline;
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Playback parameters for the written file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidiSettings {
    pub tempo_bpm: u16,
    /// General MIDI program number (0-127). 24 is nylon-string guitar.
    pub program: u8,
    /// Note-on velocity (1-127).
    pub velocity: u8,
    pub ticks_per_quarter: u16,
}

impl Default for MidiSettings {
    fn default() -> Self {
        MidiSettings {
            tempo_bpm: 120,
            program: 24,
            velocity: 90,
            ticks_per_quarter: 480,
        }
    }
}

/// Convert a Timeline to MIDI and write it to a file.
pub fn write_midi(timeline: &Timeline, settings: &MidiSettings, path: &Path) -> Result<()> {
    let buf = timeline_to_bytes(timeline, settings)?;
    std::fs::write(path, &buf).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Encode a Timeline as SMF bytes.
pub fn timeline_to_bytes(timeline: &Timeline, settings: &MidiSettings) -> Result<Vec<u8>> {
    let smf = timeline_to_smf(timeline, settings)?;
    let mut buf = Vec::new();
    smf.write_std(&mut buf).map_err(Error::Midi)?;
    Ok(buf)
}

/// Largest delta time a track event can carry (28 bits).
const MAX_DELTA: u32 = (1 << 28) - 1;

/// A note boundary at an absolute tick.
struct Boundary {
    tick: u32,
    key: u8,
    on: bool,
}

fn timeline_to_smf(timeline: &Timeline, settings: &MidiSettings) -> Result<Smf<'static>> {
    let ticks_per_quarter = settings.ticks_per_quarter.clamp(1, 0x7fff);
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(ticks_per_quarter)),
    ));

    // Track 0: tempo track
    // 4 BPM keeps the microsecond value inside 24 bits.
    let tempo_microseconds = 60_000_000 / settings.tempo_bpm.max(4) as u32;
    let tempo_track: Track<'static> = vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_microseconds))),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        },
    ];
    smf.tracks.push(tempo_track);

    let too_long = |quarters: f64| Error::TimelineTooLong { quarters };
    let to_tick = |quarters: f64| {
        let ticks = (quarters * ticks_per_quarter as f64).round().max(0.0);
        if ticks < u32::MAX as f64 {
            Ok(ticks as u32)
        } else {
            Err(too_long(quarters))
        }
    };

    let mut boundaries: Vec<Boundary> = Vec::new();
    for note in timeline.notes() {
        let Ok(key) = u8::try_from(note.pitch.midi()) else {
            continue;
        };
        if key > 127 {
            continue;
        }
        let start = to_tick(note.offset)?;
        let end = to_tick(note.offset + note.duration)?.max(start + 1);
        boundaries.push(Boundary {
            tick: start,
            key,
            on: true,
        });
        boundaries.push(Boundary {
            tick: end,
            key,
            on: false,
        });
    }
    // Note-offs before note-ons at the same tick, so a repeated pitch is
    // released before it is struck again.
    boundaries.sort_by_key(|b| (b.tick, b.on, b.key));

    let channel = u4::new(0);
    let mut track: Track<'static> = vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TrackName(b"Chords")),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange {
                    program: u7::new(settings.program.min(127)),
                },
            },
        },
    ];

    let velocity = u7::new(settings.velocity.clamp(1, 127));
    let mut last_tick = 0;
    for boundary in boundaries {
        let delta = boundary.tick - last_tick;
        if delta > MAX_DELTA {
            return Err(too_long(boundary.tick as f64 / ticks_per_quarter as f64));
        }
        let message = if boundary.on {
            MidiMessage::NoteOn {
                key: u7::new(boundary.key),
                vel: velocity,
            }
        } else {
            MidiMessage::NoteOff {
                key: u7::new(boundary.key),
                vel: u7::new(0),
            }
        };
        track.push(TrackEvent {
            delta: u28::new(delta),
            kind: TrackEventKind::Midi { channel, message },
        });
        last_tick = boundary.tick;
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(track);

    Ok(smf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::Chord;
    use crate::render::{NoteValue, TimedEvent};

    fn event(symbol: &str, offset: f64, value: NoteValue) -> TimedEvent {
        TimedEvent {
            offset,
            value,
            pitches: Chord::parse(symbol).unwrap().pitches().to_vec(),
        }
    }

    fn note_messages(smf: &Smf) -> Vec<(u32, bool, u8)> {
        let mut tick = 0;
        let mut out = Vec::new();
        for ev in &smf.tracks[1] {
            tick += ev.delta.as_int();
            if let TrackEventKind::Midi { message, .. } = ev.kind {
                match message {
                    MidiMessage::NoteOn { key, .. } => out.push((tick, true, key.as_int())),
                    MidiMessage::NoteOff { key, .. } => out.push((tick, false, key.as_int())),
                    _ => {}
                }
            }
        }
        out
    }

    #[test]
    fn timeline_becomes_two_tracks() {
        let timeline = Timeline {
            events: vec![
                event("C4.E4.G4", 0.0, NoteValue::Half),
                event("A3.C4.E4", 2.0, NoteValue::Eighth),
            ],
        };
        let smf = timeline_to_smf(&timeline, &MidiSettings::default()).unwrap();
        assert_eq!(smf.tracks.len(), 2);

        let notes = note_messages(&smf);
        assert_eq!(notes.len(), 12);
        // C major sounds 0..960, A minor 960..1200.
        assert!(notes.contains(&(0, true, 60)));
        assert!(notes.contains(&(960, false, 60)));
        assert!(notes.contains(&(960, true, 57)));
        assert!(notes.contains(&(1200, false, 64)));
    }

    #[test]
    fn repeated_pitch_releases_before_restrike() {
        let timeline = Timeline {
            events: vec![
                event("C4", 0.0, NoteValue::Quarter),
                event("C4", 1.0, NoteValue::Quarter),
            ],
        };
        let smf = timeline_to_smf(&timeline, &MidiSettings::default()).unwrap();
        let notes = note_messages(&smf);
        assert_eq!(
            notes,
            vec![(0, true, 60), (480, false, 60), (480, true, 60), (960, false, 60)]
        );
    }

    #[test]
    fn oversized_gaps_are_errors() {
        // Roughly 288M ticks between the two chords at 480 per quarter.
        let gap = Timeline {
            events: vec![
                event("C4", 0.0, NoteValue::Quarter),
                event("C4", 600_000.0, NoteValue::Quarter),
            ],
        };
        assert!(matches!(
            timeline_to_bytes(&gap, &MidiSettings::default()),
            Err(Error::TimelineTooLong { .. })
        ));

        let far = Timeline {
            events: vec![event("C4", 1e10, NoteValue::Quarter)],
        };
        assert!(matches!(
            timeline_to_bytes(&far, &MidiSettings::default()),
            Err(Error::TimelineTooLong { .. })
        ));
    }

    #[test]
    fn bytes_parse_back() {
        let timeline = Timeline {
            events: vec![event("E.G#.B", 0.0, NoteValue::Sixteenth)],
        };
        let bytes = timeline_to_bytes(&timeline, &MidiSettings::default()).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.header.format, Format::Parallel);
        assert_eq!(smf.tracks.len(), 2);
        assert_eq!(note_messages(&smf).len(), 6);
    }
}
