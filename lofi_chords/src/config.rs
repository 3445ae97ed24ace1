// Data-driven generator configuration.
//
// Everything tunable lives in `GeneratorConfig`, loaded from JSON. Every
// field has a default and the struct is `#[serde(default)]`, so a config file
// only needs the keys it overrides. `validate` checks the values the decode
// loop, the renderer and the MIDI writer rely on; the loaders call it before
// handing the config out.
//
// See also: `decode.rs` which reads the window length, decode policy and
// scale table, `render.rs` for the duration table, `midi.rs` for the
// playback settings.

use crate::decode::DecodeStrategy;
use crate::error::{Error, Result};
use crate::midi::MidiSettings;
use crate::render::DurationTable;
use crate::scale::ScaleTable;
use crate::window::SEQUENCE_LENGTH;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Length of the context window fed to the predictor.
    pub sequence_length: usize,
    pub decode: DecodeStrategy,
    /// Cap on predictor steps per generation call. `None` loops until the
    /// requested number of chords is accepted.
    pub max_attempts: Option<u64>,
    /// Named scales available to `generate`.
    pub scales: ScaleTable,
    pub durations: DurationTable,
    pub midi: MidiSettings,
    /// Where the rendered MIDI file is written.
    pub output_path: PathBuf,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            sequence_length: SEQUENCE_LENGTH,
            decode: DecodeStrategy::Greedy,
            max_attempts: None,
            scales: ScaleTable::default(),
            durations: DurationTable::default(),
            midi: MidiSettings::default(),
            output_path: PathBuf::from("output.mid"),
        }
    }
}

impl GeneratorConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: GeneratorConfig =
            serde_json::from_str(&data).map_err(|source| Error::Json {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::InvalidConfig(msg));

        if self.sequence_length == 0 {
            return invalid("sequence_length must be at least 1".into());
        }
        if let DecodeStrategy::Sampled { temperature } = self.decode {
            if !(temperature.is_finite() && temperature > 0.0) {
                return invalid(format!("temperature must be positive, got {temperature}"));
            }
        }
        if self.max_attempts == Some(0) {
            return invalid("max_attempts must be at least 1 when set".into());
        }
        if !self.durations.is_valid() {
            return invalid(
                "duration weights must be finite, non-negative and not all zero".into(),
            );
        }
        if self.midi.tempo_bpm == 0 {
            return invalid("midi.tempo_bpm must be positive".into());
        }
        if self.midi.program > 127 {
            return invalid(format!("midi.program {} is above 127", self.midi.program));
        }
        if self.midi.velocity == 0 || self.midi.velocity > 127 {
            return invalid(format!(
                "midi.velocity {} is outside 1..=127",
                self.midi.velocity
            ));
        }
        if self.midi.ticks_per_quarter == 0 || self.midi.ticks_per_quarter > 0x7fff {
            return invalid(format!(
                "midi.ticks_per_quarter {} is outside 1..=32767",
                self.midi.ticks_per_quarter
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{NoteValue, WeightedValue};
    use crate::scale::Scale;
    use std::io::Write;

    #[test]
    fn default_config_is_valid_and_roundtrips() {
        let config = GeneratorConfig::default();
        config.validate().unwrap();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let restored: GeneratorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
        assert_eq!(restored.sequence_length, 50);
        assert_eq!(restored.scales.len(), 10);
        assert_eq!(restored.output_path, PathBuf::from("output.mid"));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{
            "sequence_length": 8,
            "decode": { "strategy": "sampled", "temperature": 0.7 },
            "midi": { "tempo_bpm": 72, "program": 0, "velocity": 64, "ticks_per_quarter": 96 }
        }"#;
        let config: GeneratorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.sequence_length, 8);
        assert_eq!(config.decode, DecodeStrategy::Sampled { temperature: 0.7 });
        assert_eq!(config.midi.tempo_bpm, 72);
        assert_eq!(config.max_attempts, None);
        assert_eq!(config.durations, DurationTable::default());
        assert!(config.scales.get("e_major_scale").is_ok());
    }

    #[test]
    fn custom_scales_replace_defaults() {
        let json = r#"{ "scales": { "blues": ["C", "E-", "F", "F#", "G", "B-"] } }"#;
        let config: GeneratorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.scales.len(), 1);
        assert_eq!(
            config.scales.get("blues").unwrap(),
            &Scale::new(["C", "E-", "F", "F#", "G", "B-"])
        );
    }

    #[test]
    fn validation_rejects_bad_values() {
        let bad = [
            GeneratorConfig {
                sequence_length: 0,
                ..Default::default()
            },
            GeneratorConfig {
                decode: DecodeStrategy::Sampled { temperature: 0.0 },
                ..Default::default()
            },
            GeneratorConfig {
                max_attempts: Some(0),
                ..Default::default()
            },
            GeneratorConfig {
                durations: DurationTable::new(vec![WeightedValue {
                    value: NoteValue::Half,
                    weight: f64::NAN,
                }]),
                ..Default::default()
            },
            GeneratorConfig {
                midi: MidiSettings {
                    tempo_bpm: 0,
                    ..Default::default()
                },
                ..Default::default()
            },
            GeneratorConfig {
                midi: MidiSettings {
                    program: 128,
                    ..Default::default()
                },
                ..Default::default()
            },
            GeneratorConfig {
                midi: MidiSettings {
                    velocity: 0,
                    ..Default::default()
                },
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(Error::InvalidConfig(_))),
                "{config:?} should be rejected"
            );
        }
    }

    #[test]
    fn load_reads_and_validates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "max_attempts": 500, "output_path": "out/song.mid" }}"#).unwrap();
        let config = GeneratorConfig::load(file.path()).unwrap();
        assert_eq!(config.max_attempts, Some(500));
        assert_eq!(config.output_path, PathBuf::from("out/song.mid"));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "sequence_length": 0 }}"#).unwrap();
        assert!(matches!(
            GeneratorConfig::load(file.path()),
            Err(Error::InvalidConfig(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            GeneratorConfig::load(file.path()),
            Err(Error::Json { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = GeneratorConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
