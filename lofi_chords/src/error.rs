// Error taxonomy for the chord generator.
//
// Setup errors (empty vocabulary, short corpus, predictor load failure) are
// fatal to the pipeline. Per-call errors (unknown scale, predictor fault,
// exhausted attempt budget) abort one generation and return no partial
// output. `MalformedSymbol` comes from `Session::chord`; the decode loop
// catches it and counts a rejection.

use crate::chord::MalformedSymbolError;
use crate::predictor::PredictorError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("corpus contains no chord symbols")]
    EmptyVocabulary,

    #[error("unknown scale '{name}'")]
    UnknownScale { name: String },

    #[error("predictor failed: {0}")]
    Predictor(#[from] PredictorError),

    #[error(transparent)]
    MalformedSymbol(#[from] MalformedSymbolError),

    #[error(
        "gave up after {attempts} predictor steps with {accepted} of {requested} chords accepted"
    )]
    GenerationExhausted {
        attempts: u64,
        accepted: usize,
        requested: usize,
    },

    #[error("corpus has {len} symbols, needs more than the window length {sequence_length}")]
    CorpusTooShort { len: usize, sequence_length: usize },

    #[error("symbol '{symbol}' is not in the vocabulary")]
    UnknownSymbol { symbol: String },

    #[error("session has no predictor")]
    MissingPredictor,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("timeline reaches {quarters} quarter notes, past what MIDI delta times can hold")]
    TimelineTooLong { quarters: f64 },

    #[error("failed to encode MIDI: {0}")]
    Midi(#[source] std::io::Error),
}
