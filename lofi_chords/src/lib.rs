// Lofi Chord Generator
//
// Generates chord progressions one chord at a time from a pre-trained
// sequence predictor, keeping only chords whose pitch classes all sit inside
// a requested scale. Accepted chords get random note values, are written to a
// MIDI file and are described as flat records for JSON output.
//
// Architecture:
// - pitch.rs: Pitch tokens (named or numeric), spelling, MIDI numbers
// - chord.rs: Chord symbols, root finding, quality and common names
// - scale.rs: Named scales and the membership test
// - vocabulary.rs: Sorted symbol <-> index codec built from the corpus
// - window.rs: Fixed-length sliding context and its normalized view
// - predictor.rs: The `Predictor` seam plus a back-off transition table
// - decode.rs: Session builder and the constrained generation loop
// - render.rs: Weighted note-value sampling into a timed event stream
// - midi.rs: Standard MIDI File output from rendered timelines
// - present.rs: Flat `ChordRecord` descriptions
// - config.rs: JSON-loadable `GeneratorConfig`
// - corpus.rs: Corpus file loading
// - error.rs: Crate error type
//
// Generation is deterministic given a seeded `ChordRng` and a deterministic
// predictor.

pub mod chord;
pub mod config;
pub mod corpus;
pub mod decode;
pub mod error;
pub mod midi;
pub mod pitch;
pub mod predictor;
pub mod present;
pub mod render;
pub mod scale;
pub mod vocabulary;
pub mod window;

pub use chord::Chord;
pub use config::GeneratorConfig;
pub use decode::{DecodeStrategy, Generation, Session, SessionBuilder};
pub use error::{Error, Result};
pub use predictor::{Predictor, PredictorError, TransitionPredictor};
pub use present::ChordRecord;
pub use render::Timeline;

use lofi_prng::ChordRng;
use tracing::info;

/// Everything one generation call produced.
#[derive(Debug, Clone)]
pub struct Composition {
    pub generation: Generation,
    pub timeline: Timeline,
    pub records: Vec<ChordRecord>,
}

/// A built session plus the config that drives rendering and output.
///
/// This is the invocation surface: `generate(quantity, scale)` returns the
/// records and leaves a MIDI file at `config.output_path`.
pub struct ChordGenerator {
    session: Session,
    config: GeneratorConfig,
}

impl ChordGenerator {
    pub fn new(session: Session, config: GeneratorConfig) -> Self {
        ChordGenerator { session, config }
    }

    /// Validate the config and build a session from a corpus and predictor.
    pub fn from_parts<I, S>(
        config: GeneratorConfig,
        corpus: I,
        predictor: impl Predictor + 'static,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        config.validate()?;
        let session = Session::builder()
            .config(&config)
            .corpus(corpus)
            .predictor(predictor)
            .build()?;
        Ok(ChordGenerator::new(session, config))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate, render and write MIDI; returns the chord records.
    pub fn generate(
        &self,
        quantity: usize,
        scale_name: &str,
        rng: &mut ChordRng,
    ) -> Result<Vec<ChordRecord>> {
        Ok(self.compose(quantity, scale_name, rng)?.records)
    }

    /// Like `generate`, but keeps the intermediate results.
    ///
    /// The MIDI file is only written once decoding has succeeded, so an
    /// unknown scale or predictor failure leaves the filesystem untouched.
    pub fn compose(
        &self,
        quantity: usize,
        scale_name: &str,
        rng: &mut ChordRng,
    ) -> Result<Composition> {
        let composition = self.compose_in_memory(quantity, scale_name, rng)?;
        midi::write_midi(
            &composition.timeline,
            &self.config.midi,
            &self.config.output_path,
        )?;
        info!(
            path = %self.config.output_path.display(),
            events = composition.timeline.events.len(),
            "wrote MIDI"
        );
        Ok(composition)
    }

    /// Decode, render and describe without touching the filesystem.
    pub fn compose_in_memory(
        &self,
        quantity: usize,
        scale_name: &str,
        rng: &mut ChordRng,
    ) -> Result<Composition> {
        let generation = decode::generate(&self.session, quantity, scale_name, rng)?;
        let timeline = render::render(&generation.chords, &self.config.durations, rng);
        let records = present::describe_all(&generation.chords);
        Ok(Composition {
            generation,
            timeline,
            records,
        })
    }
}
