// Constrained decoding: the autoregressive generation loop.
//
// A `Session` bundles everything that stays fixed across generation calls:
// the vocabulary, the encoded corpus used for seeding, the scale table, the
// predictor and the decode policy. It is immutable once built and can be
// shared by reference between threads; each `generate` call owns its window.
//
// Per step:
// 1. normalize the window and query the predictor
// 2. pick an index (first argmax, or a tempered draw)
// 3. look up the chord parsed for that vocabulary entry
// 4. accept it if every pitch class is in the scale
// 5. advance the window with the picked index, accepted or not
//
// Rejected indices still enter the context. That keeps the walk moving when
// the predictor favours an out-of-scale chord, at the price of letting those
// chords shape what comes next. Without an attempt budget the loop runs until
// it has enough chords, however long that takes.

use crate::chord::{Chord, MalformedSymbolError};
use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::predictor::{Predictor, PredictorError, TransitionPredictor};
use crate::scale::ScaleTable;
use crate::vocabulary::Vocabulary;
use crate::window::{SEQUENCE_LENGTH, Window};
use lofi_prng::ChordRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// How the next index is picked from the predictor's distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum DecodeStrategy {
    /// Highest probability; ties go to the lowest index.
    #[default]
    Greedy,
    /// Draw from the distribution raised to `1 / temperature`.
    Sampled { temperature: f64 },
}

/// Accepted chords plus loop statistics.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    pub chords: Vec<Chord>,
    /// Predictor queries made.
    pub steps: u64,
    /// Parsed fine but had a pitch class outside the scale.
    pub out_of_scale: u64,
    /// Vocabulary entry could not be parsed into a chord.
    pub malformed: u64,
}

pub struct Session {
    vocabulary: Vocabulary,
    /// Parse result for each vocabulary entry, kept so a malformed symbol
    /// reports the same error every time it is picked.
    parsed: Vec<std::result::Result<Chord, MalformedSymbolError>>,
    encoded: Vec<usize>,
    scales: ScaleTable,
    predictor: Box<dyn Predictor>,
    sequence_length: usize,
    strategy: DecodeStrategy,
    max_attempts: Option<u64>,
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn scales(&self) -> &ScaleTable {
        &self.scales
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    pub fn strategy(&self) -> DecodeStrategy {
        self.strategy
    }

    /// The corpus as vocabulary indices.
    pub fn encoded_corpus(&self) -> &[usize] {
        &self.encoded
    }

    /// The chord for a vocabulary index.
    ///
    /// Fails with `MalformedSymbol` when the entry did not parse, and with
    /// `UnknownSymbol` when the index is past the end of the vocabulary.
    pub fn chord(&self, index: usize) -> Result<&Chord> {
        match self.parsed.get(index) {
            Some(Ok(chord)) => Ok(chord),
            Some(Err(e)) => Err(e.clone().into()),
            None => Err(Error::UnknownSymbol {
                symbol: format!("#{index}"),
            }),
        }
    }

    /// A fresh window over a random contiguous stretch of the corpus. The
    /// start offset is uniform in `[0, len - sequence_length)`.
    pub fn seed_window(&self, rng: &mut ChordRng) -> Result<Window> {
        let too_short = || Error::CorpusTooShort {
            len: self.encoded.len(),
            sequence_length: self.sequence_length,
        };
        if self.encoded.len() <= self.sequence_length {
            return Err(too_short());
        }
        let start = rng.range_usize(0, self.encoded.len() - self.sequence_length);
        Window::seed(
            &self.encoded[start..start + self.sequence_length],
            self.sequence_length,
        )
        .ok_or_else(too_short)
    }
}

/// Collects session inputs and validates them in `build`.
pub struct SessionBuilder {
    corpus: Vec<String>,
    predictor: Option<Box<dyn Predictor>>,
    fit_transition_table: bool,
    scales: ScaleTable,
    sequence_length: usize,
    strategy: DecodeStrategy,
    max_attempts: Option<u64>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        SessionBuilder {
            corpus: Vec::new(),
            predictor: None,
            fit_transition_table: false,
            scales: ScaleTable::default(),
            sequence_length: SEQUENCE_LENGTH,
            strategy: DecodeStrategy::Greedy,
            max_attempts: None,
        }
    }
}

impl SessionBuilder {
    /// Take scales, window length and decode policy from a config.
    pub fn config(mut self, config: &GeneratorConfig) -> Self {
        self.scales = config.scales.clone();
        self.sequence_length = config.sequence_length;
        self.strategy = config.decode;
        self.max_attempts = config.max_attempts;
        self
    }

    pub fn corpus<I, S>(mut self, corpus: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.corpus = corpus.into_iter().map(Into::into).collect();
        self
    }

    pub fn predictor(mut self, predictor: impl Predictor + 'static) -> Self {
        self.predictor = Some(Box::new(predictor));
        self.fit_transition_table = false;
        self
    }

    /// Build a `TransitionPredictor` from the corpus instead of supplying one.
    pub fn transition_predictor(mut self) -> Self {
        self.predictor = None;
        self.fit_transition_table = true;
        self
    }

    pub fn scales(mut self, scales: ScaleTable) -> Self {
        self.scales = scales;
        self
    }

    pub fn sequence_length(mut self, sequence_length: usize) -> Self {
        self.sequence_length = sequence_length;
        self
    }

    pub fn strategy(mut self, strategy: DecodeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn max_attempts(mut self, max_attempts: Option<u64>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn build(self) -> Result<Session> {
        let vocabulary = Vocabulary::from_corpus(&self.corpus)?;
        let encoded = vocabulary.encode(self.corpus.as_slice())?;

        if self.sequence_length == 0 {
            return Err(Error::InvalidConfig(
                "sequence_length must be at least 1".into(),
            ));
        }
        if encoded.len() <= self.sequence_length {
            return Err(Error::CorpusTooShort {
                len: encoded.len(),
                sequence_length: self.sequence_length,
            });
        }
        if let DecodeStrategy::Sampled { temperature } = self.strategy {
            if !(temperature.is_finite() && temperature > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "temperature must be positive, got {temperature}"
                )));
            }
        }

        let predictor: Box<dyn Predictor> = match self.predictor {
            Some(p) => p,
            None if self.fit_transition_table => Box::new(TransitionPredictor::from_indices(
                &encoded,
                vocabulary.len(),
            )),
            None => return Err(Error::MissingPredictor),
        };

        let parsed: Vec<_> = vocabulary
            .symbols()
            .iter()
            .map(|symbol| {
                let chord = Chord::parse(symbol);
                if let Err(e) = &chord {
                    warn!("{e}; it will always be rejected");
                }
                chord
            })
            .collect();

        info!(
            vocabulary = vocabulary.len(),
            corpus = encoded.len(),
            sequence_length = self.sequence_length,
            "session ready"
        );

        Ok(Session {
            vocabulary,
            parsed,
            encoded,
            scales: self.scales,
            predictor,
            sequence_length: self.sequence_length,
            strategy: self.strategy,
            max_attempts: self.max_attempts,
        })
    }
}

/// Generate exactly `quantity` chords inside `scale_name`.
///
/// Fails with `UnknownScale` before touching the predictor. A predictor
/// error aborts the call; nothing generated so far is returned.
pub fn generate(
    session: &Session,
    quantity: usize,
    scale_name: &str,
    rng: &mut ChordRng,
) -> Result<Generation> {
    let scale = session.scales.get(scale_name)?;
    let mut generation = Generation::default();
    if quantity == 0 {
        return Ok(generation);
    }

    let number_of_chords = session.vocabulary.len();
    let mut window = session.seed_window(rng)?;

    while generation.chords.len() < quantity {
        if let Some(max) = session.max_attempts {
            if generation.steps >= max {
                warn!(
                    steps = generation.steps,
                    accepted = generation.chords.len(),
                    "attempt budget exhausted"
                );
                return Err(Error::GenerationExhausted {
                    attempts: generation.steps,
                    accepted: generation.chords.len(),
                    requested: quantity,
                });
            }
        }

        let distribution = session
            .predictor
            .predict(&window.normalize(number_of_chords))?;
        if distribution.len() != number_of_chords {
            return Err(PredictorError::ShapeMismatch {
                expected: number_of_chords,
                actual: distribution.len(),
            }
            .into());
        }

        let index = select_index(&distribution, session.strategy, rng)
            .ok_or(PredictorError::NoFiniteProbability)?;
        generation.steps += 1;

        match session.chord(index) {
            Ok(chord) if scale.contains_chord(chord) => {
                debug!(step = generation.steps, index, %chord, "accepted");
                generation.chords.push(chord.clone());
            }
            Ok(chord) => {
                debug!(step = generation.steps, index, %chord, "out of scale");
                generation.out_of_scale += 1;
            }
            Err(Error::MalformedSymbol(e)) => {
                debug!(step = generation.steps, index, error = %e, "malformed symbol");
                generation.malformed += 1;
            }
            Err(e) => return Err(e),
        }

        window.advance(index);
    }

    info!(
        scale = scale_name,
        accepted = generation.chords.len(),
        steps = generation.steps,
        out_of_scale = generation.out_of_scale,
        malformed = generation.malformed,
        "generation finished"
    );
    Ok(generation)
}

/// Pick an index from a distribution. NaN and infinite entries never win.
/// Returns `None` when no entry is usable.
pub fn select_index(
    distribution: &[f32],
    strategy: DecodeStrategy,
    rng: &mut ChordRng,
) -> Option<usize> {
    match strategy {
        DecodeStrategy::Greedy => argmax(distribution),
        DecodeStrategy::Sampled { temperature } => {
            let exponent = 1.0 / temperature;
            let weights: Vec<f64> = distribution
                .iter()
                .map(|&p| {
                    let p = p as f64;
                    if p.is_finite() && p > 0.0 { p.powf(exponent) } else { 0.0 }
                })
                .collect();
            rng.choose_weighted(&weights)
                .or_else(|| argmax(distribution))
        }
    }
}

/// First index of the maximum finite value.
fn argmax(distribution: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &p) in distribution.iter().enumerate() {
        if !p.is_finite() {
            continue;
        }
        match best {
            Some((_, best_p)) if p <= best_p => {}
            _ => best = Some((i, p)),
        }
    }
    best.map(|(i, _)| i)
}
