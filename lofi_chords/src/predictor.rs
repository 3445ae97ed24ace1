// The sequence predictor seam.
//
// The decoder only knows `Predictor::predict`: a normalized window in, one
// probability per vocabulary entry out. Neural backends live outside this
// crate and plug in through the trait (closures work too). The shipped
// implementation is `TransitionPredictor`, a back-off n-gram table over
// vocabulary indices:
// - order 2: conditioned on the last two indices in the window
// - order 1: conditioned on the last index
// - order 0: overall symbol frequency
// The highest order with data for the current context wins, the same back-off
// scheme the melodic Markov tables use. Tables are plain counts; `predict`
// normalizes them. They round-trip through JSON so a table built once can be
// loaded as a fixed model later.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Transition counts. Key: next symbol index. Value: count (unnormalized).
type TransitionTable = BTreeMap<usize, f64>;

#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("distribution has {actual} entries, vocabulary has {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("invalid predictor input: {0}")]
    InvalidInput(String),

    #[error("failed to read model {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("distribution has no finite probabilities")]
    NoFiniteProbability,

    #[error("predictor backend failed: {0}")]
    Backend(String),
}

/// A pre-trained model returning a distribution over the vocabulary.
///
/// `window` holds `sequence_length` values, each `index / number_of_chords`.
/// The result must hold `number_of_chords` probabilities. Implementations
/// are shared read-only between concurrent generation calls.
pub trait Predictor: Send + Sync {
    fn predict(&self, window: &[f32]) -> Result<Vec<f32>, PredictorError>;
}

impl<F> Predictor for F
where
    F: Fn(&[f32]) -> Result<Vec<f32>, PredictorError> + Send + Sync,
{
    fn predict(&self, window: &[f32]) -> Result<Vec<f32>, PredictorError> {
        self(window)
    }
}

/// Back-off n-gram predictor over vocabulary indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionPredictor {
    pub vocabulary_size: usize,
    /// Context of two indices ("a,b") -> next index counts.
    pub order2: BTreeMap<String, TransitionTable>,
    /// Context of one index -> next index counts.
    pub order1: BTreeMap<String, TransitionTable>,
    /// Unigram counts.
    pub order0: TransitionTable,
}

impl TransitionPredictor {
    /// Count transitions in an encoded corpus.
    pub fn from_indices(indices: &[usize], vocabulary_size: usize) -> Self {
        let mut order2: BTreeMap<String, TransitionTable> = BTreeMap::new();
        let mut order1: BTreeMap<String, TransitionTable> = BTreeMap::new();
        let mut order0 = TransitionTable::new();

        for (pos, &next) in indices.iter().enumerate() {
            *order0.entry(next).or_insert(0.0) += 1.0;
            if pos >= 1 {
                let table = order1.entry(context_key(&indices[pos - 1..pos])).or_default();
                *table.entry(next).or_insert(0.0) += 1.0;
            }
            if pos >= 2 {
                let table = order2.entry(context_key(&indices[pos - 2..pos])).or_default();
                *table.entry(next).or_insert(0.0) += 1.0;
            }
        }

        TransitionPredictor {
            vocabulary_size,
            order2,
            order1,
            order0,
        }
    }

    pub fn load(path: &Path) -> Result<Self, PredictorError> {
        let data = std::fs::read_to_string(path).map_err(|source| PredictorError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| PredictorError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), PredictorError> {
        let json = serde_json::to_string(self).map_err(|source| PredictorError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| PredictorError::Load {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Recover vocabulary indices from the normalized window.
    fn denormalize(&self, window: &[f32]) -> Result<Vec<usize>, PredictorError> {
        let n = self.vocabulary_size as f32;
        window
            .iter()
            .map(|&v| {
                let scaled = (v * n).round();
                if !scaled.is_finite() || scaled < 0.0 || scaled >= n {
                    Err(PredictorError::InvalidInput(format!(
                        "window value {v} does not map into a vocabulary of {}",
                        self.vocabulary_size
                    )))
                } else {
                    Ok(scaled as usize)
                }
            })
            .collect()
    }

    /// The table for the longest context that has any data.
    fn table_for(&self, context: &[usize]) -> &TransitionTable {
        if context.len() >= 2 {
            let key = context_key(&context[context.len() - 2..]);
            if let Some(table) = self.order2.get(&key) {
                return table;
            }
        }
        if let Some(last) = context.last() {
            if let Some(table) = self.order1.get(&context_key(&[*last])) {
                return table;
            }
        }
        &self.order0
    }
}

impl Predictor for TransitionPredictor {
    fn predict(&self, window: &[f32]) -> Result<Vec<f32>, PredictorError> {
        if self.vocabulary_size == 0 {
            return Err(PredictorError::Backend("model has an empty vocabulary".into()));
        }
        let context = self.denormalize(window)?;
        let table = self.table_for(&context);

        let mut distribution = vec![0.0f32; self.vocabulary_size];
        let total: f64 = table.values().sum();
        if total <= 0.0 {
            // No data at all: uniform.
            let p = 1.0 / self.vocabulary_size as f32;
            distribution.iter_mut().for_each(|d| *d = p);
            return Ok(distribution);
        }
        for (&next, &count) in table {
            if next < self.vocabulary_size {
                distribution[next] = (count / total) as f32;
            }
        }
        Ok(distribution)
    }
}

/// Encode a context of indices as a map key.
fn context_key(context: &[usize]) -> String {
    context
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(indices: &[usize], n: usize) -> Vec<f32> {
        indices.iter().map(|&i| i as f32 / n as f32).collect()
    }

    #[test]
    fn order_two_context_wins() {
        // 0 0 1 2 3 repeated: after (0,0) always comes 1.
        let corpus: Vec<usize> = [0, 0, 1, 2, 3].iter().cycle().take(60).copied().collect();
        let model = TransitionPredictor::from_indices(&corpus, 4);
        let dist = model.predict(&normalized(&[3, 0, 0], 4)).unwrap();
        assert_eq!(dist.len(), 4);
        assert!((dist[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn backs_off_to_lower_orders() {
        let model = TransitionPredictor::from_indices(&[0, 1, 0, 2], 3);
        // (2,1) never occurred; order 1 context "1" -> 0.
        let dist = model.predict(&normalized(&[2, 1], 3)).unwrap();
        assert!((dist[0] - 1.0).abs() < 1e-6);
        // Index 2 never precedes anything: unigram frequencies.
        let dist = model.predict(&normalized(&[2], 3)).unwrap();
        assert!((dist[0] - 0.5).abs() < 1e-6);
        assert!((dist.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn rejects_values_outside_vocabulary() {
        let model = TransitionPredictor::from_indices(&[0, 1], 2);
        assert!(matches!(
            model.predict(&[1.5]),
            Err(PredictorError::InvalidInput(_))
        ));
        assert!(matches!(
            model.predict(&[f32::NAN]),
            Err(PredictorError::InvalidInput(_))
        ));
    }

    #[test]
    fn json_roundtrip() {
        let model = TransitionPredictor::from_indices(&[0, 1, 2, 0, 1, 2], 3);
        let json = serde_json::to_string(&model).unwrap();
        let restored: TransitionPredictor = serde_json::from_str(&json).unwrap();
        assert_eq!(model, restored);
    }

    #[test]
    fn closures_are_predictors() {
        let uniform =
            |w: &[f32]| -> Result<Vec<f32>, PredictorError> { Ok(vec![0.5; w.len()]) };
        assert_eq!(uniform.predict(&[0.0, 0.5]).unwrap(), vec![0.5, 0.5]);
    }

    #[test]
    fn context_key_format() {
        assert_eq!(context_key(&[2, 10]), "2,10");
        assert_eq!(context_key(&[]), "");
    }
}
