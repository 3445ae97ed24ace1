// Vocabulary codec: chord symbols <-> integer indices.
//
// The vocabulary is the sorted set of distinct symbols in the corpus. Sorting
// is by byte order of the symbol text, so identical corpora always give
// identical index assignments. A predictor trained against one assignment
// only makes sense with that exact assignment, which is why nothing here is
// ever reordered or extended after construction.

use crate::error::{Error, Result};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone)]
pub struct Vocabulary {
    symbols: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Build from a corpus of symbols; duplicates are fine.
    pub fn from_corpus<I, S>(corpus: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique: BTreeSet<String> = corpus
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        if unique.is_empty() {
            return Err(Error::EmptyVocabulary);
        }

        let symbols: Vec<String> = unique.into_iter().collect();
        let index = symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i))
            .collect();
        Ok(Vocabulary { symbols, index })
    }

    /// `number_of_chords`.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Always false; construction rejects empty corpora.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn index_of(&self, symbol: &str) -> Option<usize> {
        self.index.get(symbol).copied()
    }

    pub fn symbol(&self, index: usize) -> Option<&str> {
        self.symbols.get(index).map(String::as_str)
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Map every corpus symbol to its index.
    pub fn encode<S: AsRef<str>>(&self, corpus: &[S]) -> Result<Vec<usize>> {
        corpus
            .iter()
            .map(|s| {
                let s = s.as_ref();
                self.index_of(s).ok_or_else(|| Error::UnknownSymbol {
                    symbol: s.to_string(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<&'static str> {
        vec!["C.E.G", "A.C#.E", "C.E.G", "4.7.11", "D.F#.A"]
    }

    #[test]
    fn sorted_unique_assignment() {
        let vocab = Vocabulary::from_corpus(corpus()).unwrap();
        assert_eq!(vocab.len(), 4);
        assert_eq!(vocab.symbols(), &["4.7.11", "A.C#.E", "C.E.G", "D.F#.A"]);
        assert_eq!(vocab.index_of("C.E.G"), Some(2));
        assert_eq!(vocab.index_of("G.B.D"), None);
        assert_eq!(vocab.symbol(4), None);
    }

    #[test]
    fn round_trip_every_symbol() {
        let vocab = Vocabulary::from_corpus(corpus()).unwrap();
        for symbol in vocab.symbols() {
            let i = vocab.index_of(symbol).unwrap();
            assert_eq!(vocab.symbol(i), Some(symbol.as_str()));
        }
    }

    #[test]
    fn construction_is_deterministic() {
        let a = Vocabulary::from_corpus(corpus()).unwrap();
        let mut shuffled = corpus();
        shuffled.reverse();
        let b = Vocabulary::from_corpus(shuffled).unwrap();
        assert_eq!(a.symbols(), b.symbols());
        for symbol in a.symbols() {
            assert_eq!(a.index_of(symbol), b.index_of(symbol));
        }
    }

    #[test]
    fn empty_corpus_is_rejected() {
        let empty: Vec<String> = Vec::new();
        assert!(matches!(
            Vocabulary::from_corpus(empty),
            Err(Error::EmptyVocabulary)
        ));
    }

    #[test]
    fn encode_maps_whole_corpus() {
        let vocab = Vocabulary::from_corpus(corpus()).unwrap();
        assert_eq!(vocab.encode(&corpus()).unwrap(), vec![2, 1, 2, 0, 3]);
        assert!(matches!(
            vocab.encode(&["E.G#.B"]),
            Err(Error::UnknownSymbol { .. })
        ));
    }
}
