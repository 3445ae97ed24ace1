// Sliding context window fed to the predictor.
//
// Fixed length once seeded; `advance` pushes the newest index and drops the
// oldest, so the length never changes. Each generation call owns its own
// window. `normalize` is a read-only view scaled into [0, 1) by the
// vocabulary size, the shape the predictor consumes.

use std::collections::VecDeque;

/// Default context length.
pub const SEQUENCE_LENGTH: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    indices: VecDeque<usize>,
}

impl Window {
    /// Seed from a contiguous slice of the encoded corpus. Returns `None`
    /// unless `initial` holds exactly `sequence_length` indices.
    pub fn seed(initial: &[usize], sequence_length: usize) -> Option<Self> {
        if sequence_length == 0 || initial.len() != sequence_length {
            return None;
        }
        Some(Window {
            indices: initial.iter().copied().collect(),
        })
    }

    /// Push `index` as the newest entry, then drop the oldest.
    pub fn advance(&mut self, index: usize) {
        self.indices.push_back(index);
        self.indices.pop_front();
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Oldest to newest.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    pub fn newest(&self) -> Option<usize> {
        self.indices.back().copied()
    }

    /// Each index divided by `number_of_chords`.
    pub fn normalize(&self, number_of_chords: usize) -> Vec<f32> {
        let n = number_of_chords.max(1) as f32;
        self.indices.iter().map(|&i| i as f32 / n).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_requires_exact_length() {
        assert!(Window::seed(&[1, 2, 3], 3).is_some());
        assert!(Window::seed(&[1, 2], 3).is_none());
        assert!(Window::seed(&[1, 2, 3, 4], 3).is_none());
        assert!(Window::seed(&[], 0).is_none());
    }

    #[test]
    fn advance_slides_and_keeps_length() {
        let seed: Vec<usize> = (0..SEQUENCE_LENGTH).collect();
        let mut window = Window::seed(&seed, SEQUENCE_LENGTH).unwrap();
        for step in 0..200 {
            window.advance(1000 + step);
            assert_eq!(window.len(), SEQUENCE_LENGTH);
            assert_eq!(window.newest(), Some(1000 + step));
        }
        let first = window.indices().next().unwrap();
        assert_eq!(first, 1000 + 200 - SEQUENCE_LENGTH);
    }

    #[test]
    fn normalize_is_pure() {
        let window = Window::seed(&[0, 2, 3], 3).unwrap();
        let before = window.clone();
        assert_eq!(window.normalize(4), vec![0.0, 0.5, 0.75]);
        assert_eq!(window, before);
    }
}
