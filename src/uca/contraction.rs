use std::collections::HashMap;

use crate::data::ContractionDump;

use super::Weights;

/// Multi-codepoint units of a collation, keyed by their path.
#[derive(Debug, Default)]
pub struct Contractions {
    paths: HashMap<Vec<u32>, Box<[Weights]>>,
    contextual: HashMap<(u32, u32), Box<[Weights]>>,
    /// Length of the longest path starting with a given codepoint
    lookahead: HashMap<u32, usize>,
}

impl Contractions {
    pub fn new(entries: Vec<ContractionDump>) -> Self {
        let mut contractions = Self::default();

        for entry in entries {
            let weights = entry.weights.into_boxed_slice();

            if entry.contextual {
                // one starter plus the codepoint that has to follow it
                let [starter, context] = entry.path[..] else {
                    panic!("contextual contraction with path {:X?}", entry.path);
                };
                contractions.contextual.insert((starter, context), weights);
                continue;
            }

            assert!(
                entry.path.len() >= 2,
                "contraction path {:X?} is too short",
                entry.path
            );

            let longest = contractions.lookahead.entry(entry.path[0]).or_insert(1);
            *longest = (*longest).max(entry.path.len());
            contractions.paths.insert(entry.path, weights);
        }

        contractions
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.contextual.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len() + self.contextual.len()
    }

    pub fn lookahead(&self, starter: u32) -> usize {
        self.lookahead.get(&starter).copied().unwrap_or(1)
    }

    pub fn get(&self, path: &[u32]) -> Option<&[Weights]> {
        self.paths.get(path).map(|weights| &weights[..])
    }

    pub fn contextual(&self, starter: u32, next: u32) -> Option<&[Weights]> {
        if self.contextual.is_empty() {
            return None;
        }
        self.contextual.get(&(starter, next)).map(|weights| &weights[..])
    }
}
