use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

mod contraction;
mod implicit;
mod legacy;
mod reorder;
mod table;
mod uca900;

pub use contraction::Contractions;
pub use legacy::UcaLegacy;
pub use reorder::{Reorder, Reorders};
pub use table::WeightTable;
pub use uca900::Uca900;

use crate::data::WeightEntry;

//
// Structs etc.
//

/// One collation element. Legacy tables only fill in `primary`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Weights {
    pub primary: u16,
    pub secondary: u16,
    pub tertiary: u16,
}

impl Weights {
    pub const fn new(primary: u16, secondary: u16, tertiary: u16) -> Self {
        Self {
            primary,
            secondary,
            tertiary,
        }
    }

    pub const fn primary(primary: u16) -> Self {
        Self::new(primary, 0, 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum UcaVersion {
    Uca400,
    Uca520,
    Uca900,
}

/// The building blocks every UCA collation shares: the base table for its
/// generation, its own tailoring patches and its contractions.
#[derive(Debug)]
pub struct Uca {
    table: Arc<WeightTable>,
    tailoring: HashMap<u32, Box<[Weights]>>,
    contractions: Contractions,
    max_codepoint: u32,
}

//
// Functions, public
//

impl Uca {
    pub fn new(
        table: Arc<WeightTable>,
        tailoring: Vec<WeightEntry>,
        contractions: Contractions,
        max_codepoint: u32,
    ) -> Self {
        let tailoring = tailoring
            .into_iter()
            .map(|entry| {
                table.check_weights(entry.codepoint, &entry.weights);
                (entry.codepoint, entry.weights.into_boxed_slice())
            })
            .collect();

        Self {
            table,
            tailoring,
            contractions,
            max_codepoint,
        }
    }

    pub fn version(&self) -> UcaVersion {
        self.table.version()
    }

    /// Walk `codepoints` left to right and hand every collation element to
    /// `emit`, together with the codepoint that starts the unit it belongs to.
    /// Scanning stops as soon as `emit` returns false.
    pub fn for_each_element(&self, codepoints: &[u32], mut emit: impl FnMut(u32, Weights) -> bool) {
        let mut left: usize = 0;

        'outer: while left < codepoints.len() {
            let left_val = codepoints[left];

            // Longest contraction first; lookahead is 1 for codepoints that start none
            let lookahead = self.contractions.lookahead(left_val);

            if lookahead > 1 {
                let mut right = (left + lookahead).min(codepoints.len());

                while right - left > 1 {
                    if let Some(weights) = self.contractions.get(&codepoints[left..right]) {
                        if !emit_all(left_val, weights, &mut emit) {
                            return;
                        }
                        left = right;
                        continue 'outer;
                    }
                    right -= 1;
                }
            }

            if let Some(&next) = codepoints.get(left + 1) {
                if let Some(weights) = self.contractions.contextual(left_val, next) {
                    if !emit_all(left_val, weights, &mut emit) {
                        return;
                    }
                    left += 1;
                    continue 'outer;
                }
            }

            if !self.single(left_val, &mut emit) {
                return;
            }
            left += 1;
        }
    }
}

//
// Functions, private
//

impl Uca {
    fn single(&self, codepoint: u32, emit: &mut impl FnMut(u32, Weights) -> bool) -> bool {
        // Codepoints beyond what the generation covers weigh as U+FFFD
        let lookup = if codepoint > self.max_codepoint {
            0xFFFD
        } else {
            codepoint
        };

        let found = self
            .tailoring
            .get(&lookup)
            .map(|weights| &weights[..])
            .or_else(|| self.table.get(lookup));

        match found {
            Some(weights) => emit_all(codepoint, weights, emit),
            None => emit_all(codepoint, &implicit::weights(self.version(), lookup), emit),
        }
    }
}

fn emit_all(codepoint: u32, weights: &[Weights], emit: &mut impl FnMut(u32, Weights) -> bool) -> bool {
    weights.iter().all(|&w| emit(codepoint, w))
}
