use std::collections::HashMap;

use crate::data::TableDump;

use super::{UcaVersion, Weights};

/// Codepoint to collation elements for one UCA generation. Shared by every
/// collation of that generation and never mutated after load.
#[derive(Debug)]
pub struct WeightTable {
    name: String,
    version: UcaVersion,
    keys: HashMap<u32, Box<[Weights]>>,
}

impl WeightTable {
    pub fn from_dump(dump: TableDump) -> Self {
        let mut keys = HashMap::with_capacity(dump.entries.len());

        for entry in dump.entries {
            check_weights(&dump.name, dump.version, entry.codepoint, &entry.weights);
            let previous = keys.insert(entry.codepoint, entry.weights.into_boxed_slice());
            assert!(
                previous.is_none(),
                "weight table {} lists U+{:04X} twice",
                dump.name,
                entry.codepoint
            );
        }

        Self {
            name: dump.name,
            version: dump.version,
            keys,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> UcaVersion {
        self.version
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn get(&self, codepoint: u32) -> Option<&[Weights]> {
        self.keys.get(&codepoint).map(|weights| &weights[..])
    }

    /// Panics on weights that do not fit this table's generation.
    pub(crate) fn check_weights(&self, codepoint: u32, weights: &[Weights]) {
        check_weights(&self.name, self.version, codepoint, weights);
    }
}

// Legacy generations only carry primary weights
fn check_weights(table: &str, version: UcaVersion, codepoint: u32, weights: &[Weights]) {
    if version == UcaVersion::Uca900 {
        return;
    }

    assert!(
        weights.iter().all(|w| w.secondary == 0 && w.tertiary == 0),
        "legacy weight table {table} has non-primary weights for U+{codepoint:04X}"
    );
}
