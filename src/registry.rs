use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::debug;

use crate::charset::Charset;
use crate::collation::Collation;
use crate::data::{self, Dump};
use crate::error::{CollationError, Result};
use crate::uca::WeightTable;

static REGISTRY: Lazy<Registry> = Lazy::new(|| Registry::from_dump(data::load()));

/// Every collation known to the process, by id and by name
#[derive(Debug, Default)]
pub struct Registry {
    collations: Vec<Collation>,
    by_id: HashMap<u16, usize>,
    by_name: HashMap<String, usize>,
    defaults: HashMap<&'static str, usize>,
    unsupported: HashMap<u16, String>,
}

impl Registry {
    pub fn global() -> &'static Registry {
        Lazy::force(&REGISTRY)
    }

    pub fn from_dump(dump: Dump) -> Self {
        let tables: Vec<Arc<WeightTable>> = dump
            .tables
            .into_iter()
            .map(|table| Arc::new(WeightTable::from_dump(table)))
            .collect();
        let charsets: Vec<&'static Charset> =
            dump.charsets.into_iter().map(Charset::from_dump).collect();

        let mut registry = Registry::default();

        for collation in dump.collations {
            registry.register(Collation::from_dump(collation, &tables, &charsets));
        }
        registry.register_hardcoded();

        for unsupported in dump.unsupported {
            assert!(
                !registry.by_id.contains_key(&unsupported.id),
                "collation {} is both supported and unsupported",
                unsupported.id
            );
            registry.unsupported.insert(unsupported.id, unsupported.name);
        }

        registry.collations.sort_by_key(Collation::id);
        registry.reindex();

        debug!(
            collations = registry.collations.len(),
            unsupported = registry.unsupported.len(),
            charsets = ?charsets.iter().map(|cs| cs.name()).collect::<Vec<_>>(),
            tables = ?tables.iter().map(|t| (t.name(), t.len())).collect::<Vec<_>>(),
            "collation registry initialized"
        );

        registry
    }

    /// Add a collation. Clashing ids or names, or a second default for a
    /// charset, are fatal.
    pub fn register(&mut self, collation: Collation) {
        let idx = self.collations.len();

        assert!(
            self.by_id.insert(collation.id(), idx).is_none(),
            "collation id {} registered twice",
            collation.id()
        );
        assert!(
            self.by_name.insert(collation.name().to_string(), idx).is_none(),
            "collation {} registered twice",
            collation.name()
        );
        if collation.is_default() {
            assert!(
                self.defaults.insert(collation.charset().name(), idx).is_none(),
                "charset {} has a second default collation {}",
                collation.charset().name(),
                collation.name()
            );
        }

        self.collations.push(collation);
    }

    pub fn lookup_by_name(&self, name: &str) -> Result<&Collation> {
        if let Some(&idx) = self.by_name.get(name) {
            return Ok(&self.collations[idx]);
        }
        if self.is_unsupported(name) {
            return Err(CollationError::UnsupportedCollation(name.to_string()));
        }
        Err(CollationError::UnknownCollation(name.to_string()))
    }

    pub fn lookup_by_id(&self, id: u16) -> Result<&Collation> {
        if let Some(&idx) = self.by_id.get(&id) {
            return Ok(&self.collations[idx]);
        }
        if let Some(name) = self.unsupported.get(&id) {
            return Err(CollationError::UnsupportedCollation(name.clone()));
        }
        Err(CollationError::UnknownCollation(format!("id {id}")))
    }

    /// All supported collations, ordered by id
    pub fn all(&self) -> &[Collation] {
        &self.collations
    }

    pub fn default_for_charset(&self, charset: &str) -> Option<&Collation> {
        self.defaults
            .get(Charset::canonical_name(charset))
            .map(|&idx| &self.collations[idx])
    }

    pub fn is_unsupported(&self, name: &str) -> bool {
        self.unsupported.values().any(|n| n == name)
    }
}

impl Registry {
    fn register_hardcoded(&mut self) {
        let charset = |name: &str| {
            Charset::lookup(name).unwrap_or_else(|| panic!("charset {name} is not built in"))
        };

        self.register(Collation::hardcoded_bin(63, "binary", charset("binary"), true));
        self.register(Collation::hardcoded_bin(
            309,
            "utf8mb4_0900_bin",
            charset("utf8mb4"),
            false,
        ));
    }

    // Indexes point into `collations` and have to follow its order
    fn reindex(&mut self) {
        self.by_id.clear();
        self.by_name.clear();
        self.defaults.clear();

        for (idx, collation) in self.collations.iter().enumerate() {
            self.by_id.insert(collation.id(), idx);
            self.by_name.insert(collation.name().to_string(), idx);
            if collation.is_default() {
                self.defaults.insert(collation.charset().name(), idx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CharsetDump, CollationDump, KindDump, UnsupportedDump, DUMP_FORMAT};

    fn collation(id: u16, name: &str, charset: &str, is_default: bool) -> CollationDump {
        CollationDump {
            id,
            name: name.to_string(),
            charset: charset.to_string(),
            is_default,
            kind: KindDump::UnicodeBin,
        }
    }

    fn dump(collations: Vec<CollationDump>) -> Dump {
        Dump {
            format: DUMP_FORMAT,
            tables: vec![],
            charsets: vec![CharsetDump {
                name: "latin5".to_string(),
                to_unicode: (0..=255).collect(),
            }],
            collations,
            unsupported: vec![UnsupportedDump {
                id: 89,
                name: "tis620_bin".to_string(),
            }],
        }
    }

    #[test]
    fn lookups() {
        let registry = Registry::from_dump(dump(vec![
            collation(83, "utf8mb3_bin", "utf8mb3", false),
            collation(46, "utf8mb4_bin", "utf8mb4", true),
        ]));

        assert_eq!(registry.lookup_by_name("utf8mb4_bin").map(Collation::id), Ok(46));
        assert_eq!(registry.lookup_by_id(83).map(Collation::name), Ok("utf8mb3_bin"));
        assert_eq!(registry.lookup_by_id(63).map(Collation::name), Ok("binary"));
        assert_eq!(
            registry.lookup_by_name("tis620_bin").map(Collation::id),
            Err(CollationError::UnsupportedCollation("tis620_bin".to_string()))
        );
        assert_eq!(
            registry.lookup_by_id(89).map(Collation::id),
            Err(CollationError::UnsupportedCollation("tis620_bin".to_string()))
        );
        assert!(matches!(
            registry.lookup_by_name("klingon_ci"),
            Err(CollationError::UnknownCollation(_))
        ));
        assert!(registry.is_unsupported("tis620_bin"));

        let ids: Vec<u16> = registry.all().iter().map(Collation::id).collect();
        assert_eq!(ids, vec![46, 63, 83, 309]);

        assert_eq!(
            registry.default_for_charset("utf8mb4").map(Collation::name),
            Some("utf8mb4_bin")
        );
        assert_eq!(
            registry.default_for_charset("binary").map(Collation::name),
            Some("binary")
        );
        assert!(registry.default_for_charset("utf8").is_none());
    }

    #[test]
    fn dump_charsets_back_their_collations() {
        let mut latin5_bin = collation(78, "latin5_bin", "latin5", true);
        latin5_bin.kind = KindDump::EightBitBin;
        let registry = Registry::from_dump(dump(vec![latin5_bin]));

        let found = registry.lookup_by_name("latin5_bin").unwrap();
        assert_eq!(found.charset().name(), "latin5");
        assert_eq!(found.weight_string(b"ab  ", None), Ok(b"ab".to_vec()));
        assert_eq!(
            registry.default_for_charset("latin5").map(Collation::id),
            Some(78)
        );
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn duplicate_ids_are_fatal() {
        Registry::from_dump(dump(vec![
            collation(46, "utf8mb4_bin", "utf8mb4", false),
            collation(46, "utf8mb4_other_bin", "utf8mb4", false),
        ]));
    }

    #[test]
    #[should_panic(expected = "second default")]
    fn two_defaults_are_fatal() {
        Registry::from_dump(dump(vec![
            collation(83, "utf8mb3_bin", "utf8mb3", true),
            collation(33, "utf8mb3_general_ci", "utf8mb3", true),
        ]));
    }
}
