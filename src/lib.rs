//! MySQL-compatible collations: weight strings and comparisons for text in
//! any of the server's character sets, without a server.
//!
//! ```no_run
//! let collation = mysql_collations::lookup_by_name("utf8mb4_0900_ai_ci").unwrap();
//! let key = collation.weight_string("Straße".as_bytes(), None).unwrap();
//! assert!(!key.is_empty());
//! ```

use std::cmp::Ordering;

mod charset;
mod collation;
mod data;
mod error;
mod key;
mod registry;
mod simple;
mod unicase;
pub mod uca;

pub use charset::Charset;
pub use collation::{Collation, CollationKind, PadAttribute};
pub use data::{
    CharsetDump, CollationDump, ContractionDump, Dump, KindDump, TableDump, UnsupportedDump,
    WeightEntry, DUMP_FORMAT,
};
pub use error::{CollationError, Result};
pub use key::KeyWriter;
pub use registry::Registry;

//
// Functions, public
//

pub fn lookup_by_name(name: &str) -> Result<&'static Collation> {
    Registry::global().lookup_by_name(name)
}

pub fn lookup_by_id(id: u16) -> Result<&'static Collation> {
    Registry::global().lookup_by_id(id)
}

/// Every supported collation, ordered by id
pub fn all() -> &'static [Collation] {
    Registry::global().all()
}

pub fn default_for_charset(charset: &str) -> Option<&'static Collation> {
    Registry::global().default_for_charset(charset)
}

/// Compare two strings given as UTF-8, after converting them into the
/// collation's charset.
pub fn collate(a: &str, b: &str, collation: &Collation) -> Result<Ordering> {
    let charset = collation.charset();
    collation.compare(&charset.encode_str(a)?, &charset.encode_str(b)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(collation: &str, words: &[&'static str]) -> Vec<&'static str> {
        let collation = lookup_by_name(collation).unwrap();
        let mut words = words.to_vec();
        words.sort_by(|a, b| collate(a, b, collation).unwrap());
        words
    }

    #[test]
    fn registry_loads() {
        assert!(all().len() > 50);
        assert_eq!(lookup_by_id(255).unwrap().name(), "utf8mb4_0900_ai_ci");
        assert_eq!(lookup_by_name("binary").unwrap().id(), 63);
        assert_eq!(
            default_for_charset("utf8mb4").map(Collation::name),
            Some("utf8mb4_0900_ai_ci")
        );
        assert_eq!(
            default_for_charset("latin1").map(Collation::name),
            Some("latin1_swedish_ci")
        );
        assert_eq!(
            lookup_by_name("tis620_bin").unwrap_err(),
            CollationError::UnsupportedCollation("tis620_bin".to_string())
        );
    }

    #[test]
    fn defaults_point_back() {
        for collation in all().iter().filter(|c| c.is_default()) {
            let default = default_for_charset(collation.charset().name()).unwrap();
            assert_eq!(default.id(), collation.id());
        }
    }

    #[test]
    fn case_and_accents() {
        let words = ["b", "A", "á", "a", "B"];
        // stable sort keeps equal words in input order
        assert_eq!(sorted("utf8mb4_0900_ai_ci", &words), ["A", "á", "a", "b", "B"]);
        assert_eq!(sorted("utf8mb4_0900_as_cs", &words), ["a", "A", "á", "b", "B"]);
        assert_eq!(sorted("utf8mb4_bin", &words), ["A", "B", "a", "b", "á"]);
    }

    #[test]
    fn spanish_traditional_ch() {
        let words = ["cz", "ch", "d", "ca"];
        assert_eq!(sorted("utf8mb4_0900_ai_ci", &words), ["ca", "ch", "cz", "d"]);
        assert_eq!(sorted("utf8mb4_es_trad_0900_ai_ci", &words), ["ca", "cz", "ch", "d"]);
        assert_eq!(sorted("utf8mb4_spanish2_ci", &words), ["ca", "cz", "ch", "d"]);
    }

    #[test]
    fn swedish_letters_after_z() {
        let words = ["ö", "z", "o", "å", "a"];
        assert_eq!(sorted("utf8mb4_swedish_ci", &words), ["a", "o", "z", "å", "ö"]);
        assert_eq!(sorted("utf8mb4_unicode_ci", &words), ["å", "a", "ö", "o", "z"]);
    }

    #[test]
    fn pad_space() {
        for name in ["latin1_swedish_ci", "utf8mb4_general_ci", "utf8mb4_unicode_ci", "sjis_bin"] {
            let collation = lookup_by_name(name).unwrap();
            assert_eq!(
                collation.compare(b"abc", b"abc   "),
                Ok(Ordering::Equal),
                "{name}"
            );
        }
        let nopad = lookup_by_name("utf8mb4_0900_ai_ci").unwrap();
        assert_eq!(nopad.compare(b"abc", b"abc "), Ok(Ordering::Less));
    }
}
