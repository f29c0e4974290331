//! Format of the compiled-in collation blob.
//!
//! `makecolldata` writes a bincode-encoded [`Dump`] to `src/data/mysqldata.bin`;
//! the registry deserializes it once at startup.

use serde::{Deserialize, Serialize};

use crate::uca::{Reorder, UcaVersion, Weights};

/// Bumped whenever the layout of [`Dump`] changes.
pub const DUMP_FORMAT: u32 = 2;

static MYSQLDATA: &[u8] = include_bytes!("data/mysqldata.bin");

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Dump {
    pub format: u32,
    pub tables: Vec<TableDump>,
    pub charsets: Vec<CharsetDump>,
    pub collations: Vec<CollationDump>,
    pub unsupported: Vec<UnsupportedDump>,
}

/// A shared base weight table for one UCA generation
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TableDump {
    pub name: String,
    pub version: UcaVersion,
    pub entries: Vec<WeightEntry>,
}

/// An 8-bit charset with no built-in codec, as the server's byte-to-Unicode table
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CharsetDump {
    pub name: String,
    pub to_unicode: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WeightEntry {
    pub codepoint: u32,
    pub weights: Vec<Weights>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ContractionDump {
    pub path: Vec<u32>,
    pub weights: Vec<Weights>,
    pub contextual: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CollationDump {
    pub id: u16,
    pub name: String,
    pub charset: String,
    pub is_default: bool,
    pub kind: KindDump,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub enum KindDump {
    EightBitSimple {
        sort: Vec<u8>,
    },
    EightBitBin,
    UnicodeGeneral,
    UnicodeBin,
    Multibyte {
        sort: Option<Vec<u8>>,
    },
    UcaLegacy {
        table: String,
        tailoring: Vec<WeightEntry>,
        contractions: Vec<ContractionDump>,
        max_codepoint: u32,
    },
    Uca900 {
        table: String,
        levels: u8,
        tailoring: Vec<WeightEntry>,
        contractions: Vec<ContractionDump>,
        reorder: Vec<Reorder>,
        upper_case_first: bool,
    },
}

/// Collations the reference server knows about but this crate refuses to emulate
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UnsupportedDump {
    pub id: u16,
    pub name: String,
}

/// Deserialize the compiled-in blob. A blob that does not decode cannot be
/// recovered from, so this panics.
pub fn load() -> Dump {
    let dump: Dump = bincode::deserialize(MYSQLDATA)
        .unwrap_or_else(|err| panic!("corrupt collation data blob: {err}"));

    assert_eq!(
        dump.format, DUMP_FORMAT,
        "collation data blob has format {}, expected {}",
        dump.format, DUMP_FORMAT
    );

    dump
}
