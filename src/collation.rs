use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::charset::Charset;
use crate::data::{CollationDump, KindDump};
use crate::error::Result;
use crate::key::KeyWriter;
use crate::simple::{self, SortTable};
use crate::uca::{Contractions, Reorders, Uca, Uca900, UcaLegacy, WeightTable};

//
// Structs etc.
//

/// Whether trailing spaces take part in comparisons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadAttribute {
    /// Trailing spaces are ignored
    PadSpace,
    NoPad,
}

/// The closed set of collation algorithms
pub enum CollationKind {
    EightBitSimple { sort: Box<SortTable> },
    EightBitBin,
    UnicodeGeneral,
    UnicodeBin,
    Multibyte { sort: Option<Box<SortTable>> },
    UcaLegacy(UcaLegacy),
    Uca900(Uca900),
}

pub struct Collation {
    id: u16,
    name: String,
    charset: &'static Charset,
    is_default: bool,
    pad: PadAttribute,
    kind: CollationKind,
}

//
// Functions, public
//

impl Collation {
    /// Build a collation from its dump entry. `tables` holds the shared
    /// weight tables and `charsets` the table-driven charsets that came with
    /// the dump; a dump naming any other table or charset is fatal.
    pub fn from_dump(
        dump: CollationDump,
        tables: &[Arc<WeightTable>],
        charsets: &[&'static Charset],
    ) -> Self {
        let charset = Charset::lookup(&dump.charset)
            .or_else(|| charsets.iter().copied().find(|cs| cs.name() == dump.charset))
            .unwrap_or_else(|| {
                panic!("collation {} uses unknown charset {}", dump.name, dump.charset)
            });

        let table = |name: &str| -> Arc<WeightTable> {
            tables
                .iter()
                .find(|t| t.name() == name)
                .cloned()
                .unwrap_or_else(|| panic!("collation {} uses unknown table {name}", dump.name))
        };
        let sort_table = |sort: Vec<u8>| -> Box<SortTable> {
            let len = sort.len();
            sort.into_boxed_slice()
                .try_into()
                .unwrap_or_else(|_| panic!("collation {} has a {len}-byte sort table", dump.name))
        };

        let kind = match dump.kind {
            KindDump::EightBitSimple { sort } => CollationKind::EightBitSimple {
                sort: sort_table(sort),
            },
            KindDump::EightBitBin => CollationKind::EightBitBin,
            KindDump::UnicodeGeneral => CollationKind::UnicodeGeneral,
            KindDump::UnicodeBin => CollationKind::UnicodeBin,
            KindDump::Multibyte { sort } => CollationKind::Multibyte {
                sort: sort.map(sort_table),
            },
            KindDump::UcaLegacy {
                table: name,
                tailoring,
                contractions,
                max_codepoint,
            } => CollationKind::UcaLegacy(UcaLegacy::new(Uca::new(
                table(&name),
                tailoring,
                Contractions::new(contractions),
                max_codepoint,
            ))),
            KindDump::Uca900 {
                table: name,
                levels,
                tailoring,
                contractions,
                reorder,
                upper_case_first,
            } => CollationKind::Uca900(Uca900::new(
                Uca::new(
                    table(&name),
                    tailoring,
                    Contractions::new(contractions),
                    charset.max_codepoint(),
                ),
                levels,
                Reorders::new(reorder),
                upper_case_first,
            )),
        };

        let pad = match kind {
            CollationKind::Uca900(_) => PadAttribute::NoPad,
            _ => PadAttribute::PadSpace,
        };

        Self {
            id: dump.id,
            name: dump.name,
            charset,
            is_default: dump.is_default,
            pad,
            kind,
        }
    }

    /// The byte-for-byte NO PAD collations that exist on every server
    /// (`binary` and `utf8mb4_0900_bin`).
    pub fn hardcoded_bin(id: u16, name: &str, charset: &'static Charset, is_default: bool) -> Self {
        Self {
            id,
            name: name.to_string(),
            charset,
            is_default,
            pad: PadAttribute::NoPad,
            kind: CollationKind::EightBitBin,
        }
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn charset(&self) -> &'static Charset {
        self.charset
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn pad(&self) -> PadAttribute {
        self.pad
    }

    pub fn kind(&self) -> &CollationKind {
        &self.kind
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            CollationKind::EightBitSimple { .. } => "8bit_simple_ci",
            CollationKind::EightBitBin => "8bit_bin",
            CollationKind::UnicodeGeneral => "unicode_general_ci",
            CollationKind::UnicodeBin => "unicode_bin",
            CollationKind::Multibyte { .. } => "multibyte",
            CollationKind::UcaLegacy(_) => "uca_legacy",
            CollationKind::Uca900(_) => "uca_900",
        }
    }

    /// Compute the sort key of `src`, which must be encoded in this
    /// collation's charset. With `max_len`, the key is cut after that many
    /// bytes and is a prefix of the full key.
    pub fn weight_string(&self, src: &[u8], max_len: Option<usize>) -> Result<Vec<u8>> {
        let mut key = KeyWriter::new(max_len, src.len() * 2);

        match &self.kind {
            CollationKind::EightBitSimple { sort } => {
                simple::eight_bit(sort, self.trim_bytes(src), &mut key);
            }
            CollationKind::EightBitBin => simple::bytes(self.trim_bytes(src), &mut key),
            CollationKind::Multibyte { sort } => {
                simple::multibyte(self.charset, sort.as_deref(), self.trim_bytes(src), &mut key)?;
            }
            CollationKind::UnicodeGeneral => {
                simple::unicode_general(&self.codepoints(src)?, &mut key);
            }
            CollationKind::UnicodeBin => {
                simple::unicode_bin(self.charset, &self.codepoints(src)?, &mut key);
            }
            CollationKind::UcaLegacy(uca) => uca.weight_string(&self.codepoints(src)?, &mut key),
            CollationKind::Uca900(uca) => uca.weight_string(&self.codepoints(src)?, &mut key),
        }

        Ok(key.finish())
    }

    /// Order `a` and `b` under this collation. Agrees with comparing their
    /// weight strings byte by byte.
    pub fn compare(&self, a: &[u8], b: &[u8]) -> Result<Ordering> {
        if let CollationKind::EightBitBin = self.kind {
            return Ok(self.trim_bytes(a).cmp(self.trim_bytes(b)));
        }

        let a = self.weight_string(a, None)?;
        let b = self.weight_string(b, None)?;
        Ok(a.cmp(&b))
    }
}

//
// Functions, private
//

impl Collation {
    fn trim_bytes<'a>(&self, src: &'a [u8]) -> &'a [u8] {
        match self.pad {
            PadAttribute::NoPad => src,
            PadAttribute::PadSpace => {
                let end = src.iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
                &src[..end]
            }
        }
    }

    fn codepoints(&self, src: &[u8]) -> Result<Vec<u32>> {
        let mut codepoints = self.charset.decode(src)?;

        if self.pad == PadAttribute::PadSpace {
            let end = codepoints
                .iter()
                .rposition(|&cp| cp != 0x20)
                .map_or(0, |i| i + 1);
            codepoints.truncate(end);
        }

        Ok(codepoints)
    }
}

impl fmt::Debug for Collation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collation")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("charset", &self.charset.name())
            .field("is_default", &self.is_default)
            .field("pad", &self.pad)
            .field("kind", &self.kind_name())
            .finish()
    }
}
