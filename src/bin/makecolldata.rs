//! Compile the per-collation JSON dumps scraped from a MySQL server into the
//! bincode blob that `mysql_collations` embeds.
//!
//! The three base collations (`utf8mb4_unicode_ci`, `utf8mb4_unicode_520_ci`
//! and `utf8mb4_0900_ai_ci`) provide the shared weight tables; every other
//! UCA collation is stored as a patch against the table of its generation.
//! 8-bit collations over charsets without a built-in codec bring their
//! charset along as the server's byte-to-Unicode table.

#![warn(clippy::pedantic)]

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use base64::Engine;
use clap::Parser;
use mysql_collations::uca::{Reorder, UcaVersion, Weights};
use mysql_collations::{
    Charset, CharsetDump, CollationDump, ContractionDump, Dump, KindDump, TableDump, UnsupportedDump,
    WeightEntry, DUMP_FORMAT,
};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

//
// Structs etc.
//

#[derive(Parser, Debug)]
#[command(about = "Compile MySQL collation dumps into a data blob")]
struct Args {
    /// Directory with one JSON dump per collation
    #[arg(long, default_value = "testdata/mysqldata")]
    input: PathBuf,

    /// Where to write the bincode blob
    #[arg(long, default_value = "src/data/mysqldata.bin")]
    out: PathBuf,
}

#[derive(Error, Debug)]
enum ConvertError {
    #[error("cannot read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot encode the collation dump")]
    Bincode(#[from] bincode::Error),

    #[error("no collation dumps under {0} (run colldump against a server first)")]
    NoInput(PathBuf),

    #[error("base collation {0} is missing from the dumps")]
    MissingBase(&'static str),

    #[error("{collation}: malformed codepoint key {key:?}")]
    CodepointKey { collation: String, key: String },

    #[error("{collation}: {len} weights for {key} do not form whole collation elements")]
    WeightLength {
        collation: String,
        key: String,
        len: usize,
    },

    #[error("{collation}: unexpected UCA version {version}")]
    UcaVersion { collation: String, version: u32 },

    #[error("{0}: cannot derive comparison levels from the name")]
    Levels(String),

    #[error("{collation}: sort order has {len} bytes, expected 256")]
    SortOrder { collation: String, len: usize },

    #[error("{collation}: charset table has {len} entries, expected 256")]
    CharsetTable { collation: String, len: usize },
}

type Weights16 = BTreeMap<String, Vec<u16>>;

/// One `colldump` record. Byte tables are base64, as Go writes `[]byte`.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "PascalCase")]
struct CollationMetadata {
    name: String,
    charset: String,
    #[serde(default)]
    flags: Flags,
    #[serde(default)]
    collation_impl: String,
    number: u16,
    #[serde(default, deserialize_with = "base64_bytes")]
    sort_order: Option<Vec<u8>>,
    #[serde(default)]
    tab_to_uni: Option<Vec<u16>>,
    #[serde(rename = "UCAVersion", default)]
    uca_version: u32,
    #[serde(default)]
    weights: Option<Weights16>,
    #[serde(default)]
    contractions: Option<Vec<ContractionMetadata>>,
    #[serde(default)]
    reorder: Option<Vec<[u16; 4]>>,
    #[serde(default)]
    upper_case_first: bool,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "PascalCase")]
struct Flags {
    #[serde(default)]
    binary: bool,
    #[serde(default)]
    default: bool,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
struct ContractionMetadata {
    path: Vec<u32>,
    weights: Vec<u16>,
    #[serde(default)]
    contextual: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Route {
    /// Registered in code, nothing to export
    Hardcoded,
    Unsupported,
    UcaLegacy,
    Uca900,
    EightBit,
    Multibyte,
    Unicode,
}

/// Base collations and the shared tables built from them
const BASES: [(&str, &str, UcaVersion); 3] = [
    ("utf8mb4_unicode_ci", "uca400", UcaVersion::Uca400),
    ("utf8mb4_unicode_520_ci", "uca520", UcaVersion::Uca520),
    ("utf8mb4_0900_ai_ci", "uca900", UcaVersion::Uca900),
];

/// Collations large enough to get a whole table of their own
const OWN_TABLES: [(&str, &str); 3] = [
    ("utf8mb4_ja_0900_as_cs", "uca900_ja"),
    ("utf8mb4_ja_0900_as_cs_ks", "uca900_ja"),
    ("utf8mb4_zh_0900_as_cs", "uca900_zh"),
];

#[derive(Debug, Default)]
struct Report {
    handled: usize,
    total: usize,
    unhandled: BTreeMap<String, Vec<String>>,
}

//
// Macros
//

macro_rules! regex {
    ($re:literal $(,)?) => {{
        static RE: OnceCell<Regex> = OnceCell::new();
        RE.get_or_init(|| Regex::new($re).unwrap())
    }};
}

//
// Main
//

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let metadata = load_metadata(&args.input)
        .with_context(|| format!("loading dumps from {}", args.input.display()))?;
    let (dump, report) = convert(metadata)?;

    let blob = bincode::serialize(&dump).map_err(ConvertError::from)?;
    fs::write(&args.out, &blob).with_context(|| format!("writing {}", args.out.display()))?;

    for (charset, names) in &report.unhandled {
        warn!(charset = %charset, collations = %names.join(", "), "unhandled collations");
    }

    #[allow(clippy::cast_precision_loss)]
    let percent = report.handled as f64 / report.total.max(1) as f64 * 100.0;
    info!(
        out = %args.out.display(),
        bytes = blob.len(),
        tables = dump.tables.len(),
        "written {}/{} collations ({percent:.2}% handled)",
        report.handled,
        report.total,
    );

    Ok(())
}

//
// Functions, private
//

fn load_metadata(dir: &Path) -> Result<Vec<CollationMetadata>, ConvertError> {
    let io = |source| ConvertError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()
        .map_err(io)?;
    paths.retain(|p| p.extension().is_some_and(|ext| ext == "json"));
    paths.sort();

    if paths.is_empty() {
        return Err(ConvertError::NoInput(dir.to_path_buf()));
    }

    let mut all = Vec::with_capacity(paths.len());
    for path in paths {
        let raw = fs::read(&path).map_err(|source| ConvertError::Io {
            path: path.clone(),
            source,
        })?;
        let meta: CollationMetadata = serde_json::from_slice(&raw)
            .map_err(|source| ConvertError::Json { path, source })?;
        all.push(meta);
    }

    all.sort_by_key(|meta| meta.number);
    Ok(all)
}

fn convert(mut all: Vec<CollationMetadata>) -> Result<(Dump, Report), ConvertError> {
    let mut tables = Vec::new();
    let mut bases: HashMap<UcaVersion, Weights16> = HashMap::new();

    for (collation, table, version) in BASES {
        let meta = all
            .iter()
            .find(|meta| meta.name == collation)
            .ok_or(ConvertError::MissingBase(collation))?;
        let weights = meta.weights.clone().unwrap_or_default();
        tables.push(table_dump(collation, table, version, &weights)?);
        bases.insert(version, weights);
    }
    for (collation, table) in OWN_TABLES {
        if tables.iter().any(|t: &TableDump| t.name == table) {
            continue;
        }
        if let Some(meta) = all.iter().find(|meta| meta.name == collation) {
            let weights = meta.weights.clone().unwrap_or_default();
            tables.push(table_dump(collation, table, UcaVersion::Uca900, &weights)?);
        }
    }

    let mut charsets: Vec<CharsetDump> = Vec::new();
    let mut collations = Vec::new();
    let mut unsupported = Vec::new();
    let mut report = Report {
        total: all.len(),
        ..Report::default()
    };

    for meta in &mut all {
        let charset = Charset::lookup(&meta.charset);

        let kind = match route(meta, charset) {
            Route::Hardcoded => {
                debug!(collation = %meta.name, "hardcoded, skipping");
                report.handled += 1;
                continue;
            }
            Route::Unsupported => {
                if meta.name != "tis620_bin" {
                    report
                        .unhandled
                        .entry(meta.charset.clone())
                        .or_default()
                        .push(meta.name.clone());
                }
                unsupported.push(UnsupportedDump {
                    id: meta.number,
                    name: meta.name.clone(),
                });
                continue;
            }
            Route::UcaLegacy => uca_legacy(meta, &bases)?,
            Route::Uca900 => uca900(meta, &bases)?,
            Route::EightBit => {
                if charset.is_none() && !charsets.iter().any(|cs| cs.name == meta.charset) {
                    charsets.push(charset_dump(meta)?);
                }
                eight_bit(meta)?
            }
            Route::Multibyte => KindDump::Multibyte {
                sort: sort_order(meta)?,
            },
            Route::Unicode if meta.flags.binary => KindDump::UnicodeBin,
            Route::Unicode => KindDump::UnicodeGeneral,
        };

        report.handled += 1;
        collations.push(CollationDump {
            id: meta.number,
            name: meta.name.clone(),
            // canonical name, `utf8` becomes `utf8mb3`
            charset: charset.map_or_else(|| meta.charset.clone(), |cs| cs.name().to_string()),
            is_default: meta.flags.default,
            kind,
        });
    }

    let dump = Dump {
        format: DUMP_FORMAT,
        tables,
        charsets,
        collations,
        unsupported,
    };
    Ok((dump, report))
}

fn route(meta: &CollationMetadata, charset: Option<&Charset>) -> Route {
    let name = meta.name.as_str();
    let impl_ = meta.collation_impl.as_str();

    if name == "utf8mb4_0900_bin" || name == "binary" {
        return Route::Hardcoded;
    }
    // known to give wrong results
    if name == "tis620_bin" {
        return Route::Unsupported;
    }
    let Some(charset) = charset else {
        return match impl_ {
            "8bit_bin" | "8bit_simple_ci" if meta.tab_to_uni.is_some() => Route::EightBit,
            _ => Route::Unsupported,
        };
    };

    match impl_ {
        "any_uca" | "utf16_uca" | "utf32_uca" | "ucs2_uca" => Route::UcaLegacy,
        "uca_900" => Route::Uca900,
        "8bit_bin" | "8bit_simple_ci" => Route::EightBit,
        _ if name == "gb18030_unicode_520_ci" => Route::UcaLegacy,
        _ if charset.is_multibyte() => Route::Multibyte,
        _ if name.ends_with("_bin") && charset.is_unicode() => Route::Unicode,
        _ if name.ends_with("_general_ci") => Route::Unicode,
        _ => Route::Unsupported,
    }
}

fn table_dump(
    collation: &str,
    table: &str,
    version: UcaVersion,
    weights: &Weights16,
) -> Result<TableDump, ConvertError> {
    let mut entries = weights
        .iter()
        .map(|(key, raw)| {
            Ok(WeightEntry {
                codepoint: parse_codepoint(collation, key)?,
                weights: parse_weights(collation, key, version, raw)?,
            })
        })
        .collect::<Result<Vec<_>, ConvertError>>()?;
    entries.sort_by_key(|e| e.codepoint);

    info!(table, collation, entries = entries.len(), "weight table");

    Ok(TableDump {
        name: table.to_string(),
        version,
        entries,
    })
}

fn uca_legacy(
    meta: &CollationMetadata,
    bases: &HashMap<UcaVersion, Weights16>,
) -> Result<KindDump, ConvertError> {
    let (table, version, max_codepoint) = match meta.uca_version {
        400 => ("uca400", UcaVersion::Uca400, 0xFFFF),
        520 => ("uca520", UcaVersion::Uca520, 0x10_FFFF),
        version => {
            return Err(ConvertError::UcaVersion {
                collation: meta.name.clone(),
                version,
            })
        }
    };

    Ok(KindDump::UcaLegacy {
        table: table.to_string(),
        tailoring: tailoring(meta, version, bases.get(&version))?,
        contractions: contractions(meta, version),
        max_codepoint,
    })
}

fn uca900(
    meta: &mut CollationMetadata,
    bases: &HashMap<UcaVersion, Weights16>,
) -> Result<KindDump, ConvertError> {
    if meta.uca_version != 900 {
        return Err(ConvertError::UcaVersion {
            collation: meta.name.clone(),
            version: meta.uca_version,
        });
    }

    let mut table = "uca900";
    if let Some(&(_, own)) = OWN_TABLES.iter().find(|(name, _)| *name == meta.name) {
        table = own;
        meta.weights = None;
    }
    // Chinese weights come already reordered
    if meta.name == "utf8mb4_zh_0900_as_cs" {
        meta.reorder = None;
    }

    let levels = levels(&meta.name).ok_or_else(|| ConvertError::Levels(meta.name.clone()))?;

    let reorder = meta
        .reorder
        .iter()
        .flatten()
        .map(|&[from_min, from_max, to_min, to_max]| Reorder {
            from_min,
            from_max,
            to_min,
            to_max,
        })
        .collect();

    Ok(KindDump::Uca900 {
        table: table.to_string(),
        levels,
        tailoring: tailoring(meta, UcaVersion::Uca900, bases.get(&UcaVersion::Uca900))?,
        contractions: contractions(meta, UcaVersion::Uca900),
        reorder,
        upper_case_first: meta.upper_case_first,
    })
}

fn levels(name: &str) -> Option<u8> {
    [("_ai_ci", 1), ("_as_ci", 2), ("_as_cs", 3), ("_as_cs_ks", 4)]
        .into_iter()
        .find(|(suffix, _)| name.ends_with(suffix))
        .map(|(_, levels)| levels)
}

fn eight_bit(meta: &CollationMetadata) -> Result<KindDump, ConvertError> {
    if meta.flags.binary {
        return Ok(KindDump::EightBitBin);
    }

    let sort = sort_order(meta)?.ok_or(ConvertError::SortOrder {
        collation: meta.name.clone(),
        len: 0,
    })?;
    Ok(KindDump::EightBitSimple { sort })
}

fn charset_dump(meta: &CollationMetadata) -> Result<CharsetDump, ConvertError> {
    let to_unicode = meta.tab_to_uni.clone().unwrap_or_default();
    if to_unicode.len() != 256 {
        return Err(ConvertError::CharsetTable {
            collation: meta.name.clone(),
            len: to_unicode.len(),
        });
    }

    debug!(charset = %meta.charset, collation = %meta.name, "table-driven charset");
    Ok(CharsetDump {
        name: meta.charset.clone(),
        to_unicode,
    })
}

fn sort_order(meta: &CollationMetadata) -> Result<Option<Vec<u8>>, ConvertError> {
    match &meta.sort_order {
        Some(sort) if sort.len() != 256 => Err(ConvertError::SortOrder {
            collation: meta.name.clone(),
            len: sort.len(),
        }),
        sort => Ok(sort.clone()),
    }
}

/// Weights that differ from the base table, sorted by codepoint
fn tailoring(
    meta: &CollationMetadata,
    version: UcaVersion,
    base: Option<&Weights16>,
) -> Result<Vec<WeightEntry>, ConvertError> {
    let Some(weights) = &meta.weights else {
        return Ok(Vec::new());
    };

    let mut patches = Vec::new();
    for (key, raw) in weights {
        if base.and_then(|base| base.get(key)) == Some(raw) {
            continue;
        }
        patches.push(WeightEntry {
            codepoint: parse_codepoint(&meta.name, key)?,
            weights: parse_weights(&meta.name, key, version, raw)?,
        });
    }

    patches.sort_by_key(|p| p.codepoint);
    Ok(patches)
}

fn contractions(meta: &CollationMetadata, version: UcaVersion) -> Vec<ContractionDump> {
    meta.contractions
        .iter()
        .flatten()
        .map(|c| ContractionDump {
            path: c.path.clone(),
            weights: strip_ignorable_tail(elements(version, &c.weights)),
            contextual: c.contextual,
        })
        .collect()
}

fn elements(version: UcaVersion, raw: &[u16]) -> Vec<Weights> {
    match version {
        UcaVersion::Uca900 => raw
            .chunks_exact(3)
            .map(|w| Weights::new(w[0], w[1], w[2]))
            .collect(),
        _ => raw.iter().map(|&w| Weights::primary(w)).collect(),
    }
}

// The server pads contraction weights with zero elements; cut at the
// first one, never looking at the last element
fn strip_ignorable_tail(mut weights: Vec<Weights>) -> Vec<Weights> {
    let checked = weights.len().saturating_sub(1);
    if let Some(end) = weights[..checked]
        .iter()
        .position(|&w| w == Weights::default())
    {
        weights.truncate(end);
    }
    weights
}

fn parse_codepoint(collation: &str, key: &str) -> Result<u32, ConvertError> {
    let malformed = || ConvertError::CodepointKey {
        collation: collation.to_string(),
        key: key.to_string(),
    };

    let caps = regex!(r"^U\+([\dA-F]{4,6})$")
        .captures(key)
        .ok_or_else(malformed)?;
    u32::from_str_radix(&caps[1], 16).map_err(|_| malformed())
}

fn parse_weights(
    collation: &str,
    key: &str,
    version: UcaVersion,
    raw: &[u16],
) -> Result<Vec<Weights>, ConvertError> {
    if version == UcaVersion::Uca900 && raw.len() % 3 != 0 {
        return Err(ConvertError::WeightLength {
            collation: collation.to_string(),
            key: key.to_string(),
            len: raw.len(),
        });
    }
    Ok(elements(version, raw))
}

fn base64_bytes<'de, D>(de: D) -> Result<Option<Vec<u8>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(text) = Option::<String>::deserialize(de)? else {
        return Ok(None);
    };
    base64::engine::general_purpose::STANDARD
        .decode(text)
        .map(Some)
        .map_err(serde::de::Error::custom)
}
