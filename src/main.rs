#![warn(clippy::pedantic)]

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mysql_collations::{lookup_by_name, Collation};
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

//
// Structs etc.
//

/// Compute MySQL weight strings and check them against known-good output
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the weight string of a text, as uppercase hex
    Weight {
        collation: String,
        text: String,
        #[arg(long)]
        max_len: Option<usize>,
    },
    /// Check every record of a golden corpus
    Verify { corpus: PathBuf },
    /// Check that the lines of a file are already sorted under a collation
    Order { collation: String, file: PathBuf },
}

#[derive(Deserialize)]
struct Record {
    collation: String,
    lang: String,
    text: String,
    weights: String,
}

//
// Functions
//

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Args::parse().command {
        Command::Weight {
            collation,
            text,
            max_len,
        } => {
            let collation = lookup_by_name(&collation)?;
            println!("{}", hex::encode_upper(weigh(collation, &text, max_len)?));
        }
        Command::Verify { corpus } => verify(&corpus)?,
        Command::Order { collation, file } => order(lookup_by_name(&collation)?, &file)?,
    }

    Ok(())
}

fn weigh(collation: &Collation, text: &str, max_len: Option<usize>) -> Result<Vec<u8>> {
    let src = collation
        .charset()
        .encode_str(text)
        .with_context(|| format!("cannot encode {text:?} for {}", collation.name()))?;
    Ok(collation.weight_string(&src, max_len)?)
}

fn verify(path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let records: Vec<Record> = serde_json::from_str(&raw)
        .with_context(|| format!("cannot parse {}", path.display()))?;

    let mut mismatches = 0;
    for record in &records {
        let collation = lookup_by_name(&record.collation)?;
        let actual = hex::encode_upper(weigh(collation, &record.text, None)?);

        if !actual.eq_ignore_ascii_case(&record.weights) {
            mismatches += 1;
            warn!(
                collation = %record.collation,
                lang = %record.lang,
                text = ?record.text,
                expected = %record.weights,
                actual = %actual,
                "weight string mismatch"
            );
        }
    }

    info!(records = records.len(), mismatches, "verified {}", path.display());
    if mismatches > 0 {
        bail!("{mismatches} of {} records did not match", records.len());
    }
    Ok(())
}

fn order(collation: &Collation, path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;

    let mut max_key: Vec<u8> = Vec::new();
    let mut lines = 0;

    for (n, line) in raw.lines().enumerate() {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let key = weigh(collation, line, None)?;
        if key.cmp(&max_key) == Ordering::Less {
            bail!("line {} ({line:?}) sorts before the line above it", n + 1);
        }

        max_key = key;
        lines += 1;
    }

    info!(lines, collation = collation.name(), "{} is in order", path.display());
    Ok(())
}
