//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! The store file is the canonical export of the DAG; every mutating
//! command loads it, applies its change and writes it back.

use pcdfa_core::{
    Acceptance, DagError, DagMetrics, IncrementalDag, ListAlphabet, Word,
    export::{canonical_checksum, canonical_crypto_hash, export_canonical, import_canonical},
    primitives::{MAX_BATCH_LENGTH, MAX_IMPORT_PAYLOAD_SIZE},
    verify_canonical,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The store kept by the CLI: words over single characters.
pub type Store = IncrementalDag<ListAlphabet<char>>;

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum file size for ingestion (100 MB).
///
/// This prevents memory exhaustion from malicious or accidental large files.
const MAX_INGEST_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), DagError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| DagError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(DagError::IoError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve `path` to a canonical path of an existing regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, DagError> {
    // Canonicalize resolves "..", symlinks, and validates existence
    let canonical = path.canonicalize().map_err(|e| {
        DagError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(DagError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

// =============================================================================
// FACTS
// =============================================================================

/// One accept/reject fact, as read from an ingest file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    /// The word, one symbol per character.
    pub word: String,
    /// `true` to accept, `false` to reject.
    pub accept: bool,
}

/// Parse a batch of facts.
///
/// - `json`: an array of `{"word": "...", "accept": true}` objects.
/// - `text`: one fact per line, `+word` to accept and `-word` to reject.
///   Blank lines and lines starting with `#` are skipped.
pub fn parse_facts(contents: &[u8], format: &str) -> Result<Vec<Fact>, DagError> {
    let facts: Vec<Fact> = match format {
        "json" => serde_json::from_slice(contents)
            .map_err(|e| DagError::DeserializationError(format!("Facts: {}", e)))?,
        "text" => {
            let mut facts = Vec::new();

            for (number, raw) in contents.split(|&byte| byte == b'\n').enumerate() {
                let line = std::str::from_utf8(raw).map_err(|e| {
                    DagError::DeserializationError(format!(
                        "Line {}: invalid UTF-8: {}",
                        number + 1,
                        e
                    ))
                })?;
                let line = line.trim_end_matches('\r');
                if line.trim().is_empty() || line.starts_with('#') {
                    continue;
                }
                let accept = match line.chars().next() {
                    Some('+') => true,
                    Some('-') => false,
                    _ => {
                        return Err(DagError::DeserializationError(format!(
                            "Line {}: expected '+word' or '-word'",
                            number + 1
                        )));
                    }
                };
                facts.push(Fact {
                    word: line[1..].to_string(),
                    accept,
                });
            }
            facts
        }
        _ => {
            return Err(DagError::DeserializationError(format!(
                "Unknown format: {}",
                format
            )));
        }
    };

    if facts.len() > MAX_BATCH_LENGTH {
        return Err(DagError::DeserializationError(format!(
            "Fact count {} exceeds maximum allowed {}",
            facts.len(),
            MAX_BATCH_LENGTH
        )));
    }

    Ok(facts)
}

/// Summary of an ingested batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Facts recorded or already known.
    pub applied: usize,
    /// Facts skipped because they contradict the store.
    pub conflicts: usize,
}

/// Apply facts in order. Conflicting facts are skipped and counted; any
/// other error aborts the batch.
pub fn apply_facts(store: &mut Store, facts: &[Fact]) -> Result<IngestReport, DagError> {
    let mut report = IngestReport::default();
    for fact in facts {
        match store.insert(&Word::from(fact.word.as_str()), fact.accept) {
            Ok(()) => report.applied += 1,
            Err(e) if e.is_conflict() => {
                tracing::warn!("Skipping fact: {}", e);
                report.conflicts += 1;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(report)
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Create an empty store over `alphabet`.
pub fn cmd_init(
    store_path: &Path,
    json_mode: bool,
    alphabet: &str,
    force: bool,
) -> Result<(), DagError> {
    if store_path.exists() && !force {
        return Err(DagError::IoError(
            "Store already exists. Use --force to overwrite.".to_string(),
        ));
    }

    let store = Store::new(ListAlphabet::from_chars(alphabet)?);
    save_store(&store, store_path)?;

    if json_mode {
        let output = serde_json::json!({
            "store": store_path.to_string_lossy(),
            "alphabet": alphabet,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
    } else {
        println!(
            "Initialized new store at {:?} over {} symbols",
            store_path,
            store.alphabet().symbols().len()
        );
    }

    Ok(())
}

// =============================================================================
// INSERT COMMAND
// =============================================================================

/// Record one fact.
pub fn cmd_insert(
    store_path: &Path,
    json_mode: bool,
    word: &str,
    accept: bool,
) -> Result<(), DagError> {
    let mut store = load_store(store_path)?;
    store.insert(&Word::from(word), accept)?;
    save_store(&store, store_path)?;

    let verdict = Acceptance::from_bool(accept);
    tracing::info!("Recorded {} for {:?}", verdict, word);

    if json_mode {
        let output = serde_json::json!({
            "word": word,
            "verdict": verdict.to_string(),
            "node_count": store.node_count(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
    } else {
        println!("{}\t{}", Word::from(word), verdict);
    }

    Ok(())
}

// =============================================================================
// LOOKUP COMMAND
// =============================================================================

/// Look up each word and print its verdict.
pub fn cmd_lookup(store_path: &Path, json_mode: bool, words: &[String]) -> Result<(), DagError> {
    let store = load_store(store_path)?;
    let verdicts: Vec<(&String, Acceptance)> = words
        .iter()
        .map(|word| (word, store.lookup(&Word::from(word.as_str()))))
        .collect();

    if json_mode {
        let output: Vec<serde_json::Value> = verdicts
            .iter()
            .map(|(word, verdict)| {
                serde_json::json!({
                    "word": word,
                    "verdict": verdict.to_string(),
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    for (word, verdict) in verdicts {
        println!("{}\t{}", Word::from(word.as_str()), verdict);
    }
    Ok(())
}

// =============================================================================
// INGEST COMMAND
// =============================================================================

/// Record facts from a file.
pub fn cmd_ingest(
    store_path: &Path,
    json_mode: bool,
    file: &Path,
    format: &str,
) -> Result<(), DagError> {
    tracing::info!("Ingesting from {:?} (format: {})", file, format);

    let mut store = load_store(store_path)?;

    let validated_path = validate_file_path(file)?;
    validate_file_size(&validated_path, MAX_INGEST_FILE_SIZE)?;

    let contents = std::fs::read(&validated_path)
        .map_err(|e| DagError::IoError(format!("Read file: {}", e)))?;

    let facts = parse_facts(&contents, format)?;
    let report = apply_facts(&mut store, &facts)?;
    save_store(&store, store_path)?;

    if json_mode {
        let output = serde_json::json!({
            "applied": report.applied,
            "conflicts": report.conflicts,
            "node_count": store.node_count(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!(
        "Ingested {} facts ({} conflicts skipped)",
        report.applied, report.conflicts
    );
    println!("Store now has {} nodes", store.node_count());

    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show store status.
pub fn cmd_status(store_path: &Path, json_mode: bool) -> Result<(), DagError> {
    let store = load_store(store_path)?;
    let metrics = DagMetrics::from_dag(&store);
    let alphabet: String = store.alphabet().iter().collect();

    if json_mode {
        let output = serde_json::json!({
            "store": store_path.to_string_lossy(),
            "alphabet": alphabet,
            "metrics": metrics,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("pcdfa Store Status");
    println!("==================");
    println!("Store:    {:?}", store_path);
    println!("Alphabet: {}", alphabet);
    println!();
    println!("Nodes:            {}", metrics.node_count);
    println!("Registered:       {}", metrics.registered_count);
    println!("Accepting:        {}", metrics.accepting_count);
    println!("Confluence:       {}", metrics.confluence_count);
    println!("Max Depth:        {}", metrics.max_depth);
    println!("Has Rejections:   {}", metrics.has_sink);

    Ok(())
}

// =============================================================================
// DIFF COMMAND
// =============================================================================

/// Print the shortest word on which two stores disagree.
pub fn cmd_diff(
    store_path: &Path,
    json_mode: bool,
    other_path: &Path,
    omit_undefined: bool,
) -> Result<(), DagError> {
    let store = load_store(store_path)?;
    let other = load_store(&validate_file_path(other_path)?)?;

    if store.alphabet() != other.alphabet() {
        return Err(DagError::InvalidAlphabet(
            "stores use different alphabets".to_string(),
        ));
    }

    let separating = store.find_separating_word(&other, omit_undefined);

    if json_mode {
        let output = match &separating {
            Some(word) => serde_json::json!({
                "agree": false,
                "word": word.iter().collect::<String>(),
                "this": store.lookup(word).to_string(),
                "other": other.lookup(word).to_string(),
            }),
            None => serde_json::json!({ "agree": true }),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    match separating {
        Some(word) => {
            println!("Stores disagree on {}", word);
            println!("  this:  {}", store.lookup(&word));
            println!("  other: {}", other.lookup(&word));
        }
        None => println!("Stores agree"),
    }
    Ok(())
}

// =============================================================================
// VERIFY COMMAND
// =============================================================================

/// Re-import the store file, re-check every invariant and print its hashes.
pub fn cmd_verify(store_path: &Path, json_mode: bool) -> Result<(), DagError> {
    let data = read_store_bytes(store_path)?;
    let store: Store = import_canonical(&data)?;
    store.validate()?;

    if !verify_canonical(&store, &data)? {
        return Err(DagError::Corrupted(
            "store file does not round-trip".to_string(),
        ));
    }

    let checksum = canonical_checksum(&store)?;
    let blake3 = canonical_crypto_hash(&store)?;

    if json_mode {
        let output = serde_json::json!({
            "valid": true,
            "checksum": checksum,
            "blake3": blake3,
            "node_count": store.node_count(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Store {:?} is valid", store_path);
    println!("Checksum: {:016x}", checksum);
    println!("BLAKE3:   {}", blake3);

    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn read_store_bytes(store_path: &Path) -> Result<Vec<u8>, DagError> {
    if !store_path.exists() {
        return Err(DagError::IoError(format!(
            "No store at {:?}. Run `pcdfa init --alphabet <symbols>` first.",
            store_path
        )));
    }
    validate_file_size(store_path, MAX_IMPORT_PAYLOAD_SIZE as u64)?;
    std::fs::read(store_path).map_err(|e| DagError::IoError(format!("Read store: {}", e)))
}

/// Load a store from its canonical export.
pub fn load_store(store_path: &Path) -> Result<Store, DagError> {
    let data = read_store_bytes(store_path)?;
    let store = import_canonical(&data)?;
    tracing::debug!("Loaded store {:?} ({} nodes)", store_path, store.node_count());
    Ok(store)
}

/// Write a store as its canonical export.
pub fn save_store(store: &Store, store_path: &Path) -> Result<(), DagError> {
    let data = export_canonical(store)?;
    std::fs::write(store_path, &data)
        .map_err(|e| DagError::IoError(format!("Write store: {}", e)))?;
    tracing::debug!("Saved store {:?} ({} bytes)", store_path, data.len());
    Ok(())
}
