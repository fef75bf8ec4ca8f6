//! # Innate Primitives
//!
//! Hardcoded runtime constants for the pcdfa store.
//!
//! The store starts with zero facts but fixed limits.
//! These primitives are compiled into the binary and are immutable at runtime.

/// Magic bytes for the canonical export header.
pub const MAGIC_BYTES: &[u8; 4] = b"PCDX";

/// Current canonical export format version.
///
/// Increment this when making breaking changes to the serialization format.
pub const FORMAT_VERSION: u8 = 1;

/// Maximum number of symbols in an alphabet.
///
/// Every node carries one successor slot per symbol, so the alphabet size
/// multiplies the memory cost of the whole DAG.
pub const MAX_ALPHABET_SIZE: usize = 4096;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum number of nodes accepted from a canonical import.
///
/// This prevents memory exhaustion from malicious or corrupted data.
pub const MAX_IMPORT_NODE_COUNT: u64 = 1_000_000;

/// Maximum allowed size of a canonical import, in bytes (500 MB).
///
/// Validated BEFORE attempting deserialization.
pub const MAX_IMPORT_PAYLOAD_SIZE: usize = 500 * 1024 * 1024;

/// Maximum number of facts in a single ingestion batch.
///
/// Batches longer than this are rejected by the app layer.
pub const MAX_BATCH_LENGTH: usize = 100_000;
