//! # Core Type Definitions
//!
//! This module contains the small value types shared by every part of the
//! store:
//! - Node identifiers (`NodeId`)
//! - The three-valued verdict (`Acceptance`)
//! - Error types (`DagError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// NODE IDENTIFIER
// =============================================================================

/// Identifier of a node in the DAG arena.
///
/// Ids are slot indices. A slot freed by a purge may be handed out again by a
/// later insert, so an id is only meaningful while its node is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The arena slot this id addresses.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

// =============================================================================
// ACCEPTANCE
// =============================================================================

/// Three-valued verdict for a word.
///
/// `True` and `False` are recorded facts. `DontKnow` means nothing has been
/// recorded for the exact word and no rejected prefix decides it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Acceptance {
    /// No fact recorded.
    #[default]
    DontKnow,
    /// Definitely rejected.
    False,
    /// Definitely accepted.
    True,
}

impl Acceptance {
    /// Map a boolean verdict onto the definite values.
    #[must_use]
    pub const fn from_bool(accepting: bool) -> Self {
        if accepting { Self::True } else { Self::False }
    }

    /// `Some(bool)` for definite verdicts, `None` for `DontKnow`.
    #[must_use]
    pub const fn to_bool(self) -> Option<bool> {
        match self {
            Self::True => Some(true),
            Self::False => Some(false),
            Self::DontKnow => None,
        }
    }

    /// Whether this is a recorded fact.
    #[must_use]
    pub const fn is_definite(self) -> bool {
        !matches!(self, Self::DontKnow)
    }
}

impl fmt::Display for Acceptance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::True => "accept",
            Self::False => "reject",
            Self::DontKnow => "unknown",
        };
        f.write_str(s)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the store.
///
/// - No silent failures
/// - Use `Result<T, DagError>` for fallible operations
/// - A failed insert leaves the DAG exactly as it was
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DagError {
    /// The requested verdict contradicts a recorded fact.
    #[error("Conflict on word {word}: recorded {recorded}, requested {requested}")]
    Conflict {
        /// The word being inserted, rendered with `Debug` symbols.
        word: String,
        /// The verdict already implied by the DAG.
        recorded: Acceptance,
        /// The verdict the caller tried to record.
        requested: Acceptance,
    },

    /// A word contained a symbol that is not part of the alphabet.
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    /// The alphabet is empty, has duplicates or is too large.
    #[error("Invalid alphabet: {0}")]
    InvalidAlphabet(String),

    /// A structural invariant check failed.
    #[error("Corrupted DAG: {0}")]
    Corrupted(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl DagError {
    /// Whether this is a verdict conflict (as opposed to bad input or I/O).
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

// =============================================================================
// TESTS
// =============================================================================
