//! # pcdfa-core
//!
//! The incremental prefix-closed DFA store - THE LOGIC.
//!
//! This crate keeps a minimal, shared, prefix-closed deterministic acceptor
//! as a canonical DAG. It records accept/reject facts one word at a time and
//! answers three-valued membership queries: accept, reject, or not yet known.
//!
//! ## Architectural Constraints
//!
//! - Canonical after every call: nodes with equal signatures are unified
//! - Prefix-closed: rejecting a word rejects all of its extensions
//! - Atomic: a failed insert leaves the DAG exactly as it was
//! - Has NO async, NO file I/O, NO HashMap (pure, deterministic Rust)
//!
//! ## Example
//!
//! ```
//! use pcdfa_core::{Acceptance, IncrementalDag, ListAlphabet, Word};
//!
//! let alphabet = ListAlphabet::from_chars("abc")?;
//! let mut dag = IncrementalDag::new(alphabet);
//!
//! dag.insert(&Word::from("abc"), true)?;
//! dag.insert(&Word::from("ac"), false)?;
//!
//! assert_eq!(dag.lookup(&Word::from("abc")), Acceptance::True);
//! assert_eq!(dag.lookup(&Word::from("acb")), Acceptance::False);
//! assert_eq!(dag.lookup(&Word::from("ab")), Acceptance::DontKnow);
//! assert!(dag.insert(&Word::from("acb"), true).is_err());
//! # Ok::<(), pcdfa_core::DagError>(())
//! ```

// =============================================================================
// MODULES
// =============================================================================

pub mod acceptor;
pub mod alphabet;
pub mod builder;
pub mod export;
pub mod primitives;
pub mod registry;
pub mod signature;
pub mod system;
pub mod types;
pub mod word;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Acceptance, DagError, NodeId};

// =============================================================================
// RE-EXPORTS: Store
// =============================================================================

pub use acceptor::Acceptor;
pub use alphabet::{Alphabet, ListAlphabet, Symbol};
pub use builder::IncrementalDag;
pub use registry::Registry;
pub use signature::Signature;
pub use word::Word;

// =============================================================================
// RE-EXPORTS: Canonical Export
// =============================================================================

pub use export::{
    CanonicalDag, CanonicalHeader, CanonicalNode, CanonicalTarget, canonical_checksum,
    export_canonical, import_canonical, verify_canonical,
};

#[cfg(feature = "crypto-hash")]
pub use export::canonical_crypto_hash;

// =============================================================================
// RE-EXPORTS: System (from system module)
// =============================================================================

pub use system::DagMetrics;
