//! # Node Signatures
//!
//! A signature is the value identity of a node: its acceptance plus one
//! successor slot per alphabet symbol. Two nodes with equal signatures
//! accept the same futures, so the registry keeps at most one node per
//! signature.

use crate::types::{Acceptance, NodeId};

/// Acceptance plus the full successor array of a node.
///
/// Ordered (not hashed) so the registry can stay a `BTreeMap`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Signature {
    acceptance: Acceptance,
    successors: Box<[Option<NodeId>]>,
}

/// A single-field change applied to a signature.
///
/// Every mutation the insert algorithm performs on a non-sink node is one of
/// these; the registry turns an edit into a canonical node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Edit {
    /// Mark the node as accepting.
    Accept,
    /// Point the slot for a symbol index at another node.
    Successor(usize, NodeId),
}

impl Signature {
    /// A signature with the given acceptance and every successor undefined.
    #[must_use]
    pub fn new(alphabet_size: usize, acceptance: Acceptance) -> Self {
        Self {
            acceptance,
            successors: vec![None; alphabet_size].into_boxed_slice(),
        }
    }

    /// A signature whose every slot points at `target`.
    pub(crate) fn saturated(alphabet_size: usize, acceptance: Acceptance, target: NodeId) -> Self {
        Self {
            acceptance,
            successors: vec![Some(target); alphabet_size].into_boxed_slice(),
        }
    }

    /// The acceptance stored in this signature.
    #[must_use]
    pub fn acceptance(&self) -> Acceptance {
        self.acceptance
    }

    /// The successor for a symbol index; `None` if undefined or out of range.
    #[must_use]
    pub fn successor(&self, index: usize) -> Option<NodeId> {
        self.successors.get(index).copied().flatten()
    }

    /// All successor slots in symbol-index order.
    #[must_use]
    pub fn successors(&self) -> &[Option<NodeId>] {
        &self.successors
    }

    /// Defined successors, one entry per slot (a node reachable through two
    /// symbols appears twice).
    pub fn targets(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.successors.iter().flatten().copied()
    }

    /// A copy of this signature with the slot at `index` set to `target`.
    #[must_use]
    pub fn with_successor(&self, index: usize, target: NodeId) -> Self {
        let mut sig = self.clone();
        if let Some(slot) = sig.successors.get_mut(index) {
            *slot = Some(target);
        }
        sig
    }

    /// A copy of this signature with `edit` applied.
    pub(crate) fn edited(&self, edit: Edit) -> Self {
        match edit {
            Edit::Accept => Self {
                acceptance: Acceptance::True,
                successors: self.successors.clone(),
            },
            Edit::Successor(index, target) => self.with_successor(index, target),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
