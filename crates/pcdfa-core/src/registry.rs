//! # Node Registry
//!
//! Arena of nodes plus the hash-consing register (signature → canonical
//! node). Every successor slot of a live node counts towards its target's
//! in-degree; a node with in-degree above one is a confluence node.
//!
//! A registered node never changes its signature. Edits produce the
//! canonical node for the edited signature instead, so successors always
//! predate their predecessors and the graph stays acyclic. Only the root,
//! which is never registered, is edited in place.
//!
//! ## Invariants (between calls)
//!
//! - Every live node other than the root is registered under its own
//!   signature, so no two live non-root nodes share a signature.
//! - `incoming` equals the number of live successor slots pointing at the
//!   node. The sink is exempt from counting.
//! - Every live node other than the sink is reachable from the root.
//!
//! An insert temporarily breaks the last one (a replaced node lingers until
//! swept); `collect_garbage` restores it at the end of each insert.

use crate::signature::{Edit, Signature};
use crate::types::{Acceptance, DagError, NodeId};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
struct Slot {
    signature: Signature,
    incoming: u32,
}

/// Node arena with a canonical signature register.
#[derive(Debug, Clone)]
pub struct Registry {
    alphabet_size: usize,
    slots: Vec<Option<Slot>>,
    free: Vec<NodeId>,
    live: usize,
    register: BTreeMap<Signature, NodeId>,
    root: NodeId,
    sink: Option<NodeId>,
    /// Nodes whose in-degree dropped to zero since the last sweep.
    pending: Vec<NodeId>,
}

impl Registry {
    /// A registry holding only the root (`DontKnow`, no successors).
    #[must_use]
    pub fn new(alphabet_size: usize) -> Self {
        let root = Slot {
            signature: Signature::new(alphabet_size, Acceptance::DontKnow),
            incoming: 0,
        };
        Self {
            alphabet_size,
            slots: vec![Some(root)],
            free: Vec::new(),
            live: 1,
            register: BTreeMap::new(),
            root: NodeId(0),
            sink: None,
            pending: Vec::new(),
        }
    }

    // =========================================================================
    // READ ACCESS
    // =========================================================================

    /// Number of successor slots per node.
    #[must_use]
    pub fn alphabet_size(&self) -> usize {
        self.alphabet_size
    }

    /// The root node (the empty word).
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The reject sink, if one has been created.
    #[must_use]
    pub fn sink(&self) -> Option<NodeId> {
        self.sink
    }

    /// Whether `id` is the sink.
    #[must_use]
    pub fn is_sink(&self, id: NodeId) -> bool {
        self.sink == Some(id)
    }

    /// Whether `id` addresses a live node.
    #[must_use]
    pub fn is_live(&self, id: NodeId) -> bool {
        matches!(self.slots.get(id.index()), Some(Some(_)))
    }

    /// The signature of a live node, `None` for dead or unknown ids.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Signature> {
        self.slots
            .get(id.index())
            .and_then(Option::as_ref)
            .map(|slot| &slot.signature)
    }

    /// The signature of a live node.
    #[must_use]
    pub(crate) fn signature(&self, id: NodeId) -> &Signature {
        &self.slot(id).signature
    }

    /// Acceptance of a live node.
    #[must_use]
    pub(crate) fn acceptance(&self, id: NodeId) -> Acceptance {
        self.slot(id).signature.acceptance()
    }

    /// Successor of a live node for a symbol index.
    #[must_use]
    pub(crate) fn successor(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.slot(id).signature.successor(index)
    }

    /// Number of successor slots pointing at `id`.
    #[must_use]
    pub(crate) fn incoming(&self, id: NodeId) -> u32 {
        self.slot(id).incoming
    }

    /// Whether more than one slot points at `id`.
    #[must_use]
    pub(crate) fn is_confluence(&self, id: NodeId) -> bool {
        !self.is_sink(id) && self.incoming(id) > 1
    }

    /// Whether `id` rejects itself and, by prefix-closedness, every extension.
    #[must_use]
    pub(crate) fn is_rejecting(&self, id: NodeId) -> bool {
        self.is_sink(id) || self.acceptance(id) == Acceptance::False
    }

    /// Number of live nodes, root and sink included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.live
    }

    /// Number of register entries.
    #[must_use]
    pub fn registered_count(&self) -> usize {
        self.register.len()
    }

    /// Live nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Signature)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.as_ref()
                .map(|slot| (NodeId(i as u32), &slot.signature))
        })
    }

    /// Whether an accepting node is reachable from `start` (inclusive).
    #[must_use]
    pub(crate) fn reaches_accepting(&self, start: NodeId) -> bool {
        let mut seen = BTreeSet::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if self.is_sink(id) || !seen.insert(id) {
                continue;
            }
            let signature = self.signature(id);
            if signature.acceptance() == Acceptance::True {
                return true;
            }
            stack.extend(signature.targets());
        }
        false
    }

    /// Nodes reachable from the root, successors before predecessors, root
    /// last. The sink is left out.
    ///
    /// Fails if a cycle other than the sink's self-loops is found.
    pub fn topological_order(&self) -> Result<Vec<NodeId>, DagError> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Open,
            Done,
        }

        let mut marks = BTreeMap::new();
        let mut order = Vec::new();
        let mut stack = vec![(self.root, 0usize)];
        marks.insert(self.root, Mark::Open);

        while let Some(frame) = stack.last_mut() {
            let (id, next) = *frame;
            if next < self.alphabet_size {
                frame.1 += 1;
                let Some(target) = self.successor(id, next) else {
                    continue;
                };
                if self.is_sink(target) {
                    continue;
                }
                match marks.get(&target) {
                    Some(Mark::Open) => {
                        return Err(DagError::Corrupted(format!(
                            "cycle through {} -> {}",
                            id, target
                        )));
                    }
                    Some(Mark::Done) => {}
                    None => {
                        marks.insert(target, Mark::Open);
                        stack.push((target, 0));
                    }
                }
            } else {
                marks.insert(id, Mark::Done);
                order.push(id);
                stack.pop();
            }
        }

        Ok(order)
    }

    /// Re-check every structural invariant.
    ///
    /// Intended for tests, imports and debugging; cost is linear in the
    /// size of the DAG.
    pub fn validate(&self) -> Result<(), DagError> {
        let corrupted = |msg: String| Err(DagError::Corrupted(msg));

        if !self.pending.is_empty() {
            return corrupted(format!("{} nodes awaiting collection", self.pending.len()));
        }
        if !self.is_live(self.root) {
            return corrupted("root is not live".to_string());
        }

        let mut counts: BTreeMap<NodeId, u32> = BTreeMap::new();
        let mut live = 0usize;
        for (id, signature) in self.nodes() {
            live += 1;
            if signature.successors().len() != self.alphabet_size {
                return corrupted(format!("{} has a malformed successor array", id));
            }
            for target in signature.targets() {
                if !self.is_live(target) {
                    return corrupted(format!("{} points at dead node {}", id, target));
                }
                if !self.is_sink(target) {
                    *counts.entry(target).or_default() += 1;
                }
            }
        }
        if live != self.live {
            return corrupted(format!("live count {} but {} live slots", self.live, live));
        }

        for (id, signature) in self.nodes() {
            if self.is_sink(id) {
                let expected =
                    Signature::saturated(self.alphabet_size, Acceptance::False, id);
                if *signature != expected {
                    return corrupted(format!("sink {} has been modified", id));
                }
            } else {
                if signature.acceptance() == Acceptance::False
                    && (id != self.root
                        || signature.successors().iter().any(|s| s.is_none() || *s != self.sink))
                {
                    return corrupted(format!("rejecting node {} does not lead to the sink", id));
                }
                let expected = counts.get(&id).copied().unwrap_or(0);
                let recorded = self.incoming(id);
                if recorded != expected {
                    return corrupted(format!(
                        "{} records in-degree {} but has {}",
                        id, recorded, expected
                    ));
                }
            }
            if id != self.root && self.register.get(signature) != Some(&id) {
                return corrupted(format!("{} is not the canonical node for its signature", id));
            }
        }

        for (signature, &id) in &self.register {
            if id == self.root || self.get(id) != Some(signature) {
                return corrupted(format!("stale register entry for {}", id));
            }
        }
        if self.register.len() != self.live - 1 {
            return corrupted(format!(
                "{} register entries for {} non-root nodes",
                self.register.len(),
                self.live - 1
            ));
        }

        let reachable = self.topological_order()?.len() + usize::from(self.sink.is_some());
        if reachable != self.live {
            return corrupted(format!(
                "{} live nodes but only {} reachable",
                self.live, reachable
            ));
        }

        Ok(())
    }

    // =========================================================================
    // CANONICAL NODE CREATION
    // =========================================================================

    /// The reject sink, created on first use.
    pub(crate) fn sink_node(&mut self) -> NodeId {
        if let Some(sink) = self.sink {
            return sink;
        }
        let id = self.alloc(Signature::new(self.alphabet_size, Acceptance::False));
        self.sink = Some(id);
        let signature = Signature::saturated(self.alphabet_size, Acceptance::False, id);
        self.slot_mut(id).signature = signature.clone();
        self.register.insert(signature, id);
        id
    }

    /// The canonical node for `signature`, allocating one if none exists.
    pub(crate) fn replace_or_register(&mut self, signature: Signature) -> NodeId {
        if let Some(&id) = self.register.get(&signature) {
            return id;
        }
        let id = self.alloc(signature.clone());
        self.register.insert(signature, id);
        id
    }

    /// Register a node built from an import. `None` if the signature is
    /// already taken.
    pub(crate) fn register_new(&mut self, signature: Signature) -> Option<NodeId> {
        if self.register.contains_key(&signature) {
            return None;
        }
        Some(self.replace_or_register(signature))
    }

    /// The canonical node for `id`'s signature with `edit` applied.
    /// `id` itself is left untouched.
    pub(crate) fn clone_node(&mut self, id: NodeId, edit: Edit) -> NodeId {
        let signature = self.signature(id).edited(edit);
        self.replace_or_register(signature)
    }

    // =========================================================================
    // ROOT UPDATES
    // =========================================================================

    /// Edit the root in place. The root is never registered.
    pub(crate) fn update_root(&mut self, edit: Edit) {
        let signature = self.signature(self.root).edited(edit);
        self.set_root_signature(signature);
    }

    /// Replace the root signature wholesale.
    pub(crate) fn set_root_signature(&mut self, signature: Signature) {
        self.retarget(self.root, signature);
    }

    /// Reject the empty word: the root becomes rejecting with every slot on
    /// the sink, and its former subtree is purged.
    pub(crate) fn reject_root(&mut self) -> usize {
        let sink = self.sink_node();
        let former: Vec<NodeId> = self.signature(self.root).targets().collect();
        self.set_root_signature(Signature::saturated(
            self.alphabet_size,
            Acceptance::False,
            sink,
        ));
        former.into_iter().map(|id| self.purge(id)).sum()
    }

    // =========================================================================
    // REMOVAL
    // =========================================================================

    /// Remove `id` and everything reachable only through it.
    ///
    /// Nodes still referenced from elsewhere are kept. Returns the number of
    /// nodes removed.
    ///
    /// # Panics
    ///
    /// Panics if an accepting node would be removed: callers only purge
    /// subtrees they have checked to hold no accepted word.
    pub(crate) fn purge(&mut self, id: NodeId) -> usize {
        self.sweep(id, true)
    }

    /// Sweep every node orphaned since the last call. Returns the number of
    /// nodes removed.
    pub(crate) fn collect_garbage(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending);
        pending.into_iter().map(|id| self.sweep(id, false)).sum()
    }

    fn sweep(&mut self, start: NodeId, purging: bool) -> usize {
        let mut removed = 0;
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if id == self.root || self.is_sink(id) || !self.is_live(id) || self.incoming(id) > 0
            {
                continue;
            }
            if purging {
                assert!(
                    self.acceptance(id) != Acceptance::True,
                    "attempting to purge accepting node {id}"
                );
            }
            self.unregister(id);
            let Some(slot) = self.slots[id.index()].take() else {
                continue;
            };
            self.free.push(id);
            self.live -= 1;
            removed += 1;
            for target in slot.signature.targets() {
                if self.is_sink(target) {
                    continue;
                }
                let target_slot = self.slot_mut(target);
                target_slot.incoming = target_slot.incoming.saturating_sub(1);
                stack.push(target);
            }
        }
        removed
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn slot(&self, id: NodeId) -> &Slot {
        match self.slots.get(id.index()) {
            Some(Some(slot)) => slot,
            _ => unreachable!("access to dead node {id}"),
        }
    }

    fn slot_mut(&mut self, id: NodeId) -> &mut Slot {
        match self.slots.get_mut(id.index()) {
            Some(Some(slot)) => slot,
            _ => unreachable!("access to dead node {id}"),
        }
    }

    fn alloc(&mut self, signature: Signature) -> NodeId {
        for target in signature.targets() {
            self.link(target);
        }
        let slot = Slot {
            signature,
            incoming: 0,
        };
        self.live += 1;
        if let Some(id) = self.free.pop() {
            self.slots[id.index()] = Some(slot);
            id
        } else {
            let id = NodeId(self.slots.len() as u32);
            self.slots.push(Some(slot));
            id
        }
    }

    fn link(&mut self, id: NodeId) {
        if !self.is_sink(id) {
            self.slot_mut(id).incoming += 1;
        }
    }

    fn unlink(&mut self, id: NodeId) {
        if self.is_sink(id) {
            return;
        }
        let slot = self.slot_mut(id);
        debug_assert!(slot.incoming > 0, "unlink of unreferenced node {id}");
        slot.incoming = slot.incoming.saturating_sub(1);
        if slot.incoming == 0 {
            self.pending.push(id);
        }
    }

    fn unregister(&mut self, id: NodeId) {
        let Some(Some(slot)) = self.slots.get(id.index()) else {
            return;
        };
        if self.register.get(&slot.signature) == Some(&id) {
            self.register.remove(&slot.signature);
        }
    }

    /// Swap in a new signature, moving in-degree from old targets to new.
    fn retarget(&mut self, id: NodeId, signature: Signature) {
        for target in signature.targets() {
            self.link(target);
        }
        let previous = std::mem::replace(&mut self.slot_mut(id).signature, signature);
        for target in previous.targets() {
            self.unlink(target);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
