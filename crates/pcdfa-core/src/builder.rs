//! # Incremental DAG Builder
//!
//! The canonical store for a prefix-closed three-valued acceptor.
//!
//! `insert` walks the DAG along a word, builds or clones the nodes that
//! change, and rewrites the ancestor chain back to the root through the
//! registry, so the DAG is minimal after every call. `lookup` is a pure walk.
//!
//! ## Prefix-closedness
//!
//! Rejecting a word rejects every extension of it: the rejected node is
//! replaced by the sink, whose every successor is itself. Accepting a word
//! below a rejected prefix is therefore a conflict, and so is rejecting a
//! word that already has an accepted extension.

use crate::alphabet::{Alphabet, ListAlphabet};
use crate::registry::Registry;
use crate::signature::{Edit, Signature};
use crate::types::{Acceptance, DagError, NodeId};
use crate::word::Word;
use tracing::{debug, trace};

/// Incrementally built minimal DAG over the alphabet `A`.
///
/// `insert` takes `&mut self` and `lookup` takes `&self`; the borrow checker
/// is the only synchronization the store needs.
#[derive(Debug, Clone)]
pub struct IncrementalDag<A: Alphabet = ListAlphabet<char>> {
    alphabet: A,
    registry: Registry,
}

impl<A: Alphabet> IncrementalDag<A> {
    /// An empty store: every word is `DontKnow`.
    #[must_use]
    pub fn new(alphabet: A) -> Self {
        let registry = Registry::new(alphabet.size());
        Self { alphabet, registry }
    }

    /// Reassemble a store from an imported registry.
    pub(crate) fn from_parts(alphabet: A, registry: Registry) -> Result<Self, DagError> {
        if alphabet.size() != registry.alphabet_size() {
            return Err(DagError::Corrupted(format!(
                "alphabet has {} symbols but nodes carry {} slots",
                alphabet.size(),
                registry.alphabet_size()
            )));
        }
        let dag = Self { alphabet, registry };
        dag.validate()?;
        Ok(dag)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// The recorded verdict for `word`.
    ///
    /// Words leaving the recorded part of the DAG, including words with
    /// symbols outside the alphabet, are `DontKnow` unless a prefix has
    /// already been rejected.
    #[must_use]
    pub fn lookup(&self, word: &Word<A::Symbol>) -> Acceptance {
        let mut current = self.registry.root();
        for symbol in word {
            if self.registry.is_rejecting(current) {
                return Acceptance::False;
            }
            let Some(index) = self.alphabet.index_of(symbol) else {
                return Acceptance::DontKnow;
            };
            match self.registry.successor(current, index) {
                Some(next) => current = next,
                None => return Acceptance::DontKnow,
            }
        }
        self.registry.acceptance(current)
    }

    /// Whether `lookup(word)` is a definite verdict.
    #[must_use]
    pub fn has_definitive_information(&self, word: &Word<A::Symbol>) -> bool {
        self.lookup(word).is_definite()
    }

    // =========================================================================
    // INSERTION
    // =========================================================================

    /// Record that `word` is accepted (`true`) or rejected (`false`).
    ///
    /// Recording a fact that already holds is a no-op. On error the DAG is
    /// left exactly as it was.
    ///
    /// # Errors
    ///
    /// - [`DagError::UnknownSymbol`] if `word` uses a symbol outside the alphabet.
    /// - [`DagError::Conflict`] if the fact contradicts a recorded one.
    pub fn insert(&mut self, word: &Word<A::Symbol>, accepting: bool) -> Result<(), DagError> {
        let indices = word
            .iter()
            .map(|symbol| {
                self.alphabet
                    .index_of(symbol)
                    .ok_or_else(|| DagError::UnknownSymbol(format!("{:?}", symbol)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let before = self.registry.node_count();
        let result = self.insert_indices(&indices, accepting).map_err(|recorded| {
            let requested = Acceptance::from_bool(accepting);
            debug!(word = ?word, %recorded, %requested, "conflicting fact rejected");
            DagError::Conflict {
                word: format!("{:?}", word),
                recorded,
                requested,
            }
        });

        if result.is_ok() {
            let collected = self.registry.collect_garbage();
            trace!(
                len = indices.len(),
                accepting,
                before,
                after = self.registry.node_count(),
                collected,
                "insert applied"
            );
        }
        result
    }

    /// Insert on symbol indices. `Err` carries the recorded verdict that
    /// contradicts the request; every such check runs before the first
    /// mutation.
    fn insert_indices(&mut self, indices: &[usize], accepting: bool) -> Result<(), Acceptance> {
        let requested = Acceptance::from_bool(accepting);
        let root = self.registry.root();

        // Ancestors of `current`, each with the slot taken out of it.
        let mut path: Vec<(NodeId, usize)> = Vec::with_capacity(indices.len());
        let mut current = root;
        let mut depth = 0;

        while let Some(&index) = indices.get(depth) {
            if self.registry.is_rejecting(current) {
                return if accepting {
                    Err(Acceptance::False)
                } else {
                    Ok(())
                };
            }
            let Some(next) = self.registry.successor(current, index) else {
                break;
            };
            path.push((current, index));
            current = next;
            depth += 1;
        }

        let last = current;
        let Some(&index) = indices.get(depth) else {
            return self.apply_exact(path, last, requested);
        };

        // Divergence: `last` gains the slot `index`.
        let suffix = self.create_suffix(&indices[depth + 1..], accepting);
        self.replace_child(path, last, Edit::Successor(index, suffix));
        Ok(())
    }

    /// The word ends on an existing node `last`.
    fn apply_exact(
        &mut self,
        path: Vec<(NodeId, usize)>,
        last: NodeId,
        requested: Acceptance,
    ) -> Result<(), Acceptance> {
        let recorded = self.registry.acceptance(last);
        if recorded == requested {
            return Ok(());
        }
        if recorded.is_definite() {
            return Err(recorded);
        }

        if requested == Acceptance::True {
            self.replace_child(path, last, Edit::Accept);
            return Ok(());
        }

        // Rejection turns `last` into the sink, taking its extensions with it.
        if self.registry.reaches_accepting(last) {
            return Err(Acceptance::True);
        }
        if path.is_empty() {
            let purged = self.registry.reject_root();
            debug!(purged, "rejected empty word, root saturated");
        } else {
            let sink = self.registry.sink_node();
            self.rewrite(path, sink);
            debug!(node = %last, "rejected word replaced by sink");
        }
        Ok(())
    }

    /// Apply `edit` to `node`, the end of `path`, and rewrite the path above.
    fn replace_child(&mut self, path: Vec<(NodeId, usize)>, node: NodeId, edit: Edit) {
        if path.is_empty() {
            self.registry.update_root(edit);
        } else {
            let updated = self.registry.clone_node(node, edit);
            self.rewrite(path, updated);
        }
    }

    /// The canonical chain for the remaining `indices`, built right to left.
    fn create_suffix(&mut self, indices: &[usize], accepting: bool) -> NodeId {
        let size = self.registry.alphabet_size();
        let mut node = if accepting {
            self.registry
                .replace_or_register(Signature::new(size, Acceptance::True))
        } else {
            self.registry.sink_node()
        };
        for &index in indices.iter().rev() {
            let signature = Signature::new(size, Acceptance::DontKnow).with_successor(index, node);
            node = self.registry.replace_or_register(signature);
        }
        node
    }

    /// Propagate a replaced child up the path to the root.
    ///
    /// Registered nodes are never edited: every ancestor is re-canonicalized
    /// with its new child and only the root changes in place. The originals
    /// are swept by `collect_garbage` once nothing points at them.
    fn rewrite(&mut self, mut path: Vec<(NodeId, usize)>, mut updated: NodeId) {
        let root = self.registry.root();
        while let Some((state, index)) = path.pop() {
            let edit = Edit::Successor(index, updated);
            if state == root {
                self.registry.update_root(edit);
                return;
            }
            updated = self.registry.clone_node(state, edit);
        }
    }

    // =========================================================================
    // INSPECTION
    // =========================================================================

    /// The alphabet the store was built over.
    #[must_use]
    pub fn alphabet(&self) -> &A {
        &self.alphabet
    }

    /// The underlying node registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The node of the empty word.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.registry.root()
    }

    /// The reject sink, once some word has been rejected.
    #[must_use]
    pub fn sink(&self) -> Option<NodeId> {
        self.registry.sink()
    }

    /// Acceptance of `node`, `None` if it is not live.
    #[must_use]
    pub fn acceptance(&self, node: NodeId) -> Option<Acceptance> {
        self.registry.get(node).map(Signature::acceptance)
    }

    /// Successor of `node` for a symbol index.
    #[must_use]
    pub fn successor(&self, node: NodeId, index: usize) -> Option<NodeId> {
        self.registry
            .get(node)
            .and_then(|signature| signature.successor(index))
    }

    /// Successor of `node` for a symbol.
    #[must_use]
    pub fn successor_for(&self, node: NodeId, symbol: &A::Symbol) -> Option<NodeId> {
        self.alphabet
            .index_of(symbol)
            .and_then(|index| self.successor(node, index))
    }

    /// Whether `node` is live and shared by more than one slot.
    #[must_use]
    pub fn is_confluence(&self, node: NodeId) -> bool {
        self.registry.is_live(node) && self.registry.is_confluence(node)
    }

    /// Number of live nodes, root and sink included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.registry.node_count()
    }

    /// Live nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Signature)> {
        self.registry.nodes()
    }

    /// Re-check every structural invariant.
    pub fn validate(&self) -> Result<(), DagError> {
        self.registry.validate()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> IncrementalDag {
        IncrementalDag::new(ListAlphabet::from_chars("abc").expect("alphabet"))
    }

    fn w(s: &str) -> Word<char> {
        Word::from(s)
    }

    #[test]
    fn empty_store_knows_nothing() {
        let dag = abc();
        assert_eq!(dag.lookup(&w("")), Acceptance::DontKnow);
        assert_eq!(dag.lookup(&w("abc")), Acceptance::DontKnow);
        assert_eq!(dag.node_count(), 1);
        assert!(dag.validate().is_ok());
    }

    #[test]
    fn scenario_over_abc() {
        let mut dag = abc();
        assert_eq!(dag.lookup(&w("abc")), Acceptance::DontKnow);

        dag.insert(&w("abc"), true).expect("insert abc");
        assert_eq!(dag.lookup(&w("abc")), Acceptance::True);
        assert_eq!(dag.lookup(&w("ac")), Acceptance::DontKnow);

        dag.insert(&w("ac"), false).expect("reject ac");
        assert_eq!(dag.lookup(&w("ac")), Acceptance::False);
        assert_eq!(dag.lookup(&w("abc")), Acceptance::True);
        assert_eq!(dag.lookup(&w("acb")), Acceptance::False);

        let snapshot = dag.clone();
        let err = dag.insert(&w("acb"), true).expect_err("conflict");
        assert!(err.is_conflict());
        assert_eq!(dag.node_count(), snapshot.node_count());
        assert_eq!(
            dag.nodes().collect::<Vec<_>>(),
            snapshot.nodes().collect::<Vec<_>>()
        );

        dag.insert(&w(""), true).expect("accept epsilon");
        assert_eq!(dag.lookup(&w("")), Acceptance::True);
        assert_eq!(dag.lookup(&w("abc")), Acceptance::True);
        assert_eq!(dag.lookup(&w("ac")), Acceptance::False);
        assert!(dag.validate().is_ok());
    }

    #[test]
    fn shared_suffixes_are_merged() {
        let mut dag = abc();
        dag.insert(&w("ab"), true).expect("ab");
        dag.insert(&w("cb"), true).expect("cb");
        // root, the shared "b" node and the accepting leaf
        assert_eq!(dag.node_count(), 3);
        let a = dag.successor_for(dag.root(), &'a').expect("a");
        let c = dag.successor_for(dag.root(), &'c').expect("c");
        assert_eq!(a, c);
        assert!(dag.is_confluence(a));
        assert!(dag.validate().is_ok());
    }

    #[test]
    fn insert_below_confluence_clones() {
        let mut dag = abc();
        dag.insert(&w("ab"), true).expect("ab");
        dag.insert(&w("cb"), true).expect("cb");
        dag.insert(&w("aba"), true).expect("aba");

        assert_eq!(dag.lookup(&w("aba")), Acceptance::True);
        assert_eq!(dag.lookup(&w("cba")), Acceptance::DontKnow);
        assert_eq!(dag.lookup(&w("cb")), Acceptance::True);
        assert!(dag.validate().is_ok());
    }

    #[test]
    fn converging_insert_merges_back() {
        let mut dag = abc();
        dag.insert(&w("ab"), true).expect("ab");
        dag.insert(&w("cb"), true).expect("cb");
        dag.insert(&w("aba"), true).expect("aba");
        dag.insert(&w("cba"), true).expect("cba");
        // both branches are equivalent again
        let a = dag.successor_for(dag.root(), &'a');
        let c = dag.successor_for(dag.root(), &'c');
        assert_eq!(a, c);
        assert!(dag.validate().is_ok());
    }

    #[test]
    fn repeated_insert_is_noop() {
        let mut dag = abc();
        dag.insert(&w("ab"), true).expect("ab");
        dag.insert(&w("b"), false).expect("b");
        let snapshot = dag.clone();
        dag.insert(&w("ab"), true).expect("ab again");
        dag.insert(&w("b"), false).expect("b again");
        dag.insert(&w("bcc"), false).expect("below rejected prefix");
        assert_eq!(
            dag.nodes().collect::<Vec<_>>(),
            snapshot.nodes().collect::<Vec<_>>()
        );
    }

    #[test]
    fn rejecting_prefix_of_accepted_word_conflicts() {
        let mut dag = abc();
        dag.insert(&w("abc"), true).expect("abc");
        let err = dag.insert(&w("ab"), false).expect_err("conflict");
        assert_eq!(
            err,
            DagError::Conflict {
                word: "['a', 'b']".to_string(),
                recorded: Acceptance::True,
                requested: Acceptance::False,
            }
        );
        assert_eq!(dag.lookup(&w("ab")), Acceptance::DontKnow);
        assert!(dag.validate().is_ok());
    }

    #[test]
    fn rejecting_extension_of_accepted_word_is_allowed() {
        let mut dag = abc();
        dag.insert(&w("a"), true).expect("a");
        dag.insert(&w("ab"), false).expect("ab");
        assert_eq!(dag.lookup(&w("a")), Acceptance::True);
        assert_eq!(dag.lookup(&w("abab")), Acceptance::False);
    }

    #[test]
    fn rejecting_epsilon_rejects_everything() {
        let mut dag = abc();
        dag.insert(&w("b"), false).expect("b");
        dag.insert(&w(""), false).expect("epsilon");
        assert_eq!(dag.lookup(&w("")), Acceptance::False);
        assert_eq!(dag.lookup(&w("cab")), Acceptance::False);
        assert!(dag.insert(&w("a"), true).is_err());
        // only root and sink remain
        assert_eq!(dag.node_count(), 2);
        assert!(dag.validate().is_ok());
    }

    #[test]
    fn reject_purges_unshared_subtree() {
        let mut dag = abc();
        dag.insert(&w("abc"), false).expect("abc");
        dag.insert(&w("aac"), false).expect("aac");
        let before = dag.node_count();
        dag.insert(&w("a"), false).expect("a");
        assert!(dag.node_count() < before);
        assert_eq!(dag.lookup(&w("aac")), Acceptance::False);
        assert!(dag.validate().is_ok());
    }

    #[test]
    fn unknown_symbol_is_dont_know_on_lookup_and_error_on_insert() {
        let mut dag = abc();
        assert_eq!(dag.lookup(&w("ax")), Acceptance::DontKnow);
        let err = dag.insert(&w("ax"), true).expect_err("unknown symbol");
        assert!(matches!(err, DagError::UnknownSymbol(_)));
    }

    fn ab() -> IncrementalDag {
        IncrementalDag::new(ListAlphabet::from_chars("ab").expect("alphabet"))
    }

    #[test]
    fn suffix_reusing_a_path_node_stays_acyclic() {
        let mut dag = ab();
        dag.insert(&w("a"), true).expect("a");
        dag.insert(&w("bba"), true).expect("bba");
        // the suffix for the last "a" is the chain node already walked after "bb"
        dag.insert(&w("bbaaa"), true).expect("bbaaa");

        assert!(dag.validate().is_ok(), "{:?}", dag.validate());
        assert_eq!(dag.lookup(&w("a")), Acceptance::True);
        assert_eq!(dag.lookup(&w("bba")), Acceptance::True);
        assert_eq!(dag.lookup(&w("bbaaa")), Acceptance::True);
        assert_eq!(dag.lookup(&w("bbaa")), Acceptance::DontKnow);
        assert_eq!(dag.lookup(&w("bbaaaaa")), Acceptance::DontKnow);
        assert_eq!(dag.lookup(&w("bbaaaaaaa")), Acceptance::DontKnow);
    }

    #[test]
    fn accepting_edit_merging_into_a_path_node_stays_acyclic() {
        let mut dag = ab();
        for word in ["bbaa", "bba", "a", "bbaaa"] {
            dag.insert(&w(word), true).expect(word);
            assert!(dag.validate().is_ok(), "after {word}: {:?}", dag.validate());
        }

        for word in ["a", "bba", "bbaa", "bbaaa"] {
            assert_eq!(dag.lookup(&w(word)), Acceptance::True, "{word}");
        }
        assert_eq!(dag.lookup(&w("bbaaaa")), Acceptance::DontKnow);
        assert_eq!(dag.lookup(&w("aa")), Acceptance::DontKnow);
        assert!(crate::export::export_canonical(&dag).is_ok());
    }

    #[test]
    fn replaced_ancestors_are_collected() {
        let mut dag = ab();
        dag.insert(&w("aaa"), true).expect("aaa");
        dag.insert(&w("aa"), true).expect("aa");
        dag.insert(&w("a"), true).expect("a");
        // root plus one node per accepted depth
        assert_eq!(dag.node_count(), 4);
        assert!(dag.validate().is_ok());
    }

    #[test]
    fn dead_ids_are_not_inspectable() {
        let dag = abc();
        assert_eq!(dag.acceptance(NodeId(99)), None);
        assert_eq!(dag.successor(NodeId(99), 0), None);
        assert!(!dag.is_confluence(NodeId(99)));
    }
}
