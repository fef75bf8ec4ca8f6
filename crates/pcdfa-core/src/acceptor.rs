//! # Acceptors and Separating Words
//!
//! A minimal view of a deterministic, possibly partial acceptor, and a
//! breadth-first search for the shortest word on which the store disagrees
//! with one.

use crate::alphabet::Alphabet;
use crate::builder::IncrementalDag;
use crate::types::{Acceptance, NodeId};
use crate::word::Word;
use std::collections::{BTreeMap, VecDeque};

/// A deterministic acceptor over symbols `I`.
///
/// A missing transition leads to an implicit rejecting state.
pub trait Acceptor<I> {
    /// State handle.
    type State: Copy + Ord;

    /// The state reached by the empty word.
    fn initial(&self) -> Self::State;

    /// The state reached from `state` by `symbol`, if defined.
    fn successor(&self, state: Self::State, symbol: &I) -> Option<Self::State>;

    /// Whether `state` accepts.
    fn is_accepting(&self, state: Self::State) -> bool;
}

/// The store as a plain acceptor: `DontKnow` counts as rejecting.
impl<A: Alphabet> Acceptor<A::Symbol> for IncrementalDag<A> {
    type State = NodeId;

    fn initial(&self) -> NodeId {
        self.root()
    }

    fn successor(&self, state: NodeId, symbol: &A::Symbol) -> Option<NodeId> {
        self.successor_for(state, symbol)
    }

    fn is_accepting(&self, state: NodeId) -> bool {
        self.acceptance(state) == Some(Acceptance::True)
    }
}

type Pair<S> = (Option<NodeId>, Option<S>);

impl<A: Alphabet> IncrementalDag<A> {
    /// The shortest word whose recorded verdict differs from `target`'s.
    ///
    /// With `omit_undefined` only definite verdicts are compared; otherwise a
    /// `DontKnow` word counts as rejected. Symbols are tried in alphabet
    /// order, so the result is deterministic. `None` if the two agree on
    /// every word.
    pub fn find_separating_word<T>(
        &self,
        target: &T,
        omit_undefined: bool,
    ) -> Option<Word<A::Symbol>>
    where
        T: Acceptor<A::Symbol>,
    {
        let start: Pair<T::State> = (Some(self.root()), Some(target.initial()));
        let mut parents: BTreeMap<Pair<T::State>, Option<(Pair<T::State>, usize)>> =
            BTreeMap::new();
        let mut queue = VecDeque::from([start]);
        parents.insert(start, None);

        while let Some(pair) = queue.pop_front() {
            let (node, state) = pair;
            let recorded = node
                .and_then(|node| self.acceptance(node))
                .unwrap_or(Acceptance::DontKnow);
            let expected = state.is_some_and(|state| target.is_accepting(state));

            let compared = !(omit_undefined && recorded == Acceptance::DontKnow);
            if compared && (recorded == Acceptance::True) != expected {
                return Some(self.trace_back(&parents, pair));
            }

            // Past an undefined node the store only says DontKnow.
            if node.is_none() && (omit_undefined || state.is_none()) {
                continue;
            }

            for index in 0..self.alphabet().size() {
                let Some(symbol) = self.alphabet().symbol(index) else {
                    continue;
                };
                let next: Pair<T::State> = (
                    node.and_then(|node| self.successor(node, index)),
                    state.and_then(|state| target.successor(state, symbol)),
                );
                if parents.contains_key(&next) {
                    continue;
                }
                parents.insert(next, Some((pair, index)));
                queue.push_back(next);
            }
        }

        None
    }

    fn trace_back<S: Copy + Ord>(
        &self,
        parents: &BTreeMap<Pair<S>, Option<(Pair<S>, usize)>>,
        mut pair: Pair<S>,
    ) -> Word<A::Symbol> {
        let mut indices = Vec::new();
        while let Some(Some((parent, index))) = parents.get(&pair) {
            indices.push(*index);
            pair = *parent;
        }
        indices
            .into_iter()
            .rev()
            .filter_map(|index| self.alphabet().symbol(index).cloned())
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
