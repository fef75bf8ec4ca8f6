use crate::alphabet::Alphabet;
use crate::builder::IncrementalDag;
use crate::types::{Acceptance, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// DAG METRICS
// =============================================================================

/// Size and shape of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DagMetrics {
    /// Live nodes, root and sink included.
    pub node_count: usize,
    /// Entries in the signature register (every live node except the root).
    pub registered_count: usize,
    /// Nodes recording an accepted word.
    pub accepting_count: usize,
    /// Nodes reachable through more than one successor slot.
    pub confluence_count: usize,
    /// Length of the longest path from the root that avoids the sink.
    pub max_depth: usize,
    /// Whether some word has been rejected.
    pub has_sink: bool,
}

impl DagMetrics {
    /// Compute metrics from a store.
    #[must_use]
    pub fn from_dag<A: Alphabet>(dag: &IncrementalDag<A>) -> Self {
        let registry = dag.registry();
        let accepting_count = registry
            .nodes()
            .filter(|(_, signature)| signature.acceptance() == Acceptance::True)
            .count();
        let confluence_count = registry
            .nodes()
            .filter(|&(id, _)| registry.is_confluence(id))
            .count();

        Self {
            node_count: registry.node_count(),
            registered_count: registry.registered_count(),
            accepting_count,
            confluence_count,
            max_depth: compute_max_depth(dag),
            has_sink: registry.sink().is_some(),
        }
    }
}

/// Longest sink-free path from the root, by dynamic programming over the
/// topological order.
fn compute_max_depth<A: Alphabet>(dag: &IncrementalDag<A>) -> usize {
    let registry = dag.registry();
    let order = registry.topological_order().unwrap_or_default();
    let mut depths: BTreeMap<NodeId, usize> = BTreeMap::new();

    for id in order {
        let depth = registry
            .signature(id)
            .targets()
            .filter_map(|target| depths.get(&target))
            .map(|depth| depth.saturating_add(1))
            .max()
            .unwrap_or(0);
        depths.insert(id, depth);
    }

    depths.get(&registry.root()).copied().unwrap_or(0)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::ListAlphabet;
    use crate::word::Word;

    fn abc() -> IncrementalDag {
        IncrementalDag::new(ListAlphabet::from_chars("abc").expect("alphabet"))
    }

    #[test]
    fn empty_store_metrics() {
        let metrics = DagMetrics::from_dag(&abc());
        assert_eq!(metrics.node_count, 1);
        assert_eq!(metrics.registered_count, 0);
        assert_eq!(metrics.accepting_count, 0);
        assert_eq!(metrics.max_depth, 0);
        assert!(!metrics.has_sink);
    }

    #[test]
    fn depth_follows_longest_accepted_word() {
        let mut dag = abc();
        dag.insert(&Word::from("abca"), true).expect("abca");
        dag.insert(&Word::from("b"), true).expect("b");
        let metrics = DagMetrics::from_dag(&dag);
        assert_eq!(metrics.max_depth, 4);
        assert_eq!(metrics.accepting_count, 1);
    }

    #[test]
    fn sink_edges_do_not_add_depth() {
        let mut dag = abc();
        dag.insert(&Word::from("ab"), false).expect("ab");
        let metrics = DagMetrics::from_dag(&dag);
        assert_eq!(metrics.max_depth, 1);
        assert!(metrics.has_sink);
    }

    #[test]
    fn shared_suffix_counts_one_confluence() {
        let mut dag = abc();
        dag.insert(&Word::from("ac"), true).expect("ac");
        dag.insert(&Word::from("bc"), true).expect("bc");
        let metrics = DagMetrics::from_dag(&dag);
        assert_eq!(metrics.confluence_count, 1);
        assert_eq!(metrics.node_count, 3);
        assert_eq!(metrics.registered_count, 2);
    }
}
