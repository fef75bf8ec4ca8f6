//! # Validation Tier Tests (T0-T4)
//!
//! If ANY tier fails, the store is INVALID.
//!
//! ## Tiers
//! - T0: Unknown by Default
//! - T1: Recording Facts
//! - T2: Prefix-Closedness
//! - T3: Canonical Sharing
//! - T4: Conflicts and Atomicity

use pcdfa_core::{Acceptance, DagError, DagMetrics, IncrementalDag, ListAlphabet, Word};

fn store(symbols: &str) -> IncrementalDag {
    IncrementalDag::new(ListAlphabet::from_chars(symbols).expect("alphabet"))
}

fn w(s: &str) -> Word<char> {
    Word::from(s)
}

// =============================================================================
// TIER T0: UNKNOWN BY DEFAULT
// =============================================================================

mod t0_unknown_by_default {
    use super::*;

    /// T0.1: A fresh store knows nothing, not even the empty word.
    #[test]
    fn fresh_store_is_dont_know() {
        let dag = store("abc");
        for word in ["", "a", "abc", "cccc"] {
            assert_eq!(dag.lookup(&w(word)), Acceptance::DontKnow);
            assert!(!dag.has_definitive_information(&w(word)));
        }
    }

    /// T0.2: Recording one word says nothing about its prefixes or siblings.
    #[test]
    fn accepted_word_leaves_neighbours_unknown() {
        let mut dag = store("abc");
        dag.insert(&w("abc"), true).expect("insert");
        for word in ["", "a", "ab", "abcc", "abb", "b"] {
            assert_eq!(dag.lookup(&w(word)), Acceptance::DontKnow, "{}", word);
        }
    }

    /// T0.3: Symbols outside the alphabet can never be decided.
    #[test]
    fn foreign_symbols_are_unknown() {
        let mut dag = store("ab");
        dag.insert(&w("a"), true).expect("insert");
        assert_eq!(dag.lookup(&w("az")), Acceptance::DontKnow);
        assert!(matches!(
            dag.insert(&w("az"), false),
            Err(DagError::UnknownSymbol(_))
        ));
    }
}

// =============================================================================
// TIER T1: RECORDING FACTS
// =============================================================================

mod t1_recording_facts {
    use super::*;

    /// T1.1: The five-step scenario over {a, b, c}.
    #[test]
    fn reference_scenario() {
        let mut dag = store("abc");

        assert_eq!(dag.lookup(&w("abc")), Acceptance::DontKnow);

        dag.insert(&w("abc"), true).expect("step 2");
        assert_eq!(dag.lookup(&w("abc")), Acceptance::True);
        assert_eq!(dag.lookup(&w("ac")), Acceptance::DontKnow);

        dag.insert(&w("ac"), false).expect("step 3");
        assert_eq!(dag.lookup(&w("ac")), Acceptance::False);
        assert_eq!(dag.lookup(&w("abc")), Acceptance::True);
        assert_eq!(dag.lookup(&w("acb")), Acceptance::False);

        let before = pcdfa_core::export_canonical(&dag).expect("export");
        let err = dag.insert(&w("acb"), true).expect_err("step 4");
        assert!(err.is_conflict());
        assert_eq!(pcdfa_core::export_canonical(&dag).expect("export"), before);

        dag.insert(&w(""), true).expect("step 5");
        assert_eq!(dag.lookup(&w("")), Acceptance::True);
        assert_eq!(dag.lookup(&w("abc")), Acceptance::True);
        assert_eq!(dag.lookup(&w("ac")), Acceptance::False);
        assert_eq!(dag.lookup(&w("acb")), Acceptance::False);
        assert!(dag.validate().is_ok());
    }

    /// T1.2: Every inserted fact reads back.
    #[test]
    fn facts_read_back() {
        let mut dag = store("01");
        let facts = [
            ("0", true),
            ("01", true),
            ("011", false),
            ("1", true),
            ("10", false),
            ("0100", true),
        ];
        for (word, accepting) in facts {
            dag.insert(&w(word), accepting).expect("insert");
        }
        for (word, accepting) in facts {
            assert_eq!(dag.lookup(&w(word)), Acceptance::from_bool(accepting), "{}", word);
        }
        assert!(dag.validate().is_ok());
    }

    /// T1.3: Inserting a fact twice is a no-op.
    #[test]
    fn insertion_is_idempotent() {
        let mut dag = store("ab");
        dag.insert(&w("ab"), true).expect("first");
        dag.insert(&w("ba"), false).expect("first");
        let before = pcdfa_core::export_canonical(&dag).expect("export");

        dag.insert(&w("ab"), true).expect("second");
        dag.insert(&w("ba"), false).expect("second");
        assert_eq!(pcdfa_core::export_canonical(&dag).expect("export"), before);
    }

    /// T1.4: Words over non-char symbols work the same way.
    #[test]
    fn string_symbols() {
        let alphabet =
            ListAlphabet::new(["open", "read", "close"].map(String::from)).expect("alphabet");
        let mut dag = IncrementalDag::new(alphabet);
        let session: Word<String> = ["open", "read", "close"].map(String::from).into_iter().collect();
        let bad: Word<String> = ["read"].map(String::from).into_iter().collect();

        dag.insert(&session, true).expect("session");
        dag.insert(&bad, false).expect("bad");
        assert_eq!(dag.lookup(&session), Acceptance::True);
        assert_eq!(dag.lookup(&bad.append("close".to_string())), Acceptance::False);
    }
}

// =============================================================================
// TIER T2: PREFIX-CLOSEDNESS
// =============================================================================

mod t2_prefix_closedness {
    use super::*;

    /// T2.1: Every extension of a rejected word is rejected.
    #[test]
    fn extensions_of_rejected_word_are_rejected() {
        let mut dag = store("abc");
        dag.insert(&w("ba"), false).expect("insert");
        for word in ["ba", "baa", "bacab", "babbbbbb"] {
            assert_eq!(dag.lookup(&w(word)), Acceptance::False, "{}", word);
        }
        assert_eq!(dag.lookup(&w("b")), Acceptance::DontKnow);
    }

    /// T2.2: Rejecting below an accepted word is allowed.
    #[test]
    fn accepted_word_may_have_rejected_extension() {
        let mut dag = store("ab");
        dag.insert(&w("a"), true).expect("accept");
        dag.insert(&w("ab"), false).expect("reject extension");
        assert_eq!(dag.lookup(&w("a")), Acceptance::True);
        assert_eq!(dag.lookup(&w("ab")), Acceptance::False);
        assert_eq!(dag.lookup(&w("aa")), Acceptance::DontKnow);
    }

    /// T2.3: Rejecting a word already under a rejected prefix is a no-op.
    #[test]
    fn rejecting_below_rejection_is_noop() {
        let mut dag = store("ab");
        dag.insert(&w("a"), false).expect("reject");
        let nodes = dag.node_count();
        dag.insert(&w("abab"), false).expect("noop");
        assert_eq!(dag.node_count(), nodes);
    }

    /// T2.4: Rejecting a word purges the now unreachable nodes below it.
    #[test]
    fn rejection_purges_subtree() {
        let mut dag = store("ab");
        dag.insert(&w("abab"), false).expect("deep");
        dag.insert(&w("abba"), false).expect("deep");
        dag.insert(&w("ab"), false).expect("cut");
        // root -a-> x -b-> sink
        assert_eq!(dag.node_count(), 3);
        assert!(dag.validate().is_ok());
    }

    /// T2.5: Rejecting the empty word rejects everything.
    #[test]
    fn rejecting_epsilon() {
        let mut dag = store("ab");
        dag.insert(&w("ab"), false).expect("reject");
        dag.insert(&w(""), false).expect("reject all");
        assert_eq!(dag.lookup(&w("")), Acceptance::False);
        assert_eq!(dag.lookup(&w("bbb")), Acceptance::False);
        assert_eq!(dag.node_count(), 2);
    }
}

// =============================================================================
// TIER T3: CANONICAL SHARING
// =============================================================================

mod t3_canonical_sharing {
    use super::*;

    /// T3.1: Equivalent suffixes share one node.
    #[test]
    fn equal_futures_share_nodes() {
        let mut dag = store("abc");
        for word in ["aab", "bab", "cab"] {
            dag.insert(&w(word), true).expect("insert");
        }
        // root, "ab", "b", accepting leaf
        assert_eq!(dag.node_count(), 4);
        let metrics = DagMetrics::from_dag(&dag);
        assert_eq!(metrics.confluence_count, 1);
        assert_eq!(metrics.registered_count, 3);
    }

    /// T3.2: Diverging a shared branch clones only the diverging path.
    #[test]
    fn divergence_clones_shared_branch() {
        let mut dag = store("abc");
        dag.insert(&w("ab"), true).expect("insert");
        dag.insert(&w("cb"), true).expect("insert");
        dag.insert(&w("cbb"), true).expect("insert");

        assert_eq!(dag.lookup(&w("abb")), Acceptance::DontKnow);
        assert_eq!(dag.lookup(&w("cbb")), Acceptance::True);
        assert_ne!(
            dag.successor_for(dag.root(), &'a'),
            dag.successor_for(dag.root(), &'c')
        );
        assert!(dag.validate().is_ok());
    }

    /// T3.3: Branches that become equivalent again are re-merged.
    #[test]
    fn reconverging_branches_merge() {
        let mut dag = store("abc");
        dag.insert(&w("ab"), true).expect("insert");
        dag.insert(&w("cb"), true).expect("insert");
        let shared = dag.node_count();

        dag.insert(&w("cbb"), true).expect("diverge");
        dag.insert(&w("abb"), true).expect("reconverge");
        assert_eq!(
            dag.successor_for(dag.root(), &'a'),
            dag.successor_for(dag.root(), &'c')
        );
        // one extra node per extra symbol of the shared branch
        assert_eq!(dag.node_count(), shared + 1);
        assert!(dag.validate().is_ok());
    }

    /// T3.4: Insertion order does not change the resulting DAG.
    #[test]
    fn order_independent_shape() {
        let facts = [("abc", true), ("acb", true), ("b", false), ("ca", true), ("cc", false)];
        let mut forward = store("abc");
        for (word, accepting) in facts {
            forward.insert(&w(word), accepting).expect("insert");
        }
        let mut backward = store("abc");
        for (word, accepting) in facts.iter().rev() {
            backward.insert(&w(word), *accepting).expect("insert");
        }
        assert_eq!(forward.node_count(), backward.node_count());
        assert_eq!(
            pcdfa_core::canonical_checksum(&forward).expect("checksum"),
            pcdfa_core::canonical_checksum(&backward).expect("checksum")
        );
        assert_eq!(forward.find_separating_word(&backward, false), None);
    }

    /// T3.5: A suffix that hash-conses onto a node on the walked path.
    #[test]
    fn suffix_onto_walked_node() {
        let mut dag = store("ab");
        for word in ["a", "bba", "bbaaa"] {
            dag.insert(&w(word), true).expect("insert");
        }
        assert!(dag.validate().is_ok(), "{:?}", dag.validate());
        assert_eq!(dag.lookup(&w("bbaaa")), Acceptance::True);
        assert_eq!(dag.lookup(&w("bbaaaaa")), Acceptance::DontKnow);
        assert_eq!(dag.lookup(&w("bbaaaaaaa")), Acceptance::DontKnow);
        assert!(pcdfa_core::export_canonical(&dag).is_ok());
    }

    /// T3.6: An edited leaf that merges into its own ancestor.
    #[test]
    fn edit_onto_walked_node() {
        let mut dag = store("ab");
        for word in ["bbaa", "bba", "a", "bbaaa"] {
            dag.insert(&w(word), true).expect("insert");
        }
        assert!(dag.validate().is_ok(), "{:?}", dag.validate());
        assert_eq!(dag.lookup(&w("bbaaa")), Acceptance::True);
        assert_eq!(dag.lookup(&w("bbaaaa")), Acceptance::DontKnow);

        let mut backward = store("ab");
        for word in ["bbaaa", "a", "bba", "bbaa"] {
            backward.insert(&w(word), true).expect("insert");
        }
        assert_eq!(
            pcdfa_core::export_canonical(&dag).expect("export"),
            pcdfa_core::export_canonical(&backward).expect("export")
        );
    }
}

// =============================================================================
// TIER T4: CONFLICTS AND ATOMICITY
// =============================================================================

mod t4_conflicts {
    use super::*;

    /// T4.1: Flipping a recorded verdict is a conflict.
    #[test]
    fn flipping_verdict_conflicts() {
        let mut dag = store("ab");
        dag.insert(&w("ab"), true).expect("insert");
        let err = dag.insert(&w("ab"), false).expect_err("conflict");
        assert_eq!(
            err,
            DagError::Conflict {
                word: "['a', 'b']".to_string(),
                recorded: Acceptance::True,
                requested: Acceptance::False,
            }
        );
    }

    /// T4.2: Accepting below a rejected prefix is a conflict.
    #[test]
    fn accepting_under_rejected_prefix_conflicts() {
        let mut dag = store("ab");
        dag.insert(&w("a"), false).expect("insert");
        let err = dag.insert(&w("abba"), true).expect_err("conflict");
        assert!(matches!(
            err,
            DagError::Conflict {
                recorded: Acceptance::False,
                requested: Acceptance::True,
                ..
            }
        ));
    }

    /// T4.3: Rejecting a prefix of an accepted word is a conflict.
    #[test]
    fn rejecting_prefix_of_accepted_conflicts() {
        let mut dag = store("ab");
        dag.insert(&w("abb"), true).expect("insert");
        assert!(dag.insert(&w("a"), false).is_err());
        assert!(dag.insert(&w(""), false).is_err());
        assert_eq!(dag.lookup(&w("abb")), Acceptance::True);
    }

    /// T4.4: A failed insert leaves the store untouched.
    #[test]
    fn failed_insert_is_atomic() {
        let mut dag = store("abc");
        dag.insert(&w("ab"), true).expect("insert");
        dag.insert(&w("cb"), true).expect("insert");
        dag.insert(&w("ca"), false).expect("insert");
        let before = pcdfa_core::export_canonical(&dag).expect("export");
        let count = dag.node_count();

        assert!(dag.insert(&w("c"), false).is_err());
        assert!(dag.insert(&w("cab"), true).is_err());
        assert!(dag.insert(&w("cb"), false).is_err());

        assert_eq!(dag.node_count(), count);
        assert_eq!(pcdfa_core::export_canonical(&dag).expect("export"), before);
        assert!(dag.validate().is_ok());
    }
}
