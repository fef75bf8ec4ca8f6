//! # Alphabet
//!
//! A fixed, indexable symbol set. Every symbol is assigned a dense index in
//! `[0, size)`; the store sizes every successor array by `size` and addresses
//! slots by these indices. The alphabet never grows after construction.

use crate::primitives::MAX_ALPHABET_SIZE;
use crate::types::DagError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Trait for types that can serve as input symbols.
///
/// Automatically implemented for any type satisfying the bounds
/// (`char`, `u8`, `u32`, `String`, ...).
///
/// - `Clone`: words and alphabets own their symbols
/// - `Ord`: the symbol index is a `BTreeMap`
/// - `Debug`: conflicts and errors render offending words
pub trait Symbol: Clone + Ord + Debug {}

impl<T: Clone + Ord + Debug> Symbol for T {}

/// A stable bijection between symbols and dense indices.
pub trait Alphabet {
    /// The symbol type.
    type Symbol: Symbol;

    /// Number of symbols.
    fn size(&self) -> usize;

    /// The symbol at `index`, if in range.
    fn symbol(&self, index: usize) -> Option<&Self::Symbol>;

    /// The index of `symbol`, if it belongs to the alphabet.
    fn index_of(&self, symbol: &Self::Symbol) -> Option<usize>;
}

// =============================================================================
// LIST ALPHABET
// =============================================================================

/// An alphabet backed by an ordered list of distinct symbols.
///
/// Indices follow list order. Serialized as the plain symbol list; the
/// reverse index is rebuilt (and re-validated) on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "Vec<I>",
    into = "Vec<I>",
    bound(
        serialize = "I: Symbol + Serialize",
        deserialize = "I: Symbol + Deserialize<'de>"
    )
)]
pub struct ListAlphabet<I: Symbol> {
    symbols: Vec<I>,
    index: BTreeMap<I, usize>,
}

impl<I: Symbol> ListAlphabet<I> {
    /// Build an alphabet from symbols in index order.
    ///
    /// Fails on an empty list, a duplicate symbol, or more than
    /// `MAX_ALPHABET_SIZE` symbols.
    pub fn new(symbols: impl IntoIterator<Item = I>) -> Result<Self, DagError> {
        let symbols: Vec<I> = symbols.into_iter().collect();
        if symbols.is_empty() {
            return Err(DagError::InvalidAlphabet("alphabet is empty".to_string()));
        }
        if symbols.len() > MAX_ALPHABET_SIZE {
            return Err(DagError::InvalidAlphabet(format!(
                "{} symbols exceeds maximum {}",
                symbols.len(),
                MAX_ALPHABET_SIZE
            )));
        }

        let mut index = BTreeMap::new();
        for (i, symbol) in symbols.iter().enumerate() {
            if index.insert(symbol.clone(), i).is_some() {
                return Err(DagError::InvalidAlphabet(format!(
                    "duplicate symbol {:?}",
                    symbol
                )));
            }
        }

        Ok(Self { symbols, index })
    }

    /// All symbols in index order.
    #[must_use]
    pub fn symbols(&self) -> &[I] {
        &self.symbols
    }

    /// Iterate symbols in index order.
    pub fn iter(&self) -> impl Iterator<Item = &I> {
        self.symbols.iter()
    }
}

impl ListAlphabet<char> {
    /// One symbol per char of `chars`.
    pub fn from_chars(chars: &str) -> Result<Self, DagError> {
        Self::new(chars.chars())
    }
}

impl<I: Symbol> Alphabet for ListAlphabet<I> {
    type Symbol = I;

    fn size(&self) -> usize {
        self.symbols.len()
    }

    fn symbol(&self, index: usize) -> Option<&I> {
        self.symbols.get(index)
    }

    fn index_of(&self, symbol: &I) -> Option<usize> {
        self.index.get(symbol).copied()
    }
}

impl<I: Symbol> TryFrom<Vec<I>> for ListAlphabet<I> {
    type Error = DagError;

    fn try_from(symbols: Vec<I>) -> Result<Self, Self::Error> {
        Self::new(symbols)
    }
}

impl<I: Symbol> From<ListAlphabet<I>> for Vec<I> {
    fn from(alphabet: ListAlphabet<I>) -> Self {
        alphabet.symbols
    }
}

// =============================================================================
// TESTS
// =============================================================================
