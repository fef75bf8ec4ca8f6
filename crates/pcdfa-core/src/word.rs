//! # Words
//!
//! Immutable finite symbol sequences. The store only iterates words; the
//! slicing and insertion helpers serve callers that build annotated traces
//! around stored facts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// An immutable, finite, ordered sequence of symbols.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Word<I> {
    symbols: Vec<I>,
}

impl<I> Word<I> {
    /// The empty word.
    #[must_use]
    pub const fn epsilon() -> Self {
        Self {
            symbols: Vec::new(),
        }
    }

    /// A word over the given symbols, in order.
    pub fn from_symbols(symbols: impl IntoIterator<Item = I>) -> Self {
        Self {
            symbols: symbols.into_iter().collect(),
        }
    }

    /// Number of symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether this is the empty word.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Iterate the symbols in order.
    pub fn iter(&self) -> std::slice::Iter<'_, I> {
        self.symbols.iter()
    }

    /// The symbol at `index`.
    #[must_use]
    pub fn symbol(&self, index: usize) -> Option<&I> {
        self.symbols.get(index)
    }

    /// The first symbol, if any.
    #[must_use]
    pub fn first_symbol(&self) -> Option<&I> {
        self.symbols.first()
    }

    /// The symbols as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[I] {
        &self.symbols
    }
}

impl<I: Clone> Word<I> {
    /// The sub-word covering `range`, clamped to the word's bounds.
    #[must_use]
    pub fn sub_word(&self, range: Range<usize>) -> Self {
        let end = range.end.min(self.symbols.len());
        let start = range.start.min(end);
        Self {
            symbols: self.symbols[start..end].to_vec(),
        }
    }

    /// The first `len` symbols.
    #[must_use]
    pub fn prefix(&self, len: usize) -> Self {
        self.sub_word(0..len)
    }

    /// Everything from position `from` on.
    #[must_use]
    pub fn suffix_from(&self, from: usize) -> Self {
        self.sub_word(from..self.symbols.len())
    }

    /// A new word with `symbol` inserted before position `pos`.
    ///
    /// `pos == len()` appends. Positions past the end also append.
    #[must_use]
    pub fn insert_symbol(&self, pos: usize, symbol: I) -> Self {
        let mut symbols = self.symbols.clone();
        symbols.insert(pos.min(symbols.len()), symbol);
        Self { symbols }
    }

    /// A new word with `symbol` appended.
    #[must_use]
    pub fn append(&self, symbol: I) -> Self {
        self.insert_symbol(self.symbols.len(), symbol)
    }
}

impl<I> Default for Word<I> {
    fn default() -> Self {
        Self::epsilon()
    }
}

impl From<&str> for Word<char> {
    fn from(s: &str) -> Self {
        Self::from_symbols(s.chars())
    }
}

impl<I> From<Vec<I>> for Word<I> {
    fn from(symbols: Vec<I>) -> Self {
        Self { symbols }
    }
}

impl<I> FromIterator<I> for Word<I> {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        Self::from_symbols(iter)
    }
}

impl<'a, I> IntoIterator for &'a Word<I> {
    type Item = &'a I;
    type IntoIter = std::slice::Iter<'a, I>;

    fn into_iter(self) -> Self::IntoIter {
        self.symbols.iter()
    }
}

impl<I: fmt::Debug> fmt::Debug for Word<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.symbols).finish()
    }
}

/// Symbols concatenated; the empty word renders as `ε`.
impl<I: fmt::Display> fmt::Display for Word<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.symbols.is_empty() {
            return f.write_str("ε");
        }
        for symbol in &self.symbols {
            write!(f, "{}", symbol)?;
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
