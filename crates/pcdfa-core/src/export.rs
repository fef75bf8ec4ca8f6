//! # Canonical Export Module
//!
//! Deterministic, bit-exact serialization of a store.
//!
//! Node ids are arena slots and depend on insertion history; the export
//! does not. Nodes are written in topological order (successors first, root
//! last) discovered by walking slots in symbol order, and every reference is
//! a position in that list. Two stores holding the same facts therefore
//! export to identical bytes.
//!
//! Format:
//! ```text
//! [header_len: u32 LE] [CanonicalHeader (postcard)] [CanonicalDag (postcard)]
//! ```

use crate::alphabet::{ListAlphabet, Symbol};
use crate::builder::IncrementalDag;
use crate::primitives::{
    FORMAT_VERSION, MAGIC_BYTES, MAX_ALPHABET_SIZE, MAX_IMPORT_NODE_COUNT,
    MAX_IMPORT_PAYLOAD_SIZE,
};
use crate::registry::Registry;
use crate::signature::Signature;
use crate::types::{Acceptance, DagError, NodeId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// CANONICAL FORMAT
// =============================================================================

/// Header for canonical export files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalHeader {
    /// Magic bytes to identify the format.
    pub magic: [u8; 4],

    /// Format version for compatibility.
    pub version: u8,

    /// Number of symbols in the alphabet.
    pub alphabet_size: u64,

    /// Number of nodes in the export, root included, sink excluded.
    pub node_count: u64,

    /// Checksum of the data section (XOR-rotate, deterministic).
    pub checksum: u64,
}

impl CanonicalHeader {
    /// Create a new header with the given counts.
    #[must_use]
    pub fn new(alphabet_size: u64, node_count: u64, checksum: u64) -> Self {
        Self {
            magic: *MAGIC_BYTES,
            version: FORMAT_VERSION,
            alphabet_size,
            node_count,
            checksum,
        }
    }

    /// Validate magic, version and size limits.
    ///
    /// Error messages are intentionally generic.
    pub fn validate(&self) -> Result<(), DagError> {
        if self.magic != *MAGIC_BYTES {
            return Err(DagError::DeserializationError(
                "Invalid file format".to_string(),
            ));
        }
        if self.version != FORMAT_VERSION {
            return Err(DagError::DeserializationError(
                "Unsupported file version".to_string(),
            ));
        }
        if self.node_count > MAX_IMPORT_NODE_COUNT {
            return Err(DagError::DeserializationError(format!(
                "Node count {} exceeds maximum allowed {}",
                self.node_count, MAX_IMPORT_NODE_COUNT
            )));
        }
        if self.alphabet_size == 0 || self.alphabet_size > MAX_ALPHABET_SIZE as u64 {
            return Err(DagError::DeserializationError(format!(
                "Alphabet size {} outside 1..={}",
                self.alphabet_size, MAX_ALPHABET_SIZE
            )));
        }
        Ok(())
    }
}

/// A successor reference in canonical form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum CanonicalTarget {
    /// The shared reject sink.
    Sink,
    /// A position in [`CanonicalDag::nodes`], always before the referrer.
    Node(u32),
}

/// A node in canonical form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalNode {
    /// Recorded verdict.
    pub acceptance: Acceptance,
    /// One entry per symbol, in alphabet order.
    pub successors: Vec<Option<CanonicalTarget>>,
}

/// A store in canonical form for bit-exact serialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalDag<I> {
    /// Alphabet symbols in index order.
    pub symbols: Vec<I>,

    /// Nodes with successors first; the last entry is the root.
    pub nodes: Vec<CanonicalNode>,
}

impl<I: Symbol> CanonicalDag<I> {
    /// Canonical form of a store.
    pub fn from_dag(dag: &IncrementalDag<ListAlphabet<I>>) -> Result<Self, DagError> {
        let order = dag.registry().topological_order()?;
        let positions: BTreeMap<NodeId, u32> = order
            .iter()
            .enumerate()
            .map(|(pos, &id)| (id, pos as u32))
            .collect();

        let registry = dag.registry();
        let mut nodes = Vec::with_capacity(order.len());
        for &id in &order {
            let signature = registry.signature(id);
            let successors = signature
                .successors()
                .iter()
                .map(|slot| {
                    slot.map(|target| match positions.get(&target) {
                        Some(&pos) => CanonicalTarget::Node(pos),
                        None => CanonicalTarget::Sink,
                    })
                })
                .collect();
            nodes.push(CanonicalNode {
                acceptance: signature.acceptance(),
                successors,
            });
        }

        Ok(Self {
            symbols: dag.alphabet().symbols().to_vec(),
            nodes,
        })
    }

    /// Rebuild a store, re-checking every invariant.
    pub fn to_dag(&self) -> Result<IncrementalDag<ListAlphabet<I>>, DagError> {
        let alphabet = ListAlphabet::new(self.symbols.iter().cloned())?;
        let size = self.symbols.len();
        let Some((root, others)) = self.nodes.split_last() else {
            return Err(DagError::Corrupted("export holds no root".to_string()));
        };

        let mut registry = Registry::new(size);
        let mut ids: Vec<NodeId> = Vec::with_capacity(self.nodes.len());
        for (pos, node) in others.iter().enumerate() {
            let signature = Self::resolve(&mut registry, &ids, node, size)?;
            let id = registry.register_new(signature).ok_or_else(|| {
                DagError::Corrupted(format!("node {} duplicates an earlier node", pos))
            })?;
            ids.push(id);
        }
        let signature = Self::resolve(&mut registry, &ids, root, size)?;
        registry.set_root_signature(signature);

        IncrementalDag::from_parts(alphabet, registry)
    }

    fn resolve(
        registry: &mut Registry,
        ids: &[NodeId],
        node: &CanonicalNode,
        size: usize,
    ) -> Result<Signature, DagError> {
        if node.successors.len() != size {
            return Err(DagError::Corrupted(format!(
                "node {} has {} slots for {} symbols",
                ids.len(),
                node.successors.len(),
                size
            )));
        }
        let mut signature = Signature::new(size, node.acceptance);
        for (index, slot) in node.successors.iter().enumerate() {
            let target = match slot {
                None => continue,
                Some(CanonicalTarget::Sink) => registry.sink_node(),
                Some(CanonicalTarget::Node(pos)) => {
                    *ids.get(*pos as usize).ok_or_else(|| {
                        DagError::Corrupted(format!(
                            "node {} refers forward to {}",
                            ids.len(),
                            pos
                        ))
                    })?
                }
            };
            signature = signature.with_successor(index, target);
        }
        Ok(signature)
    }
}

/// Deterministic XOR-rotate checksum over a byte stream.
///
/// This is **NOT** a cryptographic hash: it detects accidental corruption,
/// not tampering. Use the `crypto-hash` feature for that.
fn checksum_bytes(data: &[u8]) -> u64 {
    data.iter()
        .enumerate()
        .fold(data.len() as u64, |hash, (i, &byte)| {
            (hash ^ u64::from(byte).rotate_left((i % 57) as u32)).rotate_left(7)
        })
}

// =============================================================================
// EXPORT FUNCTIONS
// =============================================================================

/// Export a store to canonical postcard format.
///
/// # Errors
///
/// Returns `DagError::SerializationError` if serialization fails, or
/// `DagError::Corrupted` if the DAG has a cycle.
pub fn export_canonical<I>(dag: &IncrementalDag<ListAlphabet<I>>) -> Result<Vec<u8>, DagError>
where
    I: Symbol + Serialize,
{
    let canonical = CanonicalDag::from_dag(dag)?;

    let data_bytes = postcard::to_allocvec(&canonical)
        .map_err(|e| DagError::SerializationError(format!("Data: {}", e)))?;

    let header = CanonicalHeader::new(
        canonical.symbols.len() as u64,
        canonical.nodes.len() as u64,
        checksum_bytes(&data_bytes),
    );
    let header_bytes = postcard::to_allocvec(&header)
        .map_err(|e| DagError::SerializationError(format!("Header: {}", e)))?;

    // Combine: [header_len: u32] [header] [data]
    let mut result = Vec::with_capacity(4 + header_bytes.len() + data_bytes.len());
    result.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
    result.extend_from_slice(&header_bytes);
    result.extend_from_slice(&data_bytes);

    Ok(result)
}

/// Import a store from canonical postcard format.
///
/// # Errors
///
/// Returns `DagError::DeserializationError` if the framing, header or
/// checksum is wrong, and `DagError::Corrupted` if the decoded nodes do not
/// form a valid canonical DAG.
pub fn import_canonical<I>(data: &[u8]) -> Result<IncrementalDag<ListAlphabet<I>>, DagError>
where
    I: Symbol + DeserializeOwned,
{
    if data.len() > MAX_IMPORT_PAYLOAD_SIZE {
        return Err(DagError::DeserializationError(format!(
            "Payload of {} bytes exceeds maximum allowed {}",
            data.len(),
            MAX_IMPORT_PAYLOAD_SIZE
        )));
    }
    let Some((len_bytes, rest)) = data.split_first_chunk::<4>() else {
        return Err(DagError::DeserializationError(
            "Data too short".to_string(),
        ));
    };

    let header_len = u32::from_le_bytes(*len_bytes) as usize;
    if rest.len() < header_len {
        return Err(DagError::DeserializationError(
            "Data too short for header".to_string(),
        ));
    }
    let (header_bytes, data_bytes) = rest.split_at(header_len);

    let header: CanonicalHeader = postcard::from_bytes(header_bytes)
        .map_err(|e| DagError::DeserializationError(format!("Header: {}", e)))?;

    // Validate size limits BEFORE deserializing the nodes
    header.validate()?;

    let computed_checksum = checksum_bytes(data_bytes);
    if computed_checksum != header.checksum {
        return Err(DagError::DeserializationError(format!(
            "Checksum mismatch: expected {}, got {}",
            header.checksum, computed_checksum
        )));
    }

    let canonical: CanonicalDag<I> = postcard::from_bytes(data_bytes)
        .map_err(|e| DagError::DeserializationError(format!("Data: {}", e)))?;

    if canonical.nodes.len() as u64 != header.node_count {
        return Err(DagError::DeserializationError(
            "Node count mismatch".to_string(),
        ));
    }
    if canonical.symbols.len() as u64 != header.alphabet_size {
        return Err(DagError::DeserializationError(
            "Alphabet size mismatch".to_string(),
        ));
    }

    canonical.to_dag()
}

/// Verify that a store matches a canonical export.
pub fn verify_canonical<I>(
    dag: &IncrementalDag<ListAlphabet<I>>,
    canonical_data: &[u8],
) -> Result<bool, DagError>
where
    I: Symbol + Serialize + DeserializeOwned,
{
    let imported = import_canonical::<I>(canonical_data)?;
    if dag.node_count() != imported.node_count() {
        return Ok(false);
    }
    Ok(CanonicalDag::from_dag(dag)? == CanonicalDag::from_dag(&imported)?)
}

/// Compute the canonical checksum of a store.
///
/// Equal for any two stores holding the same facts.
pub fn canonical_checksum<I>(dag: &IncrementalDag<ListAlphabet<I>>) -> Result<u64, DagError>
where
    I: Symbol + Serialize,
{
    let canonical = CanonicalDag::from_dag(dag)?;
    let data_bytes = postcard::to_allocvec(&canonical)
        .map_err(|e| DagError::SerializationError(format!("Data: {}", e)))?;
    Ok(checksum_bytes(&data_bytes))
}

// =============================================================================
// CRYPTOGRAPHIC HASH SUPPORT
// =============================================================================

/// BLAKE3 hash of the canonical export, as 64 hex characters.
///
/// Only available with the `crypto-hash` feature.
#[cfg(feature = "crypto-hash")]
pub fn canonical_crypto_hash<I>(dag: &IncrementalDag<ListAlphabet<I>>) -> Result<String, DagError>
where
    I: Symbol + Serialize,
{
    let data = export_canonical(dag)?;
    Ok(blake3::hash(&data).to_hex().to_string())
}

// =============================================================================
// TESTS
// =============================================================================
