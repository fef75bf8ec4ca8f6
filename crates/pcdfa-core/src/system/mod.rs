//! # System Module
//!
//! Size and shape metrics for a store.
//!
//! Pure and deterministic: metrics are recomputed from the DAG on demand,
//! never cached.

mod metrics;

pub use metrics::*;
