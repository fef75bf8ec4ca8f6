//! # pcdfa
//!
//! Command-line front end for `pcdfa-core`.
//!
//! The binary in `main.rs` only sets up logging and dispatches to [`cli`];
//! everything else lives here so it can be driven from integration tests.

pub mod cli;
