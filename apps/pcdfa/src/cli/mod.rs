//! # pcdfa CLI Module
//!
//! This module implements the CLI interface for pcdfa.
//!
//! ## Available Commands
//!
//! - `init` - Create an empty store over an alphabet
//! - `insert` - Record that a word is accepted (or rejected)
//! - `lookup` - Query the verdict for one or more words
//! - `ingest` - Record a batch of facts from a file
//! - `status` - Show store metrics
//! - `diff` - Find the shortest word two stores disagree on
//! - `verify` - Re-check the store file and print its hashes

mod commands;

use clap::{Parser, Subcommand};
use pcdfa_core::DagError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// pcdfa - incremental prefix-closed DFA store
///
/// Records accept/reject facts about words and answers every lookup with
/// accept, reject, or unknown. Rejecting a word rejects all its extensions.
#[derive(Parser, Debug)]
#[command(name = "pcdfa")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the store file
    #[arg(short = 'S', long, global = true, default_value = "pcdfa.store")]
    pub store: PathBuf,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new empty store
    Init {
        /// Alphabet symbols, one per character, in index order
        #[arg(short, long)]
        alphabet: String,

        /// Force initialization even if the store exists
        #[arg(short, long)]
        force: bool,
    },

    /// Record a fact about a word
    Insert {
        /// The word, one symbol per character ("" for the empty word)
        word: String,

        /// Record a rejection instead of an acceptance
        #[arg(short, long)]
        reject: bool,
    },

    /// Look up the verdict for words
    Lookup {
        /// Words to look up
        #[arg(required = true)]
        words: Vec<String>,
    },

    /// Record facts from a file
    Ingest {
        /// Path to the input file (JSON or text)
        #[arg(short, long)]
        file: PathBuf,

        /// Input format (json, text)
        #[arg(short = 't', long, default_value = "json")]
        format: String,
    },

    /// Show store status
    Status,

    /// Find the shortest word on which another store disagrees
    Diff {
        /// Path to the other store file
        #[arg(short, long)]
        other: PathBuf,

        /// Only compare words both stores have definite verdicts for
        #[arg(long)]
        omit_undefined: bool,
    },

    /// Verify store integrity and print its hashes
    Verify,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), DagError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Init { alphabet, force }) => {
            cmd_init(&cli.store, json_mode, &alphabet, force)
        }
        Some(Commands::Insert { word, reject }) => {
            cmd_insert(&cli.store, json_mode, &word, !reject)
        }
        Some(Commands::Lookup { words }) => cmd_lookup(&cli.store, json_mode, &words),
        Some(Commands::Ingest { file, format }) => {
            cmd_ingest(&cli.store, json_mode, &file, &format)
        }
        Some(Commands::Diff {
            other,
            omit_undefined,
        }) => cmd_diff(&cli.store, json_mode, &other, omit_undefined),
        Some(Commands::Verify) => cmd_verify(&cli.store, json_mode),
        Some(Commands::Status) | None => {
            // No subcommand - show status by default
            cmd_status(&cli.store, json_mode)
        }
    }
}
