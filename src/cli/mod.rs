//! Command-line interface.
//!
//! The binary doubles as the admin tool: `serve` runs the HTTP server
//! (and is the default when no subcommand is given), everything else
//! operates directly on the database, bypassing HTTP entirely.

pub mod keys;
pub mod lifecycle;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

/// Purchase verification API server and API key management CLI.
#[derive(Parser)]
#[command(name = "purchase-verify-server")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server (default when no subcommand is given)
    Serve,

    /// Create a new API key (prints the plaintext exactly once)
    Create {
        /// Optional human-readable name
        #[arg(long)]
        name: Option<String>,

        /// Secret length in characters
        #[arg(long, default_value_t = 48)]
        length: usize,
    },

    /// Create the first API key, only if none exists
    InitKey,

    /// List API keys (never shows secrets)
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Activate a key by id
    Activate { id: Uuid },

    /// Deactivate a key by id
    Deactivate { id: Uuid },

    /// Permanently delete a key by id
    Delete { id: Uuid },

    /// Generate .env from .env.example and inject a fresh SECRET_KEY
    InitEnv {
        /// Overwrite an existing .env
        #[arg(long)]
        force: bool,

        /// DATABASE_URL value to set
        #[arg(long)]
        database_url: Option<String>,
    },

    /// Drop and recreate all tables (DANGEROUS)
    DbReset {
        /// Confirm the destructive action
        #[arg(long = "yes-i-am-sure")]
        yes_i_am_sure: bool,
    },

    /// Export every table to a single JSON document
    DbExport {
        /// Output path
        #[arg(long, default_value = "data/export.json")]
        output: PathBuf,
    },

    /// Import a JSON export, upserting rows by primary key
    DbImport {
        /// Input path
        #[arg(long)]
        input: PathBuf,

        /// Drop and recreate tables before importing
        #[arg(long)]
        wipe: bool,
    },

    /// Test database connectivity
    DbTest,

    /// Refresh resources and links from the plugin catalog (safe upsert)
    ResourcesRefresh {
        /// Path to plugins.json
        #[arg(long, default_value = "data/plugins.json")]
        file: PathBuf,
    },
}
