//! CLI argument definitions using clap

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::observability::Severity;

/// aliasd - a pseudonymous identity-mapping service
#[derive(Parser, Debug)]
#[command(name = "aliasd")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Host address to bind for API connections
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on for API connections
    #[arg(long, default_value_t = 8000)]
    pub port: u16,

    /// Directory holding the persistent store
    #[arg(long, default_value = ".")]
    pub data_dir: PathBuf,

    /// Record store backend
    #[arg(long, value_enum, default_value_t = Backend::Log)]
    pub backend: Backend,

    /// Flush every append to disk before acknowledging it (log backend)
    #[arg(long)]
    pub sync: bool,

    /// Minimum severity the logger emits
    #[arg(long, default_value = "info")]
    pub log_level: Severity,
}

/// Selectable record store backends.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// Append-only on-disk log store
    Log,
    /// In-memory map persisted as a periodic JSON snapshot
    Memory,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
