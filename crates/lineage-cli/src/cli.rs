//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lineage_core::InheritanceMode;

/// Lineage - inspect and version inheriting entity definitions
#[derive(Parser, Debug)]
#[command(name = "lineage")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Workspace root holding lineage.toml and the definitions directory
    #[arg(long, global = true, default_value = ".", env = "LINEAGE_ROOT")]
    pub root: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Resolve the effective value of a field
    ///
    /// Examples:
    ///   lineage resolve build steps
    ///   lineage resolve build scm --mode local-only
    ///   lineage resolve build steps --pin base=3 --pin mid=1
    Resolve {
        entity: String,
        field: String,

        /// Inheritance mode (auto, local-only, inherit-forced)
        #[arg(long)]
        mode: Option<InheritanceMode>,

        /// Pin an entity to a version, as name=id
        #[arg(long = "pin", value_name = "NAME=ID")]
        pins: Vec<String>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// List parents, children and mates of an entity
    Relations {
        entity: String,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Report whether an entity can be built
    Check { entity: String },

    /// List the versions of an entity
    Versions { entity: String },

    /// Commit the current definition of an entity as a new version
    Commit {
        entity: String,

        /// Version description
        #[arg(short, long, default_value = "")]
        message: String,

        /// Author recorded on the version (defaults to the configured author)
        #[arg(long)]
        author: Option<String>,
    },

    /// Mark a version as stable
    Stable {
        entity: String,
        id: u64,

        /// Clear the stable flag instead
        #[arg(long)]
        unset: bool,
    },

    /// Rename an entity and every reference to it
    Rename { old: String, new: String },

    /// Generate the transient variants of an entity
    Variants { entity: String },
}
