use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use config_plane_core::DEFAULT_BRANCH;

#[derive(Parser, Debug)]
#[command(name = "config-plane", version, about = "Branched, versioned configuration store")]
pub struct Cli {
    #[command(flatten)]
    pub backend: BackendArgs,

    /// Branch to operate on.
    #[arg(long, global = true, default_value = DEFAULT_BRANCH)]
    pub branch: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct BackendArgs {
    /// Which storage backend to use.
    #[arg(long, value_enum, default_value_t = Backend::Memory)]
    pub backend: Backend,

    /// SQLite file path (required for `--backend sql`).
    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Working tree path (required for `--backend vcs`).
    #[arg(long)]
    pub repo_path: Option<PathBuf>,

    /// Remote URL to clone/push/fetch from (optional for `--backend vcs`).
    #[arg(long)]
    pub remote: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Backend {
    Memory,
    Sql,
    Vcs,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the value of a key, or nothing if it's absent.
    Get { key: String },

    /// Stage a write (or, with `--delete`, a tombstone) for a key.
    Set {
        key: String,
        value: Option<String>,
        #[arg(long, conflicts_with = "value")]
        delete: bool,
    },

    /// Freeze the stage into a new committed snapshot.
    Commit,

    /// List every known branch.
    Branches,

    /// Create a new branch pointing at another branch's current head.
    Branch {
        name: String,
        #[arg(long)]
        from: Option<String>,
    },

    /// Switch to a different branch.
    Switch { name: String },

    /// Merge another branch's state into the current branch.
    Merge { source: String },

    /// Poll one or more keys on an interval, logging each one whenever it
    /// changes.
    Watch {
        #[arg(long = "key", required = true)]
        key: Vec<String>,
        #[arg(long, default_value_t = 5)]
        poll_interval: u64,
    },
}
