//! Command-line interface definition.
//!
//! Global flags mirror the configuration document keys (`--root`, `--out`)
//! so the merge in [`crate::config`] can treat flags as the strongest layer.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// philtographer - code graph & impact analysis for TypeScript monorepos
#[derive(Parser, Debug)]
#[command(
    name = "philtographer",
    version,
    about = "Code graph & impact analysis for TypeScript monorepos",
    long_about = "Builds and maintains a directed dependency graph of a \
                  TypeScript/JavaScript source tree, with entry-driven and \
                  JSX-aware component variants, an incremental watch mode, \
                  and a live visualization server."
)]
pub struct Cli {
    /// Config file (default: ./philtographer.config.{json,yaml,toml})
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Workspace root to scan
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Write the graph document to a file instead of stdout
    #[arg(long, global = true, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan the whole workspace and output the dependency graph
    Scan(ScanArgs),

    /// Discover entry points from config and build the reachable closure
    Entries(EntriesArgs),

    /// Build a React component graph (JSX-only edges) from entries
    Components(ComponentsArgs),

    /// Print nodes with no inbound or outbound edges from a graph document
    Isolated(IsolatedArgs),

    /// Watch source files, rebuild the graph, and emit impacted nodes
    Watch(WatchArgs),

    /// Serve a local UI for viewing the graph as a force-directed layout
    Ui(UiArgs),
}

#[derive(Args, Debug)]
pub struct ScanArgs {}

#[derive(Args, Debug)]
pub struct EntriesArgs {
    /// Print discovered entries and exit without building
    #[arg(long)]
    pub print_entries: bool,
}

#[derive(Args, Debug)]
pub struct ComponentsArgs {}

#[derive(Args, Debug)]
pub struct IsolatedArgs {
    /// Path to the graph document to analyze
    #[arg(long, value_name = "FILE")]
    pub graph: PathBuf,
}

/// Which builder the watcher runs after each change batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum WatchMode {
    #[default]
    Scan,
    Components,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Build mode run on each change batch
    #[arg(long, value_enum, default_value = "scan")]
    pub mode: WatchMode,

    /// Output graph document path
    #[arg(long, value_name = "FILE")]
    pub graph: PathBuf,

    /// Output events document path (default: events.json next to --graph)
    #[arg(long, value_name = "FILE")]
    pub events: Option<PathBuf>,

    /// Write only the affected subgraph to --graph after each change
    #[arg(long)]
    pub affected_only: bool,
}

#[derive(Args, Debug)]
pub struct UiArgs {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080", value_name = "ADDR")]
    pub addr: String,

    /// Path to the graph document served at /graph.json
    #[arg(long, value_name = "FILE")]
    pub graph: PathBuf,

    /// Path to the events document served at /events.json
    /// (default: <graph>-events.json)
    #[arg(long, value_name = "FILE")]
    pub events: Option<PathBuf>,
}
