//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

/// Dependency-ordered module bundler with a live-reload dev server
#[derive(Parser, Debug, Clone)]
#[command(name = "swarm", version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: swarm.toml, searched upward)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve the bundle, rebuilding and reloading on every change
    #[command(visible_alias = "s")]
    Serve {
        #[command(flatten)]
        target: TargetArgs,

        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Disable the reload websocket and script injection
        #[arg(long)]
        no_reload: bool,
    },

    /// Bundle once and exit
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        target: TargetArgs,

        /// Write the bundle here instead of stdout (`-` for stdout)
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,
    },
}

/// Workspace and entry overrides shared by Build and Serve
#[derive(clap::Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Workspace root directory
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Entry specifier, resolved against the workspace root
    #[arg(short, long)]
    pub entry: Option<String>,
}
