//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// speedway asset-delivery optimizer
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: speedway.toml)
    #[arg(short = 'C', long, default_value = "speedway.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve the document root with every optimization applied
    #[command(visible_alias = "s")]
    Serve {
        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<std::net::IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Document root (overrides [site].root)
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        root: Option<PathBuf>,
    },

    /// Write .min.css / .min.js next to stylesheets and scripts
    #[command(visible_alias = "m")]
    Minify {
        #[command(flatten)]
        args: MinifyArgs,
    },

    /// Post-process uploaded images and write WebP / AVIF derivatives
    #[command(visible_alias = "o")]
    Optimize {
        #[command(flatten)]
        args: OptimizeArgs,
    },

    /// Print the device class for a user agent
    #[command(visible_alias = "c")]
    Classify {
        /// User agent string. Use `-` to read one per line from stdin.
        user_agent: String,
    },
}

/// Minify command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct MinifyArgs {
    /// Files or directories to minify. Defaults to the document root.
    /// Use `-` to read paths from stdin.
    #[arg(value_name = "PATH", value_hint = clap::ValueHint::AnyPath)]
    pub paths: Vec<PathBuf>,

    /// Use the syntax-aware engine (oxc / lightningcss)
    #[arg(short, long)]
    pub syntax: bool,
}

/// Optimize command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct OptimizeArgs {
    /// Images or directories to process. Defaults to the document root.
    /// Use `-` to read paths from stdin.
    #[arg(value_name = "PATH", value_hint = clap::ValueHint::AnyPath)]
    pub paths: Vec<PathBuf>,

    /// Treat inputs as generated sizes: only write derivatives, with quality
    /// picked from the pixel count
    #[arg(short, long)]
    pub derivatives: bool,

    /// Skip AVIF output
    #[arg(long)]
    pub no_avif: bool,
}
