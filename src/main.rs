//! speedway command-line entry point.

use anyhow::Result;
use clap::{ColorChoice, Parser};
use speedway::cli::{self, Cli, Commands};
use speedway::config::{Config, init_config};
use speedway::{core, logger, serve};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    // Classification needs no project
    if let Commands::Classify { user_agent } = &cli.command {
        return cli::classify::classify_agents(user_agent);
    }

    let config = init_config(Config::load(&cli)?);

    match &cli.command {
        Commands::Serve { .. } => serve::serve(),
        Commands::Minify { args } => cli::minify::minify_files(args, &config),
        Commands::Optimize { args } => cli::optimize::optimize_images(args, &config),
        Commands::Classify { user_agent } => cli::classify::classify_agents(user_agent),
    }
}
