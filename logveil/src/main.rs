// logveil/src/main.rs
//! logveil command-line entry point.
//!
//! License: MIT OR APACHE 2.0

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use log::{debug, LevelFilter};

use logveil::cli::{Cli, Commands};
use logveil::commands;

fn init_diagnostics(cli: &Cli) {
    let mut builder = env_logger::Builder::from_default_env();
    if cli.quiet {
        builder.filter_level(LevelFilter::Off);
    } else if cli.debug {
        builder
            .filter_module("logveil", LevelFilter::Debug)
            .filter_module("logveil_core", LevelFilter::Debug);
    } else if std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(LevelFilter::Warn);
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn run(cli: &Cli) -> Result<ExitCode> {
    match &cli.command {
        Commands::Filter(cmd) => commands::filter::run(cmd)?,
        Commands::Check(cmd) => {
            if !commands::check::run(cmd)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Patterns(cmd) => commands::patterns::run(cmd)?,
        Commands::Log(cmd) => commands::emit::run(cmd)?,
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_diagnostics(&cli);
    debug!("Parsed arguments: {:?}", cli);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
