//! `tplres`: resolve template names across an ordered list of template
//! directories.
//!
//! Exit codes: 0 success, 1 internal failure, 2 bad input, 3 template not
//! found, 4 configuration problem.

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info, instrument};

use crate::{
    cli::{Cli, Commands},
    config::AppConfig,
    error::{CliError, CliResult},
    logging::init_logging,
    output::OutputManager,
};

mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod output;

fn main() -> ExitCode {
    // `.env` may set TPLRES_* and RUST_LOG, so it goes first.
    let _ = dotenvy::dotenv();

    // --help and --version also come back as Err, printed to stdout.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(e) = init_logging(&cli.global) {
        eprintln!("Failed to initialise logging: {e}");
        return ExitCode::from(1);
    }
    debug!(command = ?cli.command, "tplres started");

    let (verbose, color) = (cli.global.verbose > 0, !cli.global.no_color);

    // `init` and `completions` must work before any config file exists.
    let config = if cli.command.reads_config() {
        match AppConfig::load(cli.global.config.as_ref()) {
            Ok(cfg) => cfg,
            Err(e) => {
                let err = CliError::ConfigError {
                    message: format!("{e:#}"),
                    source: Some(e.into()),
                };
                return handle_error(err, verbose, color);
            }
        }
    } else {
        AppConfig::default()
    };

    let output = OutputManager::new(&cli.global, &config);
    match run(cli, config, output) {
        Ok(()) => {
            info!("done");
            ExitCode::SUCCESS
        }
        Err(e) => handle_error(e, verbose, color),
    }
}

#[instrument(skip_all)]
fn run(cli: Cli, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let config_file = cli.global.config.as_ref();
    match cli.command {
        Commands::Resolve(cmd) => commands::resolve::execute(cmd, config, output),
        Commands::List(cmd) => commands::list::execute(cmd, config, output),
        Commands::Init(cmd) => commands::init::execute(cmd, config_file, output),
        Commands::Completions(cmd) => commands::completions::execute(cmd),
        Commands::Config(cmd) => commands::config::execute(cmd, config_file, config, output),
    }
}

/// Log `err`, print it with suggestions to stderr, and pick the exit code.
fn handle_error(err: CliError, verbose: bool, color: bool) -> ExitCode {
    err.log();

    let msg = if color && std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        err.format_colored(verbose)
    } else {
        err.format_plain(verbose)
    };
    eprint!("{msg}");

    ExitCode::from(err.exit_code())
}

// ── tests ─────────────────────────────────────────────────────────────────────
