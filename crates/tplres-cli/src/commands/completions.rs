//! Shell completion generation.

use std::io;

use clap::CommandFactory;
use clap_complete::{Generator, generate, shells};

use crate::cli::{Cli, CompletionsArgs, Shell};

const BIN: &str = "tplres";

pub fn execute(args: CompletionsArgs) -> crate::error::CliResult<()> {
    match args.shell {
        Shell::Bash => emit(shells::Bash),
        Shell::Zsh => emit(shells::Zsh),
        Shell::Fish => emit(shells::Fish),
        Shell::PowerShell => emit(shells::PowerShell),
        Shell::Elvish => emit(shells::Elvish),
    }
    Ok(())
}

fn emit(shell: impl Generator) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, BIN, &mut io::stdout());
}
