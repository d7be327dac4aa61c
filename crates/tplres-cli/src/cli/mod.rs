//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "tplres",
    bin_name = "tplres",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Resolve template names across ordered template directories",
    long_about = "tplres looks a template name up in an ordered list of template \
                  directories and reports which directory answered, the version \
                  of what it found, and its content.",
    after_help = "EXAMPLES:\n\
        \x20 tplres resolve mail/welcome.ftl -s ./overrides -s ./templates\n\
        \x20 tplres resolve page.ftl --if-source fs#1 --if-version 1700000000-42\n\
        \x20 tplres list -s ./overrides -s ./templates --format json\n\
        \x20 tplres completions bash > /usr/share/bash-completion/completions/tplres",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve one template name.
    #[command(
        visible_alias = "r",
        about = "Resolve a template name",
        after_help = "EXAMPLES:\n\
            \x20 tplres resolve mail/welcome.ftl\n\
            \x20 tplres resolve mail/welcome.ftl -s ./site -s ./defaults --meta-only\n\
            \x20 tplres --output-format json resolve footer.ftl"
    )]
    Resolve(ResolveArgs),

    /// List every template and the directory that wins it.
    #[command(
        visible_alias = "ls",
        about = "List resolvable templates",
        after_help = "EXAMPLES:\n\
            \x20 tplres list\n\
            \x20 tplres list -s ./site -s ./defaults --format list"
    )]
    List(ListArgs),

    /// Initialise a tplres configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 tplres init                 # default location\n\
            \x20 tplres init -c ./tplres.toml\n\
            \x20 tplres init --force         # overwrite"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 tplres completions bash > ~/.local/share/bash-completion/completions/tplres\n\
            \x20 tplres completions zsh  > ~/.zfunc/_tplres\n\
            \x20 tplres completions fish > ~/.config/fish/completions/tplres.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the tplres configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 tplres config get sources.paths\n\
            \x20 tplres config list\n\
            \x20 tplres config path"
    )]
    Config(ConfigCommands),
}

impl Commands {
    /// Whether the command needs the configuration file loaded first.
    /// `init` creates that file and `completions` never reads it.
    pub fn reads_config(&self) -> bool {
        !matches!(self, Self::Init(_) | Self::Completions(_))
    }
}

// ── shared ────────────────────────────────────────────────────────────────────

/// Where templates are looked up.
#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Template directories, asked in the order given.  Replaces
    /// `sources.paths` from the configuration when present.
    #[arg(
        short = 's',
        long = "source",
        value_name = "DIR",
        help = "Template directory (repeatable, first wins)"
    )]
    pub sources: Vec<PathBuf>,

    /// Disable sticky resolution for this run.
    #[arg(long = "no-sticky", help = "Always scan directories in order")]
    pub no_sticky: bool,
}

// ── resolve ───────────────────────────────────────────────────────────────────

/// Arguments for `tplres resolve`.
#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Template name, e.g. `mail/welcome.ftl`.
    #[arg(value_name = "NAME", help = "Template name")]
    pub name: String,

    #[command(flatten)]
    pub sources: SourceArgs,

    /// Source identity reported by an earlier resolution.
    #[arg(
        long = "if-source",
        value_name = "ID",
        requires = "if_version",
        help = "Source of a previous resolution"
    )]
    pub if_source: Option<String>,

    /// Version reported by an earlier resolution.
    #[arg(
        long = "if-version",
        value_name = "VERSION",
        requires = "if_source",
        help = "Version of a previous resolution"
    )]
    pub if_version: Option<String>,

    /// Print only where the template was found, not its content.
    #[arg(long = "meta-only", help = "Omit the template content")]
    pub meta_only: bool,
}

// ── list ──────────────────────────────────────────────────────────────────────

/// Arguments for `tplres list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Output format.
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: ListFormat,
}

/// Output format for the `list` command.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListFormat {
    /// Human-readable table.
    Table,
    /// One name per line.
    List,
    /// JSON array.
    Json,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `tplres init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `tplres completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `tplres config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `sources.sticky`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the active configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────
