//! Clap derive structures for the `hermes` CLI.
//!
//! Defines the command tree, global flags, and shared types. Kept free of
//! crate-internal imports so `build.rs` can include it for man pages.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// hermes -- compile box records into UCI configuration artifacts
#[derive(Debug, Parser)]
#[command(
    name = "hermes",
    version,
    about = "Compile multi-tenant router configuration into UCI artifacts",
    long_about = "Reads a box record (one router and the tenant networks it hosts)\n\
        and writes the single text artifact the router applies: uci directives\n\
        for network, firewall, dhcp, wireless and dropbear.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Settings file (defaults to the platform config path)
    #[arg(long, env = "HERMES_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format for reports
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

/// Encoding of a box record on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    Json,
    Yaml,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compile a box record into its configuration artifact
    #[command(alias = "c")]
    Compile(CompileArgs),

    /// Build the default artifact of a box model, without tenants
    Default(DefaultArgs),

    /// Validate a box record and print its tenant plan
    Check(CheckArgs),

    /// Inspect or initialise operator settings
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Arguments ─────────────────────────────────────────────────

/// Box record to read.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// Box record file (JSON or YAML); `-` reads stdin
    pub box_file: PathBuf,

    /// Input encoding (default: guessed from the file extension)
    #[arg(long, value_enum)]
    pub input_format: Option<InputFormat>,
}

/// Where an artifact goes. Stdout when neither flag is given.
#[derive(Debug, Args)]
pub struct Destination {
    /// Write the artifact to this file
    #[arg(long, conflicts_with = "save")]
    pub out: Option<PathBuf>,

    /// Write the artifact under its canonical name in the output directory
    #[arg(long)]
    pub save: bool,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompileArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub dest: Destination,
}

#[derive(Debug, Args)]
pub struct DefaultArgs {
    /// Box model
    #[arg(long, default_value = "ac2350")]
    pub box_type: String,

    #[command(flatten)]
    pub dest: Destination,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective settings (file + environment)
    Show,

    /// Print the settings file path
    Path,

    /// Write a settings file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
