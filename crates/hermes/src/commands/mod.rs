//! Subcommand handlers.

pub mod check;
pub mod compile;
pub mod config_cmd;
pub mod default;

use std::io::{self, Write};
use std::path::PathBuf;

use tracing::info;

use hermes_config::Config;

use crate::cli::{Command, Destination, GlobalOpts};
use crate::error::CliError;
use crate::output;

/// Route a command that needs operator settings to its handler.
pub fn dispatch(cmd: &Command, global: &GlobalOpts, settings: &Config) -> Result<(), CliError> {
    match cmd {
        Command::Compile(args) => compile::handle(args, global, settings),
        Command::Default(args) => default::handle(args, global, settings),
        Command::Check(args) => check::handle(args, global, settings),
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}

/// Write an artifact where `dest` says: a given file, the output directory
/// under `canonical_name`, or stdout.
pub fn write_artifact(
    artifact: &str,
    dest: &Destination,
    canonical_name: &str,
    settings: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let path: PathBuf = if let Some(path) = &dest.out {
        path.clone()
    } else if dest.save {
        settings.output_directory().join(canonical_name)
    } else {
        let mut stdout = io::stdout().lock();
        stdout.write_all(artifact.as_bytes())?;
        stdout.flush()?;
        return Ok(());
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, artifact)?;
    info!(path = %path.display(), bytes = artifact.len(), "artifact written");

    let color = output::should_color(global.color);
    output::print_status(
        &format!("wrote {}", output::accent(&path.display().to_string(), color)),
        global.quiet,
    );
    Ok(())
}
