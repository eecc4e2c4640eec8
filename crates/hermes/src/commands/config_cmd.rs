//! Config subcommand handlers.

use std::path::PathBuf;

use hermes_config::{Config, config_path, load_config_from, save_config_to};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

/// Settings file in effect: `--config` / `HERMES_CONFIG`, else the platform path.
pub fn settings_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Settings file layered with `HERMES_*` overrides.
pub fn load_settings(global: &GlobalOpts) -> Result<Config, CliError> {
    let path = settings_path(global);
    tracing::debug!(path = %path.display(), "loading settings");
    Ok(load_config_from(&path)?)
}

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let settings = load_settings(global)?;
            let out = output::render_single(
                global.output,
                &settings,
                |c| Ok(toml::to_string_pretty(c)?),
                |c| c.output_directory().display().to_string(),
            )?;
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&settings_path(global).display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Init { force } => {
            let path = settings_path(global);
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            save_config_to(&Config::default(), &path)?;
            output::print_status(&format!("wrote {}", path.display()), global.quiet);
            Ok(())
        }
    }
}
