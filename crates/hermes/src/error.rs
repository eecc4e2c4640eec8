//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use strum::IntoEnumIterator;
use thiserror::Error;

use hermes_config::ConfigError;
use hermes_core::{BoxModel, CoreError, GatewayFamily};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Box record ───────────────────────────────────────────────────
    #[error("invalid {field} '{value}': {reason}")]
    #[diagnostic(
        code(hermes::invalid_field),
        help("Fix the value in the box record and compile again.")
    )]
    InvalidField {
        field: String,
        value: String,
        reason: String,
    },

    #[error("no {family} gateway declared for uplink VLAN {vlan}")]
    #[diagnostic(
        code(hermes::missing_gateway),
        help(
            "Add an entry for VLAN {vlan} to `wanVlans` with its {family} gateway,\n\
             or move the tenant to an uplink that has one."
        )
    )]
    MissingGateway { vlan: u16, family: GatewayFamily },

    #[error("{message}")]
    #[diagnostic(code(hermes::precondition))]
    Precondition { message: String },

    #[error("unsupported box type '{box_type}'")]
    #[diagnostic(code(hermes::box_type), help("Supported box types: {supported}"))]
    UnsupportedBoxType { box_type: String, supported: String },

    #[error("internal error: {message}")]
    #[diagnostic(
        code(hermes::internal),
        help("The box record is valid but produced an inconsistent build; please report it.")
    )]
    Internal { message: String },

    #[error("Could not parse {path} as {format}")]
    #[diagnostic(
        code(hermes::parse),
        help("Pass --input-format if the file extension does not match its contents.")
    )]
    Parse {
        path: String,
        format: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Box record {path} not found")]
    #[diagnostic(code(hermes::input_not_found))]
    InputNotFound { path: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(hermes::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Settings file already exists at {path}")]
    #[diagnostic(
        code(hermes::config_exists),
        help("Use `hermes config init --force` to overwrite it.")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(
        code(hermes::config),
        help("Check the settings file and HERMES_* environment variables.")
    )]
    Config(Box<ConfigError>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not serialize output: {0}")]
    #[diagnostic(code(hermes::serialize))]
    Serialize(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingGateway { .. } | Self::InputNotFound { .. } => exit_code::NOT_FOUND,
            Self::InvalidField { .. }
            | Self::Precondition { .. }
            | Self::UnsupportedBoxType { .. }
            | Self::Parse { .. }
            | Self::Validation { .. }
            | Self::ConfigExists { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidField {
                field,
                value,
                reason,
            } => Self::InvalidField {
                field,
                value,
                reason,
            },
            CoreError::MissingGateway { vlan, family } => Self::MissingGateway { vlan, family },
            CoreError::Precondition { message } => Self::Precondition { message },
            CoreError::UnsupportedBoxType { box_type } => Self::UnsupportedBoxType {
                box_type,
                supported: BoxModel::iter()
                    .map(|m| m.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            },
            err @ CoreError::DuplicateSection { .. } => Self::Internal {
                message: err.to_string(),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config(Box::new(other)),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}

impl From<toml::ser::Error> for CliError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}
