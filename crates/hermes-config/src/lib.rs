//! Operator settings for the hermes compiler.
//!
//! One TOML file plus `HERMES_*` environment overrides, layered with
//! figment and translated into `hermes_core::BuildConfig`. The core never
//! reads files or the environment itself; this crate is the only place it
//! happens.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use ipnetwork::Ipv6Network;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hermes_core::BuildConfig;
use hermes_core::uci::attr::Country;
use hermes_core::uci::dhcp::DnsServers;

/// Prefix of environment overrides; `__` separates nested keys.
pub const ENV_PREFIX: &str = "HERMES_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    fn validation(field: &str, reason: impl ToString) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.to_string(),
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level operator settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub dns: Dns,

    #[serde(default)]
    pub network: Network,

    #[serde(default)]
    pub wireless: Wireless,

    #[serde(default)]
    pub output: Output,
}

/// Resolvers handed to every tenant pool and used as dnsmasq upstreams.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Dns {
    #[serde(default = "default_dns_ipv4")]
    pub ipv4: Vec<Ipv4Addr>,

    #[serde(default = "default_dns_ipv6")]
    pub ipv6: Vec<Ipv6Addr>,
}

impl Default for Dns {
    fn default() -> Self {
        Self {
            ipv4: default_dns_ipv4(),
            ipv6: default_dns_ipv6(),
        }
    }
}

fn default_dns_ipv4() -> Vec<Ipv4Addr> {
    vec![Ipv4Addr::new(8, 8, 8, 8)]
}
fn default_dns_ipv6() -> Vec<Ipv6Addr> {
    vec![Ipv6Addr::new(0x2001, 0x4860, 0x4860, 0, 0, 0, 0, 0x8888)]
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Network {
    /// Device ULA prefix, e.g. "fdb2:b6c0:8430::/48".
    #[serde(default = "default_ula_prefix")]
    pub ula_prefix: String,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            ula_prefix: default_ula_prefix(),
        }
    }
}

fn default_ula_prefix() -> String {
    "fdb2:b6c0:8430::/48".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Wireless {
    /// ISO 3166-1 alpha-2 regulatory domain of both radios.
    #[serde(default = "default_country")]
    pub country: String,
}

impl Default for Wireless {
    fn default() -> Self {
        Self {
            country: default_country(),
        }
    }
}

fn default_country() -> String {
    "FR".into()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Output {
    /// Where `--save` writes artifacts. Current directory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Config {
    /// Validate and convert into the core's runtime configuration.
    pub fn to_build_config(&self) -> Result<BuildConfig, ConfigError> {
        if self.dns.ipv4.is_empty() && self.dns.ipv6.is_empty() {
            return Err(ConfigError::validation(
                "dns",
                "at least one resolver is required",
            ));
        }

        let ula_prefix: Ipv6Network = self
            .network
            .ula_prefix
            .parse()
            .map_err(|e| ConfigError::validation("network.ula_prefix", e))?;
        if ula_prefix.ip().segments()[0] & 0xfe00 != 0xfc00 {
            return Err(ConfigError::validation(
                "network.ula_prefix",
                format!("{ula_prefix} is not inside fc00::/7"),
            ));
        }

        let country = Country::new(self.wireless.country.as_str())
            .map_err(|e| ConfigError::validation("wireless.country", e))?;

        Ok(BuildConfig {
            dns: DnsServers {
                ipv4: self.dns.ipv4.clone(),
                ipv6: self.dns.ipv6.clone(),
            },
            ula_prefix,
            country,
            ..BuildConfig::default()
        })
    }

    /// Directory `--save` writes into.
    pub fn output_directory(&self) -> PathBuf {
        self.output
            .directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("net", "rezel", "hermes").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("hermes");
    p
}

// ── Config loading ──────────────────────────────────────────────────

fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load settings from the canonical path plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load settings from `path` plus environment. A missing file is not an
/// error: defaults and environment still apply.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment(path).extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_match_the_core() {
        let built = Config::default().to_build_config().unwrap();
        assert_eq!(built, BuildConfig::default());
    }

    #[test]
    fn file_then_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "hermes.toml",
                r#"
                [dns]
                ipv4 = ["1.1.1.1", "9.9.9.9"]

                [wireless]
                country = "BE"
                "#,
            )?;
            jail.set_env("HERMES_WIRELESS__COUNTRY", "DE");
            jail.set_env("HERMES_OUTPUT__DIRECTORY", "/srv/hermes");

            let config = load_config_from(Path::new("hermes.toml")).unwrap();
            assert_eq!(
                config.dns.ipv4,
                [Ipv4Addr::new(1, 1, 1, 1), Ipv4Addr::new(9, 9, 9, 9)]
            );
            // Untouched keys keep their defaults.
            assert_eq!(config.dns.ipv6, default_dns_ipv6());
            assert_eq!(config.wireless.country, "DE");
            assert_eq!(config.output_directory(), PathBuf::from("/srv/hermes"));
            Ok(())
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_| {
            let config = load_config_from(Path::new("absent.toml")).unwrap();
            assert_eq!(config, Config::default());
            assert_eq!(config.output_directory(), PathBuf::from("."));
            Ok(())
        });
    }

    #[test]
    fn malformed_addresses_fail_extraction() {
        Jail::expect_with(|jail| {
            jail.create_file("hermes.toml", "[dns]\nipv4 = [\"not-an-ip\"]\n")?;
            let err = load_config_from(Path::new("hermes.toml")).unwrap_err();
            assert!(matches!(err, ConfigError::Figment(_)), "{err}");
            Ok(())
        });
    }

    #[test]
    fn rejects_lowercase_country() {
        let mut config = Config::default();
        config.wireless.country = "fr".into();
        let err = config.to_build_config().unwrap_err();
        assert!(
            err.to_string().starts_with("invalid wireless.country:"),
            "{err}"
        );
    }

    #[test]
    fn rejects_global_ula_prefix() {
        let mut config = Config::default();
        config.network.ula_prefix = "2001:db8::/48".into();
        let err = config.to_build_config().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid network.ula_prefix: 2001:db8::/48 is not inside fc00::/7"
        );

        config.network.ula_prefix = "fdb2::/129".into();
        assert!(config.to_build_config().is_err());
    }

    #[test]
    fn rejects_empty_resolvers() {
        let mut config = Config::default();
        config.dns.ipv4.clear();
        config.dns.ipv6.clear();
        assert!(matches!(
            config.to_build_config(),
            Err(ConfigError::Validation { field, .. }) if field == "dns"
        ));
    }
}
