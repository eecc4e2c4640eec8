// ── Core error types ──
//
// Every error is raised while the section graph is being constructed.
// Rendering never fails: once a section exists, its fields were already
// checked by a validated attribute constructor.

use thiserror::Error;

use crate::uci::Subsystem;

/// Address family an uplink gateway was looked up for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum GatewayFamily {
    #[strum(serialize = "IPv4")]
    Ipv4,
    #[strum(serialize = "IPv6")]
    Ipv6,
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Field validation ─────────────────────────────────────────────
    #[error("invalid {field} '{value}': {reason}")]
    InvalidField {
        field: String,
        value: String,
        reason: String,
    },

    // ── Cross-reference errors ───────────────────────────────────────
    #[error("no {family} gateway declared for uplink VLAN {vlan}")]
    MissingGateway { vlan: u16, family: GatewayFamily },

    // ── Structural preconditions ─────────────────────────────────────
    #[error("precondition failed: {message}")]
    Precondition { message: String },

    #[error("duplicate {subsystem} section '{name}'")]
    DuplicateSection { subsystem: Subsystem, name: String },

    #[error("unsupported box type '{box_type}'")]
    UnsupportedBoxType { box_type: String },
}

impl CoreError {
    pub(crate) fn invalid(
        field: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    /// Re-label a field error with the full path of the offending input,
    /// e.g. `unets[aaaaaaaa].wifi.ssid` instead of `SSID`.
    #[must_use]
    pub fn at(self, path: impl Into<String>) -> Self {
        match self {
            Self::InvalidField { value, reason, .. } => Self::InvalidField {
                field: path.into(),
                value,
                reason,
            },
            other => other,
        }
    }

    /// Whether a transport should surface this error as "not found".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::MissingGateway { .. })
    }

    /// Whether the error stems from a single malformed input value.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidField { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_relabels_field_errors_only() {
        let err = CoreError::invalid("SSID", "bad ssid", "must match [A-Za-z0-9_-]{1,32}")
            .at("unets[aaaaaaaa].wifi.ssid");
        assert_eq!(
            err.to_string(),
            "invalid unets[aaaaaaaa].wifi.ssid 'bad ssid': must match [A-Za-z0-9_-]{1,32}"
        );

        let err = CoreError::MissingGateway {
            vlan: 104,
            family: GatewayFamily::Ipv4,
        }
        .at("ignored");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "no IPv4 gateway declared for uplink VLAN 104");
    }
}
