// ── UCI section library ──
//
// Typed sections for the five UCI packages the compiler writes to, plus the
// line writer that turns them into `uci set` / `uci add_list` directives.

pub mod attr;
pub mod dhcp;
pub mod dropbear;
pub mod firewall;
pub mod network;
pub mod node;
pub mod wireless;
mod writer;

pub use node::{Node, Ref, Section};
pub use writer::SectionWriter;

/// UCI package a section belongs to. Also fixes the block order of the artifact.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    serde::Serialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Subsystem {
    Network,
    Firewall,
    Dhcp,
    Wireless,
    Dropbear,
}

impl Subsystem {
    /// Directive appended once at the end of the subsystem's block.
    pub fn apply_directive(self) -> &'static str {
        match self {
            Self::Network => "uci commit\nservice network restart\n",
            Self::Firewall => "uci commit\nservice firewall restart\n",
            Self::Dhcp => "uci commit\nservice dnsmasq restart\n",
            Self::Wireless => "uci commit\nwifi reload\n",
            Self::Dropbear => "uci commit\nservice dropbear restart\n",
        }
    }
}
