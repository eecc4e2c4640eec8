// ── Emitter ──
//
// One text block per package: every section's directives in insertion
// order, then the package's commit/restart directive. The full artifact is
// the five blocks in package order, each behind a separator line.

use std::fmt::Write as _;

use serde::Serialize;
use strum::IntoEnumIterator;

use crate::builder::Builder;
use crate::uci::Subsystem;

/// Rendered blocks of one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedConfig {
    pub network: String,
    pub firewall: String,
    pub dhcp: String,
    pub wireless: String,
    pub dropbear: String,
}

impl RenderedConfig {
    pub fn block(&self, subsystem: Subsystem) -> &str {
        match subsystem {
            Subsystem::Network => &self.network,
            Subsystem::Firewall => &self.firewall,
            Subsystem::Dhcp => &self.dhcp,
            Subsystem::Wireless => &self.wireless,
            Subsystem::Dropbear => &self.dropbear,
        }
    }

    /// The single text file a box applies.
    pub fn to_artifact(&self) -> String {
        let mut out = String::with_capacity(
            Subsystem::iter().map(|s| self.block(s).len() + 32).sum(),
        );
        for subsystem in Subsystem::iter() {
            let _ = writeln!(out, "{}", separator(subsystem));
            out.push_str(self.block(subsystem));
        }
        out
    }
}

/// `/-- SEPARATOR <package> --/`
pub fn separator(subsystem: Subsystem) -> String {
    format!("/-- SEPARATOR {subsystem} --/")
}

/// Render every package of `builder`.
pub fn render(builder: &Builder) -> RenderedConfig {
    RenderedConfig {
        network: render_block(builder, Subsystem::Network),
        firewall: render_block(builder, Subsystem::Firewall),
        dhcp: render_block(builder, Subsystem::Dhcp),
        wireless: render_block(builder, Subsystem::Wireless),
        dropbear: render_block(builder, Subsystem::Dropbear),
    }
}

fn render_block(builder: &Builder, subsystem: Subsystem) -> String {
    let mut out = String::new();
    for node in builder.nodes(subsystem) {
        node.render_into(&mut out);
    }
    out.push_str(subsystem.apply_directive());
    out
}
