// ── dropbear package ──

use super::Subsystem;
use super::attr::{SectionName, TcpUdpPort};
use super::node::Section;
use super::writer::SectionWriter;

/// SSH daemon: key-only authentication.
#[derive(Debug, Clone, PartialEq)]
pub struct Dropbear {
    name: SectionName,
    port: TcpUdpPort,
}

impl Dropbear {
    pub fn new(port: TcpUdpPort) -> Self {
        Self {
            name: SectionName::from_static("dropbear"),
            port,
        }
    }
}

impl Section for Dropbear {
    const SUBSYSTEM: Subsystem = Subsystem::Dropbear;

    fn name(&self) -> &SectionName {
        &self.name
    }

    fn section_type(&self) -> &'static str {
        "dropbear"
    }

    fn write_options(&self, w: &mut SectionWriter<'_>) {
        w.set("PasswordAuth", "off")
            .set("RootPasswordAuth", "off")
            .set("Port", self.port);
    }
}
