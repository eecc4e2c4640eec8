use std::fmt::{self, Write as _};

use super::Subsystem;
use super::attr::SectionName;

/// Appends the directives of one section to a block buffer.
///
/// Option values are single-quoted. A literal `'` inside a value is written
/// as `'\''` so the directive stays one shell word.
pub struct SectionWriter<'a> {
    out: &'a mut String,
    subsystem: Subsystem,
    name: &'a SectionName,
}

impl<'a> SectionWriter<'a> {
    /// Write the `uci set <pkg>.<name>=<type>` header line.
    pub fn open(
        out: &'a mut String,
        subsystem: Subsystem,
        name: &'a SectionName,
        section_type: &str,
    ) -> Self {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "uci set {subsystem}.{name}={section_type}");
        Self {
            out,
            subsystem,
            name,
        }
    }

    pub fn set(&mut self, key: &str, value: impl fmt::Display) -> &mut Self {
        self.option("set", key, &value)
    }

    pub fn set_opt<T: fmt::Display>(&mut self, key: &str, value: Option<&T>) -> &mut Self {
        if let Some(value) = value {
            self.option("set", key, value);
        }
        self
    }

    pub fn add_list(&mut self, key: &str, value: impl fmt::Display) -> &mut Self {
        self.option("add_list", key, &value)
    }

    fn option(&mut self, verb: &str, key: &str, value: &dyn fmt::Display) -> &mut Self {
        let value = value.to_string();
        let _ = writeln!(
            self.out,
            "uci {verb} {}.{}.{key}='{}'",
            self.subsystem,
            self.name,
            value.replace('\'', r"'\''")
        );
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn writes_header_and_options() {
        let name = SectionName::new("lan_aaaaaaaa").unwrap();
        let mut out = String::new();
        SectionWriter::open(&mut out, Subsystem::Network, &name, "interface")
            .set("proto", "static")
            .set_opt::<u8>("ip6assign", None)
            .add_list("dns", "2001:db8::1");
        assert_eq!(
            out,
            "uci set network.lan_aaaaaaaa=interface\n\
             uci set network.lan_aaaaaaaa.proto='static'\n\
             uci add_list network.lan_aaaaaaaa.dns='2001:db8::1'\n"
        );
    }

    #[test]
    fn single_quotes_are_escaped() {
        let name = SectionName::new("wifi").unwrap();
        let mut out = String::new();
        SectionWriter::open(&mut out, Subsystem::Wireless, &name, "wifi-iface").set("key", "it's-a-key");
        assert!(out.ends_with("uci set wireless.wifi.key='it'\\''s-a-key'\n"));
    }
}
