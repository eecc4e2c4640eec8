// ── firewall package ──

use std::net::Ipv4Addr;

use ipnetwork::{IpNetwork, Ipv4Network};

use super::Subsystem;
use super::attr::{
    Description, Family, IcmpType, MatchIpSet, Protocol, SectionName, TcpUdpPort, Target,
    ZonePolicy,
};
use super::network::Interface;
use super::node::{Ref, Section};
use super::writer::SectionWriter;
use crate::error::CoreError;

// ── Defaults ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Defaults {
    name: SectionName,
}

impl Defaults {
    pub fn new() -> Self {
        Self {
            name: SectionName::from_static("defaults"),
        }
    }
}

impl Default for Defaults {
    fn default() -> Self {
        Self::new()
    }
}

impl Section for Defaults {
    const SUBSYSTEM: Subsystem = Subsystem::Firewall;

    fn name(&self) -> &SectionName {
        &self.name
    }

    fn section_type(&self) -> &'static str {
        "defaults"
    }

    fn write_options(&self, w: &mut SectionWriter<'_>) {
        w.set("synflood_protect", 1).set("flow_offloading", 1);
    }
}

// ── Zone ────────────────────────────────────────────────────────────

/// Firewall zone wrapping exactly one interface; named `zone_<interface>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    name: SectionName,
    network: Ref<Interface>,
    input: ZonePolicy,
    output: ZonePolicy,
    forward: ZonePolicy,
    family: Option<Family>,
}

impl Zone {
    pub fn new(
        network: Ref<Interface>,
        input: ZonePolicy,
        output: ZonePolicy,
        forward: ZonePolicy,
    ) -> Self {
        Self {
            name: SectionName::join(&[&"zone", network.name()]),
            network,
            input,
            output,
            forward,
            family: None,
        }
    }

    pub fn with_family(mut self, family: Family) -> Self {
        self.family = Some(family);
        self
    }
}

impl Section for Zone {
    const SUBSYSTEM: Subsystem = Subsystem::Firewall;

    fn name(&self) -> &SectionName {
        &self.name
    }

    fn section_type(&self) -> &'static str {
        "zone"
    }

    fn write_options(&self, w: &mut SectionWriter<'_>) {
        w.set("name", &self.name)
            .set("network", &self.network)
            .set("input", self.input)
            .set("output", self.output)
            .set("forward", self.forward)
            .set_opt("family", self.family.as_ref());
    }

    fn references(&self) -> Vec<(Subsystem, &SectionName)> {
        vec![self.network.target()]
    }
}

// ── Rule ────────────────────────────────────────────────────────────

/// Traffic rule (`config rule`). Zones, addresses and ports are all optional
/// matches; leaving `dest` unset makes it an input rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    name: SectionName,
    desc: Description,
    proto: Protocol,
    target: Target,
    family: Family,
    src: Option<Ref<Zone>>,
    src_ip: Option<IpNetwork>,
    src_port: Option<TcpUdpPort>,
    dest: Option<Ref<Zone>>,
    dest_ip: Option<IpNetwork>,
    dest_port: Option<TcpUdpPort>,
    icmp_type: Option<IcmpType>,
}

impl Rule {
    pub fn new(
        name: SectionName,
        desc: Description,
        proto: Protocol,
        target: Target,
        family: Family,
    ) -> Self {
        Self {
            name,
            desc,
            proto,
            target,
            family,
            src: None,
            src_ip: None,
            src_port: None,
            dest: None,
            dest_ip: None,
            dest_port: None,
            icmp_type: None,
        }
    }

    pub fn src_zone(mut self, zone: Ref<Zone>) -> Self {
        self.src = Some(zone);
        self
    }

    pub fn src_ip(mut self, ip: IpNetwork) -> Self {
        self.src_ip = Some(ip);
        self
    }

    pub fn src_port(mut self, port: TcpUdpPort) -> Self {
        self.src_port = Some(port);
        self
    }

    pub fn dest_zone(mut self, zone: Ref<Zone>) -> Self {
        self.dest = Some(zone);
        self
    }

    pub fn dest_ip(mut self, ip: IpNetwork) -> Self {
        self.dest_ip = Some(ip);
        self
    }

    pub fn dest_port(mut self, port: TcpUdpPort) -> Self {
        self.dest_port = Some(port);
        self
    }

    pub fn icmp_type(mut self, icmp_type: IcmpType) -> Self {
        self.icmp_type = Some(icmp_type);
        self
    }
}

impl Section for Rule {
    const SUBSYSTEM: Subsystem = Subsystem::Firewall;

    fn name(&self) -> &SectionName {
        &self.name
    }

    fn section_type(&self) -> &'static str {
        "rule"
    }

    fn write_options(&self, w: &mut SectionWriter<'_>) {
        w.set("name", &self.desc)
            .set("proto", &self.proto)
            .set("target", self.target)
            .set("family", self.family)
            .set_opt("src", self.src.as_ref())
            .set_opt("src_ip", self.src_ip.as_ref())
            .set_opt("src_port", self.src_port.as_ref())
            .set_opt("dest", self.dest.as_ref())
            .set_opt("dest_ip", self.dest_ip.as_ref())
            .set_opt("dest_port", self.dest_port.as_ref())
            .set_opt("icmp_type", self.icmp_type.as_ref());
    }

    fn references(&self) -> Vec<(Subsystem, &SectionName)> {
        self.src
            .iter()
            .chain(self.dest.iter())
            .map(Ref::target)
            .collect()
    }
}

// ── Redirect ────────────────────────────────────────────────────────

/// IPv4 port forward (DNAT) from a WAN zone to a host in a LAN zone.
#[derive(Debug, Clone, PartialEq)]
pub struct Redirect {
    name: SectionName,
    desc: Description,
    src: Ref<Zone>,
    src_dport: TcpUdpPort,
    dest: Ref<Zone>,
    dest_ip: Ipv4Addr,
    dest_port: TcpUdpPort,
    proto: Protocol,
    src_dip: Option<Ipv4Addr>,
    src_ip: Option<Ipv4Network>,
}

/// Where a DNAT redirect lands.
#[derive(Debug, Clone, PartialEq)]
pub struct RedirectTarget {
    pub zone: Ref<Zone>,
    pub ip: Ipv4Addr,
    pub port: TcpUdpPort,
}

impl Redirect {
    pub fn dnat(
        name: SectionName,
        desc: Description,
        src: Ref<Zone>,
        src_dport: TcpUdpPort,
        dest: RedirectTarget,
        proto: Protocol,
    ) -> Self {
        Self {
            name,
            desc,
            src,
            src_dport,
            dest: dest.zone,
            dest_ip: dest.ip,
            dest_port: dest.port,
            proto,
            src_dip: None,
            src_ip: None,
        }
    }

    /// Only match traffic addressed to this external address.
    pub fn src_dip(mut self, src_dip: Ipv4Addr) -> Self {
        self.src_dip = Some(src_dip);
        self
    }

    /// Only match traffic coming from this network.
    pub fn src_ip(mut self, src_ip: Ipv4Network) -> Self {
        self.src_ip = Some(src_ip);
        self
    }
}

impl Section for Redirect {
    const SUBSYSTEM: Subsystem = Subsystem::Firewall;

    fn name(&self) -> &SectionName {
        &self.name
    }

    fn section_type(&self) -> &'static str {
        "redirect"
    }

    fn write_options(&self, w: &mut SectionWriter<'_>) {
        w.set("name", &self.desc)
            .set("target", "DNAT")
            .set("src", &self.src)
            .set("src_dport", self.src_dport)
            .set("dest", &self.dest)
            .set("dest_ip", self.dest_ip)
            .set("dest_port", self.dest_port)
            .set("proto", &self.proto)
            .set_opt("src_dip", self.src_dip.as_ref())
            .set_opt("src_ip", self.src_ip.as_ref());
    }

    fn references(&self) -> Vec<(Subsystem, &SectionName)> {
        vec![self.src.target(), self.dest.target()]
    }
}

// ── Forwarding ──────────────────────────────────────────────────────

/// Zone-to-zone forwarding, optionally restricted to an ipset.
#[derive(Debug, Clone, PartialEq)]
pub struct Forwarding {
    name: SectionName,
    src: Ref<Zone>,
    dest: Ref<Zone>,
    ipset: Option<Ref<Ipset>>,
}

impl Forwarding {
    /// Named `forwarding_<src>_<dest>`.
    pub fn new(src: Ref<Zone>, dest: Ref<Zone>) -> Self {
        Self {
            name: SectionName::join(&[&"forwarding", src.name(), dest.name()]),
            src,
            dest,
            ipset: None,
        }
    }

    /// Named `forwarding_<src>_<dest>_<ipset>`; only traffic matching the
    /// set is forwarded.
    pub fn through_ipset(src: Ref<Zone>, dest: Ref<Zone>, ipset: Ref<Ipset>) -> Self {
        Self {
            name: SectionName::join(&[&"forwarding", src.name(), dest.name(), ipset.name()]),
            src,
            dest,
            ipset: Some(ipset),
        }
    }
}

impl Section for Forwarding {
    const SUBSYSTEM: Subsystem = Subsystem::Firewall;

    fn name(&self) -> &SectionName {
        &self.name
    }

    fn section_type(&self) -> &'static str {
        "forwarding"
    }

    fn write_options(&self, w: &mut SectionWriter<'_>) {
        w.set("src", &self.src)
            .set("dest", &self.dest)
            .set_opt("ipset", self.ipset.as_ref());
    }

    fn references(&self) -> Vec<(Subsystem, &SectionName)> {
        let mut refs = vec![self.src.target(), self.dest.target()];
        refs.extend(self.ipset.iter().map(Ref::target));
        refs
    }
}

// ── Snat ────────────────────────────────────────────────────────────

/// Source NAT of a LAN behind the WAN address.
///
/// Both sides come from the interfaces themselves: the source match is the
/// LAN interface's own network and the rewritten address is the WAN
/// interface's own address.
#[derive(Debug, Clone, PartialEq)]
pub struct Snat {
    name: SectionName,
    lan: Ref<Interface>,
    wan: Ref<Interface>,
    snat_ip: Ipv4Addr,
    lan_network: Ipv4Network,
}

impl Snat {
    pub fn new(lan: &Interface, wan: &Interface) -> Result<Self, CoreError> {
        let lan_address = lan.ipv4().ok_or_else(|| {
            CoreError::precondition(format!(
                "cannot NAT from interface '{}': it has no IPv4 address",
                lan.name()
            ))
        })?;
        let wan_address = wan.ipv4().ok_or_else(|| {
            CoreError::precondition(format!(
                "cannot NAT to interface '{}': it has no IPv4 address",
                wan.name()
            ))
        })?;
        let lan_network = Ipv4Network::new(lan_address.network(), lan_address.prefix())
            .map_err(|e| CoreError::invalid("IPv4Network", lan_address, e.to_string()))?;

        Ok(Self {
            name: SectionName::join(&[&"nat", lan.name(), &"to", wan.name()]),
            lan: lan.handle(),
            wan: wan.handle(),
            snat_ip: wan_address.ip(),
            lan_network,
        })
    }
}

impl Section for Snat {
    const SUBSYSTEM: Subsystem = Subsystem::Firewall;

    fn name(&self) -> &SectionName {
        &self.name
    }

    fn section_type(&self) -> &'static str {
        "nat"
    }

    fn write_options(&self, w: &mut SectionWriter<'_>) {
        w.set("name", &self.name)
            .set("target", "SNAT")
            .set("snat_ip", self.snat_ip)
            .set("src_ip", self.lan_network)
            .set("proto", "all");
    }

    fn references(&self) -> Vec<(Subsystem, &SectionName)> {
        vec![self.lan.target(), self.wan.target()]
    }
}

// ── Ipset ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Ipset {
    name: SectionName,
    matches: MatchIpSet,
    family: Family,
    entries: Vec<IpNetwork>,
}

impl Ipset {
    pub fn new(name: SectionName, matches: MatchIpSet, family: Family, entries: Vec<IpNetwork>) -> Self {
        Self {
            name,
            matches,
            family,
            entries,
        }
    }

    pub fn entries(&self) -> &[IpNetwork] {
        &self.entries
    }
}

impl Section for Ipset {
    const SUBSYSTEM: Subsystem = Subsystem::Firewall;

    fn name(&self) -> &SectionName {
        &self.name
    }

    fn section_type(&self) -> &'static str {
        "ipset"
    }

    fn write_options(&self, w: &mut SectionWriter<'_>) {
        w.set("name", &self.name)
            .set("match", &self.matches)
            .set("family", self.family);
        for entry in &self.entries {
            w.add_list("entry", entry);
        }
    }
}
