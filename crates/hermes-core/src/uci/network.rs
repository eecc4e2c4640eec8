// ── network package ──

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use ipnetwork::{Ipv4Network, Ipv6Network};

use super::attr::{DeviceName, InterfaceProto, NetworkPorts, RouteTable, SectionName, VlanId};
use super::node::{Ref, Section};
use super::writer::SectionWriter;
use super::Subsystem;

// ── Interface ───────────────────────────────────────────────────────

/// A logical interface (`config interface`).
///
/// The IPv4 side is an address with its prefix (`ipaddr` + `netmask`). The
/// IPv6 side is either an upstream address with gateway and delegated
/// prefix, or an `ip6class`/`ip6assign` pair that makes the device carve a
/// downstream prefix out of another interface's delegation.
#[derive(Debug, Clone, PartialEq)]
pub struct Interface {
    name: SectionName,
    proto: InterfaceProto,
    ipv4: Option<Ipv4Network>,
    device: Option<DeviceName>,
    ip6addr: Option<Ipv6Network>,
    ip6gw: Option<Ipv6Addr>,
    ip6prefix: Option<Ipv6Network>,
    ip6class: Option<Ref<Interface>>,
    ip6assign: Option<u8>,
}

impl Interface {
    pub fn new(name: SectionName, proto: InterfaceProto) -> Self {
        Self {
            name,
            proto,
            ipv4: None,
            device: None,
            ip6addr: None,
            ip6gw: None,
            ip6prefix: None,
            ip6class: None,
            ip6assign: None,
        }
    }

    pub fn with_ipv4(mut self, address: Ipv4Network) -> Self {
        self.ipv4 = Some(address);
        self
    }

    pub fn with_device(mut self, device: DeviceName) -> Self {
        self.device = Some(device);
        self
    }

    /// Upstream IPv6: interface address, default router and the prefix
    /// routed to this interface for downstream assignment.
    pub fn with_ipv6_uplink(
        mut self,
        address: Ipv6Network,
        gateway: Ipv6Addr,
        delegated: Option<Ipv6Network>,
    ) -> Self {
        self.ip6addr = Some(address);
        self.ip6gw = Some(gateway);
        self.ip6prefix = delegated;
        self
    }

    /// Downstream IPv6: take a `/assign` out of `source`'s delegated prefix.
    pub fn with_ipv6_assignment(mut self, source: Ref<Interface>, assign: u8) -> Self {
        self.ip6class = Some(source);
        self.ip6assign = Some(assign);
        self
    }

    pub fn ipv4(&self) -> Option<Ipv4Network> {
        self.ipv4
    }

    pub fn ip6addr(&self) -> Option<Ipv6Network> {
        self.ip6addr
    }

    pub fn device(&self) -> Option<&DeviceName> {
        self.device.as_ref()
    }
}

impl Section for Interface {
    const SUBSYSTEM: Subsystem = Subsystem::Network;

    fn name(&self) -> &SectionName {
        &self.name
    }

    fn section_type(&self) -> &'static str {
        "interface"
    }

    fn write_options(&self, w: &mut SectionWriter<'_>) {
        w.set("proto", self.proto);
        if let Some(ipv4) = self.ipv4 {
            w.set("ipaddr", ipv4.ip()).set("netmask", ipv4.mask());
        }
        w.set_opt("device", self.device.as_ref())
            .set_opt("ip6addr", self.ip6addr.as_ref())
            .set_opt("ip6gw", self.ip6gw.as_ref())
            .set_opt("ip6prefix", self.ip6prefix.as_ref())
            .set_opt("ip6class", self.ip6class.as_ref())
            .set_opt("ip6assign", self.ip6assign.as_ref());
    }

    fn references(&self) -> Vec<(Subsystem, &SectionName)> {
        self.ip6class.iter().map(Ref::target).collect()
    }
}

// ── Bridge ──────────────────────────────────────────────────────────

/// Bridge device (`config device` with `type bridge`). Its section name is
/// also the kernel device name.
#[derive(Debug, Clone, PartialEq)]
pub struct Bridge {
    name: SectionName,
    ports: Option<NetworkPorts>,
}

impl Bridge {
    pub fn new(name: SectionName, ports: Option<NetworkPorts>) -> Self {
        Self { name, ports }
    }

    pub fn device_name(&self) -> Result<DeviceName, crate::CoreError> {
        DeviceName::from_section(&self.name)
    }
}

impl Section for Bridge {
    const SUBSYSTEM: Subsystem = Subsystem::Network;

    fn name(&self) -> &SectionName {
        &self.name
    }

    fn section_type(&self) -> &'static str {
        "device"
    }

    fn write_options(&self, w: &mut SectionWriter<'_>) {
        w.set("type", "bridge")
            .set("name", &self.name)
            .set_opt("ports", self.ports.as_ref());
    }
}

// ── Switch ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Switch {
    name: SectionName,
    ports: Option<NetworkPorts>,
}

impl Switch {
    pub fn new(name: SectionName) -> Self {
        Self { name, ports: None }
    }
}

impl Section for Switch {
    const SUBSYSTEM: Subsystem = Subsystem::Network;

    fn name(&self) -> &SectionName {
        &self.name
    }

    fn section_type(&self) -> &'static str {
        "switch"
    }

    fn write_options(&self, w: &mut SectionWriter<'_>) {
        w.set("name", &self.name)
            .set("reset", 1)
            .set("enable_vlan", 1)
            .set_opt("ports", self.ports.as_ref());
    }
}

/// One VLAN on the switch: which physical ports carry it, and how.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchVlan {
    name: SectionName,
    device: Ref<Switch>,
    vid: VlanId,
    ports: NetworkPorts,
}

impl SwitchVlan {
    pub fn new(name: SectionName, device: Ref<Switch>, vid: VlanId, ports: NetworkPorts) -> Self {
        Self {
            name,
            device,
            vid,
            ports,
        }
    }

    pub fn vid(&self) -> VlanId {
        self.vid
    }
}

impl Section for SwitchVlan {
    const SUBSYSTEM: Subsystem = Subsystem::Network;

    fn name(&self) -> &SectionName {
        &self.name
    }

    fn section_type(&self) -> &'static str {
        "switch_vlan"
    }

    fn write_options(&self, w: &mut SectionWriter<'_>) {
        w.set("device", &self.device)
            .set("vlan", self.vid)
            .set("ports", &self.ports);
    }

    fn references(&self) -> Vec<(Subsystem, &SectionName)> {
        vec![self.device.target()]
    }
}

// ── Globals ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Globals {
    name: SectionName,
    ula_prefix: Ipv6Network,
}

impl Globals {
    pub fn new(ula_prefix: Ipv6Network) -> Self {
        Self {
            name: SectionName::from_static("globals"),
            ula_prefix,
        }
    }
}

impl Section for Globals {
    const SUBSYSTEM: Subsystem = Subsystem::Network;

    fn name(&self) -> &SectionName {
        &self.name
    }

    fn section_type(&self) -> &'static str {
        "globals"
    }

    fn write_options(&self, w: &mut SectionWriter<'_>) {
        w.set("ula_prefix", self.ula_prefix);
    }
}

// ── Routes ──────────────────────────────────────────────────────────

mod sealed {
    pub trait Sealed {}
}

/// Address family of a static route or policy rule.
pub trait RouteFamily: sealed::Sealed + fmt::Debug + Clone + PartialEq {
    type Network: fmt::Display + fmt::Debug + Clone + Copy + PartialEq;
    type Addr: fmt::Display + fmt::Debug + Clone + Copy + PartialEq;

    const ROUTE_TYPE: &'static str;
    const RULE_TYPE: &'static str;
}

#[derive(Debug, Clone, PartialEq)]
pub enum V4 {}

#[derive(Debug, Clone, PartialEq)]
pub enum V6 {}

impl sealed::Sealed for V4 {}
impl sealed::Sealed for V6 {}

impl RouteFamily for V4 {
    type Network = Ipv4Network;
    type Addr = Ipv4Addr;

    const ROUTE_TYPE: &'static str = "route";
    const RULE_TYPE: &'static str = "rule";
}

impl RouteFamily for V6 {
    type Network = Ipv6Network;
    type Addr = Ipv6Addr;

    const ROUTE_TYPE: &'static str = "route6";
    const RULE_TYPE: &'static str = "rule6";
}

/// Static route (`config route` / `config route6`), optionally into a
/// policy routing table.
#[derive(Debug, Clone, PartialEq)]
pub struct Route<F: RouteFamily> {
    name: SectionName,
    target: F::Network,
    gateway: F::Addr,
    interface: Ref<Interface>,
    table: Option<RouteTable>,
}

impl<F: RouteFamily> Route<F> {
    pub fn new(
        name: SectionName,
        target: F::Network,
        gateway: F::Addr,
        interface: Ref<Interface>,
        table: Option<RouteTable>,
    ) -> Self {
        Self {
            name,
            target,
            gateway,
            interface,
            table,
        }
    }

    pub fn table(&self) -> Option<RouteTable> {
        self.table
    }

    pub fn target(&self) -> F::Network {
        self.target
    }

    pub fn gateway(&self) -> F::Addr {
        self.gateway
    }
}

impl<F: RouteFamily> Section for Route<F> {
    const SUBSYSTEM: Subsystem = Subsystem::Network;

    fn name(&self) -> &SectionName {
        &self.name
    }

    fn section_type(&self) -> &'static str {
        F::ROUTE_TYPE
    }

    fn write_options(&self, w: &mut SectionWriter<'_>) {
        w.set("target", self.target)
            .set("gateway", self.gateway)
            .set("interface", &self.interface)
            .set_opt("table", self.table.as_ref());
    }

    fn references(&self) -> Vec<(Subsystem, &SectionName)> {
        vec![self.interface.target()]
    }
}

/// Policy rule (`config rule` / `config rule6`) sending matching traffic to
/// a routing table.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRule<F: RouteFamily> {
    name: SectionName,
    lookup: RouteTable,
    src: Option<F::Network>,
    dest: Option<F::Network>,
}

impl<F: RouteFamily> RouteRule<F> {
    pub fn for_source(name: SectionName, lookup: RouteTable, src: F::Network) -> Self {
        Self {
            name,
            lookup,
            src: Some(src),
            dest: None,
        }
    }

    pub fn for_destination(name: SectionName, lookup: RouteTable, dest: F::Network) -> Self {
        Self {
            name,
            lookup,
            src: None,
            dest: Some(dest),
        }
    }

    pub fn lookup(&self) -> RouteTable {
        self.lookup
    }
}

impl<F: RouteFamily> Section for RouteRule<F> {
    const SUBSYSTEM: Subsystem = Subsystem::Network;

    fn name(&self) -> &SectionName {
        &self.name
    }

    fn section_type(&self) -> &'static str {
        F::RULE_TYPE
    }

    fn write_options(&self, w: &mut SectionWriter<'_>) {
        w.set("lookup", self.lookup)
            .set_opt("src", self.src.as_ref())
            .set_opt("dest", self.dest.as_ref());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::uci::attr::{TableBand, UNetId};

    fn name(s: &str) -> SectionName {
        SectionName::new(s).unwrap()
    }

    #[test]
    fn static_interface_renders_address_and_mask() {
        let wan = Interface::new(name("wan_aaaaaaaa"), InterfaceProto::Static)
            .with_ipv4("137.194.8.2/22".parse().unwrap())
            .with_device(DeviceName::new("eth0.101").unwrap());
        assert_eq!(
            wan.render(),
            "uci set network.wan_aaaaaaaa=interface\n\
             uci set network.wan_aaaaaaaa.proto='static'\n\
             uci set network.wan_aaaaaaaa.ipaddr='137.194.8.2'\n\
             uci set network.wan_aaaaaaaa.netmask='255.255.252.0'\n\
             uci set network.wan_aaaaaaaa.device='eth0.101'\n"
        );
    }

    #[test]
    fn lan_interface_chains_ipv6_assignment() {
        let wan6 = Interface::new(name("wan6_aaaaaaaa"), InterfaceProto::Static);
        let lan = Interface::new(name("lan_aaaaaaaa"), InterfaceProto::Static)
            .with_ipv6_assignment(wan6.handle(), 64);
        let out = lan.render();
        assert!(out.contains("uci set network.lan_aaaaaaaa.ip6class='wan6_aaaaaaaa'\n"));
        assert!(out.contains("uci set network.lan_aaaaaaaa.ip6assign='64'\n"));
        assert_eq!(lan.references(), vec![(Subsystem::Network, &name("wan6_aaaaaaaa"))]);
    }

    #[test]
    fn bridge_names_itself() {
        let unet = UNetId::new("aaaaaaaa").unwrap();
        let prefix = crate::uci::attr::SectionNamePrefix::new("br_lan_").unwrap();
        let bridge = Bridge::new(
            SectionName::prefixed(&prefix, &unet),
            Some(NetworkPorts::new("eth0.1").unwrap()),
        );
        insta::assert_snapshot!(bridge.render(), @r"
        uci set network.br_lan_aaaaaaaa=device
        uci set network.br_lan_aaaaaaaa.type='bridge'
        uci set network.br_lan_aaaaaaaa.name='br_lan_aaaaaaaa'
        uci set network.br_lan_aaaaaaaa.ports='eth0.1'
        ");
        assert_eq!(bridge.device_name().unwrap().as_str(), "br_lan_aaaaaaaa");
    }

    #[test]
    fn table_less_route_omits_table_key() {
        let wan = Interface::new(name("wan_aaaaaaaa"), InterfaceProto::Static);
        let route = Route::<V4>::new(
            name("route_default_wan_aaaaaaaa"),
            "0.0.0.0/0".parse().unwrap(),
            "137.194.11.254".parse().unwrap(),
            wan.handle(),
            None,
        );
        let out = route.render();
        assert!(out.starts_with("uci set network.route_default_wan_aaaaaaaa=route\n"));
        assert!(out.contains(".target='0.0.0.0/0'\n"));
        assert!(out.contains(".gateway='137.194.11.254'\n"));
        assert!(out.contains(".interface='wan_aaaaaaaa'\n"));
        assert!(!out.contains(".table="));
    }

    #[test]
    fn ipv6_route_and_rule_use_their_own_types() {
        let wan6 = Interface::new(name("wan6_bbbbbbbb"), InterfaceProto::Static);
        let table = RouteTable::for_tenant(TableBand::Ipv6Default, 2).unwrap();
        let route = Route::<V6>::new(
            name("route6_default_wan6_bbbbbbbb"),
            "::/0".parse().unwrap(),
            "2a09:6847:ffff::1".parse().unwrap(),
            wan6.handle(),
            Some(table),
        );
        let rule = RouteRule::<V6>::for_source(
            name("rule6_lan_bbbbbbbb"),
            table,
            "2a09:6847:402::/48".parse().unwrap(),
        );
        assert!(route.render().contains("=route6\n"));
        assert!(route.render().contains(".table='602'\n"));
        insta::assert_snapshot!(rule.render(), @r"
        uci set network.rule6_lan_bbbbbbbb=rule6
        uci set network.rule6_lan_bbbbbbbb.lookup='602'
        uci set network.rule6_lan_bbbbbbbb.src='2a09:6847:402::/48'
        ");
    }

    #[test]
    fn switch_vlan_points_at_switch() {
        let switch = Switch::new(name("switch0"));
        let vlan = SwitchVlan::new(
            name("vlan_65"),
            switch.handle(),
            VlanId::new(65).unwrap(),
            NetworkPorts::new("1t 0t").unwrap(),
        );
        assert_eq!(
            vlan.render(),
            "uci set network.vlan_65=switch_vlan\n\
             uci set network.vlan_65.device='switch0'\n\
             uci set network.vlan_65.vlan='65'\n\
             uci set network.vlan_65.ports='1t 0t'\n"
        );
        assert_eq!(vlan.references(), vec![(Subsystem::Network, &name("switch0"))]);
    }
}
