// ── Shared default assembly ──
//
// Device-wide sections every build starts from: loopback, switch and its
// infrastructure VLANs, the management network, firewall defaults, the
// DHCP daemons, both radios and SSH. Tenants reference the switch, the LAN
// trunk VLAN and the radios through `DefaultHandles`.

use std::net::Ipv4Addr;

use ipnetwork::Ipv4Network;
use tracing::debug;

use crate::builder::Builder;
use crate::config::{BuildConfig, MANAGEMENT_DAEMON_PORT};
use crate::error::CoreError;
use crate::hardware::HardwareProfile;
use crate::uci::{Ref, Section};
use crate::uci::attr::{
    Description, DeviceName, Family, InterfaceProto, NetworkPorts, Protocol, ProtocolName,
    SectionName, TcpUdpPort, Target, VlanId, ZonePolicy,
};
use crate::uci::dhcp::{DnsServers, Dnsmasq, Odhcpd};
use crate::uci::dropbear::Dropbear;
use crate::uci::firewall::{Defaults, Rule, Zone};
use crate::uci::network::{Globals, Interface, Switch, SwitchVlan};
use crate::uci::wireless::WifiDevice;

/// VLAN carrying the physical LAN jacks.
pub const LAN_TRUNK_VLAN: u16 = 1;
/// Out-of-band management VLAN.
pub const MANAGEMENT_VLAN: u16 = 65;
/// Uplink VLANs every box is wired for.
pub const UPLINK_VLANS: [u16; 3] = [101, 102, 103];

const ODHCPD_LOGLEVEL: u8 = 4;

/// Default sections tenants point at.
#[derive(Debug, Clone)]
pub struct DefaultHandles {
    pub switch: Ref<Switch>,
    pub radios: Vec<Ref<WifiDevice>>,
    /// Parent device of every VLAN sub-interface.
    pub cpu_device: DeviceName,
    /// Ports of a switch VLAN that only reaches the CPU.
    pub trunk_only_ports: NetworkPorts,
    /// Resolvers for tenant pools that do not override them.
    pub dns: DnsServers,
}

/// Build the device-wide sections.
///
/// `extra_uplinks` are WAN VLAN ids declared by the box beyond the fixed
/// [`UPLINK_VLANS`]; each gets its own uplink switch VLAN.
pub fn build_defaults(
    config: &BuildConfig,
    hw: &HardwareProfile,
    extra_uplinks: &[VlanId],
) -> Result<(Builder, DefaultHandles), CoreError> {
    let mut b = Builder::new();
    let cpu_device = hw.cpu_device();

    // ── network ──
    b.push(
        Interface::new(SectionName::from_static("loopback"), InterfaceProto::Static)
            .with_ipv4(Ipv4Network::new(Ipv4Addr::LOCALHOST, 8).map_err(|e| {
                CoreError::invalid("IPv4Network", Ipv4Addr::LOCALHOST, e.to_string())
            })?)
            .with_device(DeviceName::from_static("lo")),
    )?;
    b.push(Globals::new(config.ula_prefix))?;

    let switch = b.add(Switch::new(SectionName::from_static("switch0")))?;
    // VLAN 1 on the physical jacks; the main tenant bridges eth0.1 onto it.
    b.push(SwitchVlan::new(
        vlan_section_name(VlanId::new(LAN_TRUNK_VLAN.into())?)?,
        switch.clone(),
        VlanId::new(LAN_TRUNK_VLAN.into())?,
        hw.main_lan_ports()?,
    ))?;

    let management_vid = VlanId::new(MANAGEMENT_VLAN.into())?;
    b.push(SwitchVlan::new(
        vlan_section_name(management_vid)?,
        switch.clone(),
        management_vid,
        hw.uplink_ports()?,
    ))?;
    let management = Interface::new(SectionName::from_static("management"), InterfaceProto::Dhcp)
        .with_device(DeviceName::vlan(&cpu_device, management_vid)?);
    let management_zone = Zone::new(
        management.handle(),
        ZonePolicy::Reject,
        ZonePolicy::Accept,
        ZonePolicy::Reject,
    );
    b.push(management)?;

    let fixed = UPLINK_VLANS
        .iter()
        .map(|&vid| VlanId::new(vid.into()))
        .collect::<Result<Vec<_>, _>>()?;
    for vid in fixed.iter().chain(extra_uplinks) {
        b.push(SwitchVlan::new(
            vlan_section_name(*vid)?,
            switch.clone(),
            *vid,
            hw.uplink_ports()?,
        ))?;
    }

    // ── firewall ──
    b.push(Defaults::new())?;
    let management_zone = b.add(management_zone)?;
    for rule in management_rules(&management_zone, config.ssh_port) {
        b.push(rule)?;
    }

    // ── dhcp ──
    b.push(Dnsmasq::new(config.dns.clone()))?;
    b.push(Odhcpd::new(ODHCPD_LOGLEVEL))?;

    // ── wireless ──
    let mut radios = Vec::with_capacity(hw.radios.len());
    for (name, settings) in hw.radio_settings(&config.country)? {
        radios.push(b.add(WifiDevice::new(name, settings))?);
    }

    // ── dropbear ──
    b.push(Dropbear::new(config.ssh_port))?;

    debug!(
        sections = b.len(),
        extra_uplinks = extra_uplinks.len(),
        "built default sections"
    );

    Ok((
        b,
        DefaultHandles {
            switch,
            radios,
            cpu_device,
            trunk_only_ports: hw.trunk_only_ports()?,
            dns: config.dns.clone(),
        },
    ))
}

/// `vlan_<vid>`.
pub fn vlan_section_name(vid: VlanId) -> Result<SectionName, CoreError> {
    SectionName::new(format!("vlan_{vid}"))
}

fn management_rules(zone: &Ref<Zone>, ssh_port: TcpUdpPort) -> Vec<Rule> {
    let tcp = Protocol::single(ProtocolName::Tcp);
    vec![
        Rule::new(
            SectionName::from_static("management_allow_icmpv6"),
            Description::from_static("Allow ICMPv6 on management"),
            Protocol::single(ProtocolName::Icmp),
            Target::Accept,
            Family::Ipv6,
        )
        .src_zone(zone.clone()),
        Rule::new(
            SectionName::from_static("management_allow_ssh"),
            Description::from_static("Allow SSH on management"),
            tcp.clone(),
            Target::Accept,
            Family::Any,
        )
        .src_zone(zone.clone())
        .dest_port(ssh_port),
        Rule::new(
            SectionName::from_static("management_allow_hermes"),
            Description::from_static("Allow management daemon"),
            tcp,
            Target::Accept,
            Family::Any,
        )
        .src_zone(zone.clone())
        .dest_port(TcpUdpPort::from_u16(MANAGEMENT_DAEMON_PORT)),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::hardware::BoxModel;
    use crate::uci::Subsystem;

    fn names(b: &Builder, subsystem: Subsystem) -> Vec<&str> {
        b.nodes(subsystem).iter().map(|n| n.name().as_str()).collect()
    }

    #[test]
    fn default_sections_in_order() {
        let (b, handles) =
            build_defaults(&BuildConfig::default(), BoxModel::Ac2350.profile(), &[]).unwrap();
        assert_eq!(
            names(&b, Subsystem::Network),
            [
                "loopback", "globals", "switch0", "vlan_1", "vlan_65", "management", "vlan_101",
                "vlan_102", "vlan_103",
            ]
        );
        assert_eq!(
            names(&b, Subsystem::Firewall),
            [
                "defaults",
                "zone_management",
                "management_allow_icmpv6",
                "management_allow_ssh",
                "management_allow_hermes",
            ]
        );
        assert_eq!(names(&b, Subsystem::Dhcp), ["dnsmasq", "odhcpd"]);
        assert_eq!(names(&b, Subsystem::Wireless), ["radio0", "radio1"]);
        assert_eq!(names(&b, Subsystem::Dropbear), ["dropbear"]);

        let lan_trunk = b.nodes(Subsystem::Network)[3].render();
        assert!(lan_trunk.contains("uci set network.vlan_1.vlan='1'\n"));
        assert!(lan_trunk.contains("uci set network.vlan_1.ports='2 3 4 0t'\n"));
        assert_eq!(handles.radios.len(), 2);
        assert_eq!(handles.trunk_only_ports.as_str(), "0t");
        b.verify_references().unwrap();
    }

    #[test]
    fn extra_uplinks_follow_the_fixed_ones() {
        let (b, _) = build_defaults(
            &BuildConfig::default(),
            BoxModel::Ac2350.profile(),
            &[VlanId::new(200).unwrap()],
        )
        .unwrap();
        let out: String = b.nodes(Subsystem::Network).iter().map(crate::uci::Node::render).collect();
        assert!(out.contains("uci set network.vlan_200=switch_vlan\n"));
        assert!(out.contains("uci set network.vlan_200.ports='1t 0t'\n"));
    }

    #[test]
    fn management_interface_and_rules() {
        let (b, _) =
            build_defaults(&BuildConfig::default(), BoxModel::Ac2350.profile(), &[]).unwrap();
        let out: String = b.iter().map(crate::uci::Node::render).collect();
        assert!(out.contains("uci set network.management.proto='dhcp'\n"));
        assert!(out.contains("uci set network.management.device='eth0.65'\n"));
        assert!(out.contains("uci set network.loopback.netmask='255.0.0.0'\n"));
        assert!(out.contains("uci set firewall.management_allow_ssh.dest_port='22'\n"));
        assert!(out.contains("uci set firewall.management_allow_icmpv6.family='ipv6'\n"));
        assert!(out.contains("uci add_list dhcp.dnsmasq.server='8.8.8.8'\n"));
        assert!(out.contains("uci set wireless.radio0.country='FR'\n"));
    }
}
