// ── Tenant assembly ──
//
// Sections for one UNet: its LAN segment and bridge, the WAN/WAN6/LAN
// interfaces, policy routing into the tenant's own tables, one access
// point per radio, its DHCP pool and its firewall zones.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};
use serde::Serialize;
use tracing::{debug, warn};

use super::defaults::{DefaultHandles, LAN_TRUNK_VLAN};
use super::rules::{self, TenantZones};
use super::uplink::{self, Uplink};
use crate::builder::Builder;
use crate::error::CoreError;
use crate::model::{DnsOverride, StaticLease, UnetProfile};
use crate::uci::Section;
use crate::uci::attr::{
    Description, DeviceName, Family, Hostname, IcmpType, InterfaceProto, LeaseTime, MacAddress,
    MatchIpSet, NetworkPorts, Protocol, ProtocolName, RouteTable, SectionName, SectionNamePrefix,
    Ssid, TableBand, Target, UNetId, VlanId, WifiPassphrase, ZonePolicy,
};
use crate::uci::dhcp::{DhcpPool, DnsServers, Host};
use crate::uci::firewall::{Forwarding, Ipset, Rule, Snat, Zone};
use crate::uci::network::{Bridge, Interface, Route, RouteRule, SwitchVlan, V4, V6};
use crate::uci::wireless::WifiIface;

const LAN_IP6_ASSIGN: u8 = 64;
const DHCP_START: u16 = 100;
const DHCP_LIMIT: u16 = 150;
const DHCP_LEASETIME: &str = "12h";

/// Whether a tenant owns the physical LAN jacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TenantRole {
    Main,
    Secondary,
}

/// What one tenant build produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantSummary {
    pub unet_id: String,
    pub role: TenantRole,
    pub lan_vlan: u16,
    pub wan_vlan: u16,
    pub wan6_vlan: u16,
    /// Absent for the main tenant, whose IPv4 default route is in `main`.
    pub ipv4_table: Option<u32>,
    pub ipv6_table: u32,
    pub delegation_table: u32,
    pub sections: usize,
}

/// Checked inputs of one tenant.
struct TenantInputs {
    unet: UNetId,
    wan_vlan: VlanId,
    wan_ip: Ipv4Network,
    wan6_vlan: VlanId,
    wan6_ip: Ipv6Network,
    prefix: Ipv6Network,
    lan_ip: Ipv4Network,
    gateway4: Ipv4Addr,
    gateway6: Ipv6Addr,
    delegations: Vec<(Ipv6Network, Ipv6Addr)>,
    ssid: Ssid,
    psk: WifiPassphrase,
    dns: Option<DnsServers>,
    leases: Vec<Host>,
}

/// Build every section of one tenant.
///
/// `ordinal` is the tenant's LAN VLAN id and the last two digits of its
/// routing tables; the main tenant is always ordinal 1 and rides the
/// default LAN trunk VLAN.
#[allow(clippy::too_many_lines, clippy::similar_names)]
pub fn build_tenant(
    profile: &UnetProfile,
    role: TenantRole,
    ordinal: u16,
    defaults: &DefaultHandles,
    uplinks: &[Uplink],
) -> Result<(Builder, TenantSummary), CoreError> {
    if role == TenantRole::Main && ordinal != LAN_TRUNK_VLAN {
        return Err(CoreError::precondition(format!(
            "main tenant '{}' must use LAN VLAN {LAN_TRUNK_VLAN}, got {ordinal}",
            profile.unet_id
        )));
    }
    let input = parse_inputs(profile, uplinks)?;
    let unet = &input.unet;
    debug!(unet = %unet, %role, ordinal, "assembling tenant");

    let lan_vlan = VlanId::new(ordinal.into())?;
    let v4_table = RouteTable::for_tenant(TableBand::Ipv4Default, ordinal)?;
    let v6_table = RouteTable::for_tenant(TableBand::Ipv6Default, ordinal)?;
    let delegation_table = RouteTable::for_tenant(TableBand::Delegation, ordinal)?;

    let mut b = Builder::new();

    // ── network ──
    if role == TenantRole::Secondary {
        b.push(SwitchVlan::new(
            named("switch_vlan_", unet),
            defaults.switch.clone(),
            lan_vlan,
            defaults.trunk_only_ports.clone(),
        ))?;
    }
    let lan_port = DeviceName::vlan(&defaults.cpu_device, lan_vlan)?;
    let bridge = Bridge::new(named("br_lan_", unet), Some(NetworkPorts::new(lan_port.as_str())?));
    let bridge_device = bridge.device_name()?;
    b.push(bridge)?;

    let wan = Interface::new(named("wan_", unet), InterfaceProto::Static)
        .with_ipv4(input.wan_ip)
        .with_device(DeviceName::vlan(&defaults.cpu_device, input.wan_vlan)?);
    let wan6 = Interface::new(named("wan6_", unet), InterfaceProto::Static)
        .with_ipv6_uplink(input.wan6_ip, input.gateway6, Some(input.prefix))
        .with_device(DeviceName::vlan(&defaults.cpu_device, input.wan6_vlan)?);
    let lan = Interface::new(named("lan_", unet), InterfaceProto::Static)
        .with_ipv4(input.lan_ip)
        .with_device(bridge_device)
        .with_ipv6_assignment(wan6.handle(), LAN_IP6_ASSIGN);
    let snat = Snat::new(&lan, &wan)?;

    let wan_ref = b.add(wan)?;
    let wan6_ref = b.add(wan6)?;
    let lan_ref = b.add(lan)?;

    // The main tenant's IPv4 default is the box's own; secondary tenants
    // get theirs through a table selected by source address.
    let ipv4_table = match role {
        TenantRole::Main => None,
        TenantRole::Secondary => Some(v4_table),
    };
    b.push(Route::<V4>::new(
        named("route_default_wan_", unet),
        default_route_v4()?,
        input.gateway4,
        wan_ref.clone(),
        ipv4_table,
    ))?;
    if let Some(table) = ipv4_table {
        b.push(RouteRule::<V4>::for_source(
            named("rule_lan_", unet),
            table,
            ipv4_network(input.lan_ip)?,
        ))?;
        b.push(RouteRule::<V4>::for_source(
            named("rule_wan_", unet),
            table,
            Ipv4Network::from(input.wan_ip.ip()),
        ))?;
    }

    b.push(Route::<V6>::new(
        named("route6_default_wan6_", unet),
        default_route_v6()?,
        input.gateway6,
        wan6_ref.clone(),
        Some(v6_table),
    ))?;
    b.push(RouteRule::<V6>::for_source(
        named("rule6_lan_", unet),
        v6_table,
        input.prefix,
    ))?;
    b.push(RouteRule::<V6>::for_source(
        named("rule6_wan6_", unet),
        v6_table,
        Ipv6Network::from(input.wan6_ip.ip()),
    ))?;

    for (i, (prefix, next_hop)) in input.delegations.iter().enumerate() {
        let index = i + 1;
        b.push(Route::<V6>::new(
            SectionName::new(format!("route6_delegation_{unet}_{index}"))?,
            *prefix,
            *next_hop,
            lan_ref.clone(),
            Some(delegation_table),
        ))?;
        b.push(RouteRule::<V6>::for_destination(
            SectionName::new(format!("rule6_delegation_{unet}_{index}"))?,
            delegation_table,
            *prefix,
        ))?;
    }

    // ── wireless ──
    for radio in &defaults.radios {
        b.push(WifiIface::access_point(
            unet,
            radio.clone(),
            lan_ref.clone(),
            input.ssid.clone(),
            input.psk.clone(),
        ))?;
    }

    // ── dhcp ──
    let dns = input.dns.clone().unwrap_or_else(|| defaults.dns.clone());
    b.push(DhcpPool::new(
        lan_ref.clone(),
        DHCP_START,
        DHCP_LIMIT,
        LeaseTime::from_static(DHCP_LEASETIME),
        dns,
    ))?;
    for host in input.leases {
        b.push(host)?;
    }

    // ── firewall ──
    let zones = TenantZones {
        lan: b.add(Zone::new(
            lan_ref,
            ZonePolicy::Accept,
            ZonePolicy::Accept,
            ZonePolicy::Reject,
        ))?,
        wan: b.add(
            Zone::new(wan_ref, ZonePolicy::Reject, ZonePolicy::Accept, ZonePolicy::Reject)
                .with_family(Family::Ipv4),
        )?,
        wan6: b.add(
            Zone::new(wan6_ref, ZonePolicy::Reject, ZonePolicy::Accept, ZonePolicy::Reject)
                .with_family(Family::Ipv6),
        )?,
    };
    b.push(Forwarding::new(zones.lan.clone(), zones.wan.clone()))?;
    b.push(Forwarding::new(zones.lan.clone(), zones.wan6.clone()))?;
    b.push(snat)?;
    b.push(
        Rule::new(
            scoped(unet, "wan_allow_ping"),
            Description::from_static("Allow ping to WAN"),
            Protocol::single(ProtocolName::Icmp),
            Target::Accept,
            Family::Ipv4,
        )
        .src_zone(zones.wan.clone())
        .icmp_type(IcmpType::EchoRequest),
    )?;
    b.push(
        Rule::new(
            scoped(unet, "wan6_allow_icmp"),
            Description::from_static("Allow ICMPv6 to WAN6"),
            Protocol::single(ProtocolName::Icmp),
            Target::Accept,
            Family::Ipv6,
        )
        .src_zone(zones.wan6.clone()),
    )?;

    if !input.delegations.is_empty() {
        let set = b.add(Ipset::new(
            named("delegations_", unet),
            MatchIpSet::from_static("net_dest"),
            Family::Ipv6,
            input
                .delegations
                .iter()
                .map(|(prefix, _)| IpNetwork::V6(*prefix))
                .collect(),
        ))?;
        b.push(Forwarding::through_ipset(zones.wan6.clone(), zones.lan.clone(), set))?;
    }

    let base = format!("unets[{}].firewall", profile.unet_id);
    for (i, record) in profile.firewall.ipv4_port_forwarding.iter().enumerate() {
        b.push(rules::port_forward(
            unet,
            &zones,
            input.wan_ip.ip(),
            ipv4_network(input.lan_ip)?,
            record,
            &format!("{base}.ipv4PortForwarding[{i}]"),
        )?)?;
    }
    for (i, record) in profile.firewall.ipv6_port_opening.iter().enumerate() {
        b.push(rules::port_opening(
            unet,
            &zones,
            record,
            &format!("{base}.ipv6PortOpening[{i}]"),
        )?)?;
    }

    let summary = TenantSummary {
        unet_id: unet.to_string(),
        role,
        lan_vlan: lan_vlan.get(),
        wan_vlan: input.wan_vlan.get(),
        wan6_vlan: input.wan6_vlan.get(),
        ipv4_table: ipv4_table.map(RouteTable::get),
        ipv6_table: v6_table.get(),
        delegation_table: delegation_table.get(),
        sections: b.len(),
    };
    debug!(unet = %unet, sections = summary.sections, "tenant assembled");
    Ok((b, summary))
}

// ── Input checks ────────────────────────────────────────────────────

fn parse_inputs(profile: &UnetProfile, uplinks: &[Uplink]) -> Result<TenantInputs, CoreError> {
    let at = |field: &str| format!("unets[{}].{field}", profile.unet_id);
    let net = &profile.network;

    let unet = UNetId::new(profile.unet_id.as_str()).map_err(|e| e.at(at("unetId")))?;
    let wan_vlan = net
        .wan_ipv4
        .vlan
        .parse()
        .map_err(|e| e.at(at("network.wanIpv4.vlan")))?;
    let wan6_vlan = net
        .wan_ipv6
        .vlan
        .parse()
        .map_err(|e| e.at(at("network.wanIpv6.vlan")))?;

    // Gateways first: an undeclared uplink is the most common bad record.
    let gateway4 = uplink::ipv4_gateway(uplinks, wan_vlan)?;
    let gateway6 = uplink::ipv6_gateway(uplinks, wan6_vlan)?;

    let wan_ip = parse_text(&net.wan_ipv4.ip, at("network.wanIpv4.ip"), "an IPv4 address in CIDR form")?;
    let wan6_ip = parse_text(&net.wan_ipv6.ip, at("network.wanIpv6.ip"), "an IPv6 address in CIDR form")?;
    let prefix = parse_text(&net.ipv6_prefix, at("network.ipv6Prefix"), "an IPv6 prefix")?;
    let lan_ip = lan_router_address(
        parse_text(&net.lan_ipv4.address, at("network.lanIpv4.address"), "an IPv4 address in CIDR form")?,
        &unet,
    )?;

    let delegations = net
        .ipv6_delegations
        .iter()
        .enumerate()
        .map(|(i, d)| {
            Ok((
                parse_text(&d.prefix, at(&format!("network.ipv6Delegations[{i}].prefix")), "an IPv6 prefix")?,
                parse_text(&d.next_hop, at(&format!("network.ipv6Delegations[{i}].nextHop")), "an IPv6 address")?,
            ))
        })
        .collect::<Result<Vec<_>, CoreError>>()?;

    let ssid = Ssid::new(profile.wifi.ssid.as_str()).map_err(|e| e.at(at("wifi.ssid")))?;
    let psk = WifiPassphrase::new(profile.wifi.psk.as_str()).map_err(|e| e.at(at("wifi.psk")))?;

    let dns = profile
        .dhcp
        .dns_servers
        .as_ref()
        .map(|o| parse_dns_override(o, &at("dhcp.dnsServers")))
        .transpose()?
        .filter(|dns| !dns.is_empty());

    let leases = profile
        .dhcp
        .static_leases
        .iter()
        .enumerate()
        .map(|(i, lease)| parse_lease(&unet, lease, &at(&format!("dhcp.staticLeases[{i}]"))))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TenantInputs {
        unet,
        wan_vlan,
        wan_ip,
        wan6_vlan,
        wan6_ip,
        prefix,
        lan_ip,
        gateway4,
        gateway6,
        delegations,
        ssid,
        psk,
        dns,
        leases,
    })
}

fn parse_text<T: FromStr>(raw: &str, field: String, expected: &str) -> Result<T, CoreError> {
    raw.trim()
        .parse()
        .map_err(|_| CoreError::invalid(field, raw, format!("must be {expected}")))
}

/// A LAN given as its bare network address (`192.168.0.0/24`) gets the
/// first host as router address.
fn lan_router_address(raw: Ipv4Network, unet: &UNetId) -> Result<Ipv4Network, CoreError> {
    if raw.prefix() >= 31 || raw.ip() != raw.network() {
        return Ok(raw);
    }
    let router = raw
        .nth(1)
        .ok_or_else(|| CoreError::invalid("LanIpv4", raw, "network has no host addresses"))?;
    warn!(unet = %unet, lan = %raw, %router, "LAN given as a network address, using its first host");
    Ipv4Network::new(router, raw.prefix()).map_err(|e| CoreError::invalid("LanIpv4", raw, e.to_string()))
}

fn parse_dns_override(raw: &DnsOverride, path: &str) -> Result<DnsServers, CoreError> {
    let ipv4 = raw
        .ipv4
        .iter()
        .enumerate()
        .map(|(i, s)| parse_text(s, format!("{path}.ipv4[{i}]"), "an IPv4 address"))
        .collect::<Result<Vec<_>, _>>()?;
    let ipv6 = raw
        .ipv6
        .iter()
        .enumerate()
        .map(|(i, s)| parse_text(s, format!("{path}.ipv6[{i}]"), "an IPv6 address"))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DnsServers { ipv4, ipv6 })
}

fn parse_lease(unet: &UNetId, lease: &StaticLease, path: &str) -> Result<Host, CoreError> {
    let hostname = Hostname::new(lease.hostname.as_str()).map_err(|e| e.at(format!("{path}.hostname")))?;
    let mac = MacAddress::new(&lease.mac).map_err(|e| e.at(format!("{path}.mac")))?;
    let ip: IpAddr = parse_text(&lease.ip, format!("{path}.ip"), "an IP address")?;
    Ok(Host::new(unet, hostname).mac(mac).ip(ip))
}

// ── Naming ──────────────────────────────────────────────────────────

fn named(prefix: &'static str, unet: &UNetId) -> SectionName {
    SectionName::prefixed(&SectionNamePrefix::from_static(prefix), unet)
}

fn scoped(unet: &UNetId, name: &'static str) -> SectionName {
    SectionName::scoped(unet, &SectionName::from_static(name))
}

fn default_route_v4() -> Result<Ipv4Network, CoreError> {
    Ipv4Network::new(Ipv4Addr::UNSPECIFIED, 0)
        .map_err(|e| CoreError::invalid("IPv4Network", "0.0.0.0/0", e.to_string()))
}

fn default_route_v6() -> Result<Ipv6Network, CoreError> {
    Ipv6Network::new(Ipv6Addr::UNSPECIFIED, 0)
        .map_err(|e| CoreError::invalid("IPv6Network", "::/0", e.to_string()))
}

fn ipv4_network(address: Ipv4Network) -> Result<Ipv4Network, CoreError> {
    Ipv4Network::new(address.network(), address.prefix())
        .map_err(|e| CoreError::invalid("IPv4Network", address, e.to_string()))
}
