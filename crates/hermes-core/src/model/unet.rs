// ── Tenant (UNet) records ──

use serde::{Deserialize, Serialize};

use super::box_record::VlanTag;

/// One tenant network hosted on a box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnetProfile {
    #[serde(alias = "unet_id")]
    pub unet_id: String,
    pub network: UnetNetwork,
    pub wifi: UnetWifi,
    #[serde(default)]
    pub firewall: UnetFirewall,
    #[serde(default)]
    pub dhcp: UnetDhcp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnetNetwork {
    #[serde(alias = "wan_ipv4")]
    pub wan_ipv4: WanIpv4,
    #[serde(alias = "wan_ipv6")]
    pub wan_ipv6: WanIpv6,
    /// Prefix routed to the tenant's WAN6 for downstream assignment (/48).
    #[serde(alias = "ipv6_prefix")]
    pub ipv6_prefix: String,
    #[serde(alias = "lan_ipv4")]
    pub lan_ipv4: LanIpv4,
    /// Prefixes routed through a host on the tenant LAN.
    #[serde(default, alias = "ipv6_delegations")]
    pub ipv6_delegations: Vec<DelegatedPrefix>,
}

/// Public IPv4 in CIDR form (`137.194.8.2/22`) on an uplink VLAN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WanIpv4 {
    pub vlan: VlanTag,
    pub ip: String,
}

/// Public IPv6 interface address (`2a09:6847:fffe::2/64`) on an uplink VLAN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WanIpv6 {
    pub vlan: VlanTag,
    pub ip: String,
}

/// Router address on the tenant LAN in CIDR form (`192.168.0.1/24`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanIpv4 {
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegatedPrefix {
    pub prefix: String,
    #[serde(alias = "next_hop")]
    pub next_hop: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnetWifi {
    pub ssid: String,
    pub psk: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnetFirewall {
    #[serde(default, alias = "ipv4_port_forwarding")]
    pub ipv4_port_forwarding: Vec<PortForward>,
    #[serde(default, alias = "ipv6_port_opening")]
    pub ipv6_port_opening: Vec<PortOpening>,
}

/// DNAT from a port on the tenant's public IPv4 to a LAN host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortForward {
    #[serde(alias = "wan_port")]
    pub wan_port: i64,
    #[serde(alias = "lan_ip")]
    pub lan_ip: String,
    #[serde(alias = "lan_port")]
    pub lan_port: i64,
    pub protocol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
}

/// Inbound IPv6 accept rule towards one LAN host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortOpening {
    pub ip: String,
    pub port: i64,
    pub protocol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnetDhcp {
    /// Replaces the operator resolvers for this tenant's pool.
    #[serde(default, alias = "dns_servers")]
    pub dns_servers: Option<DnsOverride>,
    #[serde(default, alias = "static_leases")]
    pub static_leases: Vec<StaticLease>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DnsOverride {
    #[serde(default)]
    pub ipv4: Vec<String>,
    #[serde(default)]
    pub ipv6: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticLease {
    pub hostname: String,
    pub mac: String,
    pub ip: String,
}
