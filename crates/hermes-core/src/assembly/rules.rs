// ── Tenant port forwards and port openings ──

use std::net::{Ipv4Addr, Ipv6Addr};

use ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};
use tracing::warn;

use crate::error::CoreError;
use crate::model::{PortForward, PortOpening};
use crate::uci::Ref;
use crate::uci::attr::{Description, Family, Protocol, SectionName, TcpUdpPort, Target, UNetId};
use crate::uci::firewall::{Redirect, RedirectTarget, Rule, Zone};

/// Zones of one tenant that its rules point at.
#[derive(Debug, Clone)]
pub struct TenantZones {
    pub lan: Ref<Zone>,
    pub wan: Ref<Zone>,
    pub wan6: Ref<Zone>,
}

/// DNAT from `wan_address:wanPort` to a LAN host.
///
/// `path` locates the record in the input document for error messages.
pub fn port_forward(
    unet: &UNetId,
    zones: &TenantZones,
    wan_address: Ipv4Addr,
    lan: Ipv4Network,
    record: &PortForward,
    path: &str,
) -> Result<Redirect, CoreError> {
    let wan_port = TcpUdpPort::new(record.wan_port).map_err(|e| e.at(format!("{path}.wanPort")))?;
    let lan_port = TcpUdpPort::new(record.lan_port).map_err(|e| e.at(format!("{path}.lanPort")))?;
    let proto = Protocol::new(&record.protocol).map_err(|e| e.at(format!("{path}.protocol")))?;
    let lan_ip: Ipv4Addr = record.lan_ip.trim().parse().map_err(|_| {
        CoreError::invalid(format!("{path}.lanIp"), &record.lan_ip, "must be an IPv4 address")
    })?;
    if !lan.contains(lan_ip) {
        warn!(unet = %unet, %lan_ip, %lan, "port forward targets a host outside the tenant LAN");
    }

    let name = rule_name(
        unet,
        record.name.as_deref(),
        || format!("port_forwarding_dport_{wan_port}"),
        path,
    )?;
    let desc = description(
        record.desc.as_deref(),
        || format!("Forward {proto} {wan_port} to {lan_ip}:{lan_port}"),
        path,
    )?;

    Ok(Redirect::dnat(
        name,
        desc,
        zones.wan.clone(),
        wan_port,
        RedirectTarget {
            zone: zones.lan.clone(),
            ip: lan_ip,
            port: lan_port,
        },
        proto,
    )
    .src_dip(wan_address))
}

/// Accept inbound IPv6 traffic from the tenant's WAN6 to one LAN host.
pub fn port_opening(
    unet: &UNetId,
    zones: &TenantZones,
    record: &PortOpening,
    path: &str,
) -> Result<Rule, CoreError> {
    let port = TcpUdpPort::new(record.port).map_err(|e| e.at(format!("{path}.port")))?;
    let proto = Protocol::new(&record.protocol).map_err(|e| e.at(format!("{path}.protocol")))?;
    let ip: Ipv6Addr = record.ip.trim().parse().map_err(|_| {
        CoreError::invalid(format!("{path}.ip"), &record.ip, "must be an IPv6 address")
    })?;
    let host = Ipv6Network::new(ip, 128)
        .map_err(|e| CoreError::invalid(format!("{path}.ip"), ip, e.to_string()))?;

    let name = rule_name(
        unet,
        record.name.as_deref(),
        || format!("ipv6_open_dport_{port}"),
        path,
    )?;
    let desc = description(
        record.desc.as_deref(),
        || format!("Open {proto} {port} to {ip}"),
        path,
    )?;

    Ok(Rule::new(name, desc, proto, Target::Accept, Family::Ipv6)
        .src_zone(zones.wan6.clone())
        .dest_zone(zones.lan.clone())
        .dest_ip(IpNetwork::V6(host))
        .dest_port(port))
}

fn rule_name(
    unet: &UNetId,
    given: Option<&str>,
    fallback: impl FnOnce() -> String,
    path: &str,
) -> Result<SectionName, CoreError> {
    let base = match given {
        Some(name) => SectionName::new(name).map_err(|e| e.at(format!("{path}.name")))?,
        None => SectionName::new(fallback())?,
    };
    Ok(SectionName::scoped(unet, &base))
}

fn description(
    given: Option<&str>,
    fallback: impl FnOnce() -> String,
    path: &str,
) -> Result<Description, CoreError> {
    match given {
        Some(desc) => Description::new(desc).map_err(|e| e.at(format!("{path}.desc"))),
        None => Description::new(fallback()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::uci::Section;
    use crate::uci::attr::{InterfaceProto, ZonePolicy};
    use crate::uci::network::Interface;

    fn zones() -> TenantZones {
        let zone = |iface: &str| {
            let iface = Interface::new(SectionName::new(iface).unwrap(), InterfaceProto::Static);
            Zone::new(iface.handle(), ZonePolicy::Reject, ZonePolicy::Accept, ZonePolicy::Reject)
                .handle()
        };
        TenantZones {
            lan: zone("lan_aaaaaaaa"),
            wan: zone("wan_aaaaaaaa"),
            wan6: zone("wan6_aaaaaaaa"),
        }
    }

    fn unet() -> UNetId {
        UNetId::new("aaaaaaaa").unwrap()
    }

    fn forward(name: Option<&str>) -> PortForward {
        PortForward {
            wan_port: 8080,
            lan_ip: "192.168.0.5".into(),
            lan_port: 80,
            protocol: "tcp".into(),
            name: name.map(str::to_owned),
            desc: None,
        }
    }

    #[test]
    fn port_forward_defaults_name_and_description() {
        let redirect = port_forward(
            &unet(),
            &zones(),
            "137.194.8.2".parse().unwrap(),
            "192.168.0.0/24".parse().unwrap(),
            &forward(None),
            "unets[aaaaaaaa].firewall.ipv4PortForwarding[0]",
        )
        .unwrap();
        insta::assert_snapshot!(redirect.render(), @r"
        uci set firewall.aaaaaaaa_port_forwarding_dport_8080=redirect
        uci set firewall.aaaaaaaa_port_forwarding_dport_8080.name='Forward tcp 8080 to 192.168.0.5:80'
        uci set firewall.aaaaaaaa_port_forwarding_dport_8080.target='DNAT'
        uci set firewall.aaaaaaaa_port_forwarding_dport_8080.src='zone_wan_aaaaaaaa'
        uci set firewall.aaaaaaaa_port_forwarding_dport_8080.src_dport='8080'
        uci set firewall.aaaaaaaa_port_forwarding_dport_8080.dest='zone_lan_aaaaaaaa'
        uci set firewall.aaaaaaaa_port_forwarding_dport_8080.dest_ip='192.168.0.5'
        uci set firewall.aaaaaaaa_port_forwarding_dport_8080.dest_port='80'
        uci set firewall.aaaaaaaa_port_forwarding_dport_8080.proto='tcp'
        uci set firewall.aaaaaaaa_port_forwarding_dport_8080.src_dip='137.194.8.2'
        ");
    }

    #[test]
    fn port_forward_keeps_given_name() {
        let redirect = port_forward(
            &unet(),
            &zones(),
            "137.194.8.2".parse().unwrap(),
            "192.168.0.0/24".parse().unwrap(),
            &forward(Some("web")),
            "p",
        )
        .unwrap();
        assert_eq!(redirect.name().as_str(), "aaaaaaaa_web");
    }

    #[test]
    fn port_forward_errors_carry_the_input_path() {
        let mut record = forward(None);
        record.wan_port = 70000;
        let err = port_forward(
            &unet(),
            &zones(),
            "137.194.8.2".parse().unwrap(),
            "192.168.0.0/24".parse().unwrap(),
            &record,
            "unets[aaaaaaaa].firewall.ipv4PortForwarding[0]",
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid unets[aaaaaaaa].firewall.ipv4PortForwarding[0].wanPort '70000': must be an integer in 0..=65535"
        );

        let record = forward(Some("no spaces allowed"));
        let err = port_forward(
            &unet(),
            &zones(),
            "137.194.8.2".parse().unwrap(),
            "192.168.0.0/24".parse().unwrap(),
            &record,
            "fwd",
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("invalid fwd.name 'no spaces allowed'"));
    }

    #[test]
    fn port_opening_targets_one_host() {
        let record = PortOpening {
            ip: "2a09:6847:400::10".into(),
            port: 443,
            protocol: "tcp udp".into(),
            name: None,
            desc: Some("https".into()),
        };
        let rule = port_opening(&unet(), &zones(), &record, "p").unwrap();
        insta::assert_snapshot!(rule.render(), @r"
        uci set firewall.aaaaaaaa_ipv6_open_dport_443=rule
        uci set firewall.aaaaaaaa_ipv6_open_dport_443.name='https'
        uci set firewall.aaaaaaaa_ipv6_open_dport_443.proto='tcp udp'
        uci set firewall.aaaaaaaa_ipv6_open_dport_443.target='ACCEPT'
        uci set firewall.aaaaaaaa_ipv6_open_dport_443.family='ipv6'
        uci set firewall.aaaaaaaa_ipv6_open_dport_443.src='zone_wan6_aaaaaaaa'
        uci set firewall.aaaaaaaa_ipv6_open_dport_443.dest='zone_lan_aaaaaaaa'
        uci set firewall.aaaaaaaa_ipv6_open_dport_443.dest_ip='2a09:6847:400::10/128'
        uci set firewall.aaaaaaaa_ipv6_open_dport_443.dest_port='443'
        ");
    }

    #[test]
    fn port_opening_rejects_ipv4_host() {
        let record = PortOpening {
            ip: "192.168.0.5".into(),
            port: 22,
            protocol: "tcp".into(),
            name: None,
            desc: None,
        };
        let err = port_opening(&unet(), &zones(), &record, "p").unwrap_err();
        assert!(err.is_validation());
    }
}
