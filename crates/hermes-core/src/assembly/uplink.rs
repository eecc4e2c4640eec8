// ── Uplink gateway table ──

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnetwork::IpNetwork;

use crate::error::{CoreError, GatewayFamily};
use crate::model::WanVlan;
use crate::uci::attr::VlanId;

/// A declared uplink VLAN with its parsed default routers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uplink {
    pub vlan: VlanId,
    pub ipv4_gateway: Option<Ipv4Addr>,
    pub ipv6_gateway: Option<Ipv6Addr>,
}

/// Parse the box's `wanVlans`. Each VLAN id may appear once.
pub fn parse_uplinks(wan_vlans: &[WanVlan]) -> Result<Vec<Uplink>, CoreError> {
    let mut seen = HashSet::new();
    wan_vlans
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            let vlan = raw
                .vlan_id
                .parse()
                .map_err(|e| e.at(format!("wanVlans[{i}].vlanId")))?;
            if !seen.insert(vlan) {
                return Err(CoreError::precondition(format!(
                    "uplink VLAN {vlan} is declared more than once"
                )));
            }
            let ipv4_gateway = parse_gateway(
                raw.ipv4_gateway.as_deref(),
                &format!("wanVlans[{i}].ipv4Gateway"),
                |ip| match ip {
                    IpAddr::V4(ip) => Some(ip),
                    IpAddr::V6(_) => None,
                },
            )?;
            let ipv6_gateway = parse_gateway(
                raw.ipv6_gateway.as_deref(),
                &format!("wanVlans[{i}].ipv6Gateway"),
                |ip| match ip {
                    IpAddr::V6(ip) => Some(ip),
                    IpAddr::V4(_) => None,
                },
            )?;
            Ok(Uplink {
                vlan,
                ipv4_gateway,
                ipv6_gateway,
            })
        })
        .collect()
}

/// A gateway is a bare address or an interface address in CIDR form
/// (`137.194.11.254/22`), of which only the address is kept.
fn parse_gateway<A>(
    raw: Option<&str>,
    field: &str,
    family: impl Fn(IpAddr) -> Option<A>,
) -> Result<Option<A>, CoreError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse::<IpAddr>()
            .ok()
            .or_else(|| text.parse::<IpNetwork>().ok().map(|net| net.ip()))
            .and_then(family)
            .map(Some)
            .ok_or_else(|| CoreError::invalid(field, text, "must be an IP address, optionally in CIDR form")),
    }
}

/// IPv4 default router of `vlan`.
pub fn ipv4_gateway(uplinks: &[Uplink], vlan: VlanId) -> Result<Ipv4Addr, CoreError> {
    uplinks
        .iter()
        .find(|u| u.vlan == vlan)
        .and_then(|u| u.ipv4_gateway)
        .ok_or(CoreError::MissingGateway {
            vlan: vlan.get(),
            family: GatewayFamily::Ipv4,
        })
}

/// IPv6 default router of `vlan`.
pub fn ipv6_gateway(uplinks: &[Uplink], vlan: VlanId) -> Result<Ipv6Addr, CoreError> {
    uplinks
        .iter()
        .find(|u| u.vlan == vlan)
        .and_then(|u| u.ipv6_gateway)
        .ok_or(CoreError::MissingGateway {
            vlan: vlan.get(),
            family: GatewayFamily::Ipv6,
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::VlanTag;

    fn wan_vlan(id: u16, v4: Option<&str>, v6: Option<&str>) -> WanVlan {
        WanVlan {
            vlan_id: VlanTag::from(id),
            ipv4_gateway: v4.map(str::to_owned),
            ipv6_gateway: v6.map(str::to_owned),
        }
    }

    #[test]
    fn resolves_per_family() {
        let uplinks = parse_uplinks(&[
            wan_vlan(101, Some("137.194.11.254"), Some("2a09:6847:ffff::1")),
            wan_vlan(102, Some("195.14.28.1"), None),
        ])
        .unwrap();
        let v101 = VlanId::new(101).unwrap();
        let v102 = VlanId::new(102).unwrap();
        assert_eq!(ipv4_gateway(&uplinks, v101).unwrap().to_string(), "137.194.11.254");
        assert_eq!(ipv4_gateway(&uplinks, v102).unwrap().to_string(), "195.14.28.1");

        let err = ipv6_gateway(&uplinks, v102).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "no IPv6 gateway declared for uplink VLAN 102");
    }

    #[test]
    fn unknown_vlan_is_missing_gateway() {
        let uplinks = parse_uplinks(&[wan_vlan(101, Some("137.194.11.254"), None)]).unwrap();
        let err = ipv4_gateway(&uplinks, VlanId::new(104).unwrap()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::MissingGateway {
                vlan: 104,
                family: GatewayFamily::Ipv4
            }
        ));
    }

    #[test]
    fn duplicate_and_malformed_declarations() {
        let err = parse_uplinks(&[wan_vlan(101, None, None), wan_vlan(101, None, None)]).unwrap_err();
        assert!(matches!(err, CoreError::Precondition { .. }));

        let err = parse_uplinks(&[wan_vlan(101, Some("137.194.11"), None)]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid wanVlans[0].ipv4Gateway '137.194.11': must be an IP address, optionally in CIDR form"
        );

        let err = parse_uplinks(&[wan_vlan(101, None, Some("137.194.11.254"))]).unwrap_err();
        assert!(err.to_string().starts_with("invalid wanVlans[0].ipv6Gateway '137.194.11.254'"));
    }

    #[test]
    fn gateway_in_cidr_form_keeps_the_address() {
        let uplinks = parse_uplinks(&[wan_vlan(101, Some("137.194.11.254/22"), Some("2a09:6847:ffff::1/64"))]).unwrap();
        let v101 = VlanId::new(101).unwrap();
        assert_eq!(ipv4_gateway(&uplinks, v101).unwrap().to_string(), "137.194.11.254");
        assert_eq!(ipv6_gateway(&uplinks, v101).unwrap().to_string(), "2a09:6847:ffff::1");
    }
}
