// ── Box compilation ──
//
// Entry points a caller uses: check the box record, assemble defaults plus
// every tenant into one builder, verify the graph and render it.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use strum::IntoEnumIterator;
use tracing::{debug, info, warn};

use crate::assembly::{
    TenantRole, TenantSummary, UPLINK_VLANS, Uplink, build_defaults, build_tenant, parse_uplinks,
};
use crate::builder::Builder;
use crate::config::BuildConfig;
use crate::emit::{self, RenderedConfig};
use crate::error::CoreError;
use crate::hardware::BoxModel;
use crate::model::{BoxRecord, UnetProfile};
use crate::uci::attr::{MacAddress, VlanId};
use crate::uci::{Node, Section, Subsystem};

/// Tenants one box can host: routing table numbers carry a two-digit ordinal.
pub const MAX_TENANTS: usize = 99;

/// What a box build contains, without the rendered text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPlan {
    pub box_type: BoxModel,
    pub mac: String,
    pub tenants: Vec<TenantSummary>,
    /// Uplink VLANs beyond the fixed trunk set that got their own switch VLAN.
    pub extra_uplinks: Vec<u16>,
    pub sections: BTreeMap<Subsystem, usize>,
}

/// A rendered box build and its plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compiled {
    pub rendered: RenderedConfig,
    pub plan: BuildPlan,
}

impl Compiled {
    pub fn to_artifact(&self) -> String {
        self.rendered.to_artifact()
    }
}

/// Assemble and verify every section of `record` without rendering.
pub fn assemble_box(
    record: &BoxRecord,
    config: &BuildConfig,
) -> Result<(Builder, BuildPlan), CoreError> {
    let model = BoxModel::parse(&record.box_type)?;
    let mac = MacAddress::new(&record.mac).map_err(|e| e.at("mac"))?;
    let uplinks = parse_uplinks(&record.wan_vlans)?;
    let tenants = order_tenants(record)?;
    debug!(%mac, box_type = %model, tenants = tenants.len(), "assembling box");

    let extra_uplinks: Vec<VlanId> = uplinks
        .iter()
        .map(|u| u.vlan)
        .filter(|vid| !UPLINK_VLANS.contains(&vid.get()))
        .collect();
    warn_unused_uplinks(&uplinks, &tenants);

    let (mut builder, defaults) = build_defaults(config, model.profile(), &extra_uplinks)?;

    let mut summaries = Vec::with_capacity(tenants.len());
    for (index, profile) in tenants.iter().enumerate() {
        let ordinal = u16::try_from(index + 1)
            .map_err(|_| CoreError::precondition("tenant ordinal out of range"))?;
        let role = if index == 0 {
            TenantRole::Main
        } else {
            TenantRole::Secondary
        };
        let (tenant, summary) = build_tenant(profile, role, ordinal, &defaults, &uplinks)?;
        builder.merge(tenant)?;
        summaries.push(summary);
    }

    builder.verify_references()?;
    check_switch_vlans(&builder)?;

    let sections: BTreeMap<Subsystem, usize> = Subsystem::iter()
        .map(|s| (s, builder.nodes(s).len()))
        .collect();
    info!(
        %mac,
        tenants = summaries.len(),
        network = builder.nodes(Subsystem::Network).len(),
        firewall = builder.nodes(Subsystem::Firewall).len(),
        dhcp = builder.nodes(Subsystem::Dhcp).len(),
        wireless = builder.nodes(Subsystem::Wireless).len(),
        dropbear = builder.nodes(Subsystem::Dropbear).len(),
        "box assembled"
    );

    let plan = BuildPlan {
        box_type: model,
        mac: mac.to_string(),
        tenants: summaries,
        extra_uplinks: extra_uplinks.iter().map(|v| v.get()).collect(),
        sections,
    };
    Ok((builder, plan))
}

/// Full build of one box.
pub fn compile_box(record: &BoxRecord, config: &BuildConfig) -> Result<Compiled, CoreError> {
    let (builder, plan) = assemble_box(record, config)?;
    Ok(Compiled {
        rendered: emit::render(&builder),
        plan,
    })
}

/// Default-only build used to initialise a box before it hosts any tenant.
pub fn compile_default(model: BoxModel, config: &BuildConfig) -> Result<RenderedConfig, CoreError> {
    let (builder, _) = build_defaults(config, model.profile(), &[])?;
    builder.verify_references()?;
    info!(box_type = %model, sections = builder.len(), "default configuration assembled");
    Ok(emit::render(&builder))
}

/// `configfile_<mac>.txt`
pub fn box_artifact_name(mac: &MacAddress) -> String {
    format!("configfile_{mac}.txt")
}

/// `<type>_defaultConfigfile.txt`
pub fn default_artifact_name(model: BoxModel) -> String {
    format!("{model}_defaultConfigfile.txt")
}

// ── Checks ──────────────────────────────────────────────────────────

/// Main tenant first, then the rest in document order.
fn order_tenants(record: &BoxRecord) -> Result<Vec<&UnetProfile>, CoreError> {
    let mut mains = record.main_unet();
    let main = match (mains.next(), mains.next()) {
        (Some(main), None) => main,
        (None, _) => {
            return Err(CoreError::precondition(format!(
                "mainUnetId '{}' matches no tenant",
                record.main_unet_id
            )));
        }
        (Some(_), Some(_)) => {
            return Err(CoreError::precondition(format!(
                "mainUnetId '{}' matches several tenants",
                record.main_unet_id
            )));
        }
    };

    let mut seen = HashSet::new();
    for unet in &record.unets {
        if !seen.insert(unet.unet_id.as_str()) {
            return Err(CoreError::precondition(format!(
                "tenant '{}' is declared more than once",
                unet.unet_id
            )));
        }
    }
    if record.unets.len() > MAX_TENANTS {
        return Err(CoreError::precondition(format!(
            "box hosts {} tenants, at most {MAX_TENANTS} are supported",
            record.unets.len()
        )));
    }

    let mut ordered = Vec::with_capacity(record.unets.len());
    ordered.push(main);
    ordered.extend(record.unets.iter().filter(|u| u.unet_id != record.main_unet_id));
    Ok(ordered)
}

fn warn_unused_uplinks(uplinks: &[Uplink], tenants: &[&UnetProfile]) {
    let used: HashSet<VlanId> = tenants
        .iter()
        .flat_map(|t| [&t.network.wan_ipv4.vlan, &t.network.wan_ipv6.vlan])
        .filter_map(|tag| tag.parse().ok())
        .collect();
    for uplink in uplinks.iter().filter(|u| !used.contains(&u.vlan)) {
        warn!(vlan = %uplink.vlan, "uplink VLAN declared but used by no tenant");
    }
}

/// Each switch VLAN id may only be configured once.
fn check_switch_vlans(builder: &Builder) -> Result<(), CoreError> {
    let mut seen = HashSet::new();
    let vlans = builder.nodes(Subsystem::Network).iter().filter_map(|node| match node {
        Node::SwitchVlan(vlan) => Some(vlan),
        _ => None,
    });
    for vlan in vlans {
        if !seen.insert(vlan.vid()) {
            return Err(CoreError::precondition(format!(
                "switch VLAN {} of section '{}' is already in use",
                vlan.vid(),
                vlan.name()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{LanIpv4, UnetNetwork, UnetWifi, VlanTag, WanIpv4, WanIpv6, WanVlan};

    fn unet(id: &str, vlan: u16) -> UnetProfile {
        UnetProfile {
            unet_id: id.into(),
            network: UnetNetwork {
                wan_ipv4: WanIpv4 {
                    vlan: VlanTag::from(vlan),
                    ip: "137.194.8.2/22".into(),
                },
                wan_ipv6: WanIpv6 {
                    vlan: VlanTag::from(vlan),
                    ip: "2a09:6847:fffe::2/64".into(),
                },
                ipv6_prefix: "2a09:6847:400::/48".into(),
                lan_ipv4: LanIpv4 {
                    address: "192.168.0.1/24".into(),
                },
                ipv6_delegations: Vec::new(),
            },
            wifi: UnetWifi {
                ssid: format!("Rezel-{id}"),
                psk: "password".into(),
            },
            firewall: crate::model::UnetFirewall::default(),
            dhcp: crate::model::UnetDhcp::default(),
        }
    }

    fn record(unets: Vec<UnetProfile>, main: &str, vlans: &[u16]) -> BoxRecord {
        BoxRecord {
            box_type: "ac2350".into(),
            main_unet_id: main.into(),
            mac: "AA-BB-CC-DD-EE-FF".into(),
            unets,
            wan_vlans: vlans
                .iter()
                .map(|&v| WanVlan {
                    vlan_id: VlanTag::from(v),
                    ipv4_gateway: Some("137.194.11.254".into()),
                    ipv6_gateway: Some("2a09:6847:ffff::1".into()),
                })
                .collect(),
        }
    }

    #[test]
    fn main_tenant_is_assembled_first() {
        let r = record(
            vec![unet("bbbbbbbb", 101), unet("aaaaaaaa", 101)],
            "aaaaaaaa",
            &[101],
        );
        let (_, plan) = assemble_box(&r, &BuildConfig::default()).unwrap();
        let order: Vec<(&str, TenantRole, u16)> = plan
            .tenants
            .iter()
            .map(|t| (t.unet_id.as_str(), t.role, t.lan_vlan))
            .collect();
        assert_eq!(
            order,
            [
                ("aaaaaaaa", TenantRole::Main, 1),
                ("bbbbbbbb", TenantRole::Secondary, 2)
            ]
        );
        assert_eq!(plan.mac, "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn section_counts_cover_every_subsystem() {
        let r = record(vec![unet("aaaaaaaa", 101)], "aaaaaaaa", &[101]);
        let (builder, plan) = assemble_box(&r, &BuildConfig::default()).unwrap();
        assert_eq!(plan.sections.len(), 5);
        for (subsystem, count) in &plan.sections {
            assert_eq!(*count, builder.nodes(*subsystem).len(), "{subsystem}");
        }
        assert_eq!(plan.sections[&Subsystem::Dropbear], 1);
        assert_eq!(plan.sections.values().sum::<usize>(), builder.len());
    }

    #[test]
    fn main_unet_must_match_exactly_one_tenant() {
        let r = record(vec![unet("aaaaaaaa", 101)], "cccccccc", &[101]);
        let err = assemble_box(&r, &BuildConfig::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "precondition failed: mainUnetId 'cccccccc' matches no tenant"
        );

        let r = record(vec![unet("aaaaaaaa", 101), unet("aaaaaaaa", 101)], "aaaaaaaa", &[101]);
        assert!(matches!(
            assemble_box(&r, &BuildConfig::default()),
            Err(CoreError::Precondition { .. })
        ));
    }

    #[test]
    fn extra_uplinks_get_switch_vlans() {
        let r = record(vec![unet("aaaaaaaa", 200)], "aaaaaaaa", &[101, 200]);
        let (builder, plan) = assemble_box(&r, &BuildConfig::default()).unwrap();
        assert_eq!(plan.extra_uplinks, [200]);
        assert!(builder.contains(
            Subsystem::Network,
            &crate::uci::attr::SectionName::new("vlan_200").unwrap()
        ));
    }

    #[test]
    fn uplink_clashing_with_infrastructure_vlan_is_rejected() {
        let r = record(vec![unet("aaaaaaaa", 65)], "aaaaaaaa", &[65]);
        let err = assemble_box(&r, &BuildConfig::default()).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateSection { .. } | CoreError::Precondition { .. }));
    }

    #[test]
    fn unknown_box_type_and_bad_mac() {
        let mut r = record(vec![unet("aaaaaaaa", 101)], "aaaaaaaa", &[101]);
        r.box_type = "wrt54g".into();
        assert!(matches!(
            assemble_box(&r, &BuildConfig::default()),
            Err(CoreError::UnsupportedBoxType { .. })
        ));

        let mut r = record(vec![unet("aaaaaaaa", 101)], "aaaaaaaa", &[101]);
        r.mac = "aa:bb:cc".into();
        let err = assemble_box(&r, &BuildConfig::default()).unwrap_err();
        assert!(err.to_string().starts_with("invalid mac 'aa:bb:cc'"));
    }

    #[test]
    fn artifact_names() {
        let mac = MacAddress::new("AA:BB:CC:DD:EE:FF").unwrap();
        assert_eq!(box_artifact_name(&mac), "configfile_aa:bb:cc:dd:ee:ff.txt");
        assert_eq!(
            default_artifact_name(BoxModel::Ac2350),
            "ac2350_defaultConfigfile.txt"
        );
    }

    #[test]
    fn default_build_has_no_tenant_sections() {
        let rendered = compile_default(BoxModel::Ac2350, &BuildConfig::default()).unwrap();
        assert!(rendered.network.contains("uci set network.vlan_1=switch_vlan\n"));
        assert!(!rendered.network.contains("br_lan_"));
        assert!(rendered.wireless.contains("uci set wireless.radio0=wifi-device\n"));
        assert!(!rendered.wireless.contains("wifi-iface"));
    }
}
