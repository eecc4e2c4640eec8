use std::fmt;

use serde::{Deserialize, Serialize};

use super::unet::UnetProfile;
use crate::error::CoreError;
use crate::uci::attr::VlanId;

/// One physical router and the tenants it hosts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxRecord {
    /// Device model tag (`ac2350`).
    #[serde(rename = "type")]
    pub box_type: String,
    #[serde(alias = "main_unet_id")]
    pub main_unet_id: String,
    pub mac: String,
    pub unets: Vec<UnetProfile>,
    #[serde(default, alias = "wanVlan", alias = "wan_vlan", alias = "wan_vlans")]
    pub wan_vlans: Vec<WanVlan>,
}

impl BoxRecord {
    pub fn main_unet(&self) -> impl Iterator<Item = &UnetProfile> {
        self.unets
            .iter()
            .filter(|unet| unet.unet_id == self.main_unet_id)
    }
}

/// Uplink VLAN and the default routers reachable through it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WanVlan {
    #[serde(alias = "vlan_id")]
    pub vlan_id: VlanTag,
    #[serde(default, alias = "ipv4_gateway")]
    pub ipv4_gateway: Option<String>,
    #[serde(default, alias = "ipv6_gateway")]
    pub ipv6_gateway: Option<String>,
}

/// VLAN number as found in stored documents: sometimes a number,
/// sometimes its decimal text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VlanTag {
    Number(i64),
    Text(String),
}

impl VlanTag {
    pub fn parse(&self) -> Result<VlanId, CoreError> {
        match self {
            Self::Number(n) => VlanId::new(*n),
            Self::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| CoreError::invalid(VlanId::FIELD, s, "must be a decimal VLAN id"))
                .and_then(VlanId::new),
        }
    }
}

impl fmt::Display for VlanTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<u16> for VlanTag {
    fn from(vid: u16) -> Self {
        Self::Number(i64::from(vid))
    }
}
