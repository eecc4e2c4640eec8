// ── Supported box models ──
//
// `Box.type` selects a hardware profile: which switch ports are physical
// LAN jacks, which one carries the uplink trunk, and how the radios are
// wired.

use std::str::FromStr;

use crate::error::CoreError;
use crate::uci::attr::{
    Band, Channel, Channels, Country, DeviceName, DevicePath, Htmode, NetworkPorts, SectionName,
    WifiDeviceType,
};
use crate::uci::wireless::RadioSettings;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    serde::Serialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum BoxModel {
    Ac2350,
}

impl BoxModel {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        Self::from_str(raw).map_err(|_| CoreError::UnsupportedBoxType {
            box_type: raw.to_owned(),
        })
    }

    pub fn profile(self) -> &'static HardwareProfile {
        match self {
            Self::Ac2350 => &AC2350,
        }
    }
}

/// Static wiring of one radio.
#[derive(Debug)]
pub struct RadioProfile {
    pub name: &'static str,
    pub path: &'static str,
    pub band: &'static str,
    pub htmode: &'static str,
    pub channels: Option<&'static str>,
}

/// Switch and radio layout of a box model.
#[derive(Debug)]
pub struct HardwareProfile {
    /// Kernel device of the CPU switch port; VLAN sub-interfaces hang off it.
    pub cpu_device: &'static str,
    /// Physical LAN jacks, untagged.
    pub lan_ports: &'static str,
    /// CPU port, tagged.
    pub cpu_port: &'static str,
    /// Uplink jack, tagged.
    pub uplink_port: &'static str,
    pub radios: &'static [RadioProfile],
}

static AC2350: HardwareProfile = HardwareProfile {
    cpu_device: "eth0",
    lan_ports: "2 3 4",
    cpu_port: "0t",
    uplink_port: "1t",
    radios: &[
        RadioProfile {
            name: "radio0",
            path: "pci0000:00/0000:00:00.0",
            band: "5g",
            htmode: "VHT80",
            channels: Some("36 40 44 48 100 104 108 112 116 120 124 128 132"),
        },
        RadioProfile {
            name: "radio1",
            path: "platform/ahb/18100000.wmac",
            band: "2g",
            htmode: "HT20",
            channels: None,
        },
    ],
};

impl HardwareProfile {
    pub fn cpu_device(&self) -> DeviceName {
        DeviceName::from_static(self.cpu_device)
    }

    /// Physical jacks plus the CPU trunk: the main tenant's LAN.
    pub fn main_lan_ports(&self) -> Result<NetworkPorts, CoreError> {
        NetworkPorts::new(format!("{} {}", self.lan_ports, self.cpu_port))
    }

    /// CPU trunk only: a secondary tenant's LAN, reachable over Wi-Fi.
    pub fn trunk_only_ports(&self) -> Result<NetworkPorts, CoreError> {
        NetworkPorts::new(self.cpu_port)
    }

    /// Uplink jack plus CPU trunk: management and WAN VLANs.
    pub fn uplink_ports(&self) -> Result<NetworkPorts, CoreError> {
        NetworkPorts::new(format!("{} {}", self.uplink_port, self.cpu_port))
    }

    pub fn radio_settings(
        &self,
        country: &Country,
    ) -> Result<Vec<(SectionName, RadioSettings)>, CoreError> {
        self.radios
            .iter()
            .map(|radio| {
                let settings = RadioSettings {
                    device_type: WifiDeviceType::from_static("mac80211"),
                    path: DevicePath::new(radio.path)?,
                    band: Band::new(radio.band)?,
                    htmode: Htmode::new(radio.htmode)?,
                    channel: Channel::from_static("auto"),
                    channels: radio.channels.map(Channels::new).transpose()?,
                    country: country.clone(),
                    disabled: false,
                };
                Ok((SectionName::new(radio.name)?, settings))
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn box_type_is_case_insensitive() {
        assert_eq!(BoxModel::parse("ac2350").unwrap(), BoxModel::Ac2350);
        assert_eq!(BoxModel::parse("AC2350").unwrap(), BoxModel::Ac2350);
        assert_eq!(BoxModel::Ac2350.to_string(), "ac2350");
    }

    #[test]
    fn unknown_box_type() {
        let err = BoxModel::parse("wrt54g").unwrap_err();
        assert_eq!(err.to_string(), "unsupported box type 'wrt54g'");
    }

    #[test]
    fn ac2350_port_sets() {
        let hw = BoxModel::Ac2350.profile();
        assert_eq!(hw.main_lan_ports().unwrap().as_str(), "2 3 4 0t");
        assert_eq!(hw.trunk_only_ports().unwrap().as_str(), "0t");
        assert_eq!(hw.uplink_ports().unwrap().as_str(), "1t 0t");
    }

    #[test]
    fn ac2350_radios() {
        let radios = BoxModel::Ac2350
            .profile()
            .radio_settings(&Country::new("FR").unwrap())
            .unwrap();
        let names: Vec<&str> = radios.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["radio0", "radio1"]);
        assert_eq!(radios[0].1.htmode.as_str(), "VHT80");
        assert!(radios[1].1.channels.is_none());
    }
}
