// ── wireless package ──

use super::Subsystem;
use super::attr::{
    Band, Channel, Channels, Country, DevicePath, Encryption, Htmode, SectionName, Ssid, UNetId,
    WifiDeviceType, WifiMode, WifiPassphrase,
};
use super::network::Interface;
use super::node::{Ref, Section};
use super::writer::SectionWriter;

/// Radio settings shared by every AP that uses it.
#[derive(Debug, Clone, PartialEq)]
pub struct RadioSettings {
    pub device_type: WifiDeviceType,
    pub path: DevicePath,
    pub band: Band,
    pub htmode: Htmode,
    pub channel: Channel,
    pub channels: Option<Channels>,
    pub country: Country,
    pub disabled: bool,
}

/// One physical radio (`config wifi-device`).
#[derive(Debug, Clone, PartialEq)]
pub struct WifiDevice {
    name: SectionName,
    settings: RadioSettings,
}

impl WifiDevice {
    pub fn new(name: SectionName, settings: RadioSettings) -> Self {
        Self { name, settings }
    }

    pub fn band(&self) -> &Band {
        &self.settings.band
    }
}

impl Section for WifiDevice {
    const SUBSYSTEM: Subsystem = Subsystem::Wireless;

    fn name(&self) -> &SectionName {
        &self.name
    }

    fn section_type(&self) -> &'static str {
        "wifi-device"
    }

    fn write_options(&self, w: &mut SectionWriter<'_>) {
        let s = &self.settings;
        w.set("type", &s.device_type)
            .set("path", &s.path)
            .set("channel", &s.channel)
            .set("htmode", &s.htmode)
            .set("country", &s.country)
            .set("band", &s.band)
            .set("disabled", u8::from(s.disabled))
            .set_opt("channels", s.channels.as_ref());
    }
}

/// Access point on a radio, bridged onto a tenant LAN. Named
/// `wifi_<unetid>_<radio>`.
#[derive(Debug, Clone, PartialEq)]
pub struct WifiIface {
    name: SectionName,
    device: Ref<WifiDevice>,
    network: Ref<Interface>,
    mode: WifiMode,
    ssid: Ssid,
    encryption: Encryption,
    key: WifiPassphrase,
    disabled: bool,
}

impl WifiIface {
    /// WPA2-PSK access point.
    pub fn access_point(
        unetid: &UNetId,
        device: Ref<WifiDevice>,
        network: Ref<Interface>,
        ssid: Ssid,
        key: WifiPassphrase,
    ) -> Self {
        Self {
            name: SectionName::join(&[&"wifi", unetid, device.name()]),
            device,
            network,
            mode: WifiMode::Ap,
            ssid,
            encryption: Encryption::Psk2,
            key,
            disabled: false,
        }
    }
}

impl Section for WifiIface {
    const SUBSYSTEM: Subsystem = Subsystem::Wireless;

    fn name(&self) -> &SectionName {
        &self.name
    }

    fn section_type(&self) -> &'static str {
        "wifi-iface"
    }

    fn write_options(&self, w: &mut SectionWriter<'_>) {
        w.set("device", &self.device)
            .set("network", &self.network)
            .set("mode", self.mode)
            .set("ssid", &self.ssid)
            .set("encryption", self.encryption)
            .set("key", &self.key)
            .set("disabled", u8::from(self.disabled));
    }

    fn references(&self) -> Vec<(Subsystem, &SectionName)> {
        vec![self.device.target(), self.network.target()]
    }
}
