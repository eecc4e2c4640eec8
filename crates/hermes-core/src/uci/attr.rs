// ── Validated attributes ──
//
// Every scalar that ends up inside a generated UCI directive is wrapped in
// one of these types. The constructor is the only place input is checked;
// afterwards the value is interpolated verbatim by the section renderers.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use strum::IntoEnumIterator;

use crate::error::CoreError;

// ── Pattern-checked strings ─────────────────────────────────────────

macro_rules! pattern_attribute {
    (
        $(#[$meta:meta])*
        $name:ident, field = $field:literal, pattern = $pattern:literal, reason = $reason:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            pub const FIELD: &'static str = $field;

            pub fn new(raw: impl Into<String>) -> Result<Self, CoreError> {
                static PATTERN: LazyLock<Regex> =
                    LazyLock::new(|| Regex::new($pattern).expect("static attribute pattern"));
                let raw = raw.into();
                if PATTERN.is_match(&raw) {
                    Ok(Self(raw))
                } else {
                    Err(CoreError::invalid(Self::FIELD, raw, $reason))
                }
            }

            /// Literal known to satisfy the pattern.
            #[allow(dead_code)]
            pub(crate) fn from_static(raw: &'static str) -> Self {
                debug_assert!(Self::new(raw).is_ok(), "invalid literal {raw}");
                Self(raw.to_owned())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = CoreError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

pattern_attribute!(
    /// Tenant identifier: exactly eight lowercase alphanumerics.
    ///
    /// Doubles as the namespace key of every section generated for a tenant,
    /// so two distinct ids can never produce colliding section names.
    UNetId,
    field = "UNetId",
    pattern = r"^[a-z0-9]{8}$",
    reason = "must be exactly 8 characters from [a-z0-9]"
);

pattern_attribute!(
    /// Name of a UCI section (`network.<name>`).
    SectionName,
    field = "SectionName",
    pattern = r"^[A-Za-z0-9_-]+$",
    reason = "must be non-empty and only contain [A-Za-z0-9_-]"
);

pattern_attribute!(
    /// Prefix glued in front of a tenant id to form a section name (`wan_`, `br_lan_`).
    SectionNamePrefix,
    field = "SectionNamePrefix",
    pattern = r"^[A-Za-z0-9_-]+$",
    reason = "must be non-empty and only contain [A-Za-z0-9_-]"
);

pattern_attribute!(
    /// Switch port list such as `2 3 4 0t`, or a device list such as `eth0.1 eth0.2`.
    NetworkPorts,
    field = "NetworkPorts",
    pattern = r"^[A-Za-z0-9_.-]+( [A-Za-z0-9_.-]+)*$",
    reason = "must be a single-space separated list of [A-Za-z0-9_.-] tokens"
);

pattern_attribute!(
    /// Linux network device name (`eth0.101`, `br_lan_aaaaaaaa`, `lo`).
    DeviceName,
    field = "DeviceName",
    pattern = r"^[A-Za-z0-9_.-]{1,15}$",
    reason = "must be 1-15 characters from [A-Za-z0-9_.-]"
);

pattern_attribute!(
    /// sysfs path of a radio (`platform/ahb/18100000.wmac`).
    DevicePath,
    field = "DevicePath",
    pattern = r"^[A-Za-z0-9_:./-]+$",
    reason = "must only contain [A-Za-z0-9_:./-]"
);

pattern_attribute!(
    /// Wireless driver type (`mac80211`).
    WifiDeviceType,
    field = "WifiDeviceType",
    pattern = r"^[A-Za-z0-9]+$",
    reason = "must only contain [A-Za-z0-9]"
);

pattern_attribute!(
    /// 802.11 channel width mode (`HT20`, `VHT80`).
    Htmode,
    field = "Htmode",
    pattern = r"^[A-Za-z0-9]+$",
    reason = "must only contain [A-Za-z0-9]"
);

pattern_attribute!(
    /// ISO 3166 regulatory domain.
    Country,
    field = "Country",
    pattern = r"^[A-Z]{2}$",
    reason = "must be a two-letter uppercase country code"
);

pattern_attribute!(
    Band,
    field = "Band",
    pattern = r"^[a-z0-9]+$",
    reason = "must only contain [a-z0-9]"
);

pattern_attribute!(
    /// `auto` or a channel number.
    Channel,
    field = "Channel",
    pattern = r"^(auto|[0-9]{1,3})$",
    reason = "must be 'auto' or a 1-3 digit channel number"
);

pattern_attribute!(
    /// Space separated list of channels the radio may pick from.
    Channels,
    field = "Channels",
    pattern = r"^[0-9]{1,3}( [0-9]{1,3})*$",
    reason = "must be a single-space separated list of channel numbers"
);

pattern_attribute!(
    Ssid,
    field = "SSID",
    pattern = r"^[A-Za-z0-9_-]{1,32}$",
    reason = "must be 1-32 characters from [A-Za-z0-9_-]"
);

pattern_attribute!(
    /// WPA passphrase: 8 to 63 printable ASCII characters, space excluded.
    WifiPassphrase,
    field = "WifiPassphrase",
    pattern = r"^[\x21-\x7E]{8,63}$",
    reason = "must be 8-63 printable ASCII characters (0x21-0x7E)"
);

pattern_attribute!(
    /// Free-text label of a firewall rule or redirect.
    Description,
    field = "Description",
    pattern = r"^[A-Za-z0-9 _.:/-]{1,128}$",
    reason = "must be 1-128 characters from [A-Za-z0-9 _.:/-]"
);

pattern_attribute!(
    /// fw4 ipset match expression (`net_dest`, `ip_src`).
    MatchIpSet,
    field = "MatchIPSet",
    pattern = r"^(ip|port|mac|net|set)_(src|dest)$",
    reason = "must be one of ip|port|mac|net|set followed by _src or _dest"
);

pattern_attribute!(
    /// DHCPv6 client DUID in colon-separated hex.
    Duid,
    field = "DUID",
    pattern = r"^[0-9a-f]{2}(:[0-9a-f]{2}){1,127}$",
    reason = "must be 2-128 lowercase hex octets separated by ':'"
);

pattern_attribute!(
    /// Host name of a static DHCP lease (a single DNS label).
    Hostname,
    field = "Hostname",
    pattern = r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?$",
    reason = "must be a DNS label of 1-63 characters from [A-Za-z0-9-]"
);

pattern_attribute!(
    /// dnsmasq lease time (`12h`, `3600`, `infinite`).
    LeaseTime,
    field = "LeaseTime",
    pattern = r"^([0-9]+[smhdw]?|infinite)$",
    reason = "must be a number with an optional s/m/h/d/w unit, or 'infinite'"
);

impl SectionName {
    /// `prefix` + `unetid`, e.g. `wan_` + `aaaaaaaa` → `wan_aaaaaaaa`.
    pub fn prefixed(prefix: &SectionNamePrefix, unetid: &UNetId) -> Self {
        Self(format!("{prefix}{unetid}"))
    }

    /// `unetid` + `_` + `name`, the form used for rules and redirects.
    pub fn scoped(unetid: &UNetId, name: &SectionName) -> Self {
        Self(format!("{unetid}_{name}"))
    }

    /// Join already-validated parts with `_`.
    pub fn join(parts: &[&dyn AsRef<str>]) -> Self {
        let joined = parts
            .iter()
            .map(|p| p.as_ref())
            .collect::<Vec<_>>()
            .join("_");
        Self(joined)
    }
}

impl DeviceName {
    /// VLAN sub-interface of the CPU port: `eth0` + `101` → `eth0.101`.
    pub fn vlan(parent: &DeviceName, vid: VlanId) -> Result<Self, CoreError> {
        Self::new(format!("{parent}.{vid}"))
    }

    /// A bridge section's name doubles as its device name.
    pub fn from_section(name: &SectionName) -> Result<Self, CoreError> {
        Self::new(name.as_str())
    }
}

// ── Numeric attributes ──────────────────────────────────────────────

/// TCP/UDP port number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TcpUdpPort(u16);

impl TcpUdpPort {
    pub const FIELD: &'static str = "TCPUDPPort";

    pub fn new(raw: i64) -> Result<Self, CoreError> {
        u16::try_from(raw)
            .map(Self)
            .map_err(|_| CoreError::invalid(Self::FIELD, raw, "must be an integer in 0..=65535"))
    }

    pub const fn from_u16(port: u16) -> Self {
        Self(port)
    }

    pub fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for TcpUdpPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 802.1Q VLAN id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VlanId(u16);

impl VlanId {
    pub const FIELD: &'static str = "VlanId";

    pub fn new(raw: i64) -> Result<Self, CoreError> {
        match u16::try_from(raw) {
            Ok(vid @ 1..=4094) => Ok(Self(vid)),
            _ => Err(CoreError::invalid(Self::FIELD, raw, "must be an integer in 1..=4094")),
        }
    }

    pub fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for VlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Policy routing table number.
///
/// Built from a one-digit band and the tenant's two-digit LAN VLAN ordinal:
/// band `1` + ordinal `2` → table `102`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteTable(u32);

/// The three routing table bands a tenant can own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableBand {
    /// IPv4 default route of a secondary tenant.
    Ipv4Default,
    /// IPv6 default route of every tenant.
    Ipv6Default,
    /// Static IPv6 prefix delegation routes.
    Delegation,
}

impl TableBand {
    /// Leading digit of every table in the band.
    pub fn digit(self) -> u32 {
        match self {
            Self::Ipv4Default => 1,
            Self::Ipv6Default => 6,
            Self::Delegation => 7,
        }
    }
}

impl RouteTable {
    pub const FIELD: &'static str = "RouteTable";

    /// Derive the table for `band` and a LAN VLAN ordinal in `1..=99`.
    pub fn for_tenant(band: TableBand, ordinal: u16) -> Result<Self, CoreError> {
        if !(1..=99).contains(&ordinal) {
            return Err(CoreError::invalid(
                Self::FIELD,
                ordinal,
                "tenant ordinal must be in 1..=99",
            ));
        }
        Ok(Self(band.digit() * 100 + u32::from(ordinal)))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Closed sets ─────────────────────────────────────────────────────

/// Parse `raw` as one member of a strum-derived closed set.
fn closed_set<T>(field: &'static str, raw: &str) -> Result<T, CoreError>
where
    T: FromStr + IntoEnumIterator + AsRef<str>,
{
    raw.parse().map_err(|_| {
        let allowed = T::iter()
            .map(|v| v.as_ref().to_owned())
            .collect::<Vec<_>>()
            .join(", ");
        CoreError::invalid(field, raw, format!("expected one of: {allowed}"))
    })
}

macro_rules! closed_attribute {
    ($name:ident, $field:literal) => {
        impl $name {
            pub const FIELD: &'static str = $field;

            pub fn parse(raw: &str) -> Result<Self, CoreError> {
                closed_set(Self::FIELD, raw)
            }
        }
    };
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr, strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum InterfaceProto {
    Static,
    Dhcp,
    Pppoe,
    Dhcpv6,
    None,
}
closed_attribute!(InterfaceProto, "InterfaceProto");

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr, strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum WifiMode {
    Sta,
    Ap,
    Adhoc,
    Monitor,
    Mesh,
}
closed_attribute!(WifiMode, "Mode");

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr, strum::EnumIter,
)]
pub enum Encryption {
    #[strum(serialize = "none")]
    None,
    #[strum(serialize = "wep")]
    Wep,
    #[strum(serialize = "psk")]
    Psk,
    #[strum(serialize = "psk2")]
    Psk2,
    #[strum(serialize = "psk-mixed")]
    PskMixed,
    #[strum(serialize = "sae")]
    Sae,
}
closed_attribute!(Encryption, "Encryption");

/// Zone default policy for input, output and forward chains.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr, strum::EnumIter,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ZonePolicy {
    Accept,
    Reject,
    Drop,
}
closed_attribute!(ZonePolicy, "InOutForw");

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr, strum::EnumIter,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Target {
    Accept,
    Reject,
    Drop,
    Mark,
    Notrack,
}
closed_attribute!(Target, "Target");

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr, strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum Family {
    Ipv4,
    Ipv6,
    Any,
}
closed_attribute!(Family, "Family");

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr, strum::EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
pub enum IcmpType {
    EchoRequest,
    EchoReply,
    DestinationUnreachable,
    PacketTooBig,
    TimeExceeded,
    ParameterProblem,
    NeighbourSolicitation,
    NeighbourAdvertisement,
    RouterSolicitation,
    RouterAdvertisement,
}
closed_attribute!(IcmpType, "IcmpType");

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr, strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum ProtocolName {
    Tcp,
    Udp,
    Udplite,
    Icmp,
    Ah,
    Esp,
    Sctp,
    All,
}

/// One protocol or a space separated list of protocols (`tcp udp`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Protocol(Vec<ProtocolName>);

impl Protocol {
    pub const FIELD: &'static str = "Protocol";

    pub fn new(raw: &str) -> Result<Self, CoreError> {
        if raw.is_empty() {
            return Err(CoreError::invalid(Self::FIELD, raw, "must name at least one protocol"));
        }
        raw.split(' ')
            .map(|name| closed_set::<ProtocolName>(Self::FIELD, name))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
            .map_err(|err| err.relabel_value(raw))
    }

    pub fn single(name: ProtocolName) -> Self {
        Self(vec![name])
    }

    pub fn names(&self) -> &[ProtocolName] {
        &self.0
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for name in &self.0 {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{name}")?;
            first = false;
        }
        Ok(())
    }
}

impl CoreError {
    fn relabel_value(self, raw: &str) -> Self {
        match self {
            Self::InvalidField { field, reason, .. } => Self::InvalidField {
                field,
                value: raw.to_owned(),
                reason,
            },
            other => other,
        }
    }
}

// ── Hardware addresses ──────────────────────────────────────────────

/// MAC address, canonicalized to lowercase colon-separated form (aa:bb:cc:dd:ee:ff).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddress(String);

impl MacAddress {
    pub const FIELD: &'static str = "MacAddress";

    /// Accepts colon- or dash-separated hex in either case.
    pub fn new(raw: &str) -> Result<Self, CoreError> {
        static PATTERN: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[0-9a-f]{2}(:[0-9a-f]{2}){5}$").expect("static attribute pattern")
        });
        let normalized = raw.to_ascii_lowercase().replace('-', ":");
        if PATTERN.is_match(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(CoreError::invalid(
                Self::FIELD,
                raw,
                "must be 6 hex octets separated by ':' or '-'",
            ))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MacAddress {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn unet_id_boundaries() {
        assert!(UNetId::new("aaaaaaa").is_err());
        assert_eq!(UNetId::new("aaaaaaaa").unwrap().as_str(), "aaaaaaaa");
        assert!(UNetId::new("aaaaaaaaa").is_err());
        assert!(UNetId::new("AAAAAAAA").is_err());
        assert!(UNetId::new("aaaa-aaa").is_err());
    }

    #[test]
    fn ssid_boundaries() {
        assert!(Ssid::new("").is_err());
        assert!(Ssid::new("a".repeat(31)).is_ok());
        assert!(Ssid::new("a".repeat(32)).is_ok());
        assert!(Ssid::new("a".repeat(33)).is_err());
        assert!(Ssid::new("Rezel main").is_err());
    }

    #[test]
    fn passphrase_boundaries() {
        assert!(WifiPassphrase::new("a".repeat(7)).is_err());
        assert!(WifiPassphrase::new("a".repeat(8)).is_ok());
        assert!(WifiPassphrase::new("a".repeat(63)).is_ok());
        assert!(WifiPassphrase::new("a".repeat(64)).is_err());
        assert!(WifiPassphrase::new("with space").is_err());
        assert!(WifiPassphrase::new("quote'inside").is_ok());
    }

    #[test]
    fn port_boundaries() {
        assert!(TcpUdpPort::new(-1).is_err());
        assert_eq!(TcpUdpPort::new(0).unwrap().get(), 0);
        assert_eq!(TcpUdpPort::new(65535).unwrap().to_string(), "65535");
        assert!(TcpUdpPort::new(65536).is_err());
    }

    #[test]
    fn protocol_lists() {
        assert_eq!(Protocol::new("tcp").unwrap().to_string(), "tcp");
        assert_eq!(Protocol::new("tcp udp").unwrap().to_string(), "tcp udp");
        assert!(Protocol::new("").is_err());
        assert!(Protocol::new("tcp  udp").is_err());
        assert!(Protocol::new("gre").is_err());

        let err = Protocol::new("tcp gre").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid Protocol 'tcp gre': expected one of: tcp, udp, udplite, icmp, ah, esp, sctp, all"
        );
    }

    #[test]
    fn closed_sets_render_their_uci_spelling() {
        assert_eq!(Family::parse("ipv6").unwrap().to_string(), "ipv6");
        assert!(Family::parse("inet").is_err());
        assert_eq!(ZonePolicy::Reject.to_string(), "REJECT");
        assert_eq!(Target::Notrack.to_string(), "NOTRACK");
        assert_eq!(Encryption::PskMixed.to_string(), "psk-mixed");
        assert_eq!(IcmpType::EchoRequest.to_string(), "echo-request");
        assert_eq!(InterfaceProto::parse("dhcpv6").unwrap(), InterfaceProto::Dhcpv6);
    }

    #[test]
    fn match_ipset() {
        assert!(MatchIpSet::new("net_dest").is_ok());
        assert!(MatchIpSet::new("ip_src").is_ok());
        assert!(MatchIpSet::new("ipx_src").is_err());
        assert!(MatchIpSet::new("net_both").is_err());
    }

    #[test]
    fn route_table_bands() {
        let table = RouteTable::for_tenant(TableBand::Ipv4Default, 2).unwrap();
        assert_eq!(table.to_string(), "102");
        let table = RouteTable::for_tenant(TableBand::Ipv6Default, 12).unwrap();
        assert_eq!(table.get(), 612);
        assert!(RouteTable::for_tenant(TableBand::Delegation, 0).is_err());
        assert!(RouteTable::for_tenant(TableBand::Delegation, 100).is_err());
        let table = RouteTable::for_tenant(TableBand::Delegation, 3).unwrap();
        assert_eq!(table.get() / 100, TableBand::Delegation.digit());
    }

    #[test]
    fn vlan_device_names() {
        let eth0 = DeviceName::new("eth0").unwrap();
        let dev = DeviceName::vlan(&eth0, VlanId::new(101).unwrap()).unwrap();
        assert_eq!(dev.as_str(), "eth0.101");
        assert!(VlanId::new(0).is_err());
        assert!(VlanId::new(4095).is_err());
    }

    #[test]
    fn mac_addresses_are_canonicalized() {
        let mac = MacAddress::new("AA-BB-CC-DD-EE-FF").unwrap();
        assert_eq!(mac.as_str(), "aa:bb:cc:dd:ee:ff");
        assert!(MacAddress::new("aa:bb:cc:dd:ee").is_err());
        assert!(MacAddress::new("aa:bb:cc:dd:ee:gg").is_err());
    }

    #[test]
    fn section_name_composition() {
        let unet = UNetId::new("aaaaaaaa").unwrap();
        let prefix = SectionNamePrefix::new("br_lan_").unwrap();
        assert_eq!(SectionName::prefixed(&prefix, &unet).as_str(), "br_lan_aaaaaaaa");

        let name = SectionName::new("wan_allow_ping").unwrap();
        assert_eq!(SectionName::scoped(&unet, &name).as_str(), "aaaaaaaa_wan_allow_ping");
    }
}
