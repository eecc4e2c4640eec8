// ── Runtime build configuration ──
//
// Operator-level inputs that are the same for every box: resolvers, the
// device ULA prefix and the radio regulatory domain. The CLI builds a
// `BuildConfig` from its settings file and hands it in; the core never
// reads files or the environment.

use std::net::{Ipv4Addr, Ipv6Addr};

use ipnetwork::Ipv6Network;

use crate::uci::attr::{Country, TcpUdpPort};
use crate::uci::dhcp::DnsServers;

/// Port of the management daemon reachable from the management VLAN.
pub const MANAGEMENT_DAEMON_PORT: u16 = 50051;

/// Inputs to Default Assembly that do not come from the `Box` record.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    /// Handed to every tenant pool and used as dnsmasq upstream.
    pub dns: DnsServers,
    pub ula_prefix: Ipv6Network,
    pub country: Country,
    pub ssh_port: TcpUdpPort,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            dns: DnsServers {
                ipv4: vec![Ipv4Addr::new(8, 8, 8, 8)],
                ipv6: vec![Ipv6Addr::new(0x2001, 0x4860, 0x4860, 0, 0, 0, 0, 0x8888)],
            },
            ula_prefix: Ipv6Network::new(Ipv6Addr::new(0xfdb2, 0xb6c0, 0x8430, 0, 0, 0, 0, 0), 48)
                .expect("static ULA prefix"),
            country: Country::from_static("FR"),
            ssh_port: TcpUdpPort::from_u16(22),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_fleet() {
        let config = BuildConfig::default();
        assert_eq!(config.ula_prefix.to_string(), "fdb2:b6c0:8430::/48");
        assert_eq!(config.dns.ipv4[0].to_string(), "8.8.8.8");
        assert_eq!(config.dns.ipv6[0].to_string(), "2001:4860:4860::8888");
        assert_eq!(config.country.as_str(), "FR");
        assert_eq!(config.ssh_port.get(), 22);
    }
}
