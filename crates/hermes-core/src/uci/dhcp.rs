// ── dhcp package ──

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use super::Subsystem;
use super::attr::{Duid, Hostname, LeaseTime, MacAddress, SectionName, UNetId};
use super::network::Interface;
use super::node::{Ref, Section};
use super::writer::SectionWriter;

/// Resolvers handed out to clients or used as upstream servers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DnsServers {
    pub ipv4: Vec<Ipv4Addr>,
    pub ipv6: Vec<Ipv6Addr>,
}

impl DnsServers {
    pub fn is_empty(&self) -> bool {
        self.ipv4.is_empty() && self.ipv6.is_empty()
    }
}

// ── Service options ─────────────────────────────────────────────────

/// dnsmasq daemon options.
#[derive(Debug, Clone, PartialEq)]
pub struct Dnsmasq {
    name: SectionName,
    upstream: DnsServers,
}

impl Dnsmasq {
    pub fn new(upstream: DnsServers) -> Self {
        Self {
            name: SectionName::from_static("dnsmasq"),
            upstream,
        }
    }
}

impl Section for Dnsmasq {
    const SUBSYSTEM: Subsystem = Subsystem::Dhcp;

    fn name(&self) -> &SectionName {
        &self.name
    }

    fn section_type(&self) -> &'static str {
        "dnsmasq"
    }

    fn write_options(&self, w: &mut SectionWriter<'_>) {
        w.set("domainneeded", 1)
            .set("authoritative", 1)
            .set("boguspriv", 1)
            .set("rebind_protection", 1)
            .set("rebind_localhost", 1)
            .set("localise_queries", 1)
            .set("filterwin2k", 0)
            .set("local", "/lan/")
            .set("domain", "lan")
            .set("expandhosts", 1)
            .set("nonegcache", 0)
            .set("readethers", 1)
            .set("leasefile", "/tmp/dhcp.leases")
            .set("resolvfile", "/tmp/resolv.conf.d/resolv.conf.auto")
            .set("nonwildcard", 1)
            .set("localservice", 1)
            .set("ednspacket_max", 1232);
        for server in &self.upstream.ipv4 {
            w.add_list("server", server);
        }
        for server in &self.upstream.ipv6 {
            w.add_list("server", server);
        }
    }
}

/// odhcpd daemon options. dnsmasq stays the DHCPv4 server.
#[derive(Debug, Clone, PartialEq)]
pub struct Odhcpd {
    name: SectionName,
    loglevel: u8,
}

impl Odhcpd {
    pub fn new(loglevel: u8) -> Self {
        Self {
            name: SectionName::from_static("odhcpd"),
            loglevel,
        }
    }
}

impl Section for Odhcpd {
    const SUBSYSTEM: Subsystem = Subsystem::Dhcp;

    fn name(&self) -> &SectionName {
        &self.name
    }

    fn section_type(&self) -> &'static str {
        "odhcpd"
    }

    fn write_options(&self, w: &mut SectionWriter<'_>) {
        w.set("maindhcp", 0)
            .set("leasefile", "/tmp/hosts/odhcpd")
            .set("leasetrigger", "/usr/sbin/odhcpd-update")
            .set("loglevel", self.loglevel);
    }
}

// ── Pool ────────────────────────────────────────────────────────────

/// Address pool served on one LAN interface, named `dhcp_<interface>`.
#[derive(Debug, Clone, PartialEq)]
pub struct DhcpPool {
    name: SectionName,
    interface: Ref<Interface>,
    start: u16,
    limit: u16,
    leasetime: LeaseTime,
    dns: DnsServers,
}

impl DhcpPool {
    pub fn new(
        interface: Ref<Interface>,
        start: u16,
        limit: u16,
        leasetime: LeaseTime,
        dns: DnsServers,
    ) -> Self {
        Self {
            name: SectionName::join(&[&"dhcp", interface.name()]),
            interface,
            start,
            limit,
            leasetime,
            dns,
        }
    }
}

impl Section for DhcpPool {
    const SUBSYSTEM: Subsystem = Subsystem::Dhcp;

    fn name(&self) -> &SectionName {
        &self.name
    }

    fn section_type(&self) -> &'static str {
        "dhcp"
    }

    fn write_options(&self, w: &mut SectionWriter<'_>) {
        w.set("interface", &self.interface)
            .set("start", self.start)
            .set("limit", self.limit)
            .set("leasetime", &self.leasetime)
            .set("ra", "server");
        // dnsmasq takes every IPv4 resolver in a single option 6;
        // odhcpd takes one `dns` entry per IPv6 resolver.
        if !self.dns.ipv4.is_empty() {
            let servers: Vec<String> = self.dns.ipv4.iter().map(ToString::to_string).collect();
            w.add_list("dhcp_option", format!("6,{}", servers.join(",")));
        }
        for server in &self.dns.ipv6 {
            w.add_list("dns", server);
        }
    }

    fn references(&self) -> Vec<(Subsystem, &SectionName)> {
        vec![self.interface.target()]
    }
}

// ── Host ────────────────────────────────────────────────────────────

/// Static lease, named `<unetid>_<hostname>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Host {
    name: SectionName,
    hostname: Hostname,
    ip: Option<IpAddr>,
    mac: Option<MacAddress>,
    duid: Option<Duid>,
}

impl Host {
    pub fn new(unetid: &UNetId, hostname: Hostname) -> Self {
        Self {
            name: SectionName::join(&[unetid, &hostname]),
            hostname,
            ip: None,
            mac: None,
            duid: None,
        }
    }

    pub fn ip(mut self, ip: IpAddr) -> Self {
        self.ip = Some(ip);
        self
    }

    pub fn mac(mut self, mac: MacAddress) -> Self {
        self.mac = Some(mac);
        self
    }

    pub fn duid(mut self, duid: Duid) -> Self {
        self.duid = Some(duid);
        self
    }
}

impl Section for Host {
    const SUBSYSTEM: Subsystem = Subsystem::Dhcp;

    fn name(&self) -> &SectionName {
        &self.name
    }

    fn section_type(&self) -> &'static str {
        "host"
    }

    fn write_options(&self, w: &mut SectionWriter<'_>) {
        w.set("name", &self.hostname)
            .set_opt("ip", self.ip.as_ref())
            .set_opt("mac", self.mac.as_ref())
            .set_opt("duid", self.duid.as_ref());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::uci::attr::InterfaceProto;

    fn lan() -> Interface {
        Interface::new(SectionName::new("lan_aaaaaaaa").unwrap(), InterfaceProto::Static)
    }

    #[test]
    fn pool_renders_v4_dns_as_one_option_and_v6_as_a_list() {
        let dns = DnsServers {
            ipv4: vec!["8.8.8.8".parse().unwrap(), "1.1.1.1".parse().unwrap()],
            ipv6: vec![
                "2001:4860:4860::8888".parse().unwrap(),
                "2606:4700:4700::1111".parse().unwrap(),
            ],
        };
        let pool = DhcpPool::new(lan().handle(), 100, 150, LeaseTime::new("12h").unwrap(), dns);
        assert_eq!(
            pool.render(),
            "uci set dhcp.dhcp_lan_aaaaaaaa=dhcp\n\
             uci set dhcp.dhcp_lan_aaaaaaaa.interface='lan_aaaaaaaa'\n\
             uci set dhcp.dhcp_lan_aaaaaaaa.start='100'\n\
             uci set dhcp.dhcp_lan_aaaaaaaa.limit='150'\n\
             uci set dhcp.dhcp_lan_aaaaaaaa.leasetime='12h'\n\
             uci set dhcp.dhcp_lan_aaaaaaaa.ra='server'\n\
             uci add_list dhcp.dhcp_lan_aaaaaaaa.dhcp_option='6,8.8.8.8,1.1.1.1'\n\
             uci add_list dhcp.dhcp_lan_aaaaaaaa.dns='2001:4860:4860::8888'\n\
             uci add_list dhcp.dhcp_lan_aaaaaaaa.dns='2606:4700:4700::1111'\n"
        );
    }

    #[test]
    fn pool_without_v4_dns_skips_option_6() {
        let pool = DhcpPool::new(
            lan().handle(),
            100,
            150,
            LeaseTime::new("12h").unwrap(),
            DnsServers::default(),
        );
        assert!(!pool.render().contains("dhcp_option"));
    }

    #[test]
    fn host_uses_canonical_mac() {
        let unet = UNetId::new("aaaaaaaa").unwrap();
        let host = Host::new(&unet, Hostname::new("printer").unwrap())
            .ip("192.168.0.10".parse().unwrap())
            .mac(MacAddress::new("AA-BB-CC-00-11-22").unwrap());
        insta::assert_snapshot!(host.render(), @r"
        uci set dhcp.aaaaaaaa_printer=host
        uci set dhcp.aaaaaaaa_printer.name='printer'
        uci set dhcp.aaaaaaaa_printer.ip='192.168.0.10'
        uci set dhcp.aaaaaaaa_printer.mac='aa:bb:cc:00:11:22'
        ");
    }

    #[test]
    fn dnsmasq_lists_upstream_servers() {
        let dnsmasq = Dnsmasq::new(DnsServers {
            ipv4: vec!["8.8.8.8".parse().unwrap()],
            ipv6: vec!["2001:4860:4860::8888".parse().unwrap()],
        });
        let out = dnsmasq.render();
        assert!(out.starts_with("uci set dhcp.dnsmasq=dnsmasq\n"));
        assert!(out.contains("uci set dhcp.dnsmasq.ednspacket_max='1232'\n"));
        assert!(out.ends_with(
            "uci add_list dhcp.dnsmasq.server='8.8.8.8'\n\
             uci add_list dhcp.dnsmasq.server='2001:4860:4860::8888'\n"
        ));
    }
}
