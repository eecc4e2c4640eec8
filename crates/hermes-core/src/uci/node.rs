// ── Section abstraction ──
//
// A section knows its name, its package and how to write its options.
// Sections point at each other through `Ref<T>` handles (a section name
// tagged with the target kind) instead of owning each other.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use super::attr::SectionName;
use super::writer::SectionWriter;
use super::{Subsystem, dhcp, dropbear, firewall, network, wireless};

/// One UCI section.
pub trait Section {
    const SUBSYSTEM: Subsystem;

    fn name(&self) -> &SectionName;

    /// Value on the right of `<pkg>.<name>=`.
    fn section_type(&self) -> &'static str;

    fn write_options(&self, w: &mut SectionWriter<'_>);

    /// Sections this one points at. They must already be in the build.
    fn references(&self) -> Vec<(Subsystem, &SectionName)> {
        Vec::new()
    }

    /// Typed handle other sections can hold.
    fn handle(&self) -> Ref<Self>
    where
        Self: Sized,
    {
        Ref::new(self.name().clone())
    }

    fn render_into(&self, out: &mut String) {
        let mut w = SectionWriter::open(out, Self::SUBSYSTEM, self.name(), self.section_type());
        self.write_options(&mut w);
    }

    fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }
}

// ── Ref ─────────────────────────────────────────────────────────────

/// Non-owning reference to a section of kind `T`, by name.
pub struct Ref<T> {
    name: SectionName,
    _kind: PhantomData<fn() -> T>,
}

impl<T> Ref<T> {
    fn new(name: SectionName) -> Self {
        Self {
            name,
            _kind: PhantomData,
        }
    }

    pub fn name(&self) -> &SectionName {
        &self.name
    }
}

impl<T: Section> Ref<T> {
    pub fn subsystem(&self) -> Subsystem {
        T::SUBSYSTEM
    }

    /// `(subsystem, name)` pair as reported by [`Section::references`].
    pub fn target(&self) -> (Subsystem, &SectionName) {
        (T::SUBSYSTEM, &self.name)
    }
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Self::new(self.name.clone())
    }
}

impl<T> PartialEq for Ref<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<T> Eq for Ref<T> {}

impl<T> Hash for Ref<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl<T> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ref").field(&self.name).finish()
    }
}

impl<T> fmt::Display for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.name, f)
    }
}

// ── Node ────────────────────────────────────────────────────────────

macro_rules! nodes {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        /// Any section the builder can hold.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Node {
            $($variant($ty)),*
        }

        impl Node {
            pub fn name(&self) -> &SectionName {
                match self {
                    $(Self::$variant(s) => s.name()),*
                }
            }

            pub fn subsystem(&self) -> Subsystem {
                match self {
                    $(Self::$variant(_) => <$ty as Section>::SUBSYSTEM),*
                }
            }

            pub fn section_type(&self) -> &'static str {
                match self {
                    $(Self::$variant(s) => s.section_type()),*
                }
            }

            pub fn references(&self) -> Vec<(Subsystem, &SectionName)> {
                match self {
                    $(Self::$variant(s) => s.references()),*
                }
            }

            pub fn render_into(&self, out: &mut String) {
                match self {
                    $(Self::$variant(s) => s.render_into(out)),*
                }
            }

            pub fn render(&self) -> String {
                let mut out = String::new();
                self.render_into(&mut out);
                out
            }
        }

        $(
            impl From<$ty> for Node {
                fn from(section: $ty) -> Self {
                    Self::$variant(section)
                }
            }
        )*
    };
}

nodes! {
    // network
    Interface(network::Interface),
    Bridge(network::Bridge),
    Switch(network::Switch),
    SwitchVlan(network::SwitchVlan),
    Globals(network::Globals),
    Route4(network::Route<network::V4>),
    Route6(network::Route<network::V6>),
    RouteRule4(network::RouteRule<network::V4>),
    RouteRule6(network::RouteRule<network::V6>),
    // firewall
    FirewallDefaults(firewall::Defaults),
    Zone(firewall::Zone),
    Rule(firewall::Rule),
    Redirect(firewall::Redirect),
    Forwarding(firewall::Forwarding),
    Snat(firewall::Snat),
    Ipset(firewall::Ipset),
    // dhcp
    Dnsmasq(dhcp::Dnsmasq),
    Odhcpd(dhcp::Odhcpd),
    DhcpPool(dhcp::DhcpPool),
    Host(dhcp::Host),
    // wireless
    WifiDevice(wireless::WifiDevice),
    WifiIface(wireless::WifiIface),
    // dropbear
    Dropbear(dropbear::Dropbear),
}
