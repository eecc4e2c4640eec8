// ── Box input model ──
//
// Shape of the topology document the caller resolves before a build.
// Scalars stay as raw text here; they are checked when assembly turns them
// into validated attributes, so every error can name the offending path.

pub mod box_record;
pub mod unet;

pub use box_record::{BoxRecord, VlanTag, WanVlan};
pub use unet::{
    DelegatedPrefix, DnsOverride, LanIpv4, PortForward, PortOpening, StaticLease, UnetDhcp,
    UnetFirewall, UnetNetwork, UnetProfile, UnetWifi, WanIpv4, WanIpv6,
};
