// ── Section assembly ──
//
// Turns validated inputs into sections: the device-wide defaults first,
// then one block per tenant, each pushed into its own `Builder` and merged
// by the compile step.

pub mod defaults;
pub mod rules;
pub mod tenant;
pub mod uplink;

pub use defaults::{DefaultHandles, LAN_TRUNK_VLAN, MANAGEMENT_VLAN, UPLINK_VLANS, build_defaults};
pub use tenant::{TenantRole, TenantSummary, build_tenant};
pub use uplink::{Uplink, parse_uplinks};
