//! UCI configuration compiler for multi-tenant home routers.
//!
//! Given a resolved [`BoxRecord`] (one physical router and the tenant
//! networks it hosts), this crate builds a typed graph of UCI sections and
//! renders it to the single text artifact the router applies:
//!
//! - **Validated attributes** ([`uci::attr`]): every string or number that
//!   reaches the output passes through a checked constructor first. This is
//!   the only place input is validated; rendering only quotes values and
//!   never re-checks them.
//!
//! - **Section library** ([`uci`]): typed `network`, `firewall`, `dhcp`,
//!   `wireless` and `dropbear` sections. Sections point at each other through
//!   [`Ref`] handles, never by ownership.
//!
//! - **[`Builder`]**: five append-only section lists with a name index that
//!   rejects duplicates and checks that every reference points backwards.
//!
//! - **Assembly** ([`assembly`]): device-wide defaults, then one block per
//!   tenant: its VLAN and bridge, dual-stack uplinks with policy routing
//!   into per-tenant tables, access points, DHCP and firewall.
//!
//! - **Emitter** ([`emit`]): per-package blocks in insertion order, each
//!   closed by its commit/restart directive.
//!
//! Compilation is pure: no I/O, no clock, no randomness. The same record
//! always yields the same bytes.

pub mod assembly;
pub mod builder;
pub mod compile;
pub mod config;
pub mod emit;
pub mod error;
pub mod hardware;
pub mod model;
pub mod uci;

// ── Primary re-exports ──────────────────────────────────────────────
pub use builder::Builder;
pub use compile::{
    BuildPlan, Compiled, MAX_TENANTS, assemble_box, box_artifact_name, compile_box,
    compile_default, default_artifact_name,
};
pub use config::{BuildConfig, MANAGEMENT_DAEMON_PORT};
pub use emit::RenderedConfig;
pub use error::{CoreError, GatewayFamily};
pub use hardware::BoxModel;
pub use uci::{Node, Ref, Section, Subsystem};

pub use assembly::{TenantRole, TenantSummary};
pub use model::{BoxRecord, UnetProfile, WanVlan};
