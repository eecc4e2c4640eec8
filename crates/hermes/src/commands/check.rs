//! `hermes check`: validate a box record and report its tenant plan.

use std::fmt::Write as _;

use tabled::Tabled;

use hermes_config::Config;
use hermes_core::{BuildPlan, TenantRole, TenantSummary, assemble_box};

use crate::cli::{CheckArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::{input, output};

#[derive(Tabled)]
struct TenantRow {
    #[tabled(rename = "UNET")]
    unet: String,
    #[tabled(rename = "ROLE")]
    role: String,
    #[tabled(rename = "LAN VLAN")]
    lan_vlan: u16,
    #[tabled(rename = "WAN")]
    wan_vlan: u16,
    #[tabled(rename = "WAN6")]
    wan6_vlan: u16,
    #[tabled(rename = "IPV4 TABLE")]
    ipv4_table: String,
    #[tabled(rename = "IPV6 TABLE")]
    ipv6_table: u32,
    #[tabled(rename = "DELEGATIONS")]
    delegation_table: u32,
    #[tabled(rename = "SECTIONS")]
    sections: usize,
}

fn row(tenant: &TenantSummary, color: bool) -> TenantRow {
    let role = tenant.role.to_string();
    TenantRow {
        unet: tenant.unet_id.clone(),
        role: match tenant.role {
            TenantRole::Main => output::accent(&role, color),
            TenantRole::Secondary => role,
        },
        lan_vlan: tenant.lan_vlan,
        wan_vlan: tenant.wan_vlan,
        wan6_vlan: tenant.wan6_vlan,
        ipv4_table: tenant
            .ipv4_table
            .map_or_else(|| "main".into(), |t| t.to_string()),
        ipv6_table: tenant.ipv6_table,
        delegation_table: tenant.delegation_table,
        sections: tenant.sections,
    }
}

fn detail(plan: &BuildPlan, color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} {}",
        output::accent(&plan.mac, color),
        plan.box_type,
        output::dim(&format!("({} tenants)", plan.tenants.len()), color),
    );
    let counts: Vec<String> = plan
        .sections
        .iter()
        .map(|(subsystem, n)| format!("{subsystem}={n}"))
        .collect();
    let _ = writeln!(out, "sections: {}", counts.join(" "));
    if !plan.extra_uplinks.is_empty() {
        let extra: Vec<String> = plan.extra_uplinks.iter().map(u16::to_string).collect();
        let _ = writeln!(out, "extra uplinks: {}", extra.join(" "));
    }
    let rows: Vec<TenantRow> = plan.tenants.iter().map(|t| row(t, color)).collect();
    out.push_str(&output::render_table(&rows));
    out
}

pub fn handle(args: &CheckArgs, global: &GlobalOpts, settings: &Config) -> Result<(), CliError> {
    let record = input::read_box(&args.input)?;
    let (_, plan) = assemble_box(&record, &settings.to_build_config()?)?;
    let color = output::should_color(global.color);

    let out = match global.output {
        OutputFormat::Plain => output::render_list(
            OutputFormat::Plain,
            &plan.tenants,
            |t| row(t, false),
            |t| t.unet_id.clone(),
        )?,
        format => output::render_single(
            format,
            &plan,
            |p| Ok(detail(p, color)),
            |p| p.mac.clone(),
        )?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
