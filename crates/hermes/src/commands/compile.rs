//! `hermes compile`: box record in, artifact out.

use tracing::debug;

use hermes_config::Config;
use hermes_core::compile_box;
use hermes_core::uci::attr::MacAddress;

use crate::cli::{CompileArgs, GlobalOpts};
use crate::error::CliError;
use crate::input;

use super::write_artifact;

pub fn handle(args: &CompileArgs, global: &GlobalOpts, settings: &Config) -> Result<(), CliError> {
    let record = input::read_box(&args.input)?;
    let build = settings.to_build_config()?;

    let compiled = compile_box(&record, &build)?;
    debug!(tenants = compiled.plan.tenants.len(), "box compiled");

    let mac = MacAddress::new(&compiled.plan.mac)?;
    let name = hermes_core::box_artifact_name(&mac);
    write_artifact(&compiled.to_artifact(), &args.dest, &name, settings, global)
}
