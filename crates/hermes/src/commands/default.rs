//! `hermes default`: the tenant-less artifact of a box model.

use hermes_config::Config;
use hermes_core::{BoxModel, compile_default, default_artifact_name};

use crate::cli::{DefaultArgs, GlobalOpts};
use crate::error::CliError;

use super::write_artifact;

pub fn handle(args: &DefaultArgs, global: &GlobalOpts, settings: &Config) -> Result<(), CliError> {
    let model = BoxModel::parse(&args.box_type)?;
    let rendered = compile_default(model, &settings.to_build_config()?)?;
    write_artifact(
        &rendered.to_artifact(),
        &args.dest,
        &default_artifact_name(model),
        settings,
        global,
    )
}
