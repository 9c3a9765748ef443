use std::path::Path;

use clap::Args;
use gantry::config::PipelineConfig;
use gantry::pipeline::{self, PlannedStage};
use serde::Serialize;

use crate::commands::CmdResult;

#[derive(Args)]
pub struct PlanArgs {
    /// Pipeline configuration file (JSON)
    #[arg(long)]
    pub config: String,
}

#[derive(Serialize)]
pub struct PlanOutput {
    pub command: String,
    pub stages: Vec<PlannedStage>,
}

pub fn run(args: PlanArgs) -> CmdResult<PlanOutput> {
    let config_path = shellexpand::tilde(&args.config).into_owned();
    let config = PipelineConfig::load(Path::new(&config_path))?;

    Ok((
        PlanOutput {
            command: "pipeline.plan".to_string(),
            stages: pipeline::plan(&config),
        },
        0,
    ))
}
