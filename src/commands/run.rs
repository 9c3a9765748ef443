use std::path::Path;

use clap::Args;
use gantry::config::PipelineConfig;
use gantry::context::BuildContext;
use gantry::logger::BuildLog;
use gantry::pipeline::{self, PlannedStage, RunReport};
use serde::Serialize;

use crate::commands::{parse_env_pairs, CmdResult};

#[derive(Args)]
pub struct RunArgs {
    /// Workspace directory containing the checked-out sources
    #[arg(long)]
    pub workspace: String,

    /// Pipeline configuration file (JSON)
    #[arg(long)]
    pub config: String,

    /// Build ordinal supplied by the host build system
    #[arg(long, default_value_t = 1)]
    pub build_number: u32,

    /// Seed environment entry, KEY=VALUE (repeatable)
    #[arg(long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Show the stage plan without executing anything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum RunOutput {
    Plan {
        command: String,
        stages: Vec<PlannedStage>,
    },
    Report(Box<RunReport>),
}

pub fn run(args: RunArgs) -> CmdResult<RunOutput> {
    let config_path = shellexpand::tilde(&args.config).into_owned();
    let config = PipelineConfig::load(Path::new(&config_path))?;

    if args.dry_run {
        return Ok((
            RunOutput::Plan {
                command: "pipeline.plan".to_string(),
                stages: pipeline::plan(&config),
            },
            0,
        ));
    }

    let workspace = shellexpand::tilde(&args.workspace).into_owned();
    let env = parse_env_pairs(&args.env)?;

    let mut ctx = BuildContext::with_system_runner(
        workspace,
        args.build_number,
        env,
        BuildLog::stderr(),
    )?;

    let report = pipeline::run(&config, &mut ctx);
    let exit_code = report.exit_code;
    Ok((RunOutput::Report(Box::new(report)), exit_code))
}
