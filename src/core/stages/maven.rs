//! Maven build stage and the build-info merge that follows it.

use std::fs;

use crate::config::PipelineConfig;
use crate::context::BuildContext;
use crate::env::{EnvKeys, MergePolicy};
use crate::error::Result;
use crate::files::{lookup_file, parse_properties, FileNames};
use crate::stages::StageOutcome;

pub fn build(config: &PipelineConfig, ctx: &mut BuildContext) -> Result<StageOutcome> {
    let maven = match &config.maven {
        Some(maven) if !maven.disabled => maven,
        _ => return Ok(StageOutcome::skipped("maven build is not checked")),
    };

    if maven.mvn_command.trim().is_empty() {
        return Ok(StageOutcome::skipped("mvn command is empty, skip maven build"));
    }

    if let Some(java_home) = maven.java_home.as_deref().filter(|p| !p.trim().is_empty()) {
        ctx.env.set(EnvKeys::JAVA_HOME, java_home);
    }

    ctx.execute(&maven.mvn_command)?;
    Ok(StageOutcome::Ran)
}

/// Merge the `dockerBuildInfo` properties the build left behind into the
/// store. Absent-only policy: facts derived by earlier stages win over
/// anything the file supplies.
pub fn merge_build_info(ctx: &mut BuildContext) -> Result<StageOutcome> {
    let info = match lookup_file(ctx.workspace(), FileNames::BUILD_INFO, &ctx.log) {
        Some(path) => path,
        None => {
            return Ok(StageOutcome::skipped(format!(
                "{} file not exist, skip merge",
                FileNames::BUILD_INFO
            )))
        }
    };

    let content = fs::read_to_string(&info)?;
    ctx.env
        .merge(parse_properties(&content), MergePolicy::IfAbsent);
    Ok(StageOutcome::Ran)
}
