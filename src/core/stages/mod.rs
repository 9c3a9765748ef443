//! Pipeline stages.
//!
//! Each stage is a closed variant of [`StageKind`] with one dispatch
//! function; adding a deploy style or cleanup step means adding a variant
//! and an arm here, without touching the controller.

pub mod cleanup;
pub mod deploy;
pub mod docker;
pub mod maven;

use serde::Serialize;

use crate::config::PipelineConfig;
use crate::context::BuildContext;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Maven,
    MergeBuildInfo,
    DockerBuild,
    DockerPush,
    Deploy,
    Prune,
    DeleteImage,
}

impl StageKind {
    /// Main phase, fixed order. The first failure aborts the rest.
    pub const MAIN: [StageKind; 5] = [
        StageKind::Maven,
        StageKind::MergeBuildInfo,
        StageKind::DockerBuild,
        StageKind::DockerPush,
        StageKind::Deploy,
    ];

    /// Cleanup phase, always runs; failures are logged and swallowed.
    pub const CLEANUP: [StageKind; 2] = [StageKind::Prune, StageKind::DeleteImage];

    pub fn name(&self) -> &'static str {
        match self {
            StageKind::Maven => "maven",
            StageKind::MergeBuildInfo => "build-info",
            StageKind::DockerBuild => "docker-build",
            StageKind::DockerPush => "docker-push",
            StageKind::Deploy => "deploy",
            StageKind::Prune => "prune",
            StageKind::DeleteImage => "delete-image",
        }
    }
}

/// What a stage did when it returned without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Ran,
    Skipped(String),
}

impl StageOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        StageOutcome::Skipped(reason.into())
    }
}

/// Run one stage against the shared context.
pub fn build(
    kind: StageKind,
    config: &PipelineConfig,
    ctx: &mut BuildContext,
) -> Result<StageOutcome> {
    match kind {
        StageKind::Maven => maven::build(config, ctx),
        StageKind::MergeBuildInfo => maven::merge_build_info(ctx),
        StageKind::DockerBuild => docker::build_image(config, ctx),
        StageKind::DockerPush => docker::push_image(config, ctx),
        StageKind::Deploy => deploy::apply(config, ctx),
        StageKind::Prune => cleanup::prune(config, ctx),
        StageKind::DeleteImage => cleanup::delete_image(config, ctx),
    }
}
