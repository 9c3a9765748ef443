//! Pipeline controller.
//!
//! Sequences the fixed main phase (Maven, build-info merge, docker build,
//! docker push, deploy) with fail-fast semantics, then always runs the
//! cleanup phase. The run's outcome is failure iff the main phase failed;
//! cleanup failures are logged and swallowed so they never mask the primary
//! failure reason.

use std::time::Instant;

use chrono::Utc;
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::context::BuildContext;
use crate::env::EnvStore;
use crate::error::Error;
use crate::logger::BuildLog;
use crate::stages::{self, cleanup, StageKind, StageOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Init,
    Main,
    Failed,
    Cleanup,
    Done,
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::Main => "main",
            Phase::Failed => "failed",
            Phase::Cleanup => "cleanup",
            Phase::Done => "done",
        }
    }
}

fn transition(phase: &mut Phase, next: Phase, log: &BuildLog) {
    *phase = next;
    log.line(&format!("phase: {}", next.name()));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Ok,
    Skipped,
    Failed,
    /// Cleanup-phase failure; logged but does not flip the run outcome.
    CleanupFailed,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: &'static str,
    pub status: StageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageReport {
    fn ok(kind: StageKind) -> Self {
        Self {
            stage: kind.name(),
            status: StageStatus::Ok,
            reason: None,
            error: None,
        }
    }

    fn skipped(kind: StageKind, reason: String) -> Self {
        Self {
            stage: kind.name(),
            status: StageStatus::Skipped,
            reason: Some(reason),
            error: None,
        }
    }

    fn failed(kind: StageKind, status: StageStatus, error: &Error) -> Self {
        Self {
            stage: kind.name(),
            status,
            reason: None,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub success: bool,
    pub exit_code: i32,
    pub stages: Vec<StageReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: String,
    pub duration_ms: u64,
    /// Final environment snapshot, for the host build system's record.
    pub env: EnvStore,
}

/// Execute the whole pipeline against an already-validated context.
pub fn run(config: &PipelineConfig, ctx: &mut BuildContext) -> RunReport {
    let started_at = Utc::now().to_rfc3339();
    let timer = Instant::now();
    let mut phase = Phase::Init;
    let mut reports = Vec::new();
    let mut failure: Option<Error> = None;

    transition(&mut phase, Phase::Main, &ctx.log);
    for kind in StageKind::MAIN {
        match stages::build(kind, config, ctx) {
            Ok(StageOutcome::Ran) => {
                ctx.log.stage(kind.name(), "stage ok");
                reports.push(StageReport::ok(kind));
            }
            Ok(StageOutcome::Skipped(reason)) => {
                ctx.log
                    .stage(kind.name(), &format!("stage skipped: {}", reason));
                reports.push(StageReport::skipped(kind, reason));
            }
            Err(err) => {
                ctx.log.stage(kind.name(), &format!("stage failed: {}", err));
                reports.push(StageReport::failed(kind, StageStatus::Failed, &err));
                failure = Some(err);
                transition(&mut phase, Phase::Failed, &ctx.log);
                break;
            }
        }
    }

    transition(&mut phase, Phase::Cleanup, &ctx.log);
    for kind in StageKind::CLEANUP {
        match stages::build(kind, config, ctx) {
            Ok(StageOutcome::Ran) => {
                ctx.log.stage(kind.name(), "stage ok");
                reports.push(StageReport::ok(kind));
            }
            Ok(StageOutcome::Skipped(reason)) => {
                ctx.log
                    .stage(kind.name(), &format!("stage skipped: {}", reason));
                reports.push(StageReport::skipped(kind, reason));
            }
            Err(err) => {
                ctx.log
                    .stage(kind.name(), &format!("cleanup failed, ignored: {}", err));
                reports.push(StageReport::failed(kind, StageStatus::CleanupFailed, &err));
            }
        }
    }

    let description = match cleanup::describe(ctx) {
        Ok(description) => description,
        Err(err) => {
            ctx.log
                .line(&format!("description step failed, ignored: {}", err));
            None
        }
    };
    if let Some(description) = &description {
        ctx.log.line(&format!("build description: {}", description));
    }

    transition(&mut phase, Phase::Done, &ctx.log);

    RunReport {
        success: failure.is_none(),
        exit_code: failure.as_ref().map(|e| e.exit_code()).unwrap_or(0),
        stages: reports,
        description,
        error: failure.map(|e| e.to_string()),
        started_at,
        duration_ms: timer.elapsed().as_millis() as u64,
        env: ctx.env.clone(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedStage {
    pub stage: &'static str,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Config-only preview of which stages would run. Workspace-dependent skips
/// (missing Dockerfile, missing template) only show up in a real run.
pub fn plan(config: &PipelineConfig) -> Vec<PlannedStage> {
    let mut planned = Vec::new();
    let mut add = |stage: StageKind, enabled: bool, reason: Option<&str>| {
        planned.push(PlannedStage {
            stage: stage.name(),
            enabled,
            reason: reason.map(|r| r.to_string()),
        });
    };

    let maven_enabled = config
        .maven
        .as_ref()
        .is_some_and(|m| !m.disabled && !m.mvn_command.trim().is_empty());
    add(
        StageKind::Maven,
        maven_enabled,
        (!maven_enabled).then_some("maven config absent, disabled, or command empty"),
    );
    add(StageKind::MergeBuildInfo, true, None);

    let docker = config.docker.as_ref().filter(|d| !d.disabled);
    let build_enabled = docker.is_some_and(|d| d.build_image);
    add(
        StageKind::DockerBuild,
        build_enabled,
        (!build_enabled).then_some("docker build not enabled"),
    );

    let push_enabled = docker
        .and_then(|d| d.push.as_ref())
        .is_some_and(|p| !p.disabled && p.push_image);
    add(
        StageKind::DockerPush,
        push_enabled,
        (!push_enabled).then_some("docker push not enabled"),
    );

    let deploy_enabled = config.deploy.as_ref().is_some_and(|d| !d.disabled);
    add(
        StageKind::Deploy,
        deploy_enabled,
        (!deploy_enabled).then_some("deploy config absent or disabled"),
    );

    let docker_enabled = docker.is_some();
    add(
        StageKind::Prune,
        docker_enabled,
        (!docker_enabled).then_some("docker config absent or disabled"),
    );

    let delete_enabled = docker.is_some_and(|d| d.delete_image_after_build);
    add(
        StageKind::DeleteImage,
        delete_enabled,
        (!delete_enabled).then_some("deleteImageAfterBuild not enabled"),
    );

    planned
}
