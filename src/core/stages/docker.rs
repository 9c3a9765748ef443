//! Docker image build and push stages.

use crate::config::PipelineConfig;
use crate::context::BuildContext;
use crate::env::EnvKeys;
use crate::error::{Error, Result};
use crate::files::{lookup_file, to_relative_path, FileNames};
use crate::stages::StageOutcome;

/// Compute the fully qualified image name: `registry/appName:version-buildNumber`.
///
/// The registry comes from the push config when non-blank, else from the
/// `REGISTRY` environment key. Missing after both lookups is a configuration
/// error, not a skip.
pub fn full_image_name(config: &PipelineConfig, ctx: &BuildContext) -> Result<String> {
    let configured = config
        .docker
        .as_ref()
        .and_then(|d| d.push.as_ref())
        .and_then(|p| p.registry.as_deref())
        .filter(|r| !r.trim().is_empty());

    let registry = match configured {
        Some(registry) => registry.to_string(),
        None => {
            let from_env = ctx.env.get(EnvKeys::REGISTRY);
            if from_env.trim().is_empty() {
                return Err(Error::config(
                    "registry is not configured and REGISTRY is not set",
                ));
            }
            from_env.to_string()
        }
    };

    let app_name = ctx.env.get(EnvKeys::APP_NAME);
    let version = ctx.env.get(EnvKeys::VERSION);
    Ok(format!(
        "{}/{}:{}-{}",
        registry, app_name, version, ctx.build_number
    ))
}

pub fn build_image(config: &PipelineConfig, ctx: &mut BuildContext) -> Result<StageOutcome> {
    let docker = match &config.docker {
        Some(docker) if !docker.disabled => docker,
        _ => return Ok(StageOutcome::skipped("docker build is not checked")),
    };
    if !docker.build_image {
        return Ok(StageOutcome::skipped("docker build image is skipped"));
    }

    let dockerfile = match lookup_file(ctx.workspace(), FileNames::DOCKERFILE, &ctx.log) {
        Some(path) => path,
        None => {
            return Ok(StageOutcome::skipped(
                "Dockerfile not exist, skip docker build",
            ))
        }
    };

    let image = full_image_name(config, ctx)?;
    ctx.env.set(EnvKeys::IMAGE, image.clone());

    let command = format!(
        "docker build -t {} -f {} .",
        image,
        to_relative_path(ctx.workspace(), &dockerfile)
    );
    ctx.execute(&command)?;
    ctx.image_built = true;
    Ok(StageOutcome::Ran)
}

pub fn push_image(config: &PipelineConfig, ctx: &mut BuildContext) -> Result<StageOutcome> {
    let docker = match &config.docker {
        Some(docker) if !docker.disabled => docker,
        _ => return Ok(StageOutcome::skipped("docker build is not checked")),
    };
    let push = match &docker.push {
        Some(push) if !push.disabled => push,
        _ => return Ok(StageOutcome::skipped("docker push is not configured")),
    };
    if !push.push_image {
        return Ok(StageOutcome::skipped("docker push image is skipped"));
    }

    let image = ctx.env.get(EnvKeys::IMAGE).to_string();
    if image.is_empty() {
        return Ok(StageOutcome::skipped("image name is empty, skip push"));
    }

    ctx.execute(&format!("docker push {}", image))?;
    Ok(StageOutcome::Ran)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DockerConfig, PushConfig};
    use crate::env::EnvStore;
    use crate::executor::RecordingRunner;
    use crate::logger::MemoryLog;
    use std::sync::Arc;

    fn context_with(
        dir: &std::path::Path,
        build_number: u32,
        runner: Arc<RecordingRunner>,
        seed: &[(&str, &str)],
    ) -> BuildContext {
        let mut env = EnvStore::new();
        for (k, v) in seed {
            env.set(*k, *v);
        }
        BuildContext::new(dir, build_number, env, MemoryLog::new().log(), runner).unwrap()
    }

    fn docker_config(push_registry: Option<&str>) -> PipelineConfig {
        PipelineConfig {
            docker: Some(DockerConfig {
                build_image: true,
                push: Some(PushConfig {
                    push_image: true,
                    registry: push_registry.map(|s| s.to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn image_name_from_push_registry() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_with(
            dir.path(),
            7,
            RecordingRunner::shared(),
            &[("APP_NAME", "app"), ("VERSION", "1.0")],
        );
        let image = full_image_name(&docker_config(Some("reg")), &ctx).unwrap();
        assert_eq!(image, "reg/app:1.0-7");
    }

    #[test]
    fn image_name_falls_back_to_registry_env() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_with(
            dir.path(),
            3,
            RecordingRunner::shared(),
            &[
                ("REGISTRY", "registry.example.com"),
                ("APP_NAME", "svc"),
                ("VERSION", "2.1"),
            ],
        );
        let image = full_image_name(&docker_config(None), &ctx).unwrap();
        assert_eq!(image, "registry.example.com/svc:2.1-3");
    }

    #[test]
    fn missing_registry_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_with(dir.path(), 1, RecordingRunner::shared(), &[]);
        let err = full_image_name(&docker_config(None), &ctx).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn build_sets_image_and_marks_context() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Dockerfile"), "FROM scratch").unwrap();
        let runner = RecordingRunner::shared();
        let mut ctx = context_with(
            dir.path(),
            7,
            runner.clone(),
            &[("APP_NAME", "app"), ("VERSION", "1.0")],
        );

        let outcome = build_image(&docker_config(Some("reg")), &mut ctx).unwrap();
        assert_eq!(outcome, StageOutcome::Ran);
        assert!(ctx.image_built);
        assert_eq!(ctx.env.get("IMAGE"), "reg/app:1.0-7");
        assert_eq!(
            runner.commands(),
            vec!["docker build -t reg/app:1.0-7 -f Dockerfile .".to_string()]
        );
    }

    #[test]
    fn build_skips_without_dockerfile() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::shared();
        let mut ctx = context_with(dir.path(), 7, runner.clone(), &[]);

        let outcome = build_image(&docker_config(Some("reg")), &mut ctx).unwrap();
        assert!(matches!(outcome, StageOutcome::Skipped(_)));
        assert!(!ctx.image_built);
        assert!(runner.commands().is_empty());
    }

    #[test]
    fn push_skips_when_image_unresolved() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::shared();
        let mut ctx = context_with(dir.path(), 7, runner.clone(), &[]);

        let outcome = push_image(&docker_config(Some("reg")), &mut ctx).unwrap();
        assert!(matches!(outcome, StageOutcome::Skipped(_)));
        assert!(runner.commands().is_empty());
    }

    #[test]
    fn push_uses_image_from_store() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::shared();
        let mut ctx = context_with(dir.path(), 7, runner.clone(), &[("IMAGE", "reg/app:1.0-7")]);

        let outcome = push_image(&docker_config(Some("reg")), &mut ctx).unwrap();
        assert_eq!(outcome, StageOutcome::Ran);
        assert_eq!(runner.commands(), vec!["docker push reg/app:1.0-7".to_string()]);
    }
}
