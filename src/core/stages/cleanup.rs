//! Cleanup phase: image pruning, built-image deletion, and the build
//! description derived from VCS metadata the build left in the workspace.

use std::fs;

use crate::config::PipelineConfig;
use crate::context::BuildContext;
use crate::env::EnvKeys;
use crate::error::Result;
use crate::files::{lookup_file, parse_properties, FileNames};
use crate::stages::StageOutcome;

const GIT_BRANCH: &str = "git.branch";
const GIT_COMMITTER: &str = "git.commit.user.name";

pub fn prune(config: &PipelineConfig, ctx: &mut BuildContext) -> Result<StageOutcome> {
    if !config.docker_enabled() {
        return Ok(StageOutcome::skipped("docker build is not checked"));
    }
    ctx.execute("docker image prune -f")?;
    Ok(StageOutcome::Ran)
}

pub fn delete_image(config: &PipelineConfig, ctx: &mut BuildContext) -> Result<StageOutcome> {
    let docker = match &config.docker {
        Some(docker) if !docker.disabled => docker,
        _ => return Ok(StageOutcome::skipped("docker build is not checked")),
    };
    if !docker.delete_image_after_build {
        return Ok(StageOutcome::skipped("delete built image is skipped"));
    }
    if !ctx.image_built {
        return Ok(StageOutcome::skipped("image was not built this run"));
    }

    let image = ctx.env.get(EnvKeys::IMAGE).to_string();
    if image.is_empty() {
        return Ok(StageOutcome::skipped("image name is empty, skip delete"));
    }

    ctx.execute(&format!("docker rmi -f {}", image))?;
    Ok(StageOutcome::Ran)
}

/// Read `git.properties` the build published and turn branch/committer into
/// a human description for the build record.
pub fn describe(ctx: &mut BuildContext) -> Result<Option<String>> {
    let properties = match lookup_file(ctx.workspace(), FileNames::GIT_PROPERTIES, &ctx.log) {
        Some(path) => path,
        None => return Ok(None),
    };

    let content = fs::read_to_string(&properties)?;
    let pairs = parse_properties(&content);
    let lookup = |key: &str| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    };

    let branch = lookup(GIT_BRANCH);
    let committer = lookup(GIT_COMMITTER);
    if branch.is_empty() && committer.is_empty() {
        return Ok(None);
    }

    Ok(Some(format!("{} @ {}", committer, branch)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DockerConfig;
    use crate::env::EnvStore;
    use crate::executor::RecordingRunner;
    use crate::logger::MemoryLog;
    use std::sync::Arc;

    fn context(dir: &std::path::Path, runner: Arc<RecordingRunner>) -> BuildContext {
        BuildContext::new(dir, 1, EnvStore::new(), MemoryLog::new().log(), runner).unwrap()
    }

    fn docker_config(delete_after_build: bool) -> PipelineConfig {
        PipelineConfig {
            docker: Some(DockerConfig {
                build_image: true,
                delete_image_after_build: delete_after_build,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn prune_requires_docker_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::shared();
        let mut ctx = context(dir.path(), runner.clone());

        let outcome = prune(&PipelineConfig::default(), &mut ctx).unwrap();
        assert!(matches!(outcome, StageOutcome::Skipped(_)));

        let outcome = prune(&docker_config(false), &mut ctx).unwrap();
        assert_eq!(outcome, StageOutcome::Ran);
        assert_eq!(runner.commands(), vec!["docker image prune -f".to_string()]);
    }

    #[test]
    fn delete_image_only_when_built_this_run() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::shared();
        let mut ctx = context(dir.path(), runner.clone());
        ctx.env.set(EnvKeys::IMAGE, "reg/app:1.0-1");

        let outcome = delete_image(&docker_config(true), &mut ctx).unwrap();
        assert!(matches!(outcome, StageOutcome::Skipped(_)));

        ctx.image_built = true;
        let outcome = delete_image(&docker_config(true), &mut ctx).unwrap();
        assert_eq!(outcome, StageOutcome::Ran);
        assert_eq!(runner.commands(), vec!["docker rmi -f reg/app:1.0-1".to_string()]);
    }

    #[test]
    fn delete_image_respects_flag() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::shared();
        let mut ctx = context(dir.path(), runner.clone());
        ctx.image_built = true;

        let outcome = delete_image(&docker_config(false), &mut ctx).unwrap();
        assert!(matches!(outcome, StageOutcome::Skipped(_)));
        assert!(runner.commands().is_empty());
    }

    #[test]
    fn describe_reads_git_properties() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("git.properties"),
            "git.branch=main\ngit.commit.user.name=liaozan\n",
        )
        .unwrap();
        let mut ctx = context(dir.path(), RecordingRunner::shared());

        let description = describe(&mut ctx).unwrap();
        assert_eq!(description.as_deref(), Some("liaozan @ main"));
    }

    #[test]
    fn describe_without_metadata_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path(), RecordingRunner::shared());
        assert!(describe(&mut ctx).unwrap().is_none());
    }
}
