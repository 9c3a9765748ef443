//! Shared per-run state threaded through every stage.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::env::EnvStore;
use crate::error::{Error, Result};
use crate::executor::{CommandOutput, CommandRunner, SystemRunner};
use crate::logger::BuildLog;

/// One pipeline run's mutable state: workspace, environment store, log sink,
/// and the process runner. Owned by the controller, passed by reference to
/// every stage; never shared between runs.
pub struct BuildContext {
    pub workspace: PathBuf,
    pub build_number: u32,
    pub env: EnvStore,
    pub log: BuildLog,
    runner: Arc<dyn CommandRunner>,
    /// Set by the docker build stage; gates image deletion during cleanup.
    pub image_built: bool,
}

impl std::fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildContext")
            .field("workspace", &self.workspace)
            .field("build_number", &self.build_number)
            .field("image_built", &self.image_built)
            .finish_non_exhaustive()
    }
}

impl BuildContext {
    /// Fails fast when the workspace is missing or not a directory; this is
    /// the one `WorkspaceInvalid` check, done before any stage runs.
    pub fn new(
        workspace: impl Into<PathBuf>,
        build_number: u32,
        env: EnvStore,
        log: BuildLog,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self> {
        let workspace = workspace.into();
        if !workspace.is_dir() {
            return Err(Error::Workspace(format!(
                "{} does not exist or is not a directory",
                workspace.display()
            )));
        }
        Ok(Self {
            workspace,
            build_number,
            env,
            log,
            runner,
            image_built: false,
        })
    }

    pub fn with_system_runner(
        workspace: impl Into<PathBuf>,
        build_number: u32,
        env: EnvStore,
        log: BuildLog,
    ) -> Result<Self> {
        Self::new(workspace, build_number, env, log, Arc::new(SystemRunner))
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Run a shell command in the workspace with the current environment
    /// injected. A non-zero exit becomes a `Process` error; the controller
    /// decides whether that aborts the main phase or is swallowed cleanup.
    pub fn execute(&self, command: &str) -> Result<CommandOutput> {
        self.log.line(&format!("$ {}", command));
        let output = self
            .runner
            .run(command, &self.workspace, &self.env, &self.log);
        if !output.success {
            return Err(Error::Process {
                command: command.to_string(),
                exit_code: output.exit_code,
            });
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::RecordingRunner;
    use crate::logger::MemoryLog;

    #[test]
    fn missing_workspace_is_rejected() {
        let err = BuildContext::new(
            "/nonexistent/workspace/path",
            1,
            EnvStore::new(),
            MemoryLog::new().log(),
            Arc::new(RecordingRunner::new()),
        )
        .unwrap_err();
        assert_eq!(err.code(), "WORKSPACE_INVALID");
    }

    #[test]
    fn execute_maps_nonzero_exit_to_process_error() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::shared();
        runner.fail_matching("mvn", 1);

        let ctx = BuildContext::new(
            dir.path(),
            1,
            EnvStore::new(),
            MemoryLog::new().log(),
            runner,
        )
        .unwrap();

        let err = ctx.execute("mvn package").unwrap_err();
        match err {
            Error::Process { exit_code, .. } => assert_eq!(exit_code, 1),
            other => panic!("unexpected error: {other}"),
        }
        assert!(ctx.execute("echo ok").is_ok());
    }
}
