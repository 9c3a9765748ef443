//! External process execution.
//!
//! Commands are operator-authored shell lines, run via `sh -c` in the build
//! workspace with the environment store injected. Child stdout/stderr are
//! drained by two reader threads so a full OS pipe buffer can never deadlock
//! the build; each line is teed to the build log and a capture buffer kept
//! for post-mortem. Both readers are joined before `run` returns, so stage
//! execution is a synchronous wait.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;

use serde::Serialize;

use crate::env::EnvStore;
use crate::logger::BuildLog;

#[derive(Debug, Clone, Serialize)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: i32,
}

/// Seam between stages and the operating system. The pipeline only ever
/// talks to this trait; tests install a recording fake.
pub trait CommandRunner: Send + Sync {
    fn run(&self, command: &str, workspace: &Path, env: &EnvStore, log: &BuildLog)
        -> CommandOutput;
}

/// Default runner: spawns real processes.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        command: &str,
        workspace: &Path,
        env: &EnvStore,
        log: &BuildLog,
    ) -> CommandOutput {
        #[cfg(windows)]
        let mut cmd = {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", command]);
            cmd
        };

        #[cfg(not(windows))]
        let mut cmd = {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", command]);
            cmd
        };

        cmd.current_dir(workspace);
        for (key, value) in env.iter() {
            cmd.env(key, value);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return CommandOutput {
                    stdout: String::new(),
                    stderr: format!("Command error: {}", e),
                    success: false,
                    exit_code: -1,
                }
            }
        };

        let stdout = child.stdout.take().map(|pipe| tee(pipe, log.clone()));
        let stderr = child.stderr.take().map(|pipe| tee(pipe, log.clone()));

        let captured_stdout = join_tee(stdout);
        let captured_stderr = join_tee(stderr);

        match child.wait() {
            Ok(status) => CommandOutput {
                stdout: captured_stdout,
                stderr: captured_stderr,
                success: status.success(),
                exit_code: status.code().unwrap_or(-1),
            },
            Err(e) => CommandOutput {
                stdout: captured_stdout,
                stderr: format!("Command error: {}", e),
                success: false,
                exit_code: -1,
            },
        }
    }
}

fn tee<R: Read + Send + 'static>(pipe: R, log: BuildLog) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut captured = String::new();
        for line in BufReader::new(pipe).lines() {
            match line {
                Ok(line) => {
                    log.line(&line);
                    captured.push_str(&line);
                    captured.push('\n');
                }
                Err(_) => break,
            }
        }
        captured
    })
}

fn join_tee(handle: Option<thread::JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

/// Test double that records every command instead of spawning it. Each
/// recorded command succeeds unless its string matches a registered failure.
#[derive(Default)]
pub struct RecordingRunner {
    commands: Mutex<Vec<String>>,
    failures: Mutex<Vec<(String, i32)>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Make any command containing `fragment` exit with `exit_code`.
    pub fn fail_matching(&self, fragment: &str, exit_code: i32) {
        self.failures
            .lock()
            .expect("failures poisoned")
            .push((fragment.to_string(), exit_code));
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().expect("commands poisoned").clone()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(
        &self,
        command: &str,
        _workspace: &Path,
        _env: &EnvStore,
        _log: &BuildLog,
    ) -> CommandOutput {
        self.commands
            .lock()
            .expect("commands poisoned")
            .push(command.to_string());

        let failure = self
            .failures
            .lock()
            .expect("failures poisoned")
            .iter()
            .find(|(fragment, _)| command.contains(fragment))
            .map(|(_, code)| *code);

        match failure {
            Some(exit_code) => CommandOutput {
                stdout: String::new(),
                stderr: format!("simulated failure for `{}`", command),
                success: false,
                exit_code,
            },
            None => CommandOutput {
                stdout: String::new(),
                stderr: String::new(),
                success: true,
                exit_code: 0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MemoryLog;

    #[cfg(unix)]
    #[test]
    fn system_runner_captures_and_tees_output() {
        let dir = tempfile::tempdir().unwrap();
        let memory = MemoryLog::new();
        let mut env = EnvStore::new();
        env.set("GREETING", "hello");

        let output = SystemRunner.run(
            "echo \"$GREETING\"; echo oops >&2",
            dir.path(),
            &env,
            &memory.log(),
        );

        assert!(output.success);
        assert_eq!(output.exit_code, 0);
        assert_eq!(output.stdout, "hello\n");
        assert_eq!(output.stderr, "oops\n");
        let logged = memory.contents();
        assert!(logged.contains("hello"));
        assert!(logged.contains("oops"));
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_runs_in_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let memory = MemoryLog::new();

        let output = SystemRunner.run("pwd", dir.path(), &EnvStore::new(), &memory.log());
        let reported = std::fs::canonicalize(output.stdout.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_reports_nonzero_exit() {
        let dir = tempfile::tempdir().unwrap();
        let memory = MemoryLog::new();

        let output = SystemRunner.run("exit 3", dir.path(), &EnvStore::new(), &memory.log());
        assert!(!output.success);
        assert_eq!(output.exit_code, 3);
    }

    #[test]
    fn recording_runner_matches_failures() {
        let runner = RecordingRunner::new();
        runner.fail_matching("docker push", 2);
        let memory = MemoryLog::new();
        let dir = tempfile::tempdir().unwrap();

        let ok = runner.run("docker build -t x .", dir.path(), &EnvStore::new(), &memory.log());
        let failed = runner.run("docker push x", dir.path(), &EnvStore::new(), &memory.log());

        assert!(ok.success);
        assert!(!failed.success);
        assert_eq!(failed.exit_code, 2);
        assert_eq!(runner.commands().len(), 2);
    }
}
