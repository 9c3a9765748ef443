//! Workspace file discovery and properties parsing.
//!
//! Stages locate their inputs (Dockerfile, build-info, deploy template) by
//! recursive glob under the workspace. A missing file is never an error at
//! this layer; the stage decides whether to no-op.

use std::path::{Path, PathBuf};

use crate::logger::BuildLog;

/// Default workspace file names.
pub struct FileNames;

impl FileNames {
    pub const DOCKERFILE: &'static str = "Dockerfile";
    pub const BUILD_INFO: &'static str = "dockerBuildInfo";
    pub const DEPLOY_TEMPLATE: &'static str = "k8s-deploy-template.yaml";
    pub const DEPLOY_FILE: &'static str = "deploy.yaml";
    pub const GIT_PROPERTIES: &'static str = "git.properties";
}

/// Find `name` anywhere under `workspace` via `**/<name>`.
///
/// Zero matches logs and returns `None`. Multiple matches resolve
/// deterministically to the shortest path (closest to the workspace root),
/// with a log line noting the ambiguity.
pub fn lookup_file(workspace: &Path, name: &str, log: &BuildLog) -> Option<PathBuf> {
    let pattern = workspace.join("**").join(name);
    let mut matches: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect();

    if matches.is_empty() {
        log.line(&format!("could not find matched file: {}", name));
        return None;
    }

    matches.sort_by(|a, b| {
        a.as_os_str()
            .len()
            .cmp(&b.as_os_str().len())
            .then_with(|| a.cmp(b))
    });

    if matches.len() > 1 {
        log.line(&format!(
            "multiple matches for {}, resolved to closest: {}",
            name,
            to_relative_path(workspace, &matches[0])
        ));
    }

    Some(matches.remove(0))
}

/// Path of `file` relative to `workspace`, for display and `docker -f` args.
pub fn to_relative_path(workspace: &Path, file: &Path) -> String {
    file.strip_prefix(workspace)
        .unwrap_or(file)
        .to_string_lossy()
        .to_string()
}

/// Parse Java-properties-style `key=value` lines (UTF-8). Blank lines and
/// `#`/`!` comments are skipped; order is preserved.
pub fn parse_properties(content: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            pairs.push((key.trim().to_string(), value.trim().to_string()));
        }
    }
    pairs
}
