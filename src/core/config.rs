//! Pipeline configuration.
//!
//! Loaded once from a JSON file at process start and passed down; there is
//! no ambient configuration state. Every section is optional and carries a
//! `disabled` flag, so each stage can be switched off independently.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::env::{EnvKeys, EnvStore};
use crate::error::{Error, Result};
use crate::files::FileNames;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    pub maven: Option<MavenConfig>,
    pub docker: Option<DockerConfig>,
    pub deploy: Option<DeployConfig>,
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read config {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            Error::config(format!("cannot parse config {}: {}", path.display(), e))
        })
    }

    pub fn docker_enabled(&self) -> bool {
        self.docker.as_ref().is_some_and(|d| !d.disabled)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MavenConfig {
    pub disabled: bool,
    pub mvn_command: String,
    pub java_home: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DockerConfig {
    pub disabled: bool,
    pub build_image: bool,
    pub delete_image_after_build: bool,
    pub push: Option<PushConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PushConfig {
    pub disabled: bool,
    pub push_image: bool,
    pub registry: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeployConfig {
    pub disabled: bool,
    pub namespace: String,
    pub port: String,
    pub replicas: String,
    pub memory: Option<String>,
    pub node_pool: Option<String>,
    /// Path passed to `kubectl --kubeconfig`; default kubeconfig when unset.
    pub config_location: Option<String>,
    /// Template file name looked up under the workspace.
    pub template_name: String,
    /// Fallback: fetched with wget when no local template exists.
    pub template_url: Option<String>,
    /// File name the rendered manifest is written to.
    pub deploy_file_name: String,
    pub entries: Vec<Entry>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            namespace: String::new(),
            port: String::new(),
            replicas: "1".to_string(),
            memory: None,
            node_pool: None,
            config_location: None,
            template_name: FileNames::DEPLOY_TEMPLATE.to_string(),
            template_url: None,
            deploy_file_name: FileNames::DEPLOY_FILE.to_string(),
            entries: Vec::new(),
        }
    }
}

/// Operator-supplied key contributor, applied to the store right before
/// manifest rendering so overrides land without editing the template file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Entry {
    /// Sets `JAVA_OPTS` verbatim.
    JavaOpts { text: String },
    /// `KEY=VALUE` lines, each set into the store.
    K8sEnv { text: String },
}

impl Entry {
    pub fn contribute(&self, env: &mut EnvStore) {
        match self {
            Entry::JavaOpts { text } => env.set(EnvKeys::JAVA_OPTS, text.clone()),
            Entry::K8sEnv { text } => {
                for line in text.lines() {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if let Some((key, value)) = line.split_once('=') {
                        env.set(key.trim(), value.trim());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let json = r#"{
            "maven": { "mvnCommand": "mvn -B clean package", "javaHome": "/opt/jdk17" },
            "docker": {
                "buildImage": true,
                "deleteImageAfterBuild": true,
                "push": { "pushImage": true, "registry": "registry.example.com" }
            },
            "deploy": {
                "namespace": "prod",
                "port": "8080",
                "replicas": "3",
                "configLocation": "/etc/kube/config",
                "entries": [
                    { "kind": "javaOpts", "text": "-Xmx512m" },
                    { "kind": "k8sEnv", "text": "SPRING_PROFILES_ACTIVE=prod" }
                ]
            }
        }"#;

        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert!(config.docker_enabled());
        assert_eq!(config.maven.as_ref().unwrap().mvn_command, "mvn -B clean package");
        let deploy = config.deploy.as_ref().unwrap();
        assert_eq!(deploy.replicas, "3");
        assert_eq!(deploy.template_name, "k8s-deploy-template.yaml");
        assert_eq!(deploy.deploy_file_name, "deploy.yaml");
        assert_eq!(deploy.entries.len(), 2);
    }

    #[test]
    fn disabled_docker_section_is_not_enabled() {
        let json = r#"{ "docker": { "disabled": true, "buildImage": true } }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert!(!config.docker_enabled());

        let empty: PipelineConfig = serde_json::from_str("{}").unwrap();
        assert!(!empty.docker_enabled());
    }

    #[test]
    fn java_opts_entry_sets_single_key() {
        let mut env = EnvStore::new();
        Entry::JavaOpts {
            text: "-Xmx512m".to_string(),
        }
        .contribute(&mut env);
        assert_eq!(env.get("JAVA_OPTS"), "-Xmx512m");
    }

    #[test]
    fn k8s_env_entry_sets_each_pair_and_overrides() {
        let mut env = EnvStore::new();
        env.set("NAMESPACE", "prod");
        Entry::K8sEnv {
            text: "NAMESPACE=staging\nEXTRA=1\n\nnot a pair".to_string(),
        }
        .contribute(&mut env);
        assert_eq!(env.get("NAMESPACE"), "staging");
        assert_eq!(env.get("EXTRA"), "1");
    }
}
