//! Kubernetes deploy stage: render the manifest template from the
//! accumulated environment and apply it.

use std::fs;
use std::path::PathBuf;

use crate::config::{DeployConfig, PipelineConfig};
use crate::context::BuildContext;
use crate::env::EnvKeys;
use crate::error::Result;
use crate::files::{lookup_file, to_relative_path};
use crate::stages::StageOutcome;
use crate::template;
use crate::utils::shell;

pub fn apply(config: &PipelineConfig, ctx: &mut BuildContext) -> Result<StageOutcome> {
    let deploy = match &config.deploy {
        Some(deploy) if !deploy.disabled => deploy.clone(),
        _ => return Ok(StageOutcome::skipped("k8s deploy is not checked")),
    };

    let image = ctx.env.get(EnvKeys::IMAGE).to_string();
    if image.is_empty() {
        return Ok(StageOutcome::skipped("image name is empty, skip deploy"));
    }

    contribute_deploy_vars(&deploy, ctx);
    for entry in &deploy.entries {
        entry.contribute(&mut ctx.env);
    }

    let template_path = match locate_template(&deploy, ctx)? {
        Some(path) => path,
        None => {
            return Ok(StageOutcome::skipped(format!(
                "deploy template {} not found, skip deploy",
                deploy.template_name
            )))
        }
    };

    let content = fs::read_to_string(&template_path)?;
    let rendered = template::resolve(&content, &ctx.env);
    let manifest = template_path
        .parent()
        .map(|dir| dir.join(&deploy.deploy_file_name))
        .unwrap_or_else(|| ctx.workspace().join(&deploy.deploy_file_name));
    fs::write(&manifest, &rendered)?;
    ctx.log.line(&format!(
        "resolved deploy file {}:\n{}",
        to_relative_path(ctx.workspace(), &manifest),
        rendered
    ));

    let mut command = format!(
        "kubectl apply -f {}",
        shell::quote_path(&to_relative_path(ctx.workspace(), &manifest))
    );
    match deploy
        .config_location
        .as_deref()
        .filter(|loc| !loc.trim().is_empty())
    {
        Some(location) => {
            command.push_str(&format!(" --kubeconfig {}", shell::quote_path(location)));
        }
        None => ctx
            .log
            .line("configLocation not specified, will use default kube config"),
    }

    ctx.execute(&command)?;
    Ok(StageOutcome::Ran)
}

/// Write the stage's own config into the store before entries contribute,
/// so operator entries can still override any of them.
fn contribute_deploy_vars(deploy: &DeployConfig, ctx: &mut BuildContext) {
    ctx.env.set(EnvKeys::NAMESPACE, deploy.namespace.clone());
    ctx.env.set(EnvKeys::PORT, deploy.port.clone());
    ctx.env.set(EnvKeys::REPLICAS, deploy.replicas.clone());
    if let Some(memory) = deploy.memory.as_deref().filter(|m| !m.trim().is_empty()) {
        ctx.env.set(EnvKeys::MEMORY, memory);
    }
    if let Some(pool) = deploy.node_pool.as_deref().filter(|p| !p.trim().is_empty()) {
        ctx.env.set(EnvKeys::NODE_POOL, pool);
    }
}

/// Local template wins; otherwise fetch the configured URL into the
/// workspace with wget and look again.
fn locate_template(deploy: &DeployConfig, ctx: &mut BuildContext) -> Result<Option<PathBuf>> {
    if let Some(path) = lookup_file(ctx.workspace(), &deploy.template_name, &ctx.log) {
        return Ok(Some(path));
    }

    let url = match deploy
        .template_url
        .as_deref()
        .filter(|u| !u.trim().is_empty())
    {
        Some(url) => url,
        None => return Ok(None),
    };

    ctx.execute(&format!(
        "wget -O {} {}",
        shell::quote_path(&deploy.template_name),
        shell::quote_arg(url)
    ))?;
    Ok(lookup_file(ctx.workspace(), &deploy.template_name, &ctx.log))
}
