use std::fs;

use clap::Args;
use gantry::template;
use serde::Serialize;

use crate::commands::{parse_env_pairs, CmdResult};

#[derive(Args)]
pub struct RenderArgs {
    /// Template file with ${KEY} or {KEY} placeholders
    pub template: String,

    /// Variable, KEY=VALUE (repeatable)
    #[arg(long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Fail when a placeholder has no variable instead of rendering empty
    #[arg(long)]
    pub strict: bool,

    /// Write the rendered output to this file instead of only returning it
    #[arg(long)]
    pub out: Option<String>,
}

#[derive(Serialize)]
pub struct RenderOutput {
    pub command: String,
    pub rendered: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written_to: Option<String>,
}

pub fn run(args: RenderArgs) -> CmdResult<RenderOutput> {
    let template_path = shellexpand::tilde(&args.template).into_owned();
    let content = fs::read_to_string(&template_path)?;
    let env = parse_env_pairs(&args.env)?;

    let rendered = if args.strict {
        template::resolve_strict(&content, &env)?
    } else {
        template::resolve(&content, &env)
    };

    let written_to = match &args.out {
        Some(out) => {
            let out = shellexpand::tilde(out).into_owned();
            fs::write(&out, &rendered)?;
            Some(out)
        }
        None => None,
    };

    Ok((
        RenderOutput {
            command: "template.render".to_string(),
            rendered,
            written_to,
        },
        0,
    ))
}
