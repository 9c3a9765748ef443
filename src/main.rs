use clap::{Parser, Subcommand};

mod commands;

use commands::{plan, print_result, render, run};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "gantry")]
#[command(version = VERSION)]
#[command(about = "CI pipeline engine: Maven build, Docker image, Kubernetes deploy")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute the build-and-deploy pipeline
    Run(run::RunArgs),
    /// Show which stages would run for a configuration
    Plan(plan::PlanArgs),
    /// Render a manifest template against KEY=VALUE variables
    Render(render::RenderArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Run(args) => print_result(run::run(args)),
        Commands::Plan(args) => print_result(plan::run(args)),
        Commands::Render(args) => print_result(render::run(args)),
    };

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
