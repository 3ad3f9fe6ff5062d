//! # build-artifact
//!
//! Cross-compiling build driver for the papa-schlumpf-flex firmware and its
//! Lua plugin.
//!
//! ## Usage
//!
//! ```bash
//! build-artifact                          # Build for the host
//! build-artifact -c arm64                 # Cross build for arm64
//! build-artifact -c riscv64 plan          # Show every command of a cross build
//! build-artifact stage externals lua      # Rerun single stages
//! build-artifact doctor                   # Check tools and project files
//! build-artifact clean --all              # Remove build/
//! ```
//!
//! ## Pipeline
//!
//! system packages -> jonchki -> firmware (mbs) -> Lua build requirements
//! -> externals -> Lua plugin (`make pack`). The first failing command
//! aborts the build.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

mod builder;

use builder::error::BuildError;
use builder::exec::{DryRunner, Runner, SystemRunner};
use builder::platform::{self, CpuArch, TargetOverrides};
use builder::stages::registry;
use builder::BuildCommands;

#[derive(Parser)]
#[command(name = "build-artifact", about = "papa-schlumpf-flex build driver")]
struct Cli {
    /// Project folder (contains mbs/, external/ and jonchki/)
    #[arg(long, global = true, default_value = ".")]
    project_dir: PathBuf,

    /// Settings file (default: build_artifact.json in the project folder)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print commands instead of running them
    #[arg(long, global = true)]
    dry_run: bool,

    /// Target distribution id (default: host)
    #[arg(short = 'd', long, global = true)]
    distribution_id: Option<String>,

    /// Target distribution version (default: host)
    #[arg(short = 'v', long, global = true)]
    distribution_version: Option<String>,

    /// Target CPU architecture: x86, x86_64, armhf, arm64 or riscv64 (default: host)
    #[arg(short = 'c', long, global = true)]
    cpu_architecture: Option<CpuArch>,

    #[command(subcommand)]
    command: Option<BuildCommands>,
}

/// Exit code for platform combinations that cannot be built.
const EXIT_UNSUPPORTED: i32 = 2;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    if let Err(err) = run(Cli::parse()) {
        if let Some(code) = exit_code(&err) {
            eprintln!("Error: {err:#}");
            std::process::exit(code);
        }
        return Err(err);
    }
    Ok(())
}

/// Dedicated exit code for an error, looking through any added context.
/// `None` leaves the error to `main`, which exits with 1.
fn exit_code(err: &anyhow::Error) -> Option<i32> {
    err.downcast_ref::<BuildError>()
        .filter(|e| e.is_unsupported_configuration())
        .map(|_| EXIT_UNSUPPORTED)
}

fn run(cli: Cli) -> Result<()> {
    let command = cli.command.unwrap_or(BuildCommands::All);

    if let BuildCommands::Stages = command {
        builder::list_stages();
        return Ok(());
    }

    let project_dir = cli
        .project_dir
        .canonicalize()
        .with_context(|| format!("Project folder {} not found", cli.project_dir.display()))?;

    let host = platform::detect_host()?;
    let overrides = TargetOverrides {
        distribution_id: cli.distribution_id,
        distribution_version: cli.distribution_version,
        cpu_architecture: cli.cpu_architecture,
    };
    let project = builder::Project::open(
        &project_dir,
        cli.config.as_deref(),
        platform::resolve(&host, &overrides),
    )?;

    let runner: &dyn Runner = if cli.dry_run { &DryRunner } else { &SystemRunner };

    match command {
        BuildCommands::All => project.build(registry::STAGES, runner)?,
        BuildCommands::Stage { names } => {
            let stages = registry::select(&names)?;
            project.build(&stages, runner)?;
        }
        BuildCommands::Plan => project.show_plan()?,
        BuildCommands::Doctor => builder::doctor::run(&project)?,
        BuildCommands::Clean { all } => project.clean(all, cli.dry_run)?,
        BuildCommands::Stages => builder::list_stages(),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_platform_exit_code_survives_context() {
        let err = anyhow::Error::from(BuildError::UnknownDistribution("fedora".to_string()))
            .context("Stage system-packages failed")
            .context("Building for fedora_39_x86_64");
        assert_eq!(exit_code(&err), Some(EXIT_UNSUPPORTED));
    }

    #[test]
    fn test_other_failures_keep_default_exit_code() {
        let err = anyhow::Error::from(BuildError::CommandFailed {
            command: "make".to_string(),
            status: "exit status: 2".to_string(),
        })
        .context("Stage externals failed");
        assert_eq!(exit_code(&err), None);
        assert_eq!(exit_code(&anyhow::anyhow!("plain failure")), None);
    }

    #[test]
    fn test_dry_run_flag_is_global() {
        let cli = Cli::parse_from(["build-artifact", "clean", "--all", "--dry-run"]);
        assert!(cli.dry_run);
        assert!(matches!(cli.command, Some(BuildCommands::Clean { all: true })));
    }
}
