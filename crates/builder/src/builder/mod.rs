//! Build driver for the papa-schlumpf-flex firmware and Lua plugin.
//!
//! Structure:
//! - `platform` - host detection and the target platform descriptor
//! - `toolchain` - per-platform packages, CMake defines and jonchki options
//! - `packages` - host and foreign-architecture Debian packages
//! - `jonchki` - dependency installer bootstrap and invocation
//! - `stages/` - the build pipeline, one stage per external build
//! - `exec` - process steps and runners (real and dry-run)

pub mod config;
pub mod doctor;
pub mod error;
pub mod exec;
pub mod jonchki;
pub mod packages;
pub mod platform;
pub mod stages;
pub mod toolchain;

use anyhow::{Context, Result};
use clap::Subcommand;
use config::{BuildSettings, Layout};
use exec::Runner;
use platform::Platform;
use stages::{registry, BuildContext, Stage};
use std::path::Path;
use toolchain::ToolchainPlan;

/// Build commands for the CLI.
#[derive(Subcommand)]
pub enum BuildCommands {
    /// Run every stage (default)
    All,
    /// Run the named stages, in pipeline order
    Stage {
        /// Stage names (see `stages`)
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// List the build stages
    Stages,
    /// Show the platform, toolchain plan and every command without running them
    Plan,
    /// Check host tools and project files
    Doctor,
    /// Remove the working folder of the selected platform
    Clean {
        /// Remove the whole build folder, including jonchki
        #[arg(long)]
        all: bool,
    },
}

/// A project folder prepared for one target platform.
pub struct Project {
    pub settings: BuildSettings,
    pub layout: Layout,
    pub platform: Platform,
}

impl Project {
    pub fn open(project_dir: &Path, config: Option<&Path>, platform: Platform) -> Result<Self> {
        let settings = BuildSettings::load(project_dir, config)?;
        let layout = Layout::new(project_dir, &platform.platform_id(), &settings);
        Ok(Self {
            settings,
            layout,
            platform,
        })
    }

    /// Toolchain plan, or the reason this platform cannot be built.
    pub fn plan(&self) -> Result<ToolchainPlan> {
        Ok(toolchain::select(&self.platform, &self.layout)?)
    }

    /// Run `stages` in order, stopping at the first failure.
    pub fn build(&self, stages: &[&dyn Stage], runner: &dyn Runner) -> Result<()> {
        println!("Building for {}", self.platform.platform_id());

        let plan = self.plan()?;
        let ctx = BuildContext {
            settings: &self.settings,
            layout: &self.layout,
            platform: &self.platform,
            plan: &plan,
            runner,
        };

        for stage in stages {
            stage
                .run(&ctx)
                .with_context(|| format!("Stage {} failed", stage.name()))?;
        }

        log::info!("=== Build complete: {} ===", self.layout.working_dir.display());
        Ok(())
    }

    /// Print what a build would do.
    pub fn show_plan(&self) -> Result<()> {
        let plan = self.plan()?;

        println!("Platform:   {}", self.platform);
        println!("Working:    {}", self.layout.working_dir.display());
        match &plan.packages {
            toolchain::SystemPackages::Host(debs) => {
                println!("Packages:   {} (host)", debs.join(" "));
            }
            toolchain::SystemPackages::Foreign(debs) => {
                println!("Packages:   {} (foreign)", debs.join(" "));
            }
        }
        if !plan.cmake_compiler.is_empty() {
            println!("Toolchain:  {}", plan.cmake_compiler.join(" "));
        }
        println!();

        self.build(registry::STAGES, &exec::DryRunner)
    }

    /// Remove this platform's working folder, or the whole build folder.
    pub fn clean(&self, all: bool, dry_run: bool) -> Result<()> {
        let path = if all {
            self.layout.build_root()
        } else {
            self.layout.working_dir.clone()
        };

        if !path.exists() {
            println!("{} does not exist", path.display());
        } else if dry_run {
            println!("Would remove: {}", path.display());
        } else {
            std::fs::remove_dir_all(&path)
                .with_context(|| format!("Removing {}", path.display()))?;
            println!("Cleaned: {}", path.display());
        }
        Ok(())
    }
}

/// Print stage names and descriptions.
pub fn list_stages() {
    for stage in registry::STAGES {
        println!("  {:18} {}", stage.name(), stage.description());
    }
}
