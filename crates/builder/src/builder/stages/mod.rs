//! Build stages, run in a fixed order.
//!
//! Each stage implements [`Stage`] and is registered in [`registry`].
//! Stages create the folders they use, so any one of them can be run on
//! its own once the stages before it have completed once.

pub mod externals;
pub mod firmware;
pub mod jonchki;
pub mod lua;
pub mod lua_requirements;
pub mod registry;
pub mod system_packages;

use super::config::{BuildSettings, Layout};
use super::exec::{Runner, Step};
use super::platform::Platform;
use super::toolchain::ToolchainPlan;
use anyhow::{Context, Result};
use std::path::Path;

/// Everything a stage needs to run.
pub struct BuildContext<'a> {
    pub settings: &'a BuildSettings,
    pub layout: &'a Layout,
    pub platform: &'a Platform,
    pub plan: &'a ToolchainPlan,
    pub runner: &'a dyn Runner,
}

impl BuildContext<'_> {
    /// `cmake` with the defines every configure call shares.
    fn cmake(&self) -> Step {
        Step::new(self.settings.cmake.as_str())
            .arg("-DCMAKE_INSTALL_PREFIX=")
            .arg(format!("-DPRJ_DIR={}", self.layout.project_dir.display()))
            .arg(format!("-DWORKING_DIR={}", self.layout.working_dir.display()))
    }

    fn lua_defines(&self) -> [String; 2] {
        [
            "-DBUILDCFG_LUA_USE_SYSTEM=OFF".to_string(),
            format!("-DBUILDCFG_LUA_VERSION={}", self.settings.lua_version),
        ]
    }

    fn make(&self) -> Step {
        Step::new(self.settings.make.as_str())
    }

    /// Create a stage folder; dry runs leave the tree alone.
    fn ensure_dir(&self, dir: &Path) -> Result<()> {
        if self.runner.executes() {
            std::fs::create_dir_all(dir).with_context(|| format!("Creating {}", dir.display()))?;
        }
        Ok(())
    }
}

/// A step of the build pipeline.
pub trait Stage: Sync {
    /// Name used on the command line.
    fn name(&self) -> &'static str;

    /// One-line summary for `stages`.
    fn description(&self) -> &'static str;

    fn run(&self, ctx: &BuildContext<'_>) -> Result<()>;
}
