//! System package stage.

use super::{BuildContext, Stage};
use crate::builder::packages;
use crate::builder::toolchain;
use anyhow::Result;

pub struct SystemPackages;

impl Stage for SystemPackages {
    fn name(&self) -> &'static str {
        "system-packages"
    }

    fn description(&self) -> &'static str {
        "Install host packages, or unpack target packages for cross builds"
    }

    fn run(&self, ctx: &BuildContext<'_>) -> Result<()> {
        log::info!("=== Installing system packages ===");

        match &ctx.plan.packages {
            toolchain::SystemPackages::Host(debs) => {
                packages::install_host(ctx.runner, debs, ctx.settings.use_sudo)
            }
            toolchain::SystemPackages::Foreign(debs) => {
                packages::install_foreign(ctx.runner, debs, &ctx.layout.packages_dir())
            }
        }
    }
}
