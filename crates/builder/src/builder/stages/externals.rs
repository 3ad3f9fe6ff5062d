//! External libraries from `external/`.

use super::{BuildContext, Stage};
use anyhow::Result;

pub struct Externals;

impl Stage for Externals {
    fn name(&self) -> &'static str {
        "externals"
    }

    fn description(&self) -> &'static str {
        "Configure and build the external libraries"
    }

    fn run(&self, ctx: &BuildContext<'_>) -> Result<()> {
        log::info!("=== Building externals ===");

        let cwd = ctx.layout.external_dir();
        ctx.ensure_dir(&cwd)?;

        // Externals only need the compiler, not the platform defines.
        ctx.runner.run(
            &ctx.cmake()
                .args(ctx.plan.cmake_compiler.iter().cloned())
                .path_arg(&ctx.layout.project_dir.join("external"))
                .current_dir(&cwd),
        )?;
        ctx.runner.run(&ctx.make().current_dir(&cwd))
    }
}
