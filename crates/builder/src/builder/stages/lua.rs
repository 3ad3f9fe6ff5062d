//! The Lua plugin build and its package.

use super::{BuildContext, Stage};
use anyhow::Result;

pub struct Lua;

impl Stage for Lua {
    fn name(&self) -> &'static str {
        "lua"
    }

    fn description(&self) -> &'static str {
        "Configure the Lua plugin build and pack the artifact"
    }

    fn run(&self, ctx: &BuildContext<'_>) -> Result<()> {
        log::info!("=== Building {} ===", ctx.settings.lua_dir_name());

        let cwd = ctx.layout.lua_dir();
        ctx.ensure_dir(&cwd)?;

        ctx.runner.run(
            &ctx.cmake()
                .args(ctx.lua_defines())
                .args(ctx.plan.cmake_compiler.iter().cloned())
                .args(ctx.plan.cmake_platform.iter().cloned())
                .path_arg(&ctx.layout.project_dir)
                .current_dir(&cwd),
        )?;
        ctx.runner.run(&ctx.make().arg("pack").current_dir(&cwd))?;

        log::info!("  Packed: {}", cwd.display());
        Ok(())
    }
}
