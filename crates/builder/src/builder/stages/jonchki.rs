//! Working folders and the jonchki bootstrap.

use super::{BuildContext, Stage};
use crate::builder::jonchki::JonchkiInstall;
use anyhow::Result;

pub struct Jonchki;

impl Stage for Jonchki {
    fn name(&self) -> &'static str {
        "jonchki"
    }

    fn description(&self) -> &'static str {
        "Create the working folders and install the pinned jonchki release"
    }

    fn run(&self, ctx: &BuildContext<'_>) -> Result<()> {
        log::info!("=== Installing jonchki {} ===", ctx.settings.jonchki_version);

        if ctx.runner.executes() {
            ctx.layout.create_folders()?;
        }
        let exe = JonchkiInstall::new(ctx.settings, ctx.layout)
            .install(ctx.runner, &ctx.platform.host())?;

        log::info!("  jonchki: {}", exe.display());
        Ok(())
    }
}
