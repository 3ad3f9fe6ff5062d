//! Firmware build through the project's `mbs` driver.

use super::{BuildContext, Stage};
use crate::builder::exec::Step;
use anyhow::Result;

pub struct Firmware;

impl Stage for Firmware {
    fn name(&self) -> &'static str {
        "firmware"
    }

    fn description(&self) -> &'static str {
        "Build the firmware with mbs"
    }

    fn run(&self, ctx: &BuildContext<'_>) -> Result<()> {
        log::info!("=== Building firmware ===");

        ctx.runner.run(
            &Step::new(ctx.settings.python.as_str())
                .arg("mbs/mbs")
                .current_dir(&ctx.layout.project_dir),
        )
    }
}
