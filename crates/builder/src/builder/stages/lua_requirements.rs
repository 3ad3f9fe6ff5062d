//! Build requirements of the Lua plugin.
//!
//! A configure-only CMake run writes the dependency manifest
//! (`lua5.4-<artifact>-<version>.xml`), which jonchki then resolves.

use super::{BuildContext, Stage};
use crate::builder::error::BuildError;
use crate::builder::jonchki::{InstallDependencies, JonchkiInstall};
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

pub struct LuaRequirements;

impl Stage for LuaRequirements {
    fn name(&self) -> &'static str {
        "lua-requirements"
    }

    fn description(&self) -> &'static str {
        "Generate the Lua dependency manifest and install it with jonchki"
    }

    fn run(&self, ctx: &BuildContext<'_>) -> Result<()> {
        log::info!("=== Installing {} build requirements ===", ctx.settings.lua_dir_name());

        let jonchki = JonchkiInstall::new(ctx.settings, ctx.layout).executable();
        if ctx.runner.executes() && !jonchki.is_file() {
            bail!(
                "jonchki not found at {}. Run: build-artifact stage jonchki",
                jonchki.display()
            );
        }

        let cwd = ctx.layout.requirements_dir();
        ctx.ensure_dir(&cwd)?;

        let pattern = ctx.settings.manifest_pattern();
        if ctx.runner.executes() {
            for stale in find_manifests(&cwd, &pattern)? {
                log::debug!("  Removing stale {}", stale.display());
                std::fs::remove_file(&stale)
                    .with_context(|| format!("Removing {}", stale.display()))?;
            }
        }

        ctx.runner.run(
            &ctx.cmake()
                .arg("-DBUILDCFG_ONLY_JONCHKI_CFG=ON")
                .args(ctx.lua_defines())
                .args(ctx.plan.cmake_compiler.iter().cloned())
                .args(ctx.plan.cmake_platform.iter().cloned())
                .path_arg(&ctx.layout.project_dir)
                .current_dir(&cwd),
        )?;
        ctx.runner.run(&ctx.make().current_dir(&cwd))?;

        let manifest = if ctx.runner.executes() {
            single_manifest(&cwd, &pattern)?
        } else {
            cwd.join(&pattern)
        };
        log::info!("  Manifest: {}", manifest.display());

        let log_file = cwd.join("jonchki.log");
        let dependency_log = ctx.layout.dependency_log();
        let system_config = ctx.layout.jonchki_system_config();
        let project_config = ctx.layout.jonchki_project_config();
        let call = InstallDependencies {
            verbose: ctx.settings.jonchki_verbose,
            system_config: &system_config,
            project_config: &project_config,
            log_file: &log_file,
            dependency_log: &dependency_log,
            system: &ctx.plan.jonchki_system,
            manifest: &manifest,
        };
        ctx.runner.run(&call.step(&jonchki, &cwd))
    }
}

fn find_manifests(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full = dir.join(pattern);
    let full = full.to_str().context("Manifest path contains invalid UTF-8")?;

    glob::glob(full)
        .context("Invalid manifest pattern")?
        .collect::<Result<Vec<_>, _>>()
        .context("Listing manifests")
}

/// The generated manifest; anything but exactly one match is an error.
fn single_manifest(dir: &Path, pattern: &str) -> Result<PathBuf> {
    let mut found = find_manifests(dir, pattern)?;
    if found.len() != 1 {
        return Err(BuildError::ManifestNotFound {
            pattern: pattern.to_string(),
            dir: dir.to_path_buf(),
            found: found.len(),
        }
        .into());
    }
    Ok(found.remove(0))
}
