//! jonchki dependency installer: bootstrap and invocation.
//!
//! A pinned release is unpacked into `build/jonchki-<version>`. Archives in
//! `jonchki/local_archives` are preferred over downloads.

use super::config::{BuildSettings, JonchkiVerbosity, Layout};
use super::error::BuildError;
use super::exec::{Runner, Step};
use super::platform::Host;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// A jonchki installation at a fixed version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JonchkiInstall {
    pub version: String,
    pub install_dir: PathBuf,
    pub local_archives: PathBuf,
    pub download_url: String,
}

impl JonchkiInstall {
    pub fn new(settings: &BuildSettings, layout: &Layout) -> Self {
        Self {
            version: settings.jonchki_version.clone(),
            install_dir: layout.build_root(),
            local_archives: layout.jonchki_local_archives(),
            download_url: settings.jonchki_download_url.clone(),
        }
    }

    pub fn home(&self) -> PathBuf {
        self.install_dir.join(format!("jonchki-{}", self.version))
    }

    pub fn executable(&self) -> PathBuf {
        self.home().join("jonchki")
    }

    /// Release archive for the build host.
    pub fn archive_name(&self, host: &Host) -> String {
        format!("jonchki-{}-{}.tar.gz", self.version, host.platform_id())
    }

    fn archive_url(&self, archive: &str) -> String {
        format!(
            "{}/v{}/{}",
            self.download_url.trim_end_matches('/'),
            self.version,
            archive
        )
    }

    /// Make sure the executable exists and return its path.
    pub fn install(&self, runner: &dyn Runner, host: &Host) -> Result<PathBuf> {
        let exe = self.executable();
        if exe.is_file() {
            log::info!("jonchki {} already installed at {}", self.version, exe.display());
            return Ok(exe);
        }

        if runner.executes() {
            std::fs::create_dir_all(&self.install_dir)
                .with_context(|| format!("Creating {}", self.install_dir.display()))?;
        }

        let archive_name = self.archive_name(host);
        let local = self.local_archives.join(&archive_name);
        let archive = if local.is_file() {
            log::info!("Using local archive {}", local.display());
            local
        } else {
            let target = self.install_dir.join(&archive_name);
            let url = self.archive_url(&archive_name);
            log::info!("Downloading {url}");
            runner.run(
                &Step::new("curl")
                    .args(["--fail", "--location", "--silent", "--show-error", "--output"])
                    .path_arg(&target)
                    .arg(url),
            )?;
            target
        };

        runner.run(
            &Step::new("tar")
                .args(["--extract", "--gzip", "--file"])
                .path_arg(&archive)
                .arg("--directory")
                .path_arg(&self.install_dir),
        )?;

        if runner.executes() && !exe.is_file() {
            return Err(BuildError::JonchkiMissing(exe).into());
        }
        Ok(exe)
    }
}

/// Inputs of one `jonchki install-dependencies` call.
pub struct InstallDependencies<'a> {
    pub verbose: JonchkiVerbosity,
    pub system_config: &'a Path,
    pub project_config: &'a Path,
    pub log_file: &'a Path,
    pub dependency_log: &'a Path,
    /// Target options from the toolchain plan.
    pub system: &'a [String],
    pub manifest: &'a Path,
}

impl InstallDependencies<'_> {
    pub fn step(&self, jonchki: &Path, cwd: &Path) -> Step {
        Step::new(jonchki.to_string_lossy())
            .arg("install-dependencies")
            .args(["--verbose", self.verbose.as_str()])
            .arg("--syscfg")
            .path_arg(self.system_config)
            .arg("--prjcfg")
            .path_arg(self.project_config)
            .arg("--logfile")
            .path_arg(self.log_file)
            .arg("--dependency-log")
            .path_arg(self.dependency_log)
            .args(self.system.iter().cloned())
            .arg("--build-dependencies")
            .path_arg(self.manifest)
            .current_dir(cwd)
    }
}
