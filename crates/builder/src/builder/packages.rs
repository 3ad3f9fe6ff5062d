//! Debian package installation for the build host and for cross targets.

use super::exec::{Runner, Step};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const INSTALLED: &str = "install ok installed";

/// Install missing host packages through apt.
pub fn install_host(runner: &dyn Runner, debs: &[String], use_sudo: bool) -> Result<()> {
    let mut missing = Vec::new();

    for deb in debs {
        let query = Step::new("dpkg-query")
            .args(["-W", "-f=${Status}", deb.as_str()])
            .env("LC_ALL", "C");
        let status = runner.capture(&query)?;
        if status.success && status.stdout.contains(INSTALLED) {
            log::info!("  {deb}: installed");
        } else {
            log::info!("  {deb}: missing");
            missing.push(deb.clone());
        }
    }

    if missing.is_empty() {
        return Ok(());
    }

    runner.run(&Step::new("apt-get").args(["update", "--assume-yes"]).privileged(use_sudo))?;
    runner.run(
        &Step::new("apt-get")
            .args(["install", "--assume-yes"])
            .args(missing)
            .privileged(use_sudo),
    )?;
    Ok(())
}

/// Download packages for a foreign architecture and unpack them below
/// `<packages_dir>/root`. Archives and files left by earlier runs are
/// removed first, so only this download ends up in the sysroot.
pub fn install_foreign(runner: &dyn Runner, debs: &[String], packages_dir: &Path) -> Result<()> {
    if runner.executes() {
        std::fs::create_dir_all(packages_dir)
            .with_context(|| format!("Creating {}", packages_dir.display()))?;
        remove_previous_download(packages_dir)?;
    }

    runner.run(
        &Step::new("apt-get")
            .arg("download")
            .args(debs.iter().cloned())
            .current_dir(packages_dir),
    )?;

    let root = sysroot(packages_dir);
    for deb in downloaded_debs(packages_dir)? {
        runner.run(
            &Step::new("dpkg-deb")
                .arg("--extract")
                .path_arg(&deb)
                .path_arg(&root)
                .current_dir(packages_dir),
        )?;
    }
    Ok(())
}

/// Where foreign packages are unpacked.
pub fn sysroot(packages_dir: &Path) -> PathBuf {
    packages_dir.join("root")
}

fn remove_previous_download(packages_dir: &Path) -> Result<()> {
    for deb in downloaded_debs(packages_dir)? {
        log::debug!("  Removing old {}", deb.display());
        std::fs::remove_file(&deb).with_context(|| format!("Removing {}", deb.display()))?;
    }

    let root = sysroot(packages_dir);
    if root.exists() {
        std::fs::remove_dir_all(&root).with_context(|| format!("Removing {}", root.display()))?;
    }
    Ok(())
}

fn downloaded_debs(packages_dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = packages_dir.join("*.deb");
    let pattern = pattern
        .to_str()
        .context("Package folder path contains invalid UTF-8")?;

    let mut debs = glob::glob(pattern)
        .context("Invalid package glob")?
        .collect::<Result<Vec<_>, _>>()
        .context("Listing downloaded packages")?;
    debs.sort();
    Ok(debs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::exec::testing::RecordingRunner;
    use crate::builder::exec::DryRunner;
    use tempfile::TempDir;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_host_packages_already_installed() {
        let runner = RecordingRunner::new().with_output("libudev-dev", "install ok installed");
        install_host(&runner, &names(&["libudev-dev"]), true).unwrap();

        assert_eq!(runner.lines(), vec!["LC_ALL=C dpkg-query -W -f=${Status} libudev-dev"]);
    }

    #[test]
    fn test_host_packages_installs_only_missing() {
        let runner = RecordingRunner::new().with_output("liblua5.4-dev", "install ok installed");
        install_host(&runner, &names(&["libudev-dev", "liblua5.4-dev"]), true).unwrap();

        let lines = runner.lines();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], "sudo apt-get update --assume-yes");
        assert_eq!(lines[3], "sudo apt-get install --assume-yes libudev-dev");
    }

    #[test]
    fn test_foreign_packages_are_unpacked() {
        let tmp = TempDir::new().unwrap();
        let packages = tmp.path().join("packages");
        let runner = RecordingRunner::new()
            .with_effect("apt-get", packages.join("libudev-dev_249_arm64.deb"));

        install_foreign(&runner, &names(&["libudev-dev:arm64"]), &packages).unwrap();

        let steps = runner.steps.borrow();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].to_string(), "apt-get download libudev-dev:arm64");
        assert_eq!(steps[0].cwd.as_deref(), Some(packages.as_path()));
        assert_eq!(steps[1].program, "dpkg-deb");
        assert_eq!(steps[1].args[0], "--extract");
        assert!(steps[1].args[1].ends_with("libudev-dev_249_arm64.deb"));
        assert_eq!(steps[1].args[2], packages.join("root").to_string_lossy());
    }

    #[test]
    fn test_foreign_packages_from_earlier_runs_are_dropped() {
        let tmp = TempDir::new().unwrap();
        let packages = tmp.path().join("packages");
        let old = packages.join("libudev-dev_249.11-0ubuntu3.9_arm64.deb");
        let old_header = packages.join("root/usr/include/libudev.h");
        std::fs::create_dir_all(old_header.parent().unwrap()).unwrap();
        std::fs::write(&old, b"").unwrap();
        std::fs::write(&old_header, b"").unwrap();
        let new = packages.join("libudev-dev_249.11-0ubuntu3.10_arm64.deb");
        let runner = RecordingRunner::new().with_effect("apt-get", new.clone());

        install_foreign(&runner, &names(&["libudev-dev:arm64"]), &packages).unwrap();

        let steps = runner.steps.borrow();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].args[1], new.to_string_lossy());
        assert!(!old.exists());
        assert!(!old_header.exists());
    }

    #[test]
    fn test_foreign_dry_run_keeps_previous_download() {
        let tmp = TempDir::new().unwrap();
        let old = tmp.path().join("libudev-dev_249_armhf.deb");
        std::fs::write(&old, b"").unwrap();

        install_foreign(&DryRunner, &names(&["libudev-dev:armhf"]), tmp.path()).unwrap();
        assert!(old.exists());
    }

    #[test]
    fn test_foreign_download_failure_stops() {
        let tmp = TempDir::new().unwrap();
        let runner = RecordingRunner::new().failing_on("apt-get");
        let err = install_foreign(&runner, &names(&["libudev-dev:armhf"]), tmp.path());
        assert!(err.is_err());
        assert_eq!(runner.steps.borrow().len(), 1);
    }
}
