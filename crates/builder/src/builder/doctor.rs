//! Check that host tools and project inputs are in place before a build.

use super::toolchain::SystemPackages;
use super::Project;
use anyhow::{bail, Result};
use std::path::PathBuf;

/// Programs the selected plan will call.
fn required_tools(project: &Project) -> Result<Vec<String>> {
    let settings = &project.settings;
    let mut tools = vec![
        settings.python.clone(),
        settings.cmake.clone(),
        settings.make.clone(),
        "curl".to_string(),
        "tar".to_string(),
    ];

    match project.plan()?.packages {
        SystemPackages::Host(_) => {
            tools.push("dpkg-query".to_string());
            tools.push("apt-get".to_string());
            if settings.use_sudo {
                tools.push("sudo".to_string());
            }
        }
        SystemPackages::Foreign(_) => {
            tools.push("apt-get".to_string());
            tools.push("dpkg-deb".to_string());
        }
    }
    Ok(tools)
}

/// Files the build reads from the project folder.
fn required_files(project: &Project) -> Result<Vec<PathBuf>> {
    let layout = &project.layout;
    let mut files = vec![
        layout.firmware_driver(),
        layout.jonchki_system_config(),
        layout.jonchki_project_config(),
        layout.project_dir.join("CMakeLists.txt"),
        layout.project_dir.join("external/CMakeLists.txt"),
    ];

    let platform = &project.platform;
    if !platform.is_native() {
        files.push(layout.toolchain_file(
            &platform.distribution.id,
            platform.cpu_architecture.as_str(),
        ));
    }
    Ok(files)
}

pub fn run(project: &Project) -> Result<()> {
    println!("Checking build for {}\n", project.platform);

    let mut ok = true;

    for tool in required_tools(project)? {
        if which::which(&tool).is_err() {
            eprintln!("[FAIL] missing `{tool}` in PATH");
            ok = false;
        } else {
            eprintln!("[OK] {tool}");
        }
    }

    for file in required_files(project)? {
        if file.is_file() {
            eprintln!("[OK] {}", file.display());
        } else {
            eprintln!("[FAIL] missing file: {}", file.display());
            ok = false;
        }
    }

    if !ok {
        bail!("doctor checks failed");
    }
    Ok(())
}
