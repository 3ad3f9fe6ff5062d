//! Per-platform toolchain plan.
//!
//! Only Ubuntu hosts building for the same Ubuntu release are supported.
//! Cross builds use the toolchain files in `cmake/toolchainfiles` and
//! foreign-architecture packages unpacked into the working folder.

use super::config::Layout;
use super::error::BuildError;
use super::platform::{CpuArch, Platform};

const SUPPORTED_DISTRIBUTION: &str = "ubuntu";

/// Architectures with a cross toolchain file.
const CROSS_TARGETS: &[CpuArch] = &[CpuArch::Armhf, CpuArch::Arm64, CpuArch::Riscv64];

/// Build-time system libraries, without architecture suffix.
const SYSTEM_PACKAGES: &[&str] = &["libudev-dev"];

/// How system packages are provided for this build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SystemPackages {
    /// Installed on the build host through the package manager.
    Host(Vec<String>),
    /// Downloaded for the target architecture and unpacked locally.
    Foreign(Vec<String>),
}

/// Everything the build stages need to know about the toolchain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolchainPlan {
    pub packages: SystemPackages,
    /// CMake compiler selection (toolchain file), empty for native builds.
    pub cmake_compiler: Vec<String>,
    /// `JONCHKI_PLATFORM_*` defines, empty for native builds.
    pub cmake_platform: Vec<String>,
    /// Target options for `jonchki install-dependencies`.
    pub jonchki_system: Vec<String>,
}

/// Pick the plan for `platform` or explain why it is unsupported.
pub fn select(platform: &Platform, layout: &Layout) -> Result<ToolchainPlan, BuildError> {
    if platform.host_distribution.id != SUPPORTED_DISTRIBUTION {
        return Err(BuildError::UnknownHostDistribution(
            platform.host_distribution.id.clone(),
        ));
    }
    if platform.distribution.id != SUPPORTED_DISTRIBUTION {
        return Err(BuildError::UnknownDistribution(platform.distribution.id.clone()));
    }
    // Building for another release of the OS is not possible yet.
    if platform.distribution.version != platform.host_distribution.version {
        return Err(BuildError::DistributionVersionMismatch {
            distribution: platform.distribution.id.clone(),
            target: platform.distribution.version_str().to_string(),
            host: platform.host_distribution.version_str().to_string(),
        });
    }

    if platform.is_native() {
        return Ok(ToolchainPlan {
            packages: SystemPackages::Host(
                SYSTEM_PACKAGES.iter().map(ToString::to_string).collect(),
            ),
            cmake_compiler: Vec::new(),
            cmake_platform: Vec::new(),
            jonchki_system: Vec::new(),
        });
    }

    let arch = platform.cpu_architecture;
    if !CROSS_TARGETS.contains(&arch) {
        return Err(BuildError::UnknownCpuArchitecture(arch.to_string()));
    }

    let dist_id = &platform.distribution.id;
    let dist_version = platform.distribution.version_str();
    let toolchain = layout.toolchain_file(dist_id, arch.as_str());

    Ok(ToolchainPlan {
        packages: SystemPackages::Foreign(
            SYSTEM_PACKAGES
                .iter()
                .map(|name| format!("{name}:{arch}"))
                .collect(),
        ),
        cmake_compiler: vec![format!("-DCMAKE_TOOLCHAIN_FILE={}", toolchain.display())],
        cmake_platform: vec![
            format!("-DJONCHKI_PLATFORM_DIST_ID={dist_id}"),
            format!("-DJONCHKI_PLATFORM_DIST_VERSION={dist_version}"),
            format!("-DJONCHKI_PLATFORM_CPU_ARCH={arch}"),
        ],
        jonchki_system: vec![
            "--distribution-id".to_string(),
            dist_id.clone(),
            "--distribution-version".to_string(),
            dist_version.to_string(),
            "--cpu-architecture".to_string(),
            arch.to_string(),
        ],
    })
}
