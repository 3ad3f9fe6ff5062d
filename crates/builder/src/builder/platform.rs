//! Platform descriptor: which distribution and CPU we build on, and for.
//!
//! The host side is detected from `/etc/os-release` and the architecture
//! this binary was compiled for. Every target attribute defaults to the
//! host value unless it is given on the command line.

use super::error::BuildError;
use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

const OS_RELEASE: &str = "/etc/os-release";

/// CPU architecture names as the dependency installer spells them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CpuArch {
    X86,
    X86_64,
    Armhf,
    Arm64,
    Riscv64,
}

impl CpuArch {
    pub fn as_str(self) -> &'static str {
        match self {
            CpuArch::X86 => "x86",
            CpuArch::X86_64 => "x86_64",
            CpuArch::Armhf => "armhf",
            CpuArch::Arm64 => "arm64",
            CpuArch::Riscv64 => "riscv64",
        }
    }

    /// Architecture of the running binary.
    pub fn host() -> Result<Self> {
        std::env::consts::ARCH
            .parse()
            .context("Unsupported build host architecture")
    }
}

impl FromStr for CpuArch {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x86" | "i386" | "i686" => Ok(CpuArch::X86),
            "x86_64" | "amd64" => Ok(CpuArch::X86_64),
            "armhf" | "arm" | "armv7l" => Ok(CpuArch::Armhf),
            "arm64" | "aarch64" => Ok(CpuArch::Arm64),
            "riscv64" => Ok(CpuArch::Riscv64),
            _ => Err(BuildError::UnknownCpuArchitecture(s.to_string())),
        }
    }
}

impl fmt::Display for CpuArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A distribution id with an optional version (e.g. `ubuntu` / `22.04`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Distribution {
    pub id: String,
    pub version: Option<String>,
}

impl Distribution {
    #[cfg(test)]
    pub fn new(id: &str, version: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            version: version.map(str::to_string),
        }
    }

    /// Version for messages and defines; empty when unknown.
    pub fn version_str(&self) -> &str {
        self.version.as_deref().unwrap_or("")
    }
}

/// Host and target attributes used to pick the build branch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Platform {
    pub host_distribution: Distribution,
    pub host_cpu_architecture: CpuArch,
    pub distribution: Distribution,
    pub cpu_architecture: CpuArch,
}

/// Target attributes given on the command line.
#[derive(Clone, Debug, Default)]
pub struct TargetOverrides {
    pub distribution_id: Option<String>,
    pub distribution_version: Option<String>,
    pub cpu_architecture: Option<CpuArch>,
}

/// The build host: distribution plus CPU.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Host {
    pub distribution: Distribution,
    pub cpu_architecture: CpuArch,
}

impl Host {
    /// Identifier of the host itself, used to pick prebuilt tool archives.
    pub fn platform_id(&self) -> String {
        platform_id(&self.distribution, self.cpu_architecture)
    }
}

/// Detect the build host.
pub fn detect_host() -> Result<Host> {
    detect_host_from(Path::new(OS_RELEASE))
}

fn detect_host_from(os_release: &Path) -> Result<Host> {
    let text = std::fs::read_to_string(os_release)
        .with_context(|| format!("Reading {}", os_release.display()))?;
    let distribution = parse_os_release(&text)
        .with_context(|| format!("No ID= line in {}", os_release.display()))?;

    Ok(Host {
        distribution,
        cpu_architecture: CpuArch::host()?,
    })
}

/// Extract `ID` and `VERSION_ID` from os-release content.
pub fn parse_os_release(text: &str) -> Option<Distribution> {
    let mut id = None;
    let mut version = None;

    for line in text.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches(|c: char| c == '"' || c == '\'');
        match key {
            "ID" => id = Some(value.to_lowercase()),
            "VERSION_ID" if !value.is_empty() => version = Some(value.to_string()),
            _ => {}
        }
    }

    id.map(|id| Distribution { id, version })
}

/// Combine the detected host with command line overrides.
pub fn resolve(host: &Host, overrides: &TargetOverrides) -> Platform {
    let distribution = Distribution {
        id: overrides
            .distribution_id
            .clone()
            .unwrap_or_else(|| host.distribution.id.clone()),
        version: overrides
            .distribution_version
            .clone()
            .or_else(|| host.distribution.version.clone()),
    };

    Platform {
        host_distribution: host.distribution.clone(),
        host_cpu_architecture: host.cpu_architecture,
        distribution,
        cpu_architecture: overrides.cpu_architecture.unwrap_or(host.cpu_architecture),
    }
}

fn platform_id(distribution: &Distribution, arch: CpuArch) -> String {
    match &distribution.version {
        Some(version) => format!("{}_{}_{}", distribution.id, version, arch),
        None => format!("{}_{}", distribution.id, arch),
    }
}

impl Platform {
    /// Target identifier, e.g. `ubuntu_22.04_arm64`.
    pub fn platform_id(&self) -> String {
        platform_id(&self.distribution, self.cpu_architecture)
    }

    pub fn is_native(&self) -> bool {
        self.cpu_architecture == self.host_cpu_architecture
    }

    pub fn host(&self) -> Host {
        Host {
            distribution: self.host_distribution.clone(),
            cpu_architecture: self.host_cpu_architecture,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (host {})",
            self.platform_id(),
            platform_id(&self.host_distribution, self.host_cpu_architecture)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ubuntu_host(arch: CpuArch) -> Host {
        Host {
            distribution: Distribution::new("ubuntu", Some("22.04")),
            cpu_architecture: arch,
        }
    }

    #[test]
    fn test_cpu_arch_aliases() {
        assert_eq!("aarch64".parse::<CpuArch>(), Ok(CpuArch::Arm64));
        assert_eq!("amd64".parse::<CpuArch>(), Ok(CpuArch::X86_64));
        assert_eq!("armv7l".parse::<CpuArch>(), Ok(CpuArch::Armhf));
        assert_eq!("riscv64".parse::<CpuArch>(), Ok(CpuArch::Riscv64));
        assert_eq!(
            "mips".parse::<CpuArch>(),
            Err(BuildError::UnknownCpuArchitecture("mips".to_string()))
        );
    }

    #[test]
    fn test_parse_os_release_strips_quotes() {
        let text = "NAME=\"Ubuntu\"\nVERSION_ID=\"22.04\"\nID=ubuntu\nID_LIKE=debian\n";
        let dist = parse_os_release(text).unwrap();
        assert_eq!(dist, Distribution::new("ubuntu", Some("22.04")));
    }

    #[test]
    fn test_parse_os_release_without_version() {
        let dist = parse_os_release("ID=arch\nBUILD_ID=rolling\n").unwrap();
        assert_eq!(dist.id, "arch");
        assert_eq!(dist.version, None);
        assert!(parse_os_release("NAME=nothing\n").is_none());
    }

    #[test]
    fn test_detect_host_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("os-release");
        std::fs::write(&path, "ID=ubuntu\nVERSION_ID=\"24.04\"\n").unwrap();

        let host = detect_host_from(&path).unwrap();
        assert_eq!(host.distribution, Distribution::new("ubuntu", Some("24.04")));
        assert!(detect_host_from(&tmp.path().join("missing")).is_err());
    }

    #[test]
    fn test_resolve_defaults_to_host() {
        let platform = resolve(&ubuntu_host(CpuArch::X86_64), &TargetOverrides::default());
        assert_eq!(platform.platform_id(), "ubuntu_22.04_x86_64");
        assert!(platform.is_native());
    }

    #[test]
    fn test_resolve_overrides_each_attribute() {
        let overrides = TargetOverrides {
            cpu_architecture: Some(CpuArch::Riscv64),
            ..TargetOverrides::default()
        };
        let platform = resolve(&ubuntu_host(CpuArch::X86_64), &overrides);
        assert_eq!(platform.platform_id(), "ubuntu_22.04_riscv64");
        assert!(!platform.is_native());

        let overrides = TargetOverrides {
            distribution_id: Some("windows".to_string()),
            ..TargetOverrides::default()
        };
        let platform = resolve(&ubuntu_host(CpuArch::X86_64), &overrides);
        assert_eq!(platform.distribution.id, "windows");
        assert_eq!(platform.distribution.version_str(), "22.04");
    }

    #[test]
    fn test_platform_id_without_version() {
        let host = Host {
            distribution: Distribution::new("debian", None),
            cpu_architecture: CpuArch::Arm64,
        };
        assert_eq!(host.platform_id(), "debian_arm64");
    }
}
