//! Build settings and the folder layout derived from them.
//!
//! Defaults are compiled in. A JSON file (`build_artifact.json` in the
//! project folder, or `--config`) may override any of them.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File looked up in the project folder when `--config` is not given.
pub const CONFIG_FILE: &str = "build_artifact.json";

/// Verbosity levels understood by `jonchki --verbose`.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JonchkiVerbosity {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Fatal,
}

impl JonchkiVerbosity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct BuildSettings {
    /// Artifact name used in generated manifests (`lua5.4-<artifact>-*.xml`).
    pub artifact: String,
    pub lua_version: String,
    pub jonchki_version: String,
    pub jonchki_verbose: JonchkiVerbosity,
    /// Release folder; the archive name is appended.
    pub jonchki_download_url: String,
    /// Interpreter for the firmware build driver.
    pub python: String,
    pub make: String,
    pub cmake: String,
    /// Prefix package manager calls with `sudo`.
    pub use_sudo: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            artifact: "papa-schlumpf-flex".to_string(),
            lua_version: "5.4".to_string(),
            jonchki_version: "0.0.11.1".to_string(),
            jonchki_verbose: JonchkiVerbosity::Info,
            jonchki_download_url:
                "https://github.com/muhkuh-sys/org.muhkuh.lua-jonchki/releases/download"
                    .to_string(),
            python: "python3".to_string(),
            make: "make".to_string(),
            cmake: "cmake".to_string(),
            use_sudo: true,
        }
    }
}

impl BuildSettings {
    /// Load settings: an explicit file must exist, the default one is optional.
    pub fn load(project_dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = project_dir.join(CONFIG_FILE);
                if !default.is_file() {
                    log::debug!("No {} found, using defaults", default.display());
                    return Ok(Self::default());
                }
                default
            }
        };

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Reading {}", path.display()))?;
        let settings = serde_json::from_str(&text)
            .with_context(|| format!("Parsing {}", path.display()))?;
        log::info!("Loaded build settings from {}", path.display());
        Ok(settings)
    }

    /// Folder name for the Lua build, e.g. `lua5.4`.
    pub fn lua_dir_name(&self) -> String {
        format!("lua{}", self.lua_version)
    }

    /// Glob for the manifest the requirements build generates.
    pub fn manifest_pattern(&self) -> String {
        format!("lua{}-{}-*.xml", self.lua_version, self.artifact)
    }
}

/// All paths the build touches, rooted at the project folder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub project_dir: PathBuf,
    /// `build/<platform id>`; everything for one platform lands here.
    pub working_dir: PathBuf,
    lua_dir_name: String,
}

impl Layout {
    pub fn new(project_dir: &Path, platform_id: &str, settings: &BuildSettings) -> Self {
        Self {
            project_dir: project_dir.to_path_buf(),
            working_dir: project_dir.join("build").join(platform_id),
            lua_dir_name: settings.lua_dir_name(),
        }
    }

    pub fn build_root(&self) -> PathBuf {
        self.project_dir.join("build")
    }

    pub fn external_dir(&self) -> PathBuf {
        self.working_dir.join("external")
    }

    pub fn lua_dir(&self) -> PathBuf {
        self.working_dir.join(&self.lua_dir_name)
    }

    pub fn requirements_dir(&self) -> PathBuf {
        self.lua_dir().join("build_requirements")
    }

    pub fn packages_dir(&self) -> PathBuf {
        self.working_dir.join("packages")
    }

    /// Folders every build stage expects to exist.
    pub fn folders(&self) -> Vec<PathBuf> {
        vec![
            self.working_dir.clone(),
            self.external_dir(),
            self.lua_dir(),
            self.requirements_dir(),
        ]
    }

    pub fn create_folders(&self) -> Result<()> {
        for dir in self.folders() {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Creating {}", dir.display()))?;
        }
        Ok(())
    }

    pub fn jonchki_dir(&self) -> PathBuf {
        self.project_dir.join("jonchki")
    }

    pub fn jonchki_local_archives(&self) -> PathBuf {
        self.jonchki_dir().join("local_archives")
    }

    pub fn jonchki_system_config(&self) -> PathBuf {
        self.jonchki_dir().join("jonchkisys.cfg")
    }

    pub fn jonchki_project_config(&self) -> PathBuf {
        self.jonchki_dir().join("jonchkicfg.xml")
    }

    pub fn dependency_log(&self) -> PathBuf {
        self.project_dir
            .join(format!("dependency-log-{}.xml", self.lua_dir_name))
    }

    pub fn toolchain_file(&self, distribution: &str, arch: &str) -> PathBuf {
        self.project_dir
            .join("cmake/toolchainfiles")
            .join(format!("toolchain_{distribution}_{arch}.cmake"))
    }

    pub fn firmware_driver(&self) -> PathBuf {
        self.project_dir.join("mbs/mbs")
    }
}
