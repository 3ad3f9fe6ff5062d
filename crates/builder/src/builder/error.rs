//! Failure kinds that callers may want to tell apart.
//!
//! Everything else travels as a plain `anyhow::Error` with context.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Unknown host distribution: \"{0}\"")]
    UnknownHostDistribution(String),

    #[error("Unknown distribution: \"{0}\"")]
    UnknownDistribution(String),

    #[error("The target {distribution} version must match the build host (target {target}, host {host})")]
    DistributionVersionMismatch {
        distribution: String,
        target: String,
        host: String,
    },

    #[error("Unknown CPU architecture: \"{0}\"")]
    UnknownCpuArchitecture(String),

    #[error("`{command}` failed ({status})")]
    CommandFailed { command: String, status: String },

    #[error("Expected exactly one match for \"{pattern}\" in {}, found {found}", .dir.display())]
    ManifestNotFound {
        pattern: String,
        dir: PathBuf,
        found: usize,
    },

    #[error("Unknown stage: {0}")]
    UnknownStage(String),

    #[error("jonchki executable not found at {} after unpacking", .0.display())]
    JonchkiMissing(PathBuf),
}

impl BuildError {
    /// True for errors caused by an unsupported platform combination.
    pub fn is_unsupported_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownHostDistribution(_)
                | Self::UnknownDistribution(_)
                | Self::DistributionVersionMismatch { .. }
                | Self::UnknownCpuArchitecture(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_value() {
        let err = BuildError::UnknownDistribution("fedora".to_string());
        assert_eq!(err.to_string(), "Unknown distribution: \"fedora\"");

        let err = BuildError::CommandFailed {
            command: "make pack".to_string(),
            status: "exit status: 2".to_string(),
        };
        assert_eq!(err.to_string(), "`make pack` failed (exit status: 2)");
    }

    #[test]
    fn test_unsupported_configuration_kinds() {
        assert!(BuildError::UnknownCpuArchitecture("x86".into()).is_unsupported_configuration());
        assert!(!BuildError::UnknownStage("foo".into()).is_unsupported_configuration());
    }
}
