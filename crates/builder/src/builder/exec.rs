//! External process steps and the runners that execute them.

use super::error::BuildError;
use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// One external command invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Extra environment variables, on top of the inherited environment.
    pub env: Vec<(String, String)>,
}

impl Step {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy())
    }

    #[must_use]
    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Prefix the step with `sudo` when asked to.
    #[must_use]
    pub fn privileged(self, use_sudo: bool) -> Self {
        if !use_sudo {
            return self;
        }
        let mut step = Step::new("sudo").arg(self.program).args(self.args);
        step.cwd = self.cwd;
        step.env = self.env;
        step
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.envs(self.env.iter().map(|(k, v)| (k, v)));
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }
}

fn quote(word: &str) -> String {
    if word.is_empty() {
        "''".to_string()
    } else if word.contains(|c: char| c.is_whitespace() || c == '\'' || c == '"') {
        format!("'{}'", word.replace('\'', r"'\''"))
    } else {
        word.to_string()
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{key}={} ", quote(value))?;
        }
        f.write_str(&quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

/// Result of a step run for its output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Captured {
    pub success: bool,
    pub stdout: String,
}

/// Executes steps. The pipeline only talks to this trait.
pub trait Runner {
    /// Run a step, failing on a non-zero exit.
    fn run(&self, step: &Step) -> Result<()>;

    /// Run a step for its output. A non-zero exit is reported, not raised.
    fn capture(&self, step: &Step) -> Result<Captured>;

    /// False when steps are only printed, so their outputs will not exist.
    fn executes(&self) -> bool {
        true
    }
}

/// Spawns real processes.
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(&self, step: &Step) -> Result<()> {
        match &step.cwd {
            Some(dir) => log::info!("  [{}] $ {step}", dir.display()),
            None => log::info!("  $ {step}"),
        }

        let status = step
            .command()
            .status()
            .with_context(|| format!("Failed to run {}", step.program))?;

        if !status.success() {
            return Err(BuildError::CommandFailed {
                command: step.to_string(),
                status: status.to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn capture(&self, step: &Step) -> Result<Captured> {
        log::debug!("  $ {step}");
        let output = step
            .command()
            .output()
            .with_context(|| format!("Failed to run {}", step.program))?;

        Ok(Captured {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

/// Prints steps instead of running them.
pub struct DryRunner;

impl Runner for DryRunner {
    fn run(&self, step: &Step) -> Result<()> {
        match &step.cwd {
            Some(dir) => println!("  [{}] $ {step}", dir.display()),
            None => println!("  $ {step}"),
        }
        Ok(())
    }

    fn capture(&self, step: &Step) -> Result<Captured> {
        println!("  $ {step}");
        Ok(Captured::default())
    }

    fn executes(&self) -> bool {
        false
    }
}

#[cfg(test)]
pub mod testing {
    //! A runner that records steps and fakes their side effects.

    use super::{Captured, Runner, Step};
    use anyhow::{bail, Result};
    use std::cell::RefCell;
    use std::path::PathBuf;

    #[derive(Default)]
    pub struct RecordingRunner {
        pub steps: RefCell<Vec<Step>>,
        /// (program, file): create the file whenever the program runs.
        effects: Vec<(String, PathBuf)>,
        /// (program, stdout) answers for `capture`.
        outputs: Vec<(String, String)>,
        /// Program that fails when run.
        failing: Option<String>,
    }

    impl RecordingRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_effect(mut self, program: &str, file: PathBuf) -> Self {
            self.effects.push((program.to_string(), file));
            self
        }

        pub fn with_output(mut self, word: &str, stdout: &str) -> Self {
            self.outputs.push((word.to_string(), stdout.to_string()));
            self
        }

        pub fn failing_on(mut self, program: &str) -> Self {
            self.failing = Some(program.to_string());
            self
        }

        /// Recorded steps rendered as command lines.
        pub fn lines(&self) -> Vec<String> {
            self.steps.borrow().iter().map(ToString::to_string).collect()
        }
    }

    impl Runner for RecordingRunner {
        fn run(&self, step: &Step) -> Result<()> {
            self.steps.borrow_mut().push(step.clone());
            if self.failing.as_deref() == Some(step.program.as_str()) {
                bail!("{} failed", step.program);
            }
            for (program, file) in &self.effects {
                if *program == step.program {
                    if let Some(parent) = file.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(file, b"")?;
                }
            }
            Ok(())
        }

        fn capture(&self, step: &Step) -> Result<Captured> {
            self.steps.borrow_mut().push(step.clone());
            let rendered = step.to_string();
            let stdout = self
                .outputs
                .iter()
                .find(|(word, _)| rendered.contains(word.as_str()))
                .map(|(_, out)| out.clone())
                .unwrap_or_default();
            Ok(Captured {
                success: !stdout.is_empty(),
                stdout,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_quotes_when_needed() {
        let step = Step::new("cmake")
            .arg("-DCMAKE_INSTALL_PREFIX=")
            .arg("")
            .arg("with space");
        assert_eq!(step.to_string(), "cmake -DCMAKE_INSTALL_PREFIX= '' 'with space'");
    }

    #[test]
    fn test_privileged_prefixes_sudo() {
        let step = Step::new("apt-get").arg("update").privileged(true);
        assert_eq!(step.to_string(), "sudo apt-get update");

        let step = Step::new("apt-get").arg("update").privileged(false);
        assert_eq!(step.to_string(), "apt-get update");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_reports_exit_status() {
        SystemRunner.run(&Step::new("true")).unwrap();

        let err = SystemRunner.run(&Step::new("false")).unwrap_err();
        let err = err.downcast::<BuildError>().unwrap();
        assert!(matches!(err, BuildError::CommandFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_capture() {
        let out = SystemRunner
            .capture(&Step::new("sh").args(["-c", "printf hello; exit 1"]))
            .unwrap();
        assert!(!out.success);
        assert_eq!(out.stdout, "hello");
    }

    #[test]
    fn test_display_shows_environment() {
        let step = Step::new("dpkg-query").arg("-W").env("LC_ALL", "C");
        assert_eq!(step.to_string(), "LC_ALL=C dpkg-query -W");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_passes_environment() {
        let out = SystemRunner
            .capture(
                &Step::new("sh")
                    .args(["-c", "printf %s \"$ARTIFACT_BUILD_TEST\""])
                    .env("ARTIFACT_BUILD_TEST", "set"),
            )
            .unwrap();
        assert!(out.success);
        assert_eq!(out.stdout, "set");
    }

    #[test]
    fn test_dry_runner_does_not_execute() {
        let runner = DryRunner;
        runner
            .run(&Step::new("definitely-not-a-real-program"))
            .unwrap();
        assert!(!runner.executes());
    }
}
