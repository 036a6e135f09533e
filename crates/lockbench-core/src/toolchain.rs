//! Build coordination
//!
//! Compiles every program variant once, before any sweep. A single failed
//! build aborts the run: a missing executable would turn every later trial
//! into a silent failure.

use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::types::Program;
use std::process::{Command, Stdio};

/// Invokes the external toolchain for each program
#[derive(Debug, Clone)]
pub struct BuildCoordinator {
    config: HarnessConfig,
    built: bool,
}

impl BuildCoordinator {
    /// Create a coordinator from the harness configuration
    ///
    /// Relative directories are resolved against the current directory, so
    /// executables land where trials look for them.
    ///
    /// # Errors
    /// Returns `Io` if the current directory cannot be determined
    pub fn new(config: &HarnessConfig) -> HarnessResult<Self> {
        Ok(Self {
            config: config.to_absolute()?,
            built: false,
        })
    }

    /// Check if `build_all` already succeeded
    #[inline]
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Toolchain command line for `program`
    #[must_use]
    pub fn command_for(&self, program: Program) -> Command {
        let mut cmd = Command::new(&self.config.compiler);
        cmd.arg(self.config.source_dir.join(program.source_file()))
            .arg("-o")
            .arg(self.config.executable_path(program))
            .args(program.link_flags())
            .args(&self.config.extra_compile_flags);
        cmd
    }

    /// Compile every configured program
    ///
    /// Subsequent calls after a successful build are no-ops.
    ///
    /// # Errors
    /// Returns `BuildFailure` for the first program whose compiler run could
    /// not start or exited non-zero.
    pub fn build_all(&mut self) -> HarnessResult<()> {
        if self.built {
            tracing::debug!("programs already built, skipping");
            return Ok(());
        }

        for &program in &self.config.programs {
            self.build(program)?;
        }

        self.built = true;
        Ok(())
    }

    fn build(&self, program: Program) -> HarnessResult<()> {
        tracing::info!("Compiling {} as {} ...", program.source_file(), program);
        let mut cmd = self.command_for(program);
        tracing::debug!(command = ?cmd, "invoking toolchain");

        let output = cmd
            .stdin(Stdio::null())
            .output()
            .map_err(|e| HarnessError::BuildFailure {
                program,
                reason: format!("failed to launch {}: {e}", self.config.compiler),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(HarnessError::BuildFailure {
                program,
                reason: format!(
                    "{} exited with {}: {}",
                    self.config.compiler,
                    output.status,
                    stderr.trim()
                ),
            })
        }
    }
}
