//! Trial execution
//!
//! Runs one compiled program against the current input artifact and reads
//! its metrics back from the output artifact. The [`TrialRunner`] trait is
//! the seam the sweep runner depends on; [`TrialExecutor`] is the
//! process-backed implementation.

use crate::config::HarnessConfig;
use crate::error::{HarnessResult, TrialError};
use crate::types::{Metric, Program, TrialResult};
use std::path::Path;
use std::process::{Command, Stdio};

/// Runs a single trial of a program
///
/// Implement this trait to substitute how programs are executed.
pub trait TrialRunner {
    /// Execute `program` once and return the metrics it reported
    ///
    /// An empty result means the program ran but printed no marker line.
    ///
    /// # Errors
    /// Returns `TrialError` if the program could not be run or its output
    /// could not be read or parsed.
    fn run_once(&self, program: Program) -> Result<TrialResult, TrialError>;
}

/// Process-backed trial runner
///
/// Blocks until the program exits; there is no timeout.
#[derive(Debug, Clone)]
pub struct TrialExecutor {
    config: HarnessConfig,
}

impl TrialExecutor {
    /// Create an executor from the harness configuration
    ///
    /// Relative directories are resolved against the current directory.
    ///
    /// # Errors
    /// Returns `Io` if the current directory cannot be determined
    pub fn new(config: &HarnessConfig) -> HarnessResult<Self> {
        Ok(Self {
            config: config.to_absolute()?,
        })
    }
}

fn clear_stale_output(output_path: &Path) {
    match std::fs::remove_file(output_path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(
            path = %output_path.display(),
            "could not remove stale output: {e}"
        ),
    }
}

impl TrialRunner for TrialExecutor {
    fn run_once(&self, program: Program) -> Result<TrialResult, TrialError> {
        let output_path = self.config.output_path();
        clear_stale_output(&output_path);

        let executable = self.config.executable_path(program);
        tracing::debug!(%program, path = %executable.display(), "spawning trial");

        let output = Command::new(&executable)
            .current_dir(&self.config.work_dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| TrialError::Spawn { program, source })?;

        if !output.status.success() {
            return Err(TrialError::NonZeroExit {
                program,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = std::fs::read_to_string(&output_path)
            .map_err(|source| TrialError::OutputRead { program, source })?;
        parse_output(program, &text, &self.config.metrics)
    }
}

/// Extract the requested metrics from output text
///
/// A line (after trimming) that starts with the marker phrase of a metric in
/// `metrics` contributes the first whitespace-delimited token following the
/// phrase. Later occurrences replace earlier ones; all other lines,
/// including markers of metrics not requested, are ignored.
///
/// # Errors
/// Returns `MalformedMetric` if a requested marker is followed by something
/// that is not a finite number.
pub fn parse_output(
    program: Program,
    text: &str,
    metrics: &[Metric],
) -> Result<TrialResult, TrialError> {
    let mut result = TrialResult::new();
    for line in text.lines().map(str::trim) {
        for &metric in metrics {
            let Some(rest) = line.strip_prefix(metric.marker()) else {
                continue;
            };
            let raw = rest.split_whitespace().next().unwrap_or_default();
            let value = raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| TrialError::MalformedMetric {
                    program,
                    metric,
                    raw: raw.to_string(),
                })?;
            result.insert(metric, value);
        }
    }
    Ok(result)
}
