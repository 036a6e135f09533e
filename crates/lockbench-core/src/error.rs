//! Error types for lockbench
//!
//! Two tiers:
//! - [`HarnessError`] halts the whole run (bad parameters, failed builds,
//!   unwritable artifacts)
//! - [`TrialError`] is confined to a single trial; the sweep logs it and
//!   moves on

use crate::types::{Metric, Program};
use std::path::PathBuf;
use std::process::ExitStatus;

/// Fatal harness error
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// A run parameter is out of range (e.g. grid size not a perfect square)
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The toolchain failed to produce a program
    #[error("build failed for {program}: {reason}")]
    BuildFailure {
        /// Program being compiled
        program: Program,
        /// Compiler diagnostic
        reason: String,
    },

    /// Filesystem error on a harness-owned artifact
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        /// Artifact path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be loaded or is inconsistent
    #[error("configuration error: {0}")]
    Config(String),

    /// The plotting backend failed
    #[error("plot rendering failed: {0}")]
    Plot(String),

    /// Result export failed
    #[error("export failed: {0}")]
    Export(#[from] serde_json::Error),
}

impl HarnessError {
    /// Wrap an I/O error with the artifact path it occurred on
    #[inline]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if the error was raised before any artifact was touched
    #[inline]
    #[must_use]
    pub fn is_parameter_error(&self) -> bool {
        matches!(self, Self::InvalidParameter(_) | Self::Config(_))
    }
}

/// Failure of a single trial
///
/// Never escalated: the trial simply contributes no sample.
#[derive(Debug, thiserror::Error)]
pub enum TrialError {
    /// The executable could not be launched
    #[error("failed to launch {program}: {source}")]
    Spawn {
        /// Program under test
        program: Program,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The program exited unsuccessfully
    #[error("{program} exited with {status}")]
    NonZeroExit {
        /// Program under test
        program: Program,
        /// Exit status reported by the OS
        status: ExitStatus,
        /// Captured standard error
        stderr: String,
    },

    /// The output artifact could not be read
    #[error("failed to read output of {program}: {source}")]
    OutputRead {
        /// Program under test
        program: Program,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A marker line was present but its value is not a number
    #[error("{program} reported malformed {metric} value {raw:?}")]
    MalformedMetric {
        /// Program under test
        program: Program,
        /// Metric whose marker matched
        metric: Metric,
        /// Offending token
        raw: String,
    },
}

/// Result alias for fatal harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;
