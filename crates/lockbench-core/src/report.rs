//! Sweep reports
//!
//! JSON snapshot of one sweep's averaged series. Each run overwrites the
//! previous file; nothing accumulates across runs.

use crate::error::{HarnessError, HarnessResult};
use crate::sweep::SweepDefinition;
use crate::types::{SweepAxis, SweepResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Outcome of one sweep, ready for export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Sweep identifier
    pub id: String,
    /// Varied parameter
    pub axis: SweepAxis,
    /// X-axis label
    pub x_label: String,
    /// Trials per (program, x) pair
    pub repetitions: u32,
    /// Averaged series
    pub results: SweepResult,
    /// Plot files written for this sweep
    #[serde(default)]
    pub plots: Vec<PathBuf>,
}

impl SweepReport {
    /// Build a report for `definition`
    #[must_use]
    pub fn new(definition: &SweepDefinition, repetitions: u32, results: SweepResult) -> Self {
        Self {
            id: definition.id.clone(),
            axis: definition.axis,
            x_label: definition.x_label().to_string(),
            repetitions,
            results,
            plots: Vec::new(),
        }
    }

    /// Pretty-printed JSON
    ///
    /// # Errors
    /// Returns `Export` if serialization fails
    pub fn to_json(&self) -> HarnessResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write pretty-printed JSON to `path`
    ///
    /// # Errors
    /// Returns `Io` if the file cannot be created, `Export` if serialization
    /// fails
    pub fn write_json(&self, path: &Path) -> HarnessResult<()> {
        let file = File::create(path).map_err(|e| HarnessError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush().map_err(|e| HarnessError::io(path, e))?;
        tracing::info!(path = %path.display(), "wrote report");
        Ok(())
    }

    /// Read a report written by [`SweepReport::write_json`]
    ///
    /// # Errors
    /// Returns `Io` if the file cannot be opened, `Export` if it does not
    /// parse
    pub fn read_json(path: &Path) -> HarnessResult<Self> {
        let file = File::open(path).map_err(|e| HarnessError::io(path, e))?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}
