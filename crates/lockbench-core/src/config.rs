//! Harness configuration
//!
//! All artifact locations are explicit values here rather than ambient
//! process state, so tests can point the engine at a temporary directory.

use crate::error::{HarnessError, HarnessResult};
use crate::types::{Metric, Program};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default repetitions per (program, x) pair
pub const DEFAULT_REPETITIONS: u32 = 5;

/// Default chart size in pixels (width, height)
pub const DEFAULT_PLOT_SIZE: (u32, u32) = (1000, 600);

/// Harness configuration
///
/// Loaded from TOML; every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Directory holding the executables and the input/output artifacts;
    /// programs run with this as their working directory
    pub work_dir: PathBuf,
    /// Directory holding the program sources
    pub source_dir: PathBuf,
    /// Directory receiving plots and reports
    pub plot_dir: PathBuf,
    /// Input artifact, relative to `work_dir`
    pub input_file: PathBuf,
    /// Output artifact, relative to `work_dir`
    pub output_file: PathBuf,
    /// Toolchain executable
    pub compiler: String,
    /// Flags appended after each program's link flags
    pub extra_compile_flags: Vec<String>,
    /// Trials per (program, x) pair
    pub repetitions: u32,
    /// Programs to build and benchmark
    pub programs: Vec<Program>,
    /// Metrics to collect and plot
    pub metrics: Vec<Metric>,
    /// Skip the build step (executables already present)
    pub skip_build: bool,
    /// Write `<sweep>_results.json` next to the plots
    pub export_json: bool,
    /// Chart width in pixels
    pub plot_width: u32,
    /// Chart height in pixels
    pub plot_height: u32,
}

impl HarnessConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns `Io` if the file cannot be read, `Config` if it does not parse
    /// or fails validation
    pub fn from_toml_file(path: impl AsRef<Path>) -> HarnessResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// Returns `Config` if the text does not parse or fails validation
    pub fn from_toml_str(text: &str) -> HarnessResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| HarnessError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML text
    ///
    /// # Errors
    /// Returns `Config` if serialization fails
    pub fn to_toml_string(&self) -> HarnessResult<String> {
        toml::to_string_pretty(self).map_err(|e| HarnessError::Config(e.to_string()))
    }

    /// Reject configurations that cannot produce any sample
    ///
    /// # Errors
    /// Returns `Config` describing the first problem found
    pub fn validate(&self) -> HarnessResult<()> {
        if self.repetitions == 0 {
            return Err(HarnessError::Config("repetitions must be at least 1".into()));
        }
        if self.programs.is_empty() {
            return Err(HarnessError::Config("no programs selected".into()));
        }
        if self.metrics.is_empty() {
            return Err(HarnessError::Config("no metrics selected".into()));
        }
        if self.compiler.trim().is_empty() && !self.skip_build {
            return Err(HarnessError::Config("compiler must not be empty".into()));
        }
        if self.plot_width == 0 || self.plot_height == 0 {
            return Err(HarnessError::Config("plot size must be non-zero".into()));
        }
        Ok(())
    }

    /// Same configuration with relative directories resolved against the
    /// current directory
    ///
    /// Programs run with `work_dir` as their current directory; paths handed
    /// to them and to the toolchain must be absolute.
    ///
    /// # Errors
    /// Returns `Io` if the current directory cannot be determined
    pub fn to_absolute(&self) -> HarnessResult<Self> {
        let cwd = std::env::current_dir().map_err(|e| HarnessError::io(".", e))?;
        let mut config = self.clone();
        for dir in [
            &mut config.work_dir,
            &mut config.source_dir,
            &mut config.plot_dir,
        ] {
            if dir.is_relative() {
                *dir = cwd.join(&*dir);
            }
        }
        Ok(config)
    }

    /// Absolute-or-relative path of the input artifact
    #[inline]
    #[must_use]
    pub fn input_path(&self) -> PathBuf {
        self.work_dir.join(&self.input_file)
    }

    /// Absolute-or-relative path of the output artifact
    #[inline]
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.work_dir.join(&self.output_file)
    }

    /// Path of a compiled program
    #[inline]
    #[must_use]
    pub fn executable_path(&self, program: Program) -> PathBuf {
        self.work_dir.join(program.name())
    }

    /// With working directory
    #[inline]
    #[must_use]
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    /// With source directory
    #[inline]
    #[must_use]
    pub fn with_source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = dir.into();
        self
    }

    /// With plot directory
    #[inline]
    #[must_use]
    pub fn with_plot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.plot_dir = dir.into();
        self
    }

    /// With toolchain executable
    #[inline]
    #[must_use]
    pub fn with_compiler(mut self, compiler: impl Into<String>) -> Self {
        self.compiler = compiler.into();
        self
    }

    /// With repetitions per point
    #[inline]
    #[must_use]
    pub fn with_repetitions(mut self, repetitions: u32) -> Self {
        self.repetitions = repetitions;
        self
    }

    /// With program set
    #[inline]
    #[must_use]
    pub fn with_programs(mut self, programs: Vec<Program>) -> Self {
        self.programs = programs;
        self
    }

    /// With metric set
    #[inline]
    #[must_use]
    pub fn with_metrics(mut self, metrics: Vec<Metric>) -> Self {
        self.metrics = metrics;
        self
    }

    /// With build step skipped
    #[inline]
    #[must_use]
    pub fn with_skip_build(mut self, skip: bool) -> Self {
        self.skip_build = skip;
        self
    }

    /// With JSON export
    #[inline]
    #[must_use]
    pub fn with_export_json(mut self, export: bool) -> Self {
        self.export_json = export;
        self
    }

    /// With chart size in pixels
    #[inline]
    #[must_use]
    pub fn with_plot_size(mut self, width: u32, height: u32) -> Self {
        self.plot_width = width;
        self.plot_height = height;
        self
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            source_dir: PathBuf::from("."),
            plot_dir: PathBuf::from("."),
            input_file: PathBuf::from("input.txt"),
            output_file: PathBuf::from("output.txt"),
            compiler: "g++".to_string(),
            extra_compile_flags: Vec::new(),
            repetitions: DEFAULT_REPETITIONS,
            programs: Program::ALL.to_vec(),
            metrics: vec![Metric::Total],
            skip_build: false,
            export_json: false,
            plot_width: DEFAULT_PLOT_SIZE.0,
            plot_height: DEFAULT_PLOT_SIZE.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_the_classic_layout() {
        let config = HarnessConfig::default();
        assert_eq!(config.input_path(), PathBuf::from("./input.txt"));
        assert_eq!(config.output_path(), PathBuf::from("./output.txt"));
        assert_eq!(config.executable_path(Program::Tas), PathBuf::from("./TAS"));
        assert_eq!(config.repetitions, 5);
        assert_eq!(config.metrics, vec![Metric::Total]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = HarnessConfig::from_toml_str(
            r#"
            work_dir = "/tmp/run"
            repetitions = 3
            programs = ["CAS", "sequential"]
            metrics = ["total", "worst_entry"]
            "#,
        )
        .unwrap();
        assert_eq!(config.work_dir, PathBuf::from("/tmp/run"));
        assert_eq!(config.repetitions, 3);
        assert_eq!(config.programs, vec![Program::Cas, Program::Sequential]);
        assert_eq!(config.metrics, vec![Metric::Total, Metric::WorstEntry]);
        assert_eq!(config.compiler, "g++");
    }

    #[test]
    fn relative_directories_become_absolute() {
        let cwd = std::env::current_dir().unwrap();
        let config = HarnessConfig::new()
            .with_work_dir("bench")
            .with_plot_dir("/abs/plots")
            .to_absolute()
            .unwrap();
        assert_eq!(config.work_dir, cwd.join("bench"));
        assert_eq!(config.source_dir, cwd.join("."));
        assert_eq!(config.plot_dir, PathBuf::from("/abs/plots"));
        assert_eq!(config.executable_path(Program::Cas), cwd.join("bench").join("CAS"));
        assert_eq!(config.input_path(), cwd.join("bench").join("input.txt"));
    }

    #[test]
    fn sample_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../lockbench.toml");
        let config = HarnessConfig::from_toml_file(path).unwrap();
        assert_eq!(config.programs, Program::ALL.to_vec());
        assert_eq!(config.extra_compile_flags, vec!["-O2".to_string()]);
        assert_eq!(config.plot_dir, PathBuf::from("plots"));
    }

    #[test]
    fn toml_round_trip() {
        let config = HarnessConfig::new()
            .with_work_dir("/w")
            .with_repetitions(7)
            .with_export_json(true);
        let text = config.to_toml_string().unwrap();
        assert_eq!(HarnessConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn rejects_unusable_configs() {
        assert!(HarnessConfig::new().with_repetitions(0).validate().is_err());
        assert!(HarnessConfig::new().with_programs(vec![]).validate().is_err());
        assert!(HarnessConfig::new().with_metrics(vec![]).validate().is_err());
        assert!(HarnessConfig::new().with_plot_size(0, 600).validate().is_err());
        assert!(HarnessConfig::from_toml_str("repetitions = \"many\"").is_err());
        assert!(HarnessConfig::from_toml_str("programs = [\"XYZ\"]").is_err());
    }
}
