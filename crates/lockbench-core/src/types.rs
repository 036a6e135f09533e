//! Core types for lockbench
//!
//! Defines the data flowing through the engine:
//! - Programs under test and their build flags
//! - Run parameters and the sweep axis that varies one of them
//! - Metrics, trial results and per-sweep series

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A benchmarked program variant
///
/// Closed set: each variant maps to one source file and one link-flag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Program {
    /// Compare-and-swap spin lock
    #[serde(rename = "CAS")]
    Cas,
    /// Test-and-set spin lock
    #[serde(rename = "TAS")]
    Tas,
    /// Bounded-waiting compare-and-swap lock
    #[serde(rename = "BoundedCAS")]
    BoundedCas,
    /// Single-threaded baseline
    #[serde(rename = "sequential")]
    Sequential,
}

impl Program {
    /// All programs, in reporting order
    pub const ALL: [Program; 4] = [
        Program::Cas,
        Program::Tas,
        Program::BoundedCas,
        Program::Sequential,
    ];

    /// Logical name, also used as the executable file name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Program::Cas => "CAS",
            Program::Tas => "TAS",
            Program::BoundedCas => "BoundedCAS",
            Program::Sequential => "sequential",
        }
    }

    /// Source file compiled into this program
    #[inline]
    #[must_use]
    pub fn source_file(&self) -> &'static str {
        match self {
            Program::Cas => "CAS.cpp",
            Program::Tas => "TAS.cpp",
            Program::BoundedCas => "BoundedCAS.cpp",
            Program::Sequential => "sequential.cpp",
        }
    }

    /// Link flags passed to the toolchain
    #[inline]
    #[must_use]
    pub fn link_flags(&self) -> &'static [&'static str] {
        if self.is_threaded() {
            &["-lpthread", "-lm"]
        } else {
            &["-lm"]
        }
    }

    /// Check if the variant spawns worker threads
    #[inline]
    #[must_use]
    pub fn is_threaded(&self) -> bool {
        !matches!(self, Program::Sequential)
    }

    /// Parse a program from its logical name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A timing reported by a program in its output artifact
///
/// Every metric is bound to an exact marker phrase. The value is the first
/// token after the phrase, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Wall time of the whole validation
    Total,
    /// Mean critical-section entry time
    AvgEntry,
    /// Mean critical-section exit time
    AvgExit,
    /// Worst critical-section entry time
    WorstEntry,
    /// Worst critical-section exit time
    WorstExit,
}

impl Metric {
    /// All metrics a program may report
    pub const ALL: [Metric; 5] = [
        Metric::Total,
        Metric::AvgEntry,
        Metric::AvgExit,
        Metric::WorstEntry,
        Metric::WorstExit,
    ];

    /// Key used in file names and reports
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Metric::Total => "total",
            Metric::AvgEntry => "avg_entry",
            Metric::AvgExit => "avg_exit",
            Metric::WorstEntry => "worst_entry",
            Metric::WorstExit => "worst_exit",
        }
    }

    /// Line prefix that announces this metric
    #[must_use]
    pub fn marker(&self) -> &'static str {
        match self {
            Metric::Total => "The total time taken is",
            Metric::AvgEntry => "Average time taken by a thread to enter the CS is",
            Metric::AvgExit => "Average time taken by a thread to exit the CS is",
            Metric::WorstEntry => "Worst-case time taken by a thread to enter the CS is",
            Metric::WorstExit => "Worst-case time taken by a thread to exit the CS is",
        }
    }

    /// Human-readable label for chart axes and titles
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Total => "Total Time",
            Metric::AvgEntry => "Avg CS Entry",
            Metric::AvgExit => "Avg CS Exit",
            Metric::WorstEntry => "Worst CS Entry",
            Metric::WorstExit => "Worst CS Exit",
        }
    }

    /// Parse a metric from its key
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.key() == key)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Which run parameter a sweep varies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepAxis {
    /// Side length of the grid
    GridSize,
    /// Cells grabbed per task
    BatchSize,
    /// Worker threads
    ThreadCount,
}

impl SweepAxis {
    /// Axis label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            SweepAxis::GridSize => "Grid Size",
            SweepAxis::BatchSize => "Batch Size",
            SweepAxis::ThreadCount => "Thread Count",
        }
    }
}

/// Run parameters written as the first line of the input artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunConfig {
    /// Worker threads used by the program
    pub thread_count: u32,
    /// Grid side length (must be a perfect square)
    pub grid_size: u32,
    /// Cells grabbed per task
    pub batch_size: u32,
}

impl RunConfig {
    /// Create run parameters
    #[inline]
    #[must_use]
    pub const fn new(thread_count: u32, grid_size: u32, batch_size: u32) -> Self {
        Self {
            thread_count,
            grid_size,
            batch_size,
        }
    }

    /// Copy with the field selected by `axis` replaced by `value`
    #[inline]
    #[must_use]
    pub fn with_axis(mut self, axis: SweepAxis, value: u32) -> Self {
        match axis {
            SweepAxis::GridSize => self.grid_size = value,
            SweepAxis::BatchSize => self.batch_size = value,
            SweepAxis::ThreadCount => self.thread_count = value,
        }
        self
    }

    /// Value of the field selected by `axis`
    #[inline]
    #[must_use]
    pub fn axis_value(&self, axis: SweepAxis) -> u32 {
        match axis {
            SweepAxis::GridSize => self.grid_size,
            SweepAxis::BatchSize => self.batch_size,
            SweepAxis::ThreadCount => self.thread_count,
        }
    }
}

impl fmt::Display for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.thread_count, self.grid_size, self.batch_size)
    }
}

/// Metrics parsed from one trial's output
///
/// Empty when the output carried no marker line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    metrics: BTreeMap<Metric, f64>,
}

impl TrialResult {
    /// Create an empty result
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a metric value, replacing any earlier one
    #[inline]
    pub fn insert(&mut self, metric: Metric, value: f64) {
        self.metrics.insert(metric, value);
    }

    /// With a metric value
    #[inline]
    #[must_use]
    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.insert(metric, value);
        self
    }

    /// Value for `metric`, if reported
    #[inline]
    #[must_use]
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(&metric).copied()
    }

    /// Check if no metric was reported
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Iterate over reported metrics
    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        self.metrics.iter().map(|(m, v)| (*m, *v))
    }
}

/// One averaged observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Value of the swept parameter
    pub x: u32,
    /// Mean metric value over successful trials
    pub y: f64,
}

impl SeriesPoint {
    /// Create a point
    #[inline]
    #[must_use]
    pub const fn new(x: u32, y: f64) -> Self {
        Self { x, y }
    }
}

/// Per-program series, in program insertion order
pub type ProgramSeries = IndexMap<Program, Vec<SeriesPoint>>;

/// Outcome of a sweep: metric → program → points in sweep order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepResult {
    series: BTreeMap<Metric, ProgramSeries>,
}

impl SweepResult {
    /// Create a result with an empty series for every metric/program pair
    #[must_use]
    pub fn new(metrics: &[Metric], programs: &[Program]) -> Self {
        let series = metrics
            .iter()
            .map(|&metric| {
                let per_program: ProgramSeries = programs.iter().map(|&p| (p, Vec::new())).collect();
                (metric, per_program)
            })
            .collect();
        Self { series }
    }

    /// Append a point to a program's series for `metric`
    pub fn push(&mut self, metric: Metric, program: Program, point: SeriesPoint) {
        self.series
            .entry(metric)
            .or_default()
            .entry(program)
            .or_default()
            .push(point);
    }

    /// All program series for `metric`
    #[inline]
    #[must_use]
    pub fn series(&self, metric: Metric) -> Option<&ProgramSeries> {
        self.series.get(&metric)
    }

    /// Points of one program for `metric` (empty if none)
    #[must_use]
    pub fn points(&self, metric: Metric, program: Program) -> &[SeriesPoint] {
        self.series
            .get(&metric)
            .and_then(|s| s.get(&program))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_flags() {
        assert_eq!(Program::Cas.link_flags(), &["-lpthread", "-lm"]);
        assert_eq!(Program::BoundedCas.link_flags(), &["-lpthread", "-lm"]);
        assert_eq!(Program::Sequential.link_flags(), &["-lm"]);
        assert!(!Program::Sequential.is_threaded());
    }

    #[test]
    fn program_names_round_trip() {
        for p in Program::ALL {
            assert_eq!(Program::from_name(p.name()), Some(p));
            assert_eq!(p.source_file(), format!("{}.cpp", p.name()));
        }
        assert_eq!(Program::from_name("cas"), None);
    }

    #[test]
    fn program_serializes_by_name() {
        let json = serde_json::to_string(&Program::BoundedCas).unwrap();
        assert_eq!(json, "\"BoundedCAS\"");
    }

    #[test]
    fn with_axis_replaces_only_selected_field() {
        let base = RunConfig::new(8, 100, 20);
        assert_eq!(base.with_axis(SweepAxis::GridSize, 400), RunConfig::new(8, 400, 20));
        assert_eq!(base.with_axis(SweepAxis::BatchSize, 50), RunConfig::new(8, 100, 50));
        assert_eq!(base.with_axis(SweepAxis::ThreadCount, 1), RunConfig::new(1, 100, 20));
        assert_eq!(base.axis_value(SweepAxis::BatchSize), 20);
    }

    #[test]
    fn run_config_header_line() {
        assert_eq!(RunConfig::new(8, 100, 20).to_string(), "8 100 20");
    }

    #[test]
    fn sweep_result_starts_with_empty_series() {
        let result = SweepResult::new(&[Metric::Total], &Program::ALL);
        let series = result.series(Metric::Total).unwrap();
        assert_eq!(series.len(), 4);
        assert!(series.values().all(Vec::is_empty));
        assert!(result.points(Metric::AvgEntry, Program::Cas).is_empty());
    }

    #[test]
    fn metric_keys() {
        for m in Metric::ALL {
            assert_eq!(Metric::from_key(m.key()), Some(m));
        }
    }
}
