//! lockbench core - experiment orchestration engine
//!
//! Drives four lock-variant Sudoku validators through repeated timed trials
//! while varying one run parameter at a time:
//! - Synthesizes the cyclic grid input artifact
//! - Builds each program once
//! - Runs trials, parses reported timings and averages them
//! - Plots one line per program for every sweep
//!
//! # Example
//!
//! ```rust,ignore
//! use lockbench_core::{Harness, HarnessConfig, standard_sweeps};
//!
//! let config = HarnessConfig::new().with_work_dir("bench");
//! let mut harness = Harness::new(config)?;
//! let reports = harness.run(&standard_sweeps())?;
//! println!("{} sweeps completed", reports.len());
//! ```

pub mod config;
pub mod error;
pub mod harness;
pub mod input;
pub mod plot;
pub mod report;
pub mod sweep;
pub mod toolchain;
pub mod trial;
pub mod types;

// Re-exports for convenience
pub use config::{HarnessConfig, DEFAULT_PLOT_SIZE, DEFAULT_REPETITIONS};
pub use error::{HarnessError, HarnessResult, TrialError};
pub use harness::Harness;
pub use input::{Grid, InputArtifact, InputSynthesizer};
pub use plot::ResultPlotter;
pub use report::SweepReport;
pub use sweep::{mean, standard_sweep, standard_sweeps, SweepDefinition, SweepRunner};
pub use toolchain::BuildCoordinator;
pub use trial::{parse_output, TrialExecutor, TrialRunner};
pub use types::{
    Metric, Program, ProgramSeries, RunConfig, SeriesPoint, SweepAxis, SweepResult, TrialResult,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
