//! Experiment harness
//!
//! Ties the pieces together for a full run:
//! 1. Build every program once
//! 2. Run each requested sweep
//! 3. Plot every collected metric and optionally export the series

use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::input::InputSynthesizer;
use crate::plot::ResultPlotter;
use crate::report::SweepReport;
use crate::sweep::{SweepDefinition, SweepRunner};
use crate::toolchain::BuildCoordinator;
use crate::trial::{TrialExecutor, TrialRunner};
use crate::types::ProgramSeries;

/// Runs sweeps end to end
pub struct Harness {
    config: HarnessConfig,
    builder: BuildCoordinator,
    runner: Box<dyn TrialRunner>,
    plotter: ResultPlotter,
}

impl std::fmt::Debug for Harness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harness")
            .field("config", &self.config)
            .field("builder", &self.builder)
            .finish_non_exhaustive()
    }
}

impl Harness {
    /// Create a harness that runs the compiled programs as processes
    ///
    /// # Errors
    /// Returns `Config` if the configuration fails validation, `Io` if
    /// relative directories cannot be resolved
    pub fn new(config: HarnessConfig) -> HarnessResult<Self> {
        let runner = Box::new(TrialExecutor::new(&config)?);
        Self::with_runner(config, runner)
    }

    /// Create with a custom trial runner
    ///
    /// Relative directories in `config` are resolved against the current
    /// directory.
    ///
    /// # Errors
    /// Returns `Config` if the configuration fails validation, `Io` if
    /// relative directories cannot be resolved
    pub fn with_runner(config: HarnessConfig, runner: Box<dyn TrialRunner>) -> HarnessResult<Self> {
        config.validate()?;
        let config = config.to_absolute()?;
        Ok(Self {
            builder: BuildCoordinator::new(&config)?,
            plotter: ResultPlotter::new(config.plot_width, config.plot_height),
            config,
            runner,
        })
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Compile all programs unless the build is skipped or already done
    ///
    /// # Errors
    /// Returns `BuildFailure` for the first program that fails to compile
    pub fn build(&mut self) -> HarnessResult<()> {
        if self.config.skip_build {
            tracing::info!("build step skipped");
            return Ok(());
        }
        self.builder.build_all()
    }

    /// Build, then run every definition in order
    ///
    /// # Errors
    /// Stops at the first fatal error; trial failures never surface here
    pub fn run(&mut self, definitions: &[SweepDefinition]) -> HarnessResult<Vec<SweepReport>> {
        self.build()?;

        let plot_dir = &self.config.plot_dir;
        std::fs::create_dir_all(plot_dir).map_err(|e| HarnessError::io(plot_dir, e))?;

        definitions
            .iter()
            .map(|definition| self.run_one(definition))
            .collect()
    }

    fn run_one(&self, definition: &SweepDefinition) -> HarnessResult<SweepReport> {
        tracing::info!("Sweep {}: varying {}", definition.id, definition.x_label());

        let synthesizer = InputSynthesizer::new(self.config.input_path());
        let results = SweepRunner::new(self.runner.as_ref(), synthesizer)
            .with_repetitions(self.config.repetitions)
            .with_metrics(self.config.metrics.clone())
            .run_definition(definition, &self.config.programs)?;

        let mut report = SweepReport::new(definition, self.config.repetitions, results);
        let empty = ProgramSeries::new();

        for &metric in &self.config.metrics {
            let path = self.config.plot_dir.join(definition.plot_file_name(metric));
            let series = report.results.series(metric).unwrap_or(&empty);
            self.plotter.plot(
                series,
                definition.x_label(),
                &SweepDefinition::y_label(metric),
                &definition.title(metric),
                &path,
            )?;
            report.plots.push(path);
        }

        if self.config.export_json {
            report.write_json(&self.config.plot_dir.join(definition.report_file_name()))?;
        }

        Ok(report)
    }
}
