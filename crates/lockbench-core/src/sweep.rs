//! Parameter sweeps
//!
//! A sweep varies one run parameter over an ordered list of values. For
//! each value the input artifact is regenerated, then every program runs a
//! fixed number of trials whose metrics are averaged into one point.
//!
//! Everything here is sequential: all trials share the same input and
//! output artifacts, so no two of them may overlap.

use crate::error::HarnessResult;
use crate::input::InputSynthesizer;
use crate::trial::TrialRunner;
use crate::types::{Metric, Program, RunConfig, SeriesPoint, SweepAxis, SweepResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One sweep: a fixed base configuration and the values of the varied axis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepDefinition {
    /// Identifier, used as the artifact file-name prefix
    pub id: String,
    /// Parameter being varied
    pub axis: SweepAxis,
    /// Values of the varied parameter, in run order
    pub values: Vec<u32>,
    /// Parameters held fixed (the `axis` field is overwritten per point)
    pub base: RunConfig,
}

impl SweepDefinition {
    /// Create a sweep definition
    #[must_use]
    pub fn new(id: impl Into<String>, axis: SweepAxis, values: Vec<u32>, base: RunConfig) -> Self {
        Self {
            id: id.into(),
            axis,
            values,
            base,
        }
    }

    /// Run parameters at sweep point `x`
    #[inline]
    #[must_use]
    pub fn run_config_at(&self, x: u32) -> RunConfig {
        self.base.with_axis(self.axis, x)
    }

    /// X-axis label
    #[inline]
    #[must_use]
    pub fn x_label(&self) -> &'static str {
        self.axis.label()
    }

    /// Y-axis label for `metric`
    #[must_use]
    pub fn y_label(metric: Metric) -> String {
        format!("{} (μs)", metric.label())
    }

    /// Chart title for `metric`
    #[must_use]
    pub fn title(&self, metric: Metric) -> String {
        format!("{} vs. {}", metric.label(), self.axis.label())
    }

    /// Plot file name for `metric`
    #[must_use]
    pub fn plot_file_name(&self, metric: Metric) -> String {
        format!("{}_{}.svg", self.id, metric.key())
    }

    /// Report file name
    #[must_use]
    pub fn report_file_name(&self) -> String {
        format!("{}_results.json", self.id)
    }
}

/// The three standard sweeps
///
/// - `exp1`: grid size over 10², 20², …, 100² with 8 threads, batch 20
/// - `exp2`: batch size over 10..=50 step 10 with 8 threads, grid 100
/// - `exp3`: thread count over powers of two up to 32 with grid 100, batch 20
#[must_use]
pub fn standard_sweeps() -> Vec<SweepDefinition> {
    vec![
        SweepDefinition::new(
            "exp1",
            SweepAxis::GridSize,
            (1..=10).map(|i| (i * 10) * (i * 10)).collect(),
            RunConfig::new(8, 100, 20),
        ),
        SweepDefinition::new(
            "exp2",
            SweepAxis::BatchSize,
            vec![10, 20, 30, 40, 50],
            RunConfig::new(8, 100, 20),
        ),
        SweepDefinition::new(
            "exp3",
            SweepAxis::ThreadCount,
            vec![1, 2, 4, 8, 16, 32],
            RunConfig::new(8, 100, 20),
        ),
    ]
}

/// Find a standard sweep by id
#[must_use]
pub fn standard_sweep(id: &str) -> Option<SweepDefinition> {
    standard_sweeps().into_iter().find(|d| d.id == id)
}

/// Arithmetic mean, `None` for no samples
#[must_use]
pub fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = samples.len() as f64;
    Some(samples.iter().sum::<f64>() / count)
}

/// Drives repeated trials across sweep points
pub struct SweepRunner<'a> {
    runner: &'a dyn TrialRunner,
    synthesizer: InputSynthesizer,
    repetitions: u32,
    metrics: Vec<Metric>,
}

impl<'a> SweepRunner<'a> {
    /// Create a sweep runner
    ///
    /// Defaults: 5 repetitions, `total` metric only.
    #[must_use]
    pub fn new(runner: &'a dyn TrialRunner, synthesizer: InputSynthesizer) -> Self {
        Self {
            runner,
            synthesizer,
            repetitions: crate::config::DEFAULT_REPETITIONS,
            metrics: vec![Metric::Total],
        }
    }

    /// With repetitions per (program, x) pair
    #[must_use]
    pub fn with_repetitions(mut self, repetitions: u32) -> Self {
        self.repetitions = repetitions;
        self
    }

    /// With collected metrics
    #[must_use]
    pub fn with_metrics(mut self, metrics: Vec<Metric>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Run a sweep definition, synthesizing input at every point
    ///
    /// # Errors
    /// Returns the first fatal error (invalid grid size, unwritable input)
    pub fn run_definition(
        &self,
        definition: &SweepDefinition,
        programs: &[Program],
    ) -> HarnessResult<SweepResult> {
        tracing::info!(
            sweep = %definition.id,
            "Varying {} over {:?}",
            definition.x_label(),
            definition.values
        );
        self.run_sweep(programs, &definition.values, |x| {
            self.synthesizer
                .synthesize(definition.run_config_at(x))
                .map(|_| ())
        })
    }

    /// Run `programs` at every value of `x_values`
    ///
    /// `regenerate` is called once per point, before any trial of that
    /// point. Points keep the order of `x_values`; a (program, x) pair with
    /// no successful sample is left out of that program's series.
    ///
    /// # Errors
    /// Propagates the first error returned by `regenerate`. Trial failures
    /// are logged and never returned.
    pub fn run_sweep<F>(
        &self,
        programs: &[Program],
        x_values: &[u32],
        mut regenerate: F,
    ) -> HarnessResult<SweepResult>
    where
        F: FnMut(u32) -> HarnessResult<()>,
    {
        let mut result = SweepResult::new(&self.metrics, programs);

        for &x in x_values {
            regenerate(x)?;
            tracing::info!("Running tests for x = {x} ...");

            for &program in programs {
                let samples = self.collect_samples(program, x);
                for &metric in &self.metrics {
                    let values = samples.get(&metric).map_or(&[][..], Vec::as_slice);
                    match mean(values) {
                        Some(avg) => {
                            tracing::info!(
                                "{program} {}: {avg:.2}μs over {} samples",
                                metric.label(),
                                values.len()
                            );
                            result.push(metric, program, SeriesPoint::new(x, avg));
                        }
                        None => tracing::warn!(
                            %program,
                            x,
                            %metric,
                            "no successful samples, point omitted"
                        ),
                    }
                }
            }
        }

        Ok(result)
    }

    fn collect_samples(&self, program: Program, x: u32) -> BTreeMap<Metric, Vec<f64>> {
        let mut samples: BTreeMap<Metric, Vec<f64>> = BTreeMap::new();

        for repetition in 1..=self.repetitions {
            match self.runner.run_once(program) {
                Ok(trial) if trial.is_empty() => tracing::warn!(
                    %program,
                    x,
                    repetition,
                    "output contained no metric marker"
                ),
                Ok(trial) => {
                    for (metric, value) in trial.iter() {
                        samples.entry(metric).or_default().push(value);
                    }
                }
                Err(e) => tracing::warn!(%program, x, repetition, "trial failed: {e}"),
            }
        }

        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrialError;
    use crate::types::TrialResult;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays a fixed sequence of outcomes regardless of program
    struct Replay(RefCell<VecDeque<Option<f64>>>);

    impl Replay {
        fn new(outcomes: &[Option<f64>]) -> Self {
            Self(RefCell::new(outcomes.iter().copied().collect()))
        }
    }

    impl TrialRunner for Replay {
        fn run_once(&self, program: Program) -> Result<TrialResult, TrialError> {
            match self.0.borrow_mut().pop_front().flatten() {
                Some(v) => Ok(TrialResult::new().with(Metric::Total, v)),
                None => Err(TrialError::OutputRead {
                    program,
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                }),
            }
        }
    }

    fn runner(replay: &Replay) -> SweepRunner<'_> {
        SweepRunner::new(replay, InputSynthesizer::new("unused-input.txt"))
    }

    #[test]
    fn mean_of_samples() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[10.0, 20.0, 30.0]), Some(20.0));
    }

    #[test]
    fn failures_excluded_from_average() {
        let replay = Replay::new(&[None, Some(10.0), None, Some(20.0), Some(30.0)]);
        let result = runner(&replay)
            .run_sweep(&[Program::Cas], &[1], |_| Ok(()))
            .unwrap();
        assert_eq!(
            result.points(Metric::Total, Program::Cas),
            &[SeriesPoint::new(1, 20.0)]
        );
    }

    #[test]
    fn regenerate_called_before_each_point_in_order() {
        let replay = Replay::new(&[Some(1.0); 3]);
        let mut seen = Vec::new();
        runner(&replay)
            .with_repetitions(1)
            .run_sweep(&[Program::Tas], &[30, 10, 20], |x| {
                seen.push(x);
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, vec![30, 10, 20]);
    }

    #[test]
    fn regenerate_error_is_fatal() {
        let replay = Replay::new(&[]);
        let err = runner(&replay)
            .run_sweep(&[Program::Tas], &[50], |x| {
                crate::input::Grid::cyclic(x).map(|_| ())
            })
            .unwrap_err();
        assert!(matches!(err, crate::error::HarnessError::InvalidParameter(_)));
    }

    #[test]
    fn standard_sweep_values() {
        let sweeps = standard_sweeps();
        assert_eq!(sweeps.len(), 3);
        assert_eq!(
            sweeps[0].values,
            vec![100, 400, 900, 1600, 2500, 3600, 4900, 6400, 8100, 10000]
        );
        assert_eq!(sweeps[0].run_config_at(400), RunConfig::new(8, 400, 20));
        assert_eq!(sweeps[1].run_config_at(40), RunConfig::new(8, 100, 40));
        assert_eq!(sweeps[2].run_config_at(16), RunConfig::new(16, 100, 20));
        assert_eq!(sweeps[2].plot_file_name(Metric::Total), "exp3_total.svg");
        assert_eq!(sweeps[1].title(Metric::Total), "Total Time vs. Batch Size");
        assert_eq!(SweepDefinition::y_label(Metric::AvgEntry), "Avg CS Entry (μs)");
        assert!(standard_sweep("exp2").is_some());
        assert!(standard_sweep("exp4").is_none());
    }
}
