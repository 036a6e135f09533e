//! Testing utilities for the lockbench workspace
//!
//! Shared fixtures: a scripted trial runner, fake program executables and a
//! temporary work directory wired into a `HarnessConfig`.

#![allow(missing_docs)]

use lockbench_core::{HarnessConfig, Metric, Program, TrialError, TrialResult, TrialRunner};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tempfile::TempDir;

/// Outcome of one scripted trial
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// Reports `total` with the given value
    Total(f64),
    /// Runs but prints no marker line
    Miss,
    /// Exits unsuccessfully
    Fail,
}

/// Trial runner replaying per-program outcome queues
///
/// Once a program's queue is exhausted its fallback outcome is used
/// (`Fail` unless set).
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    queues: RefCell<HashMap<Program, VecDeque<Outcome>>>,
    fallback: HashMap<Program, Outcome>,
    calls: RefCell<Vec<Program>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue outcomes for `program`
    pub fn script(self, program: Program, outcomes: &[Outcome]) -> Self {
        self.queues
            .borrow_mut()
            .entry(program)
            .or_default()
            .extend(outcomes.iter().copied());
        self
    }

    /// Outcome used after the queue for `program` runs dry
    pub fn always(mut self, program: Program, outcome: Outcome) -> Self {
        self.fallback.insert(program, outcome);
        self
    }

    /// Programs run so far, in call order
    pub fn calls(&self) -> Vec<Program> {
        self.calls.borrow().clone()
    }
}

impl TrialRunner for ScriptedRunner {
    fn run_once(&self, program: Program) -> Result<TrialResult, TrialError> {
        self.calls.borrow_mut().push(program);
        let next = self
            .queues
            .borrow_mut()
            .get_mut(&program)
            .and_then(VecDeque::pop_front)
            .or_else(|| self.fallback.get(&program).copied())
            .unwrap_or(Outcome::Fail);

        match next {
            Outcome::Total(v) => Ok(TrialResult::new().with(Metric::Total, v)),
            Outcome::Miss => Ok(TrialResult::new()),
            Outcome::Fail => Err(TrialError::OutputRead {
                program,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "scripted failure"),
            }),
        }
    }
}

static PROCESS_LOCK: Mutex<()> = Mutex::new(());

/// Serialises writing fake executables with spawning processes
///
/// Executing a script while another thread still holds it open for writing
/// fails with "text file busy"; hold this guard around both.
pub fn process_lock() -> MutexGuard<'static, ()> {
    PROCESS_LOCK
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Temporary work directory plus a config pointing at it
pub struct TestBench {
    pub dir: TempDir,
    pub config: HarnessConfig,
}

impl TestBench {
    /// Fresh bench; the build step is skipped
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = HarnessConfig::new()
            .with_work_dir(dir.path())
            .with_source_dir(dir.path())
            .with_plot_dir(dir.path().join("plots"))
            .with_skip_build(true);
        Self { dir, config }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Install a shell script as the executable for `program`
    #[cfg(unix)]
    pub fn install_program(&self, program: Program, body: &str) {
        write_script(&self.config.executable_path(program), body);
    }

    /// Install a program that writes `output` to the output artifact
    #[cfg(unix)]
    pub fn install_reporting_program(&self, program: Program, output: &str) {
        let file = self.config.output_file.display().to_string();
        self.install_program(
            program,
            &format!("cat > {file} <<'LOCKBENCH_EOF'\n{output}\nLOCKBENCH_EOF\n"),
        );
    }
}

impl Default for TestBench {
    fn default() -> Self {
        Self::new()
    }
}

/// Write an executable `/bin/sh` script to `path`
#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    std::fs::write(path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .expect("make script executable");
}
