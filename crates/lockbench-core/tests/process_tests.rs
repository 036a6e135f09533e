//! Process-level tests: real executables (shell scripts) driven through the
//! trial executor, the build coordinator and the full harness.

#![cfg(unix)]

use lockbench_core::{
    BuildCoordinator, Harness, HarnessConfig, HarnessError, Metric, Program, RunConfig,
    SeriesPoint, SweepAxis, SweepDefinition, TrialError, TrialExecutor, TrialRunner,
};
use lockbench_test_utils::{process_lock, write_script, TestBench};

#[test]
fn reads_total_from_output_artifact() {
    let _guard = process_lock();
    let bench = TestBench::new();
    bench.install_reporting_program(
        Program::Cas,
        "Sudoku is Valid\nThe total time taken is 1234 microseconds",
    );

    let result = TrialExecutor::new(&bench.config)
        .unwrap()
        .run_once(Program::Cas)
        .unwrap();
    assert_eq!(result.get(Metric::Total), Some(1234.0));
}

#[test]
fn non_zero_exit_is_a_trial_error() {
    let _guard = process_lock();
    let bench = TestBench::new();
    bench.install_program(
        Program::Tas,
        "echo 'The total time taken is 5 microseconds' > output.txt\necho broken >&2\nexit 3",
    );

    let err = TrialExecutor::new(&bench.config)
        .unwrap()
        .run_once(Program::Tas)
        .unwrap_err();
    match err {
        TrialError::NonZeroExit { program, status, stderr } => {
            assert_eq!(program, Program::Tas);
            assert_eq!(status.code(), Some(3));
            assert_eq!(stderr, "broken");
        }
        other => panic!("expected NonZeroExit, got {other:?}"),
    }
}

#[test]
fn missing_executable_is_a_spawn_error() {
    let _guard = process_lock();
    let bench = TestBench::new();
    let err = TrialExecutor::new(&bench.config)
        .unwrap()
        .run_once(Program::BoundedCas)
        .unwrap_err();
    assert!(matches!(err, TrialError::Spawn { program: Program::BoundedCas, .. }));
}

#[test]
fn stale_output_is_not_reread() {
    let _guard = process_lock();
    let bench = TestBench::new();
    std::fs::write(
        bench.config.output_path(),
        "The total time taken is 999 microseconds\n",
    )
    .unwrap();
    bench.install_program(Program::Sequential, "exit 0");

    let err = TrialExecutor::new(&bench.config)
        .unwrap()
        .run_once(Program::Sequential)
        .unwrap_err();
    assert!(matches!(err, TrialError::OutputRead { .. }));
}

#[test]
fn unmarked_output_is_an_empty_result() {
    let _guard = process_lock();
    let bench = TestBench::new();
    bench.install_reporting_program(
        Program::Sequential,
        "Sudoku is valid.\nTime taken is 87 microseconds.",
    );

    let result = TrialExecutor::new(&bench.config)
        .unwrap()
        .run_once(Program::Sequential)
        .unwrap();
    assert!(result.is_empty());
}

#[test]
fn failing_compiler_aborts_the_build() {
    let _guard = process_lock();
    let bench = TestBench::new();
    let compiler = bench.path().join("fake-cc");
    write_script(&compiler, "echo 'CAS.cpp:1: error' >&2\nexit 1");

    let config = bench.config.clone().with_compiler(compiler.display().to_string());
    let mut builder = BuildCoordinator::new(&config).unwrap();
    let err = builder.build_all().unwrap_err();

    match err {
        HarnessError::BuildFailure { program, reason } => {
            assert_eq!(program, Program::Cas);
            assert!(reason.contains("CAS.cpp:1: error"), "{reason}");
        }
        other => panic!("expected BuildFailure, got {other:?}"),
    }
}

#[test]
fn build_runs_once_per_coordinator() {
    let _guard = process_lock();
    let bench = TestBench::new();
    let log = bench.path().join("compiles.log");
    let compiler = bench.path().join("fake-cc");
    write_script(&compiler, &format!("echo \"$1 $2 $3\" >> {}", log.display()));

    let config = bench
        .config
        .clone()
        .with_compiler(compiler.display().to_string());
    let mut builder = BuildCoordinator::new(&config).unwrap();
    builder.build_all().unwrap();
    builder.build_all().unwrap();
    assert!(builder.is_built());

    let lines: Vec<String> = std::fs::read_to_string(&log)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    assert_eq!(lines.len(), 4);
    let src = bench.path().join("sequential.cpp");
    let out = bench.path().join("sequential");
    assert_eq!(lines[3], format!("{} -o {}", src.display(), out.display()));
}

#[test]
fn harness_feeds_each_point_its_own_input() {
    let _guard = process_lock();
    let bench = TestBench::new();
    // Reports the thread count from the input header as its total time
    let echo_threads = "read threads grid batch < input.txt\n\
         echo \"The total time taken is $threads microseconds\" > output.txt";
    bench.install_program(Program::Cas, echo_threads);
    bench.install_program(Program::Sequential, "exit 1");

    let config = bench
        .config
        .clone()
        .with_programs(vec![Program::Cas, Program::Sequential])
        .with_repetitions(2);
    let definition = SweepDefinition::new(
        "threads",
        SweepAxis::ThreadCount,
        vec![4, 1, 2],
        RunConfig::new(8, 9, 20),
    );

    let mut harness = Harness::new(config).unwrap();
    let reports = harness.run(&[definition]).unwrap();

    let results = &reports[0].results;
    assert_eq!(
        results.points(Metric::Total, Program::Cas),
        &[
            SeriesPoint::new(4, 4.0),
            SeriesPoint::new(1, 1.0),
            SeriesPoint::new(2, 2.0),
        ]
    );
    assert!(results.points(Metric::Total, Program::Sequential).is_empty());
    assert!(bench.path().join("plots").join("threads_total.svg").exists());
}

#[test]
fn relative_work_dir_resolves_against_current_dir() {
    let _guard = process_lock();
    let bench = TestBench::new();
    let work_dir = bench.path().join("bench");
    std::fs::create_dir(&work_dir).unwrap();
    write_script(
        &work_dir.join("CAS"),
        "echo 'The total time taken is 7 microseconds' > output.txt",
    );

    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(bench.path()).unwrap();
    let config = HarnessConfig::new()
        .with_work_dir("bench")
        .with_skip_build(true);
    let result = TrialExecutor::new(&config).map(|executor| executor.run_once(Program::Cas));
    std::env::set_current_dir(previous).unwrap();

    let trial = result.unwrap().unwrap();
    assert_eq!(trial.get(Metric::Total), Some(7.0));
    assert!(work_dir.join("output.txt").exists());
}
