use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use lockbench_core::{
    standard_sweep, standard_sweeps, Harness, HarnessConfig, InputArtifact, InputSynthesizer,
    Metric, Program, RunConfig,
};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn parse_program(name: &str) -> Result<Program, String> {
    Program::from_name(name).ok_or_else(|| {
        let names: Vec<&str> = Program::ALL.iter().map(Program::name).collect();
        format!("expected one of {}", names.join(", "))
    })
}

fn parse_metric(key: &str) -> Result<Metric, String> {
    Metric::from_key(key).ok_or_else(|| {
        let keys: Vec<&str> = Metric::ALL.iter().map(Metric::key).collect();
        format!("expected one of {}", keys.join(", "))
    })
}

fn config_args() -> [Arg; 3] {
    [
        Arg::new("config")
            .long("config")
            .short('c')
            .value_parser(value_parser!(PathBuf))
            .help("TOML configuration file"),
        Arg::new("work-dir")
            .long("work-dir")
            .value_parser(value_parser!(PathBuf))
            .help("Directory holding executables and input/output artifacts"),
        Arg::new("program")
            .long("program")
            .short('p')
            .action(ArgAction::Append)
            .value_parser(parse_program)
            .help("Program variant to include (CAS, TAS, BoundedCAS, sequential); repeatable"),
    ]
}

fn cli() -> Command {
    Command::new("lockbench")
        .version(lockbench_core::VERSION)
        .about("Benchmark sweeps for lock-based Sudoku validators")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("run")
                .about("Build the programs, run sweeps and plot the results")
                .args(config_args())
                .arg(
                    Arg::new("sweep")
                        .long("sweep")
                        .short('s')
                        .action(ArgAction::Append)
                        .help("Sweep to run (exp1, exp2, exp3); repeatable, default all"),
                )
                .arg(
                    Arg::new("repetitions")
                        .long("repetitions")
                        .short('r')
                        .value_parser(value_parser!(u32).range(1..))
                        .help("Trials per program and sweep point"),
                )
                .arg(
                    Arg::new("plot-dir")
                        .long("plot-dir")
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory receiving plots and reports"),
                )
                .arg(
                    Arg::new("skip-build")
                        .long("skip-build")
                        .action(ArgAction::SetTrue)
                        .help("Use executables already present in the work directory"),
                )
                .arg(
                    Arg::new("metric")
                        .long("metric")
                        .short('m')
                        .action(ArgAction::Append)
                        .value_parser(parse_metric)
                        .help("Metric to collect and plot (total, avg_entry, ...); repeatable"),
                )
                .arg(
                    Arg::new("all-metrics")
                        .long("all-metrics")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("metric")
                        .help("Also collect and plot critical-section entry/exit times"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Export each sweep's averaged series as JSON"),
                ),
        )
        .subcommand(
            Command::new("build")
                .about("Compile every program variant")
                .args(config_args()),
        )
        .subcommand(
            Command::new("generate")
                .about("Write a single input artifact")
                .arg(
                    Arg::new("threads")
                        .long("threads")
                        .default_value("8")
                        .value_parser(value_parser!(u32)),
                )
                .arg(
                    Arg::new("grid-size")
                        .long("grid-size")
                        .default_value("100")
                        .value_parser(value_parser!(u32))
                        .help("Grid side length; must be a perfect square"),
                )
                .arg(
                    Arg::new("batch-size")
                        .long("batch-size")
                        .default_value("20")
                        .value_parser(value_parser!(u32)),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Output file (stdout when omitted)"),
                ),
        )
        .subcommand(Command::new("sweeps").about("List the standard sweeps"))
}

fn load_config(args: &ArgMatches) -> anyhow::Result<HarnessConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => HarnessConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => HarnessConfig::new(),
    };
    if let Some(dir) = args.get_one::<PathBuf>("work-dir") {
        config = config.with_work_dir(dir);
    }
    if let Some(programs) = args.get_many::<Program>("program") {
        config = config.with_programs(programs.copied().collect());
    }
    Ok(config)
}

fn run(args: &ArgMatches) -> anyhow::Result<()> {
    let mut config = load_config(args)?;
    if let Some(&repetitions) = args.get_one::<u32>("repetitions") {
        config = config.with_repetitions(repetitions);
    }
    if let Some(dir) = args.get_one::<PathBuf>("plot-dir") {
        config = config.with_plot_dir(dir);
    }
    if args.get_flag("skip-build") {
        config = config.with_skip_build(true);
    }
    if let Some(metrics) = args.get_many::<Metric>("metric") {
        config = config.with_metrics(metrics.copied().collect());
    }
    if args.get_flag("all-metrics") {
        config = config.with_metrics(Metric::ALL.to_vec());
    }
    if args.get_flag("json") {
        config = config.with_export_json(true);
    }

    let definitions = match args.get_many::<String>("sweep") {
        Some(ids) => ids
            .map(|id| standard_sweep(id).with_context(|| format!("unknown sweep {id:?}")))
            .collect::<anyhow::Result<Vec<_>>>()?,
        None => standard_sweeps(),
    };

    let mut harness = Harness::new(config)?;
    let reports = harness.run(&definitions)?;

    for report in &reports {
        for plot in &report.plots {
            println!("{}: {}", report.id, plot.display());
        }
    }
    println!("Experiments completed. Check the generated plots.");
    Ok(())
}

fn build(args: &ArgMatches) -> anyhow::Result<()> {
    let config = load_config(args)?.with_skip_build(false);
    let mut harness = Harness::new(config)?;
    harness.build()?;
    println!("Built {} programs", harness.config().programs.len());
    Ok(())
}

fn generate(args: &ArgMatches) -> anyhow::Result<()> {
    let get = |name: &str| args.get_one::<u32>(name).copied().unwrap_or_default();
    let config = RunConfig::new(get("threads"), get("grid-size"), get("batch-size"));

    match args.get_one::<PathBuf>("out") {
        Some(path) => {
            InputSynthesizer::new(path).synthesize(config)?;
            tracing::info!("wrote {}", path.display());
        }
        None => {
            let artifact = InputArtifact::new(config)?;
            let stdout = std::io::stdout();
            let mut out = std::io::BufWriter::new(stdout.lock());
            artifact.write_to(&mut out)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn list_sweeps() {
    for definition in standard_sweeps() {
        println!(
            "{:<5} {:<13} {:?} (threads {}, grid {}, batch {})",
            definition.id,
            definition.x_label(),
            definition.values,
            definition.base.thread_count,
            definition.base.grid_size,
            definition.base.batch_size,
        );
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();

    let result = match matches.subcommand() {
        Some(("run", args)) => run(args),
        Some(("build", args)) => build(args),
        Some(("generate", args)) => generate(args),
        Some(("sweeps", _)) => {
            list_sweeps();
            Ok(())
        }
        _ => Err(anyhow::anyhow!("no command given")),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
