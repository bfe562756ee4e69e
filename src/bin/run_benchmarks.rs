use attractor_benchmark_rs::error::BenchResult;
use attractor_benchmark_rs::runner::command::find_timeout_utility;
use attractor_benchmark_rs::runner::{discover_benchmarks, BatchRunner, Mode, RunnerConfig};
use clap::Parser;
use log::info;
use std::path::PathBuf;

/// Runs a benchmark binary on every `group*/*.aeon` file of a directory and
/// collects the reported runtimes.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Timeout passed to the `timeout` utility (e.g. `1h`, `600`).
    timeout: String,

    /// Directory with `group*` subdirectories of benchmark models.
    bench_dir: PathBuf,

    /// Program (with optional extra arguments) invoked with each benchmark path.
    target: String,

    /// Ask before every benchmark (`skip`, `abort` or enter).
    #[arg(short, conflicts_with = "parallel")]
    interactive: bool,

    /// Run up to N benchmarks at the same time.
    #[arg(short, value_name = "N")]
    parallel: Option<usize>,

    /// Wrap the target with `time -p` so that it reports its own runtime.
    #[arg(short, long)]
    time: bool,

    /// Directory in which the run directory is created.
    #[arg(short, long, default_value = ".")]
    output: PathBuf,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    println!(">>>>>>>>>> START BENCHMARK RUN");
    let timeout_utility = find_timeout_utility().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = run(args, timeout_utility) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args, timeout_utility: String) -> BenchResult<()> {
    let mode = match (args.interactive, args.parallel) {
        (_, Some(workers)) if workers > 0 => Mode::Parallel(workers),
        (true, _) => Mode::Interactive,
        _ => Mode::Sequential,
    };
    info!("Timeout: {}", args.timeout);
    info!("Benchmark group directory: {}", args.bench_dir.display());
    info!("Script: {}", args.target);
    info!("Mode: {:?}", mode);

    let benchmarks = discover_benchmarks(&args.bench_dir)?;
    info!("Discovered {} benchmark(s).", benchmarks.len());

    let config = RunnerConfig {
        timeout: args.timeout,
        bench_dir: args.bench_dir,
        target: args.target,
        mode,
        output_parent: args.output,
        time_wrap: args.time,
    };
    let runner = BatchRunner::new(config, timeout_utility)?;
    let report = runner.run(benchmarks, std::io::stdin().lock())?;
    info!("Results written to {}.", report.out_dir.display());
    Ok(())
}
