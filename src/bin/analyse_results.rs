use attractor_benchmark_rs::analysis::{analyse_directory, CSV_HEADER};
use clap::Parser;
use std::path::PathBuf;

/// Extracts attractor metrics from the `*_out.txt` files of a benchmark run
/// and prints them as CSV.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Run directory produced by `run_benchmarks`.
    results_dir: PathBuf,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let rows = analyse_directory(&args.results_dir).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    println!("{}", CSV_HEADER);
    for row in rows {
        println!("{}", row);
    }
}
