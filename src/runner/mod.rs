//! Batch execution of an external analysis binary over a benchmark tree.
//!
//! Every benchmark runs as its own subprocess wrapped in an OS timeout
//! utility, with stdout and stderr captured in a dedicated file. A run that
//! fails in any way becomes a `fail` row; it never stops the batch.

pub mod command;
pub mod pool;

use crate::error::{BenchError, BenchResult};
use crate::report::{FailureKind, Reports, RunOutcome, RunRecord, RunSummary};
use command::TargetCommand;
use lazy_static::lazy_static;
use log::{info, warn};
use regex::Regex;
use std::fs::{self, File};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub const GROUP_PREFIX: &str = "group";
pub const BENCHMARK_EXTENSION: &str = "aeon";
pub const OUTPUT_SUFFIX: &str = "_out.txt";

lazy_static! {
    /// Output of `time -p`, e.g. `real 12.34`.
    static ref RE_TIME: Regex = Regex::new(r"^\s*real\s*(\d+\.?\d*)\s*").unwrap();
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Sequential,
    /// Sequential, asking the operator before every benchmark.
    Interactive,
    /// At most this many benchmarks run at the same time.
    Parallel(usize),
}

#[derive(Clone, Debug)]
pub struct RunnerConfig {
    /// Passed verbatim to the timeout utility (e.g. `1h`, `600`).
    pub timeout: String,
    pub bench_dir: PathBuf,
    /// Program (and optional extra arguments) that receives the benchmark path.
    pub target: String,
    pub mode: Mode,
    /// Directory in which the timestamped run directory is created.
    pub output_parent: PathBuf,
    /// Prefix the target with `time -p` so that it reports its own runtime.
    pub time_wrap: bool,
}

/// A benchmark file inside one of the group directories.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Benchmark {
    /// `<group>/<file>`, used for ordering.
    pub relative: String,
    /// Relative path without extension, `/` replaced by `_`.
    pub name: String,
    pub path: PathBuf,
}

impl Benchmark {
    fn new(root: &Path, group: &str, file: &str) -> Self {
        let relative = format!("{}/{}", group, file);
        let stem = match relative.rfind('.') {
            Some(i) if i > relative.rfind('/').unwrap_or(0) + 1 => &relative[..i],
            _ => relative.as_str(),
        };
        Benchmark {
            name: stem.replace('/', "_"),
            path: root.join(group).join(file),
            relative,
        }
    }
}

/// Collects all `.aeon` files from subdirectories of `root` whose name starts
/// with `group`, sorted by relative path.
pub fn discover_benchmarks(root: &Path) -> BenchResult<Vec<Benchmark>> {
    if !root.is_dir() {
        return Err(BenchError::InvalidDirectory(root.to_path_buf()));
    }

    let mut benchmarks = Vec::new();
    for group in fs::read_dir(root)? {
        let group = group?;
        let group_name = group.file_name().to_string_lossy().to_string();
        if !group_name.starts_with(GROUP_PREFIX) || !group.path().is_dir() {
            continue;
        }
        for file in fs::read_dir(group.path())? {
            let file = file?;
            let file_name = file.file_name().to_string_lossy().to_string();
            let is_bench = file.path().is_file()
                && file
                    .path()
                    .extension()
                    .map(|ext| ext == BENCHMARK_EXTENSION)
                    .unwrap_or(false);
            if is_bench {
                benchmarks.push(Benchmark::new(root, &group_name, &file_name));
            }
        }
    }
    benchmarks.sort_by(|a, b| a.relative.cmp(&b.relative));
    Ok(benchmarks)
}

/// Classifies captured output. Success requires a zero exit code and a
/// `real <seconds>` line exactly three lines from the end.
pub fn evaluate_output(output: &str, exit_success: bool) -> RunOutcome {
    let lines: Vec<&str> = output.lines().collect();
    if lines.is_empty() {
        return RunOutcome::Failure(FailureKind::NoOutput);
    }
    if lines.len() < 3 {
        return RunOutcome::Failure(FailureKind::TooShort);
    }

    let time_line = lines[lines.len() - 3];
    let elapsed_text = match RE_TIME.captures(time_line) {
        Some(captures) => captures[1].to_string(),
        None => return RunOutcome::Failure(FailureKind::MalformedTiming),
    };
    if !exit_success {
        return RunOutcome::Failure(FailureKind::NonZeroExit);
    }
    match elapsed_text.parse::<f64>() {
        Ok(elapsed) => RunOutcome::Success {
            elapsed_text,
            elapsed,
        },
        Err(_) => RunOutcome::Failure(FailureKind::MalformedTiming),
    }
}

/// Replaces path separators so that a path can be part of a file name.
fn flatten(path: &str) -> String {
    path.replace('/', "_")
}

pub struct BatchReport {
    pub out_dir: PathBuf,
    pub times_csv: PathBuf,
    pub aggregated_csv: PathBuf,
    pub summary: RunSummary,
}

pub struct BatchRunner {
    config: RunnerConfig,
    timeout_utility: String,
    target: TargetCommand,
    prefix: String,
    out_dir: PathBuf,
}

impl BatchRunner {
    pub fn new(config: RunnerConfig, timeout_utility: String) -> BenchResult<Self> {
        let target = TargetCommand::parse(&config.target)?;
        let script_name = Path::new(config.target.trim())
            .file_name()
            .map(|it| it.to_string_lossy().to_string())
            .unwrap_or_default()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_");
        let prefix = format!(
            "{}_{}",
            flatten(&config.bench_dir.to_string_lossy()),
            script_name
        );

        let mut dir_name = prefix.clone();
        if let Mode::Parallel(_) = config.mode {
            dir_name.push_str("_parallel");
        }
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let out_dir = config
            .output_parent
            .join(format!("_run_{}_{}", dir_name, timestamp));

        Ok(BatchRunner {
            config,
            timeout_utility,
            target,
            prefix,
            out_dir,
        })
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    fn output_file(&self, benchmark: &Benchmark) -> PathBuf {
        self.out_dir
            .join(format!("{}{}", benchmark.name, OUTPUT_SUFFIX))
    }

    /// Runs one benchmark to completion and evaluates its captured output.
    pub fn run_benchmark(&self, benchmark: &Benchmark) -> RunRecord {
        let output_path = self.output_file(benchmark);
        let outcome = match self.spawn_and_wait(benchmark, &output_path) {
            Ok(exit_success) => {
                let output = fs::read(&output_path)
                    .map(|bytes| String::from_utf8_lossy(&bytes).to_string())
                    .unwrap_or_default();
                let outcome = evaluate_output(&output, exit_success);
                match &outcome {
                    RunOutcome::Success { elapsed_text, .. } => {
                        info!("Finished {}. Success. Elapsed: {}", benchmark.name, elapsed_text)
                    }
                    RunOutcome::Failure(kind) => warn!(
                        "Finished {}. Fail ({}). Last line of output: {}",
                        benchmark.name,
                        kind,
                        output.lines().last().unwrap_or("")
                    ),
                }
                outcome
            }
            Err(e) => {
                warn!("Finished {}. Fail: {}", benchmark.name, e);
                RunOutcome::Failure(FailureKind::SpawnFailed)
            }
        };
        RunRecord {
            name: benchmark.name.clone(),
            outcome,
        }
    }

    fn spawn_and_wait(&self, benchmark: &Benchmark, output_path: &Path) -> BenchResult<bool> {
        let output = File::create(output_path)?;
        let mut command = self.target.command(
            &self.timeout_utility,
            &self.config.timeout,
            self.config.time_wrap,
            &benchmark.path,
            &output,
        )?;
        info!("Spawn: {:?}", command);
        let status = command.spawn()?.wait()?;
        Ok(status.success())
    }

    /// Executes all benchmarks according to the configured mode and writes
    /// both reports. Operator answers in interactive mode are read from `input`.
    pub fn run<I: BufRead>(&self, benchmarks: Vec<Benchmark>, input: I) -> BenchResult<BatchReport> {
        self.create_out_dir()?;
        let mut reports = Reports::create(&self.out_dir, &self.prefix)?;

        match self.config.mode {
            Mode::Parallel(workers) => {
                pool::run_pool(
                    benchmarks,
                    workers,
                    |benchmark| self.run_benchmark(&benchmark),
                    |record| reports.record(&record),
                )?;
            }
            Mode::Sequential | Mode::Interactive => {
                self.run_sequential(benchmarks, &mut reports, input)?;
            }
        }

        let summary = reports.summary();
        summary.print();
        let times_csv = reports.times_path().to_path_buf();
        let aggregated_csv = reports.aggregation_path().to_path_buf();
        reports.finish()?;

        Ok(BatchReport {
            out_dir: self.out_dir.clone(),
            times_csv,
            aggregated_csv,
            summary,
        })
    }

    /// Creates the run directory. A directory left by an earlier run started
    /// in the same second is never reused.
    fn create_out_dir(&self) -> BenchResult<()> {
        fs::create_dir_all(&self.config.output_parent)?;
        match fs::create_dir(&self.out_dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(BenchError::OutputExists(self.out_dir.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn run_sequential<I: BufRead>(
        &self,
        benchmarks: Vec<Benchmark>,
        reports: &mut Reports,
        mut input: I,
    ) -> BenchResult<()> {
        let interactive = self.config.mode == Mode::Interactive;
        let total = benchmarks.len();
        for (i, benchmark) in benchmarks.iter().enumerate() {
            println!(">>>>>>>>>> START BENCHMARK {} <<<<<<<<<<", benchmark.relative);
            if interactive {
                println!("Write 'skip' to go to next benchmark, 'abort' to end the run, or press enter key to continue...");
                std::io::stdout().flush()?;
                let mut answer = String::new();
                input.read_line(&mut answer)?;
                if answer.starts_with("skip") {
                    println!("Skipped!");
                    reports.record_skip();
                    continue;
                }
                if answer.starts_with("abort") {
                    println!("Aborted!");
                    for _ in i..total {
                        reports.record_skip();
                    }
                    break;
                }
            }
            let record = self.run_benchmark(benchmark);
            reports.record(&record)?;
        }
        Ok(())
    }
}
