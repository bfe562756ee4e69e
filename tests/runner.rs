#![cfg(unix)]

use attractor_benchmark_rs::error::BenchError;
use attractor_benchmark_rs::runner::command::find_timeout_utility;
use attractor_benchmark_rs::runner::{discover_benchmarks, BatchRunner, Mode, RunnerConfig};
use pretty_assertions::assert_eq;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// Prints the time stored on the first line of the benchmark in `time -p`
// format. Benchmarks named `fail.aeon` exit with an error.
const STUB: &str = r#"#!/bin/sh
echo "Processing $1"
case "$1" in
  */fail.aeon) echo "real 0.50"; echo "user 0.01"; echo "sys 0.00"; exit 2 ;;
esac
t=$(head -n 1 "$1")
echo "real $t"
echo "user 0.01"
echo "sys 0.00"
"#;

struct Fixture {
    dir: TempDir,
    bench_dir: PathBuf,
    stub: PathBuf,
}

impl Fixture {
    fn new(benchmarks: &[(&str, &str, &str)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let bench_dir = dir.path().join("bench");
        for (group, file, time) in benchmarks {
            fs::create_dir_all(bench_dir.join(group)).unwrap();
            fs::write(bench_dir.join(group).join(file), format!("{}\n", time)).unwrap();
        }
        let stub = dir.path().join("stub.sh");
        fs::write(&stub, STUB).unwrap();
        Fixture {
            dir,
            bench_dir,
            stub,
        }
    }

    fn runner(&self, timeout_utility: String, mode: Mode) -> BatchRunner {
        let config = RunnerConfig {
            timeout: "20".to_string(),
            bench_dir: self.bench_dir.clone(),
            target: format!("sh {}", self.stub.display()),
            mode,
            output_parent: self.dir.path().join("out"),
            time_wrap: false,
        };
        BatchRunner::new(config, timeout_utility).unwrap()
    }
}

/// The timeout utility, or `None` with a notice when the host has none.
fn timeout_utility() -> Option<String> {
    match find_timeout_utility() {
        Ok(utility) => Some(utility),
        Err(e) => {
            eprintln!("Skipping runner test: {}", e);
            None
        }
    }
}

fn csv_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|it| it.to_string())
        .collect()
}

#[test]
fn sequential_run_writes_times_and_aggregation() {
    let Some(utility) = timeout_utility() else {
        return;
    };
    let fixture = Fixture::new(&[
        ("group_1", "a.aeon", "1.23"),
        ("group_1", "b.aeon", "0.5"),
        ("group_2", "fail.aeon", "0.1"),
    ]);
    let runner = fixture.runner(utility, Mode::Sequential);
    let benchmarks = discover_benchmarks(&fixture.bench_dir).unwrap();
    let report = runner.run(benchmarks, Cursor::new("")).unwrap();

    assert_eq!(
        csv_lines(&report.times_csv),
        vec![
            "Benchmark, Time[s]",
            "group_1_a, 1.23",
            "group_1_b, 0.5",
            "group_2_fail, fail"
        ]
    );
    assert_eq!(
        csv_lines(&report.aggregated_csv),
        vec!["Time[s], No. Completed", "0.5, 0", "0.5, 1", "1.23, 2"]
    );
    assert_eq!(report.summary.succeeded, 2);
    assert_eq!(report.summary.failed, 1);

    let output = fs::read_to_string(report.out_dir.join("group_1_a_out.txt")).unwrap();
    assert!(output.contains("real 1.23"));
    assert!(report.out_dir.join("group_2_fail_out.txt").is_file());
}

#[test]
fn batch_without_success_keeps_only_header() {
    let Some(utility) = timeout_utility() else {
        return;
    };
    let fixture = Fixture::new(&[("group_1", "fail.aeon", "1.0")]);
    let runner = fixture.runner(utility, Mode::Sequential);
    let out_dir = runner.out_dir().to_path_buf();
    let benchmarks = discover_benchmarks(&fixture.bench_dir).unwrap();

    let result = runner.run(benchmarks, Cursor::new(""));
    assert!(matches!(result, Err(BenchError::NoSuccessfulRuns)));

    let mut times = None;
    let mut aggregated = None;
    for entry in fs::read_dir(&out_dir).unwrap() {
        let path = entry.unwrap().path();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        if name.ends_with("_times.csv") {
            times = Some(path);
        } else if name.ends_with("_aggregated.csv") {
            aggregated = Some(path);
        }
    }
    assert_eq!(
        csv_lines(&times.unwrap()),
        vec!["Benchmark, Time[s]", "group_1_fail, fail"]
    );
    assert_eq!(
        csv_lines(&aggregated.unwrap()),
        vec!["Time[s], No. Completed"]
    );
}

#[test]
fn parallel_run_completes_every_benchmark() {
    let Some(utility) = timeout_utility() else {
        return;
    };
    let fixture = Fixture::new(&[
        ("group_1", "1.aeon", "3"),
        ("group_1", "2.aeon", "1"),
        ("group_1", "3.aeon", "2.5"),
        ("group_2", "1.aeon", "0.25"),
        ("group_2", "fail.aeon", "7"),
        ("group_3", "1.aeon", "4"),
    ]);
    let runner = fixture.runner(utility, Mode::Parallel(3));
    assert!(runner
        .out_dir()
        .to_string_lossy()
        .contains("_parallel_"));
    let benchmarks = discover_benchmarks(&fixture.bench_dir).unwrap();
    let report = runner.run(benchmarks, Cursor::new("")).unwrap();

    let mut rows = csv_lines(&report.times_csv);
    assert_eq!(rows.remove(0), "Benchmark, Time[s]");
    rows.sort();
    assert_eq!(
        rows,
        vec![
            "group_1_1, 3",
            "group_1_2, 1",
            "group_1_3, 2.5",
            "group_2_1, 0.25",
            "group_2_fail, fail",
            "group_3_1, 4"
        ]
    );
    assert_eq!(
        csv_lines(&report.aggregated_csv),
        vec![
            "Time[s], No. Completed",
            "0.25, 0",
            "0.25, 1",
            "1.0, 2",
            "2.5, 3",
            "3.0, 4",
            "4.0, 5"
        ]
    );
}

#[test]
fn interactive_run_skips_and_aborts() {
    let Some(utility) = timeout_utility() else {
        return;
    };
    let fixture = Fixture::new(&[
        ("group_1", "1.aeon", "1"),
        ("group_1", "2.aeon", "2"),
        ("group_1", "3.aeon", "3"),
        ("group_1", "4.aeon", "4"),
    ]);
    let runner = fixture.runner(utility, Mode::Interactive);
    let benchmarks = discover_benchmarks(&fixture.bench_dir).unwrap();
    let report = runner
        .run(benchmarks, Cursor::new("skip\n\nabort\n"))
        .unwrap();

    assert_eq!(
        csv_lines(&report.times_csv),
        vec!["Benchmark, Time[s]", "group_1_2, 2"]
    );
    assert_eq!(report.summary.total, 4);
    assert_eq!(report.summary.succeeded, 1);
    assert_eq!(report.summary.skipped, 3);
    assert!(!report.out_dir.join("group_1_1_out.txt").exists());
}

#[test]
fn missing_target_program_is_a_failed_row() {
    let Some(utility) = timeout_utility() else {
        return;
    };
    let fixture = Fixture::new(&[("group_1", "a.aeon", "1")]);
    let config = RunnerConfig {
        timeout: "20".to_string(),
        bench_dir: fixture.bench_dir.clone(),
        target: fixture.dir.path().join("missing-binary").display().to_string(),
        mode: Mode::Sequential,
        output_parent: fixture.dir.path().join("out"),
        time_wrap: false,
    };
    let runner = BatchRunner::new(config, utility).unwrap();
    let out_dir = runner.out_dir().to_path_buf();
    let benchmarks = discover_benchmarks(&fixture.bench_dir).unwrap();

    assert!(matches!(
        runner.run(benchmarks, Cursor::new("")),
        Err(BenchError::NoSuccessfulRuns)
    ));
    assert!(out_dir.join("group_1_a_out.txt").is_file());
}
