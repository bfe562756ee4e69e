use crate::error::{BenchError, BenchResult};
use prettytable::{row, Table};
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const TIMES_HEADER: &str = "Benchmark, Time[s]";
pub const AGGREGATION_HEADER: &str = "Time[s], No. Completed";
pub const FAIL: &str = "fail";

/// Why a run did not produce a usable timing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// The output file is empty.
    NoOutput,
    /// Fewer than three lines of output.
    TooShort,
    /// The third line from the end is not a `real <seconds>` line.
    MalformedTiming,
    /// The timing line is fine, but the process exited with an error
    /// (including being killed by the timeout utility).
    NonZeroExit,
    /// The process could not be started at all.
    SpawnFailed,
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            FailureKind::NoOutput => "no output",
            FailureKind::TooShort => "output too short",
            FailureKind::MalformedTiming => "malformed timing line",
            FailureKind::NonZeroExit => "non-zero exit code",
            FailureKind::SpawnFailed => "process could not be started",
        };
        write!(f, "{}", text)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RunOutcome {
    /// `elapsed_text` is the timing exactly as printed by the benchmark.
    Success { elapsed_text: String, elapsed: f64 },
    Failure(FailureKind),
}

/// Result of one benchmark invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct RunRecord {
    pub name: String,
    pub outcome: RunOutcome,
}

impl RunRecord {
    pub fn csv_row(&self) -> String {
        match &self.outcome {
            RunOutcome::Success { elapsed_text, .. } => format!("{}, {}", self.name, elapsed_text),
            RunOutcome::Failure(_) => format!("{}, {}", self.name, FAIL),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RunOutcome::Success { .. })
    }
}

/// One point of the cumulative-completion curve.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregationPoint {
    pub elapsed: f64,
    pub completed: usize,
}

impl AggregationPoint {
    /// Times are always written as floats (`12.0`), whatever form the
    /// benchmark printed them in.
    pub fn csv_row(&self) -> String {
        format!("{:?}, {}", self.elapsed, self.completed)
    }
}

/// Builds the cumulative-completion curve from successful timings: the origin
/// `(min, 0)` followed by `(t_i, i)` for the times sorted ascending.
/// Returns `None` when there are no successes.
pub fn aggregation_curve(successes: &[f64]) -> Option<Vec<AggregationPoint>> {
    let mut sorted = successes.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let first = *sorted.first()?;
    let mut curve = Vec::with_capacity(sorted.len() + 1);
    curve.push(AggregationPoint {
        elapsed: first,
        completed: 0,
    });
    for (i, elapsed) in sorted.into_iter().enumerate() {
        curve.push(AggregationPoint {
            elapsed,
            completed: i + 1,
        });
    }
    Some(curve)
}

/// Median of ascending `times`; the mean of the two middle values for even
/// lengths.
fn median(times: &[f64]) -> Option<f64> {
    let mid = times.len() / 2;
    match times.len() {
        0 => None,
        len if len % 2 == 1 => Some(times[mid]),
        _ => Some((times[mid - 1] + times[mid]) / 2.0),
    }
}

/// Counts and timing statistics of one batch.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub min_time: Option<f64>,
    pub median_time: Option<f64>,
    pub max_time: Option<f64>,
}

impl RunSummary {
    pub fn print(&self) {
        let fmt_time = |t: Option<f64>| t.map(|t| format!("{:.2}", t)).unwrap_or_else(|| "-".to_string());

        let mut table = Table::new();
        table.add_row(row![
            "Benchmarks",
            "Succeeded",
            "Failed",
            "Skipped",
            "Min Time (s)",
            "Median Time (s)",
            "Max Time (s)"
        ]);
        table.add_row(row![
            self.total,
            self.succeeded,
            self.failed,
            self.skipped,
            fmt_time(self.min_time),
            fmt_time(self.median_time),
            fmt_time(self.max_time),
        ]);
        table.printstd();
    }
}

/// The two report files of a batch. The orchestrating thread is the only
/// writer; every recorded row is flushed immediately so that an interrupted
/// batch keeps everything finished so far.
pub struct Reports {
    times_path: PathBuf,
    aggregation_path: PathBuf,
    times: BufWriter<File>,
    aggregation: BufWriter<File>,
    successes: Vec<f64>,
    failed: usize,
    skipped: usize,
}

impl Reports {
    /// Creates `<prefix>_times.csv` and `<prefix>_aggregated.csv` in `out_dir`.
    pub fn create(out_dir: &Path, prefix: &str) -> BenchResult<Self> {
        let times_path = out_dir.join(format!("{}_times.csv", prefix));
        let aggregation_path = out_dir.join(format!("{}_aggregated.csv", prefix));

        let mut times = BufWriter::new(File::create(&times_path)?);
        writeln!(times, "{}", TIMES_HEADER)?;
        times.flush()?;
        let mut aggregation = BufWriter::new(File::create(&aggregation_path)?);
        writeln!(aggregation, "{}", AGGREGATION_HEADER)?;
        aggregation.flush()?;

        Ok(Reports {
            times_path,
            aggregation_path,
            times,
            aggregation,
            successes: Vec::new(),
            failed: 0,
            skipped: 0,
        })
    }

    pub fn times_path(&self) -> &Path {
        &self.times_path
    }

    pub fn aggregation_path(&self) -> &Path {
        &self.aggregation_path
    }

    pub fn record(&mut self, record: &RunRecord) -> BenchResult<()> {
        writeln!(self.times, "{}", record.csv_row())?;
        self.times.flush()?;
        match &record.outcome {
            RunOutcome::Success { elapsed, .. } => self.successes.push(*elapsed),
            RunOutcome::Failure(_) => self.failed += 1,
        }
        Ok(())
    }

    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    pub fn summary(&self) -> RunSummary {
        let mut times = self.successes.clone();
        times.sort_by(|a, b| a.total_cmp(b));
        RunSummary {
            total: self.successes.len() + self.failed + self.skipped,
            succeeded: self.successes.len(),
            failed: self.failed,
            skipped: self.skipped,
            min_time: times.first().copied(),
            median_time: median(&times),
            max_time: times.last().copied(),
        }
    }

    /// Writes the aggregation curve and flushes both files. With no
    /// successful run the aggregation file keeps only its header and
    /// `NoSuccessfulRuns` is returned.
    pub fn finish(mut self) -> BenchResult<()> {
        self.times.flush()?;
        let curve = aggregation_curve(&self.successes);
        if let Some(curve) = &curve {
            for point in curve {
                writeln!(self.aggregation, "{}", point.csv_row())?;
            }
        }
        self.aggregation.flush()?;
        match curve {
            Some(_) => Ok(()),
            None => Err(BenchError::NoSuccessfulRuns),
        }
    }
}
