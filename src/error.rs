//! Error types shared by the generator, the batch runner and the analyzer.
//!
//! Per-benchmark failures are never represented here: those become `fail`
//! or `x` rows in the reports. Only conditions that stop a whole tool are.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchError {
    /// Neither `timeout` nor `gtimeout` can be executed.
    #[error("No timeout utility found (tried {0}).")]
    MissingTimeoutUtility(String),

    /// The benchmark root (or another required directory) is unusable.
    #[error("{} is not a valid directory.", .0.display())]
    InvalidDirectory(PathBuf),

    /// Output directories are never reused between invocations.
    #[error("Output directory {} already exists.", .0.display())]
    OutputExists(PathBuf),

    /// The target invocation string contains no program.
    #[error("Empty target invocation.")]
    EmptyInvocation,

    /// The batch finished without a single successful run, so there is no
    /// origin for the cumulative-completion curve.
    #[error("No benchmark finished successfully; aggregation curve is empty.")]
    NoSuccessfulRuns,

    /// A distinct source state cannot be chosen for a target.
    #[error("At least two distinct attractor seeds are required, found {0}.")]
    NotEnoughSeeds(usize),

    /// Errors reported by the Boolean network library.
    #[error("Network error: {0}")]
    Network(String),

    /// A benchmark file header is missing or malformed.
    #[error("Invalid benchmark file: {0}")]
    InvalidBenchmark(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<String> for BenchError {
    fn from(value: String) -> Self {
        BenchError::Network(value)
    }
}

pub type BenchResult<T> = Result<T, BenchError>;
