use crate::error::{BenchError, BenchResult};
use crate::runner::OUTPUT_SUFFIX;
use lazy_static::lazy_static;
use num_bigint::BigUint;
use num_traits::Zero;
use regex::Regex;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

pub const CSV_HEADER: &str =
    "Benchmark name, Attractor colors, Unknown functions, Arity range, Elapsed (ms)";
pub const MISSING: &str = "x";

lazy_static! {
    static ref RE_PERTURBATION_COLORS: Regex = Regex::new(r"Perturbation colors: (\d+)").unwrap();
    static ref RE_ATTRACTOR_COLORS: Regex = Regex::new(r"Attractor colors: (\d+)").unwrap();
    static ref RE_ELAPSED_MS: Regex = Regex::new(r"Elapsed: (\d+) ms").unwrap();
    static ref RE_MIN_ARITY: Regex = Regex::new(r"Lowest cardinality: (\d+)").unwrap();
    static ref RE_MAX_ARITY: Regex = Regex::new(r"Highest cardinality: (\d+)").unwrap();
    static ref RE_NUM_FUNCTIONS: Regex = Regex::new(r"Unknown update functions: (\d+)").unwrap();
}

/// Metrics reported by one finished benchmark.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Metrics {
    /// Attractor colours per perturbation colour, exact and unbounded.
    pub colors: BigUint,
    pub unknown_functions: u64,
    pub min_arity: u64,
    pub max_arity: u64,
    pub elapsed_ms: u128,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisRow {
    pub name: String,
    /// `None` when the output lacks any of the expected metrics.
    pub metrics: Option<Metrics>,
}

impl Display for AnalysisRow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.metrics {
            Some(m) => write!(
                f,
                "{}, {}, {}, {}-{}, {}",
                self.name, m.colors, m.unknown_functions, m.min_arity, m.max_arity, m.elapsed_ms
            ),
            None => write!(
                f,
                "{}, {}, {}, {}, {}",
                self.name, MISSING, MISSING, MISSING, MISSING
            ),
        }
    }
}

fn capture<T: std::str::FromStr>(regex: &Regex, text: &str) -> Option<T> {
    regex.captures(text)?.get(1)?.as_str().parse().ok()
}

/// Extracts the metrics of one benchmark output. Any missing value, or a zero
/// perturbation colour count, yields the sentinel row.
pub fn analyse_output(name: &str, text: &str) -> AnalysisRow {
    let metrics = (|| {
        let elapsed_ms = capture::<u128>(&RE_ELAPSED_MS, text)?;
        let perturbation_colors = capture::<BigUint>(&RE_PERTURBATION_COLORS, text)?;
        let attractor_colors = capture::<BigUint>(&RE_ATTRACTOR_COLORS, text)?;
        let min_arity = capture(&RE_MIN_ARITY, text)?;
        let max_arity = capture(&RE_MAX_ARITY, text)?;
        let unknown_functions = capture(&RE_NUM_FUNCTIONS, text)?;
        if perturbation_colors.is_zero() {
            return None;
        }
        Some(Metrics {
            colors: attractor_colors / perturbation_colors,
            unknown_functions,
            min_arity,
            max_arity,
            elapsed_ms,
        })
    })();
    AnalysisRow {
        name: name.to_string(),
        metrics,
    }
}

/// Analyses every `*_out.txt` file in `dir`, sorted by file name.
pub fn analyse_directory(dir: &Path) -> BenchResult<Vec<AnalysisRow>> {
    if !dir.is_dir() {
        return Err(BenchError::InvalidDirectory(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name().to_string_lossy().to_string();
        if file_name.ends_with(OUTPUT_SUFFIX) {
            files.push((file_name, entry.path()));
        }
    }
    files.sort();

    let mut rows = Vec::with_capacity(files.len());
    for (file_name, path) in files {
        let bytes = fs::read(&path)?;
        let text = String::from_utf8_lossy(&bytes);
        let name = file_name.strip_suffix(OUTPUT_SUFFIX).unwrap_or(&file_name);
        rows.push(analyse_output(name, &text));
    }
    Ok(rows)
}
