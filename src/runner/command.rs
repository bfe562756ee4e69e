use crate::error::{BenchError, BenchResult};
use log::{debug, info};
use std::fs::File;
use std::path::Path;
use std::process::{Command, Stdio};

/// Timeout utilities probed in order; `gtimeout` is the usual name on macOS.
pub const TIMEOUT_UTILITIES: [&str; 2] = ["timeout", "gtimeout"];

/// Returns the first timeout utility that runs `--help` successfully.
pub fn find_timeout_utility() -> BenchResult<String> {
    for utility in TIMEOUT_UTILITIES {
        let probe = Command::new(utility)
            .arg("--help")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match probe {
            Ok(status) if status.success() => {
                info!("Timeout utility ok: {}", utility);
                return Ok(utility.to_string());
            }
            Ok(status) => debug!("`{} --help` exited with {}.", utility, status),
            Err(e) => debug!("`{}` is not available: {}", utility, e),
        }
    }
    Err(BenchError::MissingTimeoutUtility(TIMEOUT_UTILITIES.join(", ")))
}

/// The benchmarked program as an explicit argument vector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl TargetCommand {
    /// Splits the invocation on whitespace. Python scripts are run through
    /// `python3`.
    pub fn parse(invocation: &str) -> BenchResult<Self> {
        let mut tokens = invocation.split_whitespace().map(|it| it.to_string());
        let first = tokens.next().ok_or(BenchError::EmptyInvocation)?;
        let rest: Vec<String> = tokens.collect();
        if first.ends_with(".py") {
            let mut args = vec![first];
            args.extend(rest);
            Ok(TargetCommand {
                program: "python3".to_string(),
                args,
            })
        } else {
            Ok(TargetCommand {
                program: first,
                args: rest,
            })
        }
    }

    /// Full argument vector of one benchmark run (without output redirection).
    pub fn argv(&self, timeout_utility: &str, timeout: &str, time_wrap: bool, input: &Path) -> Vec<String> {
        let mut argv = vec![timeout_utility.to_string(), timeout.to_string()];
        if time_wrap {
            argv.push("time".to_string());
            argv.push("-p".to_string());
        }
        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());
        argv.push(input.to_string_lossy().to_string());
        argv
    }

    /// Builds the process with stdout and stderr both redirected into `output`.
    pub fn command(
        &self,
        timeout_utility: &str,
        timeout: &str,
        time_wrap: bool,
        input: &Path,
        output: &File,
    ) -> BenchResult<Command> {
        let argv = self.argv(timeout_utility, timeout, time_wrap, input);
        let mut command = Command::new(&argv[0]);
        command
            .args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::from(output.try_clone()?))
            .stderr(Stdio::from(output.try_clone()?));
        Ok(command)
    }
}
