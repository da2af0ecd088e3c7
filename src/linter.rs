//! External style checker invocation.
//!
//! Runs `flake8` as a subprocess over a scratch copy of the source. The call
//! is synchronous and bounded by a wall-clock timeout so a pathological
//! input cannot hang the run. Any failure here degrades exactly one rule to
//! "failed"; it never aborts the whole validation.

use log::debug;
use std::io::Write;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Findings the checker is told to ignore regardless of rule params.
const DEFAULT_IGNORE: &[&str] = &["E501", "W503"];

const MAX_LINE_LENGTH: u32 = 120;

/// Per-rule parameters for the style check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleCheckParams {
    /// Finding codes to ignore, merged with [`DEFAULT_IGNORE`].
    pub ignore: Vec<String>,
    /// Finding codes to restrict the check to; empty means all.
    pub select: Vec<String>,
}

/// Outcome of a completed style check.
#[derive(Debug, Clone)]
pub struct StyleReport {
    pub issue_count: usize,
    pub report: String,
}

#[derive(Error, Debug)]
pub enum LinterError {
    #[error("failed to write scratch source file: {0}")]
    Scratch(#[source] std::io::Error),

    #[error("failed to launch style checker '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("style checker timed out after {0:?}")]
    Timeout(Duration),

    #[error("style checker exited abnormally (status {status}): {stderr}")]
    Tool { status: i32, stderr: String },
}

/// External style checker bound to one executable.
pub struct StyleChecker {
    command: String,
    timeout: Duration,
}

impl StyleChecker {
    pub fn new() -> Self {
        Self {
            command: "flake8".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check one source text. The source is written to a scratch `.py` file
    /// so the checker never sees (or touches) the real submission.
    pub fn check(
        &self,
        source: &str,
        params: &StyleCheckParams,
    ) -> Result<StyleReport, LinterError> {
        let mut scratch = tempfile::Builder::new()
            .suffix(".py")
            .tempfile()
            .map_err(LinterError::Scratch)?;
        scratch
            .write_all(source.as_bytes())
            .map_err(LinterError::Scratch)?;
        scratch.flush().map_err(LinterError::Scratch)?;

        let mut ignore: Vec<&str> = DEFAULT_IGNORE.to_vec();
        for code in &params.ignore {
            if !ignore.contains(&code.as_str()) {
                ignore.push(code);
            }
        }

        let mut command = Command::new(&self.command);
        command
            .arg(format!("--max-line-length={MAX_LINE_LENGTH}"))
            .arg(format!("--extend-ignore={}", ignore.join(",")))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if !params.select.is_empty() {
            command.arg(format!("--select={}", params.select.join(",")));
        }
        command.arg(scratch.path());

        debug!("running style checker: {:?}", command);

        let mut child = command.spawn().map_err(|source| LinterError::Spawn {
            command: self.command.clone(),
            source,
        })?;

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(LinterError::Timeout(self.timeout));
                    }
                    std::thread::sleep(Duration::from_millis(25));
                }
                Err(source) => {
                    return Err(LinterError::Spawn {
                        command: self.command.clone(),
                        source,
                    })
                }
            }
        };

        let output = child
            .wait_with_output()
            .map_err(|source| LinterError::Spawn {
                command: self.command.clone(),
                source,
            })?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        // flake8 exits 0 for a clean file and 1 when it reports findings;
        // anything else is a tool failure.
        match status.code() {
            Some(0) => Ok(StyleReport {
                issue_count: 0,
                report: String::new(),
            }),
            Some(1) => {
                let report = stdout.trim().to_string();
                let issue_count = report.lines().filter(|line| !line.is_empty()).count();
                Ok(StyleReport {
                    issue_count,
                    report,
                })
            }
            code => Err(LinterError::Tool {
                status: code.unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
        }
    }
}

impl Default for StyleChecker {
    fn default() -> Self {
        Self::new()
    }
}
