use crate::executor::Outcome;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Why an attempt failed before producing a normal exit status.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Timeout,
    LaunchFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::LaunchFailure => "launch_failure",
        }
    }
}

/// Normalized record of one command attempt.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExecutionResult {
    pub command: String,                    // Rendered argument vector
    #[serde(rename = "returncode")]
    pub return_code: Option<i32>,           // None if the process never ran to completion
    pub stdout: String,                     // Standard output
    pub stderr: String,                     // Standard error output
    pub success: bool,                      // return_code == 0 and no error_kind
    #[serde(with = "timestamp_format")]
    pub timestamp: DateTime<Local>,         // Completion time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,      // Timeout / launch failure
    #[serde(default)]
    pub duration_ms: u64,                   // Wall time of the attempt (milliseconds)
    #[serde(default)]
    pub working_dir: PathBuf,               // Directory the attempt ran in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<BTreeMap<String, String>>, // Parsed key facts, per entry
}

impl ExecutionResult {
    /// Turn a raw runner outcome into a record. The timestamp is taken here,
    /// at completion, not when the process was launched.
    pub fn normalize(
        command: String,
        outcome: Outcome,
        working_dir: PathBuf,
        duration: Duration,
    ) -> Self {
        let (return_code, stdout, stderr, error_kind) = match outcome {
            Outcome::Completed { code, stdout, stderr } => (Some(code), stdout, stderr, None),
            Outcome::TimedOut { stdout, mut stderr, limit } => {
                if !stderr.is_empty() && !stderr.ends_with('\n') {
                    stderr.push('\n');
                }
                stderr.push_str(&format!(
                    "command timed out after {:.1}s and was terminated",
                    limit.as_secs_f64()
                ));
                (None, stdout, stderr, Some(ErrorKind::Timeout))
            }
            Outcome::LaunchFailed { reason } => {
                (None, String::new(), reason, Some(ErrorKind::LaunchFailure))
            }
        };

        Self {
            command,
            success: error_kind.is_none() && return_code == Some(0),
            return_code,
            stdout,
            stderr,
            timestamp: Local::now(),
            error_kind,
            duration_ms: duration.as_millis() as u64,
            working_dir,
            summary: None,
        }
    }

    /// Record for an operation the toolkit performs itself, without a child process.
    pub fn internal(
        command: String,
        result: Result<String, String>,
        working_dir: PathBuf,
    ) -> Self {
        let (code, stdout, stderr) = match result {
            Ok(out) => (0, out, String::new()),
            Err(err) => (1, String::new(), err),
        };
        Self::normalize(
            command,
            Outcome::Completed { code, stdout, stderr },
            working_dir,
            Duration::ZERO,
        )
    }

    pub fn with_summary(mut self, summary: BTreeMap<String, String>) -> Self {
        if !summary.is_empty() {
            self.summary = Some(summary);
        }
        self
    }

    pub fn timestamp_string(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

mod timestamp_format {
    use super::TIMESTAMP_FORMAT;
    use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Local>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Local>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let naive = NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
            .map_err(serde::de::Error::custom)?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| serde::de::Error::custom(format!("ambiguous local time: {}", raw)))
    }
}
