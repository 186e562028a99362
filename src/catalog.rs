//! Typed wrappers around the supported Linux utilities.
//!
//! Each entry validates its options, builds an argument vector, runs it
//! through [`ProcessRunner`] inside the toolkit's working directory, and logs
//! exactly one [`ExecutionResult`] to the toolkit history. Rejected options
//! surface as [`ArgError`] and are not logged.

use crate::error::ArgError;
use crate::executor::{render_command, ProcessRunner};
use crate::history::HistoryLog;
use crate::storage::ExecutionResult;
use anyhow::{Context, Result};
use parking_lot::RwLock;
use regex::Regex;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    /// ls's own default order; adds no flag.
    Name,
    Extension,
    Size,
    Time,
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SortBy::Name),
            "ext" | "extension" => Ok(SortBy::Extension),
            "size" => Ok(SortBy::Size),
            "time" => Ok(SortBy::Time),
            _ => Err("expected name, ext, size or time".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LsOptions {
    pub path: String,
    pub long: bool,
    pub all: bool,
    pub sort: Option<SortBy>,
}

impl Default for LsOptions {
    fn default() -> Self {
        Self {
            path: ".".to_string(),
            long: false,
            all: false,
            sort: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MkdirOptions {
    pub path: String,
    pub parents: bool,
    pub verbose: bool,
    pub mode: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TouchOptions {
    pub path: String,
    /// Do not create the file if it is missing (`touch -c`).
    pub no_create: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RmOptions {
    pub path: String,
    pub recursive: bool,
    pub force: bool,
    pub verbose: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChmodOptions {
    /// Octal (`755`) or symbolic (`u+x,go-w`) mode.
    pub mode: String,
    pub path: String,
    pub recursive: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChownOptions {
    pub owner: String,
    pub group: Option<String>,
    pub path: String,
    pub recursive: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PsOptions {
    pub all: bool,
    pub full: bool,
    pub user: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KillOptions {
    pub pid: u32,
    /// Signal name (`TERM`, `SIGKILL`) or number (`9`). Defaults to TERM.
    pub signal: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrepOptions {
    pub pattern: String,
    pub paths: Vec<String>,
    pub ignore_case: bool,
    pub recursive: bool,
    pub line_number: bool,
    pub invert: bool,
    pub count: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Dir,
    Symlink,
}

impl FromStr for FileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "f" | "file" => Ok(FileKind::File),
            "d" | "dir" => Ok(FileKind::Dir),
            "l" | "link" | "symlink" => Ok(FileKind::Symlink),
            _ => Err("expected f, d or l".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindOptions {
    pub path: String,
    /// Shell-style name pattern, e.g. `*.py`. Passed to find verbatim.
    pub name: Option<String>,
    pub kind: Option<FileKind>,
    pub max_depth: Option<u32>,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            path: ".".to_string(),
            name: None,
            kind: None,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopOptions {
    pub iterations: u32,
    pub delay_secs: Option<f64>,
}

impl Default for TopOptions {
    fn default() -> Self {
        Self {
            iterations: 1,
            delay_secs: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemUnit {
    Bytes,
    Kibi,
    Mebi,
    Gibi,
    Human,
}

impl FromStr for MemUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "b" | "bytes" => Ok(MemUnit::Bytes),
            "k" | "kilo" => Ok(MemUnit::Kibi),
            "m" | "mega" => Ok(MemUnit::Mebi),
            "g" | "giga" => Ok(MemUnit::Gibi),
            "h" | "human" => Ok(MemUnit::Human),
            _ => Err("expected b, k, m, g or h".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FreeOptions {
    pub unit: Option<MemUnit>,
}

/// Owns the working directory and history that every entry runs against.
#[derive(Debug)]
pub struct Toolkit {
    runner: ProcessRunner,
    cwd: RwLock<PathBuf>,
    history: HistoryLog,
}

impl Toolkit {
    /// Start in the process's current directory.
    pub fn new(timeout: Duration) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        Ok(Self::with_dir(cwd, timeout))
    }

    pub fn with_dir(dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            runner: ProcessRunner::new(timeout),
            cwd: RwLock::new(dir.into()),
            history: HistoryLog::new(),
        }
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn working_dir(&self) -> PathBuf {
        self.cwd.read().clone()
    }

    pub fn timeout(&self) -> Duration {
        self.runner.timeout()
    }

    /// Run an arbitrary executable with literal arguments, logged like any entry.
    pub fn exec<S: AsRef<str>>(&self, program: &str, args: &[S]) -> ExecutionResult {
        let args = args.iter().map(|a| a.as_ref().to_string()).collect();
        self.invoke(program, args)
    }

    pub fn ls(&self, opts: &LsOptions) -> Result<ExecutionResult, ArgError> {
        require("ls", "path", &opts.path)?;
        let mut args = Vec::new();
        if opts.long {
            args.push("-l".to_string());
        }
        if opts.all {
            args.push("-a".to_string());
        }
        match opts.sort {
            Some(SortBy::Extension) => args.push("-X".to_string()),
            Some(SortBy::Size) => args.push("-S".to_string()),
            Some(SortBy::Time) => args.push("-t".to_string()),
            Some(SortBy::Name) | None => {}
        }
        args.push("--".to_string());
        args.push(opts.path.clone());
        Ok(self.invoke("ls", args))
    }

    pub fn pwd(&self) -> ExecutionResult {
        self.invoke_with("pwd", Vec::new(), |out| {
            summary(&[("current_directory", out.trim_end_matches('\n'))])
        })
    }

    /// Change the toolkit's own working directory. No process is launched;
    /// the process-wide directory is left alone.
    pub fn cd(&self, path: &str) -> Result<ExecutionResult, ArgError> {
        require("cd", "path", path)?;
        let base = self.working_dir();
        let command = render_command("cd", &[path]);

        let result = match resolve_dir(&base, path) {
            Ok(target) => {
                info!(from = %base.display(), to = %target.display(), "working directory changed");
                let shown = target.to_string_lossy().into_owned();
                *self.cwd.write() = target;
                ExecutionResult::internal(command, Ok(String::new()), base)
                    .with_summary(summary(&[("current_directory", shown.as_str())]))
            }
            Err(reason) => ExecutionResult::internal(command, Err(format!("cd: {}: {}", path, reason)), base),
        };
        Ok(self.record(result))
    }

    pub fn mkdir(&self, opts: &MkdirOptions) -> Result<ExecutionResult, ArgError> {
        require("mkdir", "path", &opts.path)?;
        let mut args = Vec::new();
        if opts.parents {
            args.push("-p".to_string());
        }
        if opts.verbose {
            args.push("-v".to_string());
        }
        if let Some(mode) = opts.mode {
            if mode > 0o7777 {
                return Err(ArgError::invalid("mkdir", "mode", format!("{:o}", mode), "must be at most 7777"));
            }
            args.push("-m".to_string());
            args.push(format!("{:o}", mode));
        }
        args.push("--".to_string());
        args.push(opts.path.clone());
        Ok(self.invoke("mkdir", args))
    }

    pub fn touch(&self, opts: &TouchOptions) -> Result<ExecutionResult, ArgError> {
        require("touch", "path", &opts.path)?;
        let mut args = Vec::new();
        if opts.no_create {
            args.push("-c".to_string());
        }
        args.push("--".to_string());
        args.push(opts.path.clone());
        Ok(self.invoke("touch", args))
    }

    pub fn rm(&self, opts: &RmOptions) -> Result<ExecutionResult, ArgError> {
        require("rm", "path", &opts.path)?;
        let mut args = Vec::new();
        if opts.recursive {
            args.push("-r".to_string());
        }
        if opts.force {
            args.push("-f".to_string());
        }
        if opts.verbose {
            args.push("-v".to_string());
        }
        args.push("--".to_string());
        args.push(opts.path.clone());
        Ok(self.invoke("rm", args))
    }

    pub fn chmod(&self, opts: &ChmodOptions) -> Result<ExecutionResult, ArgError> {
        require("chmod", "mode", &opts.mode)?;
        require("chmod", "path", &opts.path)?;
        if !mode_pattern().is_match(&opts.mode) {
            return Err(ArgError::invalid("chmod", "mode", &opts.mode, "expected octal (755) or symbolic (u+x) mode"));
        }
        let mut args = Vec::new();
        if opts.recursive {
            args.push("-R".to_string());
        }
        args.push("--".to_string());
        args.push(opts.mode.clone());
        args.push(opts.path.clone());
        Ok(self.invoke("chmod", args))
    }

    pub fn chown(&self, opts: &ChownOptions) -> Result<ExecutionResult, ArgError> {
        require("chown", "owner", &opts.owner)?;
        require("chown", "path", &opts.path)?;
        check_account("chown", "owner", &opts.owner)?;
        let spec = match &opts.group {
            Some(group) => {
                check_account("chown", "group", group)?;
                format!("{}:{}", opts.owner, group)
            }
            None => opts.owner.clone(),
        };
        let mut args = Vec::new();
        if opts.recursive {
            args.push("-R".to_string());
        }
        args.push("--".to_string());
        args.push(spec);
        args.push(opts.path.clone());
        Ok(self.invoke("chown", args))
    }

    pub fn ps(&self, opts: &PsOptions) -> Result<ExecutionResult, ArgError> {
        let mut args = Vec::new();
        if opts.all {
            args.push("-e".to_string());
        }
        if opts.full {
            args.push("-f".to_string());
        }
        if let Some(user) = &opts.user {
            check_account("ps", "user", user)?;
            args.push("-u".to_string());
            args.push(user.clone());
        }
        Ok(self.invoke("ps", args))
    }

    pub fn kill(&self, opts: &KillOptions) -> Result<ExecutionResult, ArgError> {
        if opts.pid == 0 || opts.pid > i32::MAX as u32 {
            return Err(ArgError::invalid("kill", "pid", opts.pid.to_string(), "must be a positive process id"));
        }
        let mut args = Vec::new();
        if let Some(signal) = &opts.signal {
            args.push("-s".to_string());
            args.push(normalize_signal(signal)?);
        }
        args.push(opts.pid.to_string());
        Ok(self.invoke("kill", args))
    }

    pub fn grep(&self, opts: &GrepOptions) -> Result<ExecutionResult, ArgError> {
        let paths = if !opts.paths.is_empty() {
            opts.paths.clone()
        } else if opts.recursive {
            vec![".".to_string()]
        } else {
            return Err(ArgError::missing("grep", "path"));
        };
        for path in &paths {
            require("grep", "path", path)?;
        }

        let mut args = Vec::new();
        for (on, flag) in [
            (opts.ignore_case, "-i"),
            (opts.recursive, "-r"),
            (opts.line_number, "-n"),
            (opts.invert, "-v"),
            (opts.count, "-c"),
        ] {
            if on {
                args.push(flag.to_string());
            }
        }
        args.push("-e".to_string());
        args.push(opts.pattern.clone());
        args.push("--".to_string());
        args.extend(paths);
        Ok(self.invoke("grep", args))
    }

    pub fn find(&self, opts: &FindOptions) -> Result<ExecutionResult, ArgError> {
        require("find", "path", &opts.path)?;
        // find has no end-of-options marker for its starting points.
        let start = if opts.path.starts_with('-') {
            format!("./{}", opts.path)
        } else {
            opts.path.clone()
        };

        let mut args = vec![start];
        if let Some(depth) = opts.max_depth {
            args.push("-maxdepth".to_string());
            args.push(depth.to_string());
        }
        if let Some(kind) = opts.kind {
            args.push("-type".to_string());
            args.push(
                match kind {
                    FileKind::File => "f",
                    FileKind::Dir => "d",
                    FileKind::Symlink => "l",
                }
                .to_string(),
            );
        }
        if let Some(name) = &opts.name {
            require("find", "name", name)?;
            args.push("-name".to_string());
            args.push(name.clone());
        }
        Ok(self.invoke("find", args))
    }

    /// One batch-mode snapshot (or `iterations` of them) of the process table.
    pub fn top(&self, opts: &TopOptions) -> Result<ExecutionResult, ArgError> {
        if opts.iterations == 0 {
            return Err(ArgError::invalid("top", "iterations", "0", "must be at least 1"));
        }
        let mut args = vec!["-b".to_string(), "-n".to_string(), opts.iterations.to_string()];
        if let Some(delay) = opts.delay_secs {
            if !(delay.is_finite() && delay > 0.0) {
                return Err(ArgError::invalid("top", "delay", delay.to_string(), "must be a positive number of seconds"));
            }
            args.push("-d".to_string());
            args.push(delay.to_string());
        }
        Ok(self.invoke("top", args))
    }

    pub fn free(&self, opts: &FreeOptions) -> ExecutionResult {
        let mut args = Vec::new();
        if let Some(unit) = opts.unit {
            args.push(
                match unit {
                    MemUnit::Bytes => "-b",
                    MemUnit::Kibi => "-k",
                    MemUnit::Mebi => "-m",
                    MemUnit::Gibi => "-g",
                    MemUnit::Human => "-h",
                }
                .to_string(),
            );
        }
        self.invoke_with("free", args, parse_free_summary)
    }

    pub fn whoami(&self) -> ExecutionResult {
        self.invoke_with("whoami", Vec::new(), |out| summary(&[("username", out.trim())]))
    }

    fn invoke(&self, program: &str, args: Vec<String>) -> ExecutionResult {
        self.invoke_with(program, args, |_| BTreeMap::new())
    }

    /// Run, normalize, summarize (on success), then log. Every path through
    /// here appends exactly one record.
    fn invoke_with<F>(&self, program: &str, args: Vec<String>, summarize: F) -> ExecutionResult
    where
        F: FnOnce(&str) -> BTreeMap<String, String>,
    {
        let cwd = self.working_dir();
        let command = render_command(program, &args);
        let started = Instant::now();
        let outcome = self.runner.run(program, &args, Some(&cwd));
        let mut result = ExecutionResult::normalize(command, outcome, cwd, started.elapsed());
        if result.success {
            let summary = summarize(&result.stdout);
            result = result.with_summary(summary);
        }
        self.record(result)
    }

    fn record(&self, result: ExecutionResult) -> ExecutionResult {
        self.history.append(result.clone());
        result
    }
}

fn require(entry: &str, name: &str, value: &str) -> Result<(), ArgError> {
    if value.is_empty() {
        return Err(ArgError::missing(entry, name));
    }
    Ok(())
}

fn resolve_dir(base: &Path, path: &str) -> Result<PathBuf, String> {
    let raw = if path == "~" || path.starts_with("~/") {
        let home = dirs::home_dir().ok_or_else(|| "home directory is unknown".to_string())?;
        home.join(path.trim_start_matches('~').trim_start_matches('/'))
    } else {
        base.join(path)
    };

    match raw.canonicalize() {
        Ok(target) if target.is_dir() => Ok(target),
        Ok(_) => Err("Not a directory".to_string()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err("No such file or directory".to_string()),
        Err(err) => Err(err.to_string()),
    }
}

fn mode_pattern() -> &'static Regex {
    static MODE: OnceLock<Regex> = OnceLock::new();
    MODE.get_or_init(|| {
        Regex::new(r"^(?:[0-7]{1,4}|[ugoa]*(?:[-+=](?:[rwxXst]*|[ugo]))+(?:,[ugoa]*(?:[-+=](?:[rwxXst]*|[ugo]))+)*)$")
            .expect("mode pattern compiles")
    })
}

fn account_pattern() -> &'static Regex {
    static ACCOUNT: OnceLock<Regex> = OnceLock::new();
    ACCOUNT.get_or_init(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.-]*$").expect("account pattern compiles"))
}

fn check_account(entry: &str, name: &str, value: &str) -> Result<(), ArgError> {
    if !account_pattern().is_match(value) {
        return Err(ArgError::invalid(entry, name, value, "not a valid user or group name"));
    }
    Ok(())
}

fn normalize_signal(signal: &str) -> Result<String, ArgError> {
    let upper = signal.to_ascii_uppercase();
    let name = upper.strip_prefix("SIG").unwrap_or(&upper);
    let valid = match name.parse::<u32>() {
        Ok(n) => n <= 64,
        Err(_) => !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-'),
    };
    if !valid {
        return Err(ArgError::invalid("kill", "signal", signal, "expected a signal name or number"));
    }
    Ok(name.to_string())
}

fn summary(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Pick the `Mem:` row out of `free` output.
fn parse_free_summary(stdout: &str) -> BTreeMap<String, String> {
    let Some(row) = stdout.lines().find(|l| l.starts_with("Mem:")) else {
        return BTreeMap::new();
    };
    let values: Vec<&str> = row.split_whitespace().skip(1).collect();
    let columns = [("total", 0), ("used", 1), ("free", 2), ("available", 5)];
    let pairs: Vec<(&str, &str)> = columns
        .iter()
        .filter_map(|(name, idx)| values.get(*idx).map(|v| (*name, *v)))
        .collect();
    summary(&pairs)
}
