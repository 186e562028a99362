use parking_lot::Mutex;
use std::io::{self, Read};
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Raw result of one launch attempt, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed {
        code: i32,
        stdout: String,
        stderr: String,
    },
    TimedOut {
        stdout: String,
        stderr: String,
        limit: Duration,
    },
    LaunchFailed {
        reason: String,
    },
}

/// Render an argument vector the way a user would type it, quoting tokens
/// that contain whitespace or shell metacharacters. Display only: nothing
/// rendered here is ever handed to a shell.
pub fn render_command<S: AsRef<str>>(program: &str, args: &[S]) -> String {
    let mut words = Vec::with_capacity(args.len() + 1);
    words.push(program);
    words.extend(args.iter().map(|a| a.as_ref()));
    shell_words::join(words)
}

/// Launches one external program at a time and waits for it, bounded by a timeout.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `program` with `args` passed as literal tokens (no shell), inside
    /// `cwd` when given. Stdin is closed. Never retries.
    pub fn run<S: AsRef<str>>(&self, program: &str, args: &[S], cwd: Option<&Path>) -> Outcome {
        if program.trim().is_empty() {
            return Outcome::LaunchFailed {
                reason: "empty executable name".to_string(),
            };
        }

        let mut command = Command::new(program);
        command
            .args(args.iter().map(|a| a.as_ref()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = cwd {
            if !dir.is_dir() {
                return Outcome::LaunchFailed {
                    reason: format!("working directory {} does not exist", dir.display()),
                };
            }
            command.current_dir(dir).env("PWD", dir);
        }

        debug!(program, args = ?args.iter().map(|a| a.as_ref()).collect::<Vec<_>>(), "spawning");

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(err) => {
                let reason = describe_spawn_error(program, &err);
                warn!(program, error = %err, "launch failed");
                return Outcome::LaunchFailed { reason };
            }
        };

        let stdout = child.stdout.take().map(Capture::start);
        let stderr = child.stderr.take().map(Capture::start);

        // None when the timeout is too large to represent; wait without a limit.
        let deadline = Instant::now().checked_add(self.timeout);
        match wait_until(&mut child, deadline) {
            Ok(Some(status)) => {
                let now = Instant::now();
                let drain_until = match deadline {
                    Some(deadline) => deadline.max(now).checked_add(DRAIN_GRACE).unwrap_or(deadline),
                    None => now + DRAIN_GRACE,
                };
                let code = exit_code(status);
                debug!(program, code, "completed");
                Outcome::Completed {
                    code,
                    stdout: Capture::finish(stdout, drain_until),
                    stderr: Capture::finish(stderr, drain_until),
                }
            }
            Ok(None) => {
                warn!(program, timeout_ms = self.timeout.as_millis() as u64, "timed out, killing");
                let _ = child.kill();
                let _ = child.wait();
                let drain_until = Instant::now() + DRAIN_GRACE;
                Outcome::TimedOut {
                    stdout: Capture::finish(stdout, drain_until),
                    stderr: Capture::finish(stderr, drain_until),
                    limit: self.timeout,
                }
            }
            Err(err) => {
                warn!(program, error = %err, "wait failed");
                let _ = child.kill();
                let _ = child.wait();
                Outcome::LaunchFailed {
                    reason: format!("{}: {}", program, err),
                }
            }
        }
    }
}

/// Poll the child until it exits or the deadline passes. `Ok(None)` means
/// the deadline passed with the child still running.
fn wait_until(child: &mut Child, deadline: Option<Instant>) -> io::Result<Option<ExitStatus>> {
    let Some(deadline) = deadline else {
        return child.wait().map(Some);
    };
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => -1,
    }
}

fn describe_spawn_error(program: &str, err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => format!("{}: command not found", program),
        io::ErrorKind::PermissionDenied => format!("{}: permission denied", program),
        _ => format!("{}: {}", program, err),
    }
}

/// Pipe drained on a background thread so a chatty child cannot fill the
/// pipe buffer and stall. Bytes read so far stay readable even if the
/// thread never finishes.
struct Capture {
    buffer: Arc<Mutex<Vec<u8>>>,
    done: Receiver<()>,
}

impl Capture {
    fn start<R: Read + Send + 'static>(mut reader: R) -> Self {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);
        let (tx, done) = mpsc::channel();

        thread::spawn(move || {
            let mut chunk = [0u8; 4096];
            loop {
                match reader.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => sink.lock().extend_from_slice(&chunk[..n]),
                    Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
            let _ = tx.send(());
        });

        Self { buffer, done }
    }

    fn finish(capture: Option<Self>, until: Instant) -> String {
        let Some(capture) = capture else {
            return String::new();
        };
        let _ = capture
            .done
            .recv_timeout(until.saturating_duration_since(Instant::now()));
        let bytes = capture.buffer.lock();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        text
    }
}
