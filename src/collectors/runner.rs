//! Bounded execution of external commands.
//!
//! Every external tool the collector touches goes through a [`CommandRunner`].
//! The runner never returns an error: spawn failures and timeouts are folded
//! into [`CommandStatus`] so callers can fall back to the next strategy.

use std::fmt;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use log::{debug, warn};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::constants::{EXIT_DRAIN_SECS, READER_GRACE_MILLIS};

/// An external program and its argv. Never passed through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Append a single argument, e.g. a path computed at runtime
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Run a fixed PowerShell script.
    ///
    /// This is the only constructor whose command line gets interpreted by a
    /// shell. It takes `&'static str` so that only compiled-in scripts can be
    /// used; collected data must never be spliced into one.
    pub fn powershell(script: &'static str) -> Self {
        Self::new(
            "powershell",
            &["-NoProfile", "-NonInteractive", "-Command", script],
        )
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Final status of an invocation.
///
/// `TimedOut` and `LaunchFailed` mean the runner itself failed. They are
/// separate variants, so no exit code a real process produces can be
/// mistaken for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "exit_status", rename_all = "snake_case")]
pub enum CommandStatus {
    Exited(i32),
    /// Terminated by a signal without an exit code (Unix)
    Signaled,
    TimedOut,
    LaunchFailed,
}

/// Captured result of an external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl CommandResult {
    pub fn launch_failed(message: impl Into<String>, duration: Duration) -> Self {
        Self {
            status: CommandStatus::LaunchFailed,
            stdout: String::new(),
            stderr: message.into(),
            duration,
        }
    }

    /// True when the status is the runner-failure sentinel
    pub fn is_runner_failure(&self) -> bool {
        matches!(
            self.status,
            CommandStatus::TimedOut | CommandStatus::LaunchFailed
        )
    }

    pub fn success(&self) -> bool {
        self.status == CommandStatus::Exited(0)
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self.status {
            CommandStatus::Exited(code) => Some(code),
            _ => None,
        }
    }

    /// stdout followed by stderr
    pub fn output_text(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Executes external commands under a wall-clock bound
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec, limit: Duration) -> CommandResult;
}

/// [`CommandRunner`] backed by `tokio::process`
#[derive(Debug, Clone, Default)]
pub struct BoundedRunner;

impl BoundedRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl CommandRunner for BoundedRunner {
    async fn run(&self, spec: &CommandSpec, limit: Duration) -> CommandResult {
        let start = Instant::now();
        debug!("Running `{}` with timeout {:?}", spec, limit);

        let mut child = match Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                debug!("Failed to launch `{}`: {}", spec.program, e);
                return CommandResult::launch_failed(
                    format!("failed to launch {}: {}", spec.program, e),
                    start.elapsed(),
                );
            }
        };

        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let (status, grace) = match timeout(limit, child.wait()).await {
            Ok(Ok(exit)) => {
                let status = match exit.code() {
                    Some(code) => CommandStatus::Exited(code),
                    None => CommandStatus::Signaled,
                };
                // Pipes held open by a grandchild may not outlive the limit
                let remaining = limit.saturating_sub(start.elapsed());
                let grace = remaining
                    .min(Duration::from_secs(EXIT_DRAIN_SECS))
                    .max(Duration::from_millis(READER_GRACE_MILLIS));
                (status, grace)
            }
            Ok(Err(e)) => {
                warn!("Failed waiting on `{}`: {}", spec, e);
                let _ = child.start_kill();
                (CommandStatus::LaunchFailed, Duration::from_millis(READER_GRACE_MILLIS))
            }
            Err(_) => {
                warn!("`{}` exceeded {:?}, terminating it", spec, limit);
                if let Err(e) = child.kill().await {
                    debug!("Failed to kill `{}`: {}", spec.program, e);
                }
                (CommandStatus::TimedOut, Duration::from_millis(READER_GRACE_MILLIS))
            }
        };

        let (stdout, mut stderr) = tokio::join!(drain(stdout, grace), drain(stderr, grace));
        if status == CommandStatus::TimedOut {
            if !stderr.is_empty() && !stderr.ends_with('\n') {
                stderr.push('\n');
            }
            stderr.push_str(&format!("[timed out after {} seconds]", limit.as_secs_f64()));
        }

        let duration = start.elapsed();
        debug!("`{}` finished with {:?} in {:?}", spec, status, duration);

        CommandResult {
            status,
            stdout,
            stderr,
            duration,
        }
    }
}

type SharedBuffer = Arc<Mutex<Vec<u8>>>;

/// Drain a child pipe into a buffer that stays readable if the task is aborted
fn spawn_reader<R>(source: Option<R>) -> (SharedBuffer, Option<JoinHandle<()>>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let buffer = SharedBuffer::default();
    let handle = source.map(|mut reader| {
        let sink = Arc::clone(&buffer);
        tokio::spawn(async move {
            let mut chunk = [0u8; 8192];
            loop {
                match reader.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if let Ok(mut buf) = sink.lock() {
                            buf.extend_from_slice(&chunk[..n]);
                        }
                    }
                }
            }
        })
    });
    (buffer, handle)
}

async fn drain(reader: (SharedBuffer, Option<JoinHandle<()>>), grace: Duration) -> String {
    let (buffer, handle) = reader;
    if let Some(mut handle) = handle {
        // A grandchild can hold the pipe open after the child is gone
        if timeout(grace, &mut handle).await.is_err() {
            handle.abort();
        }
    }
    let bytes = buffer.lock().map(|b| b.clone()).unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}
