//! Supervised relaunch of this program as a child process.
//!
//! # Responsibilities
//! - Relaunch the binary with the same configuration flags
//! - Drain the child's stdout and stderr line by line, concurrently
//! - Return only after both drains saw end-of-stream and the child was reaped
//!
//! # Design Decisions
//! - The child is spawned before the drain tasks exist, so no drain can read
//!   from an unstarted pipe
//! - Launch failures and non-zero exits are reported, never retried

use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinError;

use crate::cli::ConfigFlags;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to launch {program:?}: {source}")]
    Launch {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("child {0} was not captured")]
    MissingPipe(&'static str),

    #[error("reading child {stream:?} failed: {source}")]
    Drain {
        stream: OutputStream,
        #[source]
        source: io::Error,
    },

    #[error("waiting for child failed: {0}")]
    Wait(#[source] io::Error),

    #[error("supervisor task failed: {0}")]
    Task(#[from] JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Outcome of a supervised run.
#[derive(Debug)]
pub struct ExitReport {
    pub status: ExitStatus,
    pub stdout_lines: usize,
    pub stderr_lines: usize,
}

pub struct Supervisor {
    program: PathBuf,
    args: Vec<String>,
}

impl Supervisor {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Supervise a fresh copy of the running executable.
    pub fn relaunch_self(flags: &ConfigFlags) -> io::Result<Self> {
        Ok(Self::new(std::env::current_exe()?, flags.filter()))
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Run the child, relaying its output to this process's stdout and stderr.
    pub async fn exec(&self) -> Result<ExitReport, SupervisorError> {
        self.exec_with(|stream, line| match stream {
            OutputStream::Stdout => println!("{line}"),
            OutputStream::Stderr => eprintln!("{line}"),
        })
        .await
    }

    /// Run the child, handing every output line to `relay`.
    pub async fn exec_with<R>(&self, relay: R) -> Result<ExitReport, SupervisorError>
    where
        R: Fn(OutputStream, &str) + Send + Sync + 'static,
    {
        tracing::trace!(program = ?self.program, args = ?self.args, "Launching child instance");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| {
                tracing::error!(program = ?self.program, error = %source, "Child launch failed");
                SupervisorError::Launch {
                    program: self.program.clone(),
                    source,
                }
            })?;

        tracing::info!(pid = child.id(), program = ?self.program, "Child instance started");

        let stdout = child.stdout.take().ok_or(SupervisorError::MissingPipe("stdout"))?;
        let stderr = child.stderr.take().ok_or(SupervisorError::MissingPipe("stderr"))?;

        let relay = Arc::new(relay);
        let stdout_task = tokio::spawn(drain(stdout, OutputStream::Stdout, relay.clone()));
        let stderr_task = tokio::spawn(drain(stderr, OutputStream::Stderr, relay));
        let wait_task = tokio::spawn(async move { child.wait().await });

        // All three must finish before the child handle and pipes are released.
        let (stdout_lines, stderr_lines, status) = tokio::join!(stdout_task, stderr_task, wait_task);

        let stdout_lines = stdout_lines?.map_err(|source| SupervisorError::Drain {
            stream: OutputStream::Stdout,
            source,
        })?;
        let stderr_lines = stderr_lines?.map_err(|source| SupervisorError::Drain {
            stream: OutputStream::Stderr,
            source,
        })?;
        let status = status?.map_err(SupervisorError::Wait)?;

        if status.success() {
            tracing::info!(%status, "Child instance exited");
        } else {
            tracing::warn!(%status, "Child instance exited unsuccessfully");
        }

        Ok(ExitReport {
            status,
            stdout_lines,
            stderr_lines,
        })
    }
}

async fn drain<S, R>(stream: S, kind: OutputStream, relay: Arc<R>) -> io::Result<usize>
where
    S: AsyncRead + Unpin,
    R: Fn(OutputStream, &str) + Send + Sync + 'static,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    let mut count = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        relay(kind, line.trim_end_matches(['\n', '\r']));
        count += 1;
    }
    tracing::debug!(stream = ?kind, lines = count, "Child stream closed");
    Ok(count)
}
