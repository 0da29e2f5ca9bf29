//! OS signal handling.
//!
//! # Responsibilities
//! - Register interest in SIGINT and SIGTERM once, before serving starts
//! - On the first signal, wait a grace interval so peers can observe this
//!   instance deregistering, then terminate and exit with status 0
//!
//! # Design Decisions
//! - Runs as a detached tokio task next to the serve loop
//! - Signals after the first are absorbed, never re-entering termination
//! - Signal source and exit hook are injectable; the OS path uses the same task

use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Time given to peer NFs to deregister before this process tears down.
pub const GRACE_PERIOD: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    Interrupt,
    Terminate,
}

/// Something the watcher can shut down.
pub trait Terminate: Send + Sync {
    /// Run cleanup. Returns false if cleanup had already run.
    fn terminate(&self) -> bool;
}

/// Stream of termination signals.
#[async_trait]
pub trait SignalSource: Send {
    /// Next signal, or `None` once the source is closed.
    async fn recv(&mut self) -> Option<TerminationSignal>;
}

/// SIGINT and SIGTERM as delivered by the OS.
pub struct OsSignals {
    interrupt: Signal,
    terminate: Signal,
}

impl OsSignals {
    /// Install the handlers. Signals delivered after this returns are queued.
    pub fn register() -> io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }
}

#[async_trait]
impl SignalSource for OsSignals {
    async fn recv(&mut self) -> Option<TerminationSignal> {
        tokio::select! {
            Some(()) = self.interrupt.recv() => Some(TerminationSignal::Interrupt),
            Some(()) = self.terminate.recv() => Some(TerminationSignal::Terminate),
            else => None,
        }
    }
}

/// In-process signal source, for driving the watcher without real signals.
pub struct ChannelSignals {
    rx: mpsc::UnboundedReceiver<TerminationSignal>,
}

impl ChannelSignals {
    pub fn new() -> (mpsc::UnboundedSender<TerminationSignal>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }
}

#[async_trait]
impl SignalSource for ChannelSignals {
    async fn recv(&mut self) -> Option<TerminationSignal> {
        self.rx.recv().await
    }
}

type ExitHook = Box<dyn FnOnce(i32) + Send>;

/// Background task turning the first termination signal into one shutdown.
pub struct SignalWatcher {
    source: Box<dyn SignalSource>,
    grace: Duration,
    exit: ExitHook,
}

impl SignalWatcher {
    /// Watch real OS signals and exit the process when done.
    pub fn os() -> io::Result<Self> {
        Ok(Self::new(OsSignals::register()?, GRACE_PERIOD, |code| {
            std::process::exit(code);
        }))
    }

    pub fn new<S, F>(source: S, grace: Duration, exit: F) -> Self
    where
        S: SignalSource + 'static,
        F: FnOnce(i32) + Send + 'static,
    {
        Self {
            source: Box::new(source),
            grace,
            exit: Box::new(exit),
        }
    }

    /// Start watching. The returned handle may be dropped to detach.
    pub fn spawn(self, target: Arc<dyn Terminate>) -> WatcherHandle {
        WatcherHandle {
            join: tokio::spawn(self.run(target)),
        }
    }

    async fn run(mut self, target: Arc<dyn Terminate>) -> Option<TerminationSignal> {
        let Some(first) = self.source.recv().await else {
            tracing::debug!("Signal source closed before any signal");
            return None;
        };

        tracing::info!(
            signal = ?first,
            grace_ms = self.grace.as_millis() as u64,
            "Termination signal received, waiting for peers to deregister"
        );

        let grace = tokio::time::sleep(self.grace);
        tokio::pin!(grace);
        loop {
            tokio::select! {
                _ = &mut grace => break,
                Some(extra) = self.source.recv() => {
                    tracing::debug!(signal = ?extra, "Termination already in progress, ignoring signal");
                }
            }
        }

        target.terminate();
        (self.exit)(0);
        Some(first)
    }
}

/// Ownership of the running watcher task. Joining consumes it.
pub struct WatcherHandle {
    join: JoinHandle<Option<TerminationSignal>>,
}

impl WatcherHandle {
    /// Wait for the watcher to finish; yields the signal that triggered it.
    pub async fn join(self) -> Option<TerminationSignal> {
        self.join.await.ok().flatten()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}
