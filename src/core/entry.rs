//! # ProcessEntry: single-process state machine.
//!
//! Owns the configuration and the live [`ChildHandle`] of one managed process and
//! drives it through its lifecycle. Each entry runs as one actor task fed by an
//! unbounded command channel, so transitions of one entry are strictly sequential.
//!
//! ## Architecture
//! ```text
//! Host ──► EntryHandle.request(Command) ──► [mpsc queue] ──► ProcessEntry::run()
//!
//! loop select (biased) {
//!   ├─► live child exited  → on_exit()        (Started → Stopped, `stopped` or `error`)
//!   └─► next command       → handle(Command)  (runs to a terminal state before the next one)
//! }
//!
//! launch():   Starting ─► spawner.spawn() ─┬─ Ok  ─► Started, publish `started`, start pumps
//!                                          └─ Err ─► Stopped, publish `error`
//! restart():  Restarting, publish `restarting` ─► teardown() ─► [replace config] ─► launch()
//! stop():     Stopping ─► teardown() ─► Stopped, publish `stopped`
//! teardown(): cancel pumps ─► Terminate ─► wait exit (≤ stop_timeout) ─► Kill ─► wait exit
//! ```
//!
//! ## Rules
//! - At most one live handle at any time; a new one is spawned only after the old exit is confirmed.
//! - A command issued mid-transition (e.g. `stop` while `Starting`) is queued and applied once
//!   the current transition settles.
//! - Output pumps of a handle are cancelled before that handle is terminated, so no output of a
//!   torn-down process is published afterwards.
//! - Stopping an entry that is already down is a silent no-op.
//! - Deferred publications (`started`, `stopped`) are flushed before the next command runs,
//!   so listeners observe every entry's events in causal order.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use futures::StreamExt;
use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot};
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::error::{ProcessError, unexpected_exit};
use crate::events::{Bus, Event, EventKind};
use crate::process::{
    ByteStream, ChildHandle, ExitInfo, ProcessConfig, ProcessInfo, ProcessState, Spawner,
    StopSignal,
};

type Reply<T> = oneshot::Sender<Result<T, ProcessError>>;

/// Requests processed by the entry actor, one at a time.
pub(crate) enum Command {
    /// First start of a freshly registered entry.
    Start { reply: Reply<ProcessInfo> },
    /// Restart cycle, regardless of state; a supplied config replaces the stored one.
    Restart {
        config: Option<ProcessConfig>,
        reply: Reply<ProcessInfo>,
    },
    /// Replace the stored config for the next start, leaving any live process alone.
    Configure {
        config: ProcessConfig,
        reply: Reply<ProcessInfo>,
    },
    /// Stop the live process, if any.
    Stop { reply: Reply<()> },
}

/// The live process of an entry.
struct Live {
    control: ChildHandle,
    pumps: CancellationToken,
}

/// State machine of one managed process.
pub(crate) struct ProcessEntry {
    id: Arc<str>,
    config: ProcessConfig,
    state: ProcessState,
    live: Option<Live>,
    pid: Option<u32>,
    started_at: Option<SystemTime>,
    last_exit: Option<ExitInfo>,
    restarts: u32,

    bus: Bus,
    spawner: Arc<dyn Spawner>,
    stop_timeout: Option<Duration>,
    view: Arc<RwLock<ProcessInfo>>,
}

impl ProcessEntry {
    /// Creates an `Idle` entry and the shared view the host reads from.
    pub(crate) fn new(
        id: Arc<str>,
        config: ProcessConfig,
        bus: Bus,
        spawner: Arc<dyn Spawner>,
        stop_timeout: Option<Duration>,
    ) -> (Self, Arc<RwLock<ProcessInfo>>) {
        let view = Arc::new(RwLock::new(ProcessInfo::idle(
            Arc::clone(&id),
            config.clone(),
        )));
        let entry = Self {
            id,
            config,
            state: ProcessState::Idle,
            live: None,
            pid: None,
            started_at: None,
            last_exit: None,
            restarts: 0,
            bus,
            spawner,
            stop_timeout,
            view: Arc::clone(&view),
        };
        (entry, view)
    }

    /// Runs the actor until the host drops its handle; then tears down the live process.
    pub(crate) async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        loop {
            tokio::select! {
                biased;
                exit = wait_exit(&mut self.live) => self.on_exit(exit),
                cmd = rx.recv() => match cmd {
                    Some(cmd) => self.handle(cmd).await,
                    None => break,
                },
            }
        }

        if self.live.is_some() {
            tracing::debug!(process = %self.id, "host dropped; tearing down live process");
            self.teardown().await;
        }
    }

    async fn handle(&mut self, cmd: Command) {
        // A `stopped` from the previous command (or exit) must reach listeners first.
        self.bus.flush().await;

        match cmd {
            Command::Start { reply } => {
                let res = self.launch().await;
                let _ = reply.send(res);
            }
            Command::Restart { config, reply } => {
                let res = self.restart(config).await;
                let _ = reply.send(res);
            }
            Command::Configure { config, reply } => {
                self.config = config;
                self.sync_view();
                let _ = reply.send(Ok(self.info()));
            }
            Command::Stop { reply } => {
                self.stop().await;
                let _ = reply.send(Ok(()));
            }
        }
    }

    /// `Starting` → `Started`, or → `Stopped` with an `error` event.
    async fn launch(&mut self) -> Result<ProcessInfo, ProcessError> {
        self.transition(ProcessState::Starting);

        match self.spawner.spawn(&self.id, &self.config).await {
            Ok(mut child) => {
                let pumps = CancellationToken::new();
                let stdout = child.stdout.take();
                let stderr = child.stderr.take();

                self.pid = child.pid;
                self.started_at = Some(SystemTime::now());
                self.live = Some(Live {
                    control: child,
                    pumps: pumps.clone(),
                });
                self.transition(ProcessState::Started);
                tracing::debug!(process = %self.id, pid = ?self.pid, "process started");
                self.bus
                    .publish(Event::new(Arc::clone(&self.id), EventKind::Started).with_pid(self.pid));

                // Output is published inline; hold the pumps until `started` went out.
                self.bus.flush().await;
                if let Some(stream) = stdout {
                    self.pump(EventKind::Stdout, stream, pumps.clone());
                }
                if let Some(stream) = stderr {
                    self.pump(EventKind::Stderr, stream, pumps);
                }
                Ok(self.info())
            }
            Err(e) => {
                let reason: Arc<str> = Arc::from(e.to_string());
                tracing::warn!(process = %self.id, error = %reason, "spawn failed");

                self.transition(ProcessState::Stopped);
                self.bus.publish(
                    Event::new(Arc::clone(&self.id), EventKind::Error)
                        .with_reason(Arc::clone(&reason)),
                );
                Err(ProcessError::Spawn {
                    id: Arc::clone(&self.id),
                    reason,
                })
            }
        }
    }

    /// `Restarting` → teardown → `Starting` → `Started`.
    async fn restart(&mut self, config: Option<ProcessConfig>) -> Result<ProcessInfo, ProcessError> {
        self.restarts += 1;
        self.transition(ProcessState::Restarting);
        self.bus.publish(
            Event::new(Arc::clone(&self.id), EventKind::Restarting).with_pid(self.pid),
        );

        self.teardown().await;
        if let Some(config) = config {
            self.config = config;
        }
        self.launch().await
    }

    /// `Stopping` → `Stopped` once the exit is confirmed.
    async fn stop(&mut self) {
        if self.state.is_down() {
            return;
        }
        self.transition(ProcessState::Stopping);
        let exit = self.teardown().await;
        self.transition(ProcessState::Stopped);

        let mut ev = Event::new(Arc::clone(&self.id), EventKind::Stopped);
        if let Some(exit) = exit {
            ev = ev.with_exit(exit);
        }
        self.bus.publish(ev);
    }

    /// The live process went away without being asked to.
    fn on_exit(&mut self, exit: ExitInfo) {
        // Pumps are left running: output the child wrote before exiting is still delivered.
        self.live = None;
        self.pid = None;
        self.last_exit = Some(exit);
        self.transition(ProcessState::Stopped);

        if exit.success() {
            tracing::debug!(process = %self.id, %exit, "process exited");
            self.bus
                .publish(Event::new(Arc::clone(&self.id), EventKind::Stopped).with_exit(exit));
        } else {
            tracing::warn!(process = %self.id, %exit, "process exited unexpectedly");
            self.bus.publish(
                Event::new(Arc::clone(&self.id), EventKind::Error)
                    .with_reason(unexpected_exit(&exit))
                    .with_exit(exit),
            );
        }
    }

    /// Terminates the live process (if any) and waits for its exit confirmation.
    async fn teardown(&mut self) -> Option<ExitInfo> {
        let Live { control, pumps } = self.live.take()?;
        pumps.cancel();

        let ChildHandle {
            control: signals,
            exit: mut exit_rx,
            ..
        } = control;
        let _ = signals.send(StopSignal::Terminate);

        let exit = match self.stop_timeout {
            Some(limit) => match time::timeout(limit, &mut exit_rx).await {
                Ok(res) => res.unwrap_or_else(|_| ExitInfo::unknown()),
                Err(_elapsed) => {
                    tracing::warn!(
                        process = %self.id,
                        timeout = ?limit,
                        "process ignored terminate; killing"
                    );
                    let _ = signals.send(StopSignal::Kill);
                    exit_rx.await.unwrap_or_else(|_| ExitInfo::unknown())
                }
            },
            None => exit_rx.await.unwrap_or_else(|_| ExitInfo::unknown()),
        };

        self.pid = None;
        self.last_exit = Some(exit);
        Some(exit)
    }

    /// Republishes one output stream until it ends or the pumps are cancelled.
    fn pump(&self, kind: EventKind, mut stream: ByteStream, token: CancellationToken) {
        let bus = self.bus.clone();
        let id = Arc::clone(&self.id);
        let pid = self.pid;

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    chunk = stream.next() => match chunk {
                        Some(Ok(data)) => {
                            bus.publish(Event::new(Arc::clone(&id), kind).with_pid(pid).with_data(data));
                        }
                        Some(Err(e)) => {
                            tracing::debug!(process = %id, %kind, error = %e, "output stream failed");
                            break;
                        }
                        None => break,
                    },
                }
            }
        });
    }

    fn transition(&mut self, next: ProcessState) {
        tracing::trace!(process = %self.id, from = %self.state, to = %next, "transition");
        self.state = next;
        self.sync_view();
    }

    fn sync_view(&self) {
        *self.view.write() = self.info();
    }

    fn info(&self) -> ProcessInfo {
        ProcessInfo {
            id: Arc::clone(&self.id),
            state: self.state,
            config: self.config.clone(),
            pid: self.pid,
            started_at: self.started_at,
            last_exit: self.last_exit,
            restarts: self.restarts,
        }
    }
}

/// Resolves when the live child exits; pending forever while there is none.
async fn wait_exit(live: &mut Option<Live>) -> ExitInfo {
    match live {
        Some(live) => (&mut live.control.exit)
            .await
            .unwrap_or_else(|_| ExitInfo::unknown()),
        None => std::future::pending().await,
    }
}
