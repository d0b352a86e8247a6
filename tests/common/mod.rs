//! Scripted spawner and helpers shared by the integration tests.
//!
//! `FakeSpawner` reads a few conventions from the config:
//! - command `fail`            → spawn error
//! - arg `--slow`              → spawn takes 50ms
//! - arg `--ignore-term`       → `Terminate` is ignored, only `Kill` ends the child
#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use futures::channel::mpsc as fmpsc;
use procvisor::{
    ChildHandle, Event, ExitInfo, Host, HostConfig, ProcessConfig, SpawnError, Spawner,
    StopSignal, Topic,
};
use tokio::sync::oneshot;

struct FakeChild {
    id: String,
    pid: u32,
    stdout: fmpsc::UnboundedSender<io::Result<Bytes>>,
    crash: Option<oneshot::Sender<i32>>,
}

#[derive(Default)]
pub struct FakeSpawner {
    next_pid: AtomicU32,
    terminates: Arc<AtomicUsize>,
    kills: Arc<AtomicUsize>,
    spawned: Mutex<Vec<(String, ProcessConfig)>>,
    children: Mutex<Vec<FakeChild>>,
}

impl FakeSpawner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_pid: AtomicU32::new(1000),
            ..Self::default()
        })
    }

    /// Number of successful spawns.
    pub fn spawn_count(&self) -> usize {
        self.spawned.lock().unwrap().len()
    }

    /// Configs handed to successful spawns, in order.
    pub fn spawned(&self) -> Vec<(String, ProcessConfig)> {
        self.spawned.lock().unwrap().clone()
    }

    pub fn terminate_count(&self) -> usize {
        self.terminates.load(Ordering::SeqCst)
    }

    pub fn kill_count(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }

    /// Writes a chunk to the stdout of the child with `pid`. Returns `false` if nobody reads it.
    pub fn emit_stdout(&self, pid: u32, text: &str) -> bool {
        let children = self.children.lock().unwrap();
        children
            .iter()
            .find(|c| c.pid == pid)
            .is_some_and(|c| {
                c.stdout
                    .unbounded_send(Ok(Bytes::copy_from_slice(text.as_bytes())))
                    .is_ok()
            })
    }

    /// Makes the child with `pid` exit on its own with `code`.
    pub fn crash(&self, pid: u32, code: i32) {
        let mut children = self.children.lock().unwrap();
        if let Some(tx) = children
            .iter_mut()
            .find(|c| c.pid == pid)
            .and_then(|c| c.crash.take())
        {
            let _ = tx.send(code);
        }
    }

    /// Pid of the most recent child spawned for `id`.
    pub fn latest_pid(&self, id: &str) -> Option<u32> {
        let children = self.children.lock().unwrap();
        children.iter().rev().find(|c| c.id == id).map(|c| c.pid)
    }
}

#[async_trait]
impl Spawner for FakeSpawner {
    async fn spawn(&self, id: &str, config: &ProcessConfig) -> Result<ChildHandle, SpawnError> {
        if config.args.iter().any(|a| a == "--slow") {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        if config.command == "fail" {
            return Err(SpawnError::Other(format!("cannot run '{}'", config.command)));
        }

        let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
        let ignore_term = config.args.iter().any(|a| a == "--ignore-term");
        let (stdout_tx, stdout_rx) = fmpsc::unbounded();
        let (crash_tx, crash_rx) = oneshot::channel::<i32>();
        let (handle, mut ctl) = ChildHandle::pair(Some(pid));

        let terminates = Arc::clone(&self.terminates);
        let kills = Arc::clone(&self.kills);
        tokio::spawn(async move {
            let mut crash_rx = crash_rx;
            let mut crash_gone = false;
            let exit = loop {
                tokio::select! {
                    sig = ctl.signals.recv() => match sig {
                        Some(StopSignal::Terminate) => {
                            terminates.fetch_add(1, Ordering::SeqCst);
                            if !ignore_term {
                                break ExitInfo::signal(15);
                            }
                        }
                        Some(StopSignal::Kill) => {
                            kills.fetch_add(1, Ordering::SeqCst);
                            break ExitInfo::signal(9);
                        }
                        None => break ExitInfo::signal(9),
                    },
                    crash = &mut crash_rx, if !crash_gone => match crash {
                        Ok(code) => break ExitInfo::code(code),
                        Err(_) => crash_gone = true,
                    },
                }
            };
            let _ = ctl.exit.send(exit);
        });

        self.spawned
            .lock()
            .unwrap()
            .push((id.to_string(), config.clone()));
        self.children.lock().unwrap().push(FakeChild {
            id: id.to_string(),
            pid,
            stdout: stdout_tx,
            crash: Some(crash_tx),
        });
        Ok(handle.with_stdout(stdout_rx))
    }
}

/// Host wired to a fresh fake spawner.
pub fn host() -> (Host, Arc<FakeSpawner>) {
    host_with(HostConfig::default())
}

pub fn host_with(cfg: HostConfig) -> (Host, Arc<FakeSpawner>) {
    let spawner = FakeSpawner::new();
    let host = Host::builder(cfg)
        .with_spawner(spawner.clone() as Arc<dyn Spawner>)
        .build();
    (host, spawner)
}

/// Config the fake spawner accepts.
pub fn cfg(name: &str) -> ProcessConfig {
    ProcessConfig::new("node").with_args([format!("{name}.js")])
}

/// Records every event delivered for `topic`.
pub fn record(host: &Host, topic: impl Into<Topic>) -> Arc<Mutex<Vec<Event>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    host.on(topic, move |ev: &Event| sink.lock().unwrap().push(ev.clone()));
    seen
}

/// Polls `cond` until it holds, failing the test after two seconds.
pub async fn eventually<F: FnMut() -> bool>(mut cond: F) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !cond() {
        assert!(Instant::now() < deadline, "condition not met within 2s");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Lets already-queued tasks (the bus dispatcher, entry actors) run.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}
