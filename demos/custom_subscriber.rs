//! # Example: custom_subscriber
//!
//! Demonstrates how to build and attach a custom event subscriber.
//!
//! Shows how to:
//! - Implement the [`Subscribe`] trait.
//! - Inspect [`Event`] / [`EventKind`] to keep per-process counters.
//! - Wire the subscriber into [`Host::builder`].
//!
//! ## Flow
//! ```text
//! Host::setup() ──► ProcessEntry (one per id)
//!     ├─► publish(started / stdout / error / restarting / stopped)
//!     └─► Bus ──► subscriber listener (in Host)
//!                   └─► SubscriberSet.emit() ──► Tally.on_event()
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example custom_subscriber
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use procvisor::{Event, EventKind, Host, HostConfig, ProcessConfig, Subscribe};

/// Counts output lines and failures per process.
/// In real life, you could export metrics, ship logs, or trigger alerts.
#[derive(Default)]
struct Tally {
    lines: Mutex<BTreeMap<String, usize>>,
    failures: Mutex<BTreeMap<String, usize>>,
}

#[async_trait::async_trait]
impl Subscribe for Tally {
    async fn on_event(&self, ev: &Event) {
        match ev.kind {
            EventKind::Stdout | EventKind::Stderr => {
                let n = ev.text().map(|t| t.lines().count()).unwrap_or(0);
                *self.lines.lock().entry(ev.process.to_string()).or_default() += n;
            }
            EventKind::Error => {
                *self.failures.lock().entry(ev.process.to_string()).or_default() += 1;
                println!(
                    "[tally] {} failed: {}",
                    ev.process,
                    ev.reason.as_deref().unwrap_or("unknown")
                );
            }
            EventKind::Started => println!("[tally] {} started (pid {:?})", ev.process, ev.pid),
            EventKind::Stopped | EventKind::Restarting => {}
        }
    }

    fn name(&self) -> &'static str {
        "tally"
    }
}

fn sh(script: &str) -> ProcessConfig {
    ProcessConfig::new("sh")
        .with_args(["-c", script])
        .with_autostart(true)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let tally = Arc::new(Tally::default());
    let host = Host::builder(HostConfig::default())
        .with_subscribers(vec![tally.clone() as Arc<dyn Subscribe>])
        .build();

    host.setup([
        ("chatty", sh("for i in 1 2 3 4 5; do echo line $i; sleep 0.1; done")),
        ("flaky", sh("echo about to fail; sleep 0.2; exit 2")),
    ])?
    .await?;

    tokio::time::sleep(Duration::from_secs(1)).await;
    host.shutdown().await?;
    tokio::time::sleep(Duration::from_millis(50)).await;

    println!("lines:    {:?}", tally.lines.lock());
    println!("failures: {:?}", tally.failures.lock());
    Ok(())
}
