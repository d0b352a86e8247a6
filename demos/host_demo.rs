//! # Example: host_demo
//!
//! Supervises a few shell processes, logs every event through `tracing`, and
//! exercises the host API end to end.
//!
//! Shows how to:
//! - Load a `setup` map from JSON.
//! - Listen on exact (`ticker.stdout`) and wildcard (`*.restarting`) topics.
//! - Redefine a running process with `start(id, Some(config))`.
//! - Shut down on Ctrl-C / SIGTERM.
//!
//! ## Run
//! ```bash
//! RUST_LOG=info,procvisor=debug cargo run --example host_demo --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use procvisor::{EventKind, Host, HostConfig, LogWriter, ProcessConfig, ProcessMap, Subscribe, Topic};
use tracing_subscriber::EnvFilter;

const PROCESSES: &str = r#"{
    "ticker":  { "command": "sh", "args": ["-c", "while true; do date +%T; sleep 1; done"], "start": true },
    "counter": { "command": "sh", "args": ["-c", "i=0; while true; do i=$((i+1)); echo $i; sleep 2; done"], "start": true },
    "oneshot": { "command": "sh", "args": ["-c", "echo done"] }
}"#;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = HostConfig {
        stop_timeout: Duration::from_secs(2),
        ..HostConfig::default()
    };
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let host = Host::builder(cfg).with_subscribers(subs).build();

    host.on(("ticker", EventKind::Stdout), |ev| {
        if let Some(line) = ev.text() {
            println!("ticker says {}", line.trim_end());
        }
    });
    host.on("*.restarting".parse::<Topic>()?, |ev| {
        println!("{} is restarting", ev.process);
    });

    let map: ProcessMap = serde_json::from_str(PROCESSES)?;
    for info in host.setup(map)?.await? {
        println!("{:<8} {:<8} pid={:?}", info.id, info.state, info.pid);
    }

    tokio::time::sleep(Duration::from_secs(3)).await;
    let faster = ProcessConfig::new("sh").with_args(["-c", "while true; do date +%T.%N; sleep 0.5; done"]);
    host.start("ticker", Some(faster))?.await?;

    host.start("oneshot", None)?.await?;

    println!("press Ctrl-C to stop");
    host.run_until_signal().await?;
    Ok(())
}
