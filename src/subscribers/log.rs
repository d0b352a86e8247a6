//! # LogWriter: event logger
//!
//! A minimal subscriber that writes every incoming [`Event`] through `tracing`
//! (target `procvisor::events`). Install any `tracing` subscriber to see them.
//!
//! ## Example output (tracing-subscriber fmt)
//! ```text
//! INFO procvisor::events: started process="web" pid=4242
//! INFO procvisor::events: stdout process="web" line="listening on :8080"
//! WARN procvisor::events: error process="web" reason="process exited unexpectedly (code=1)"
//! INFO procvisor::events: restarting process="web" pid=4242
//! INFO procvisor::events: stopped process="web" exit=signal=15
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let process = e.process.as_ref();
        match e.kind {
            EventKind::Started => {
                tracing::info!(target: "procvisor::events", process, pid = ?e.pid, "started");
            }
            EventKind::Restarting => {
                tracing::info!(target: "procvisor::events", process, pid = ?e.pid, "restarting");
            }
            EventKind::Stopped => {
                let exit = e.exit.map(|x| x.to_string());
                tracing::info!(target: "procvisor::events", process, exit = ?exit, "stopped");
            }
            EventKind::Stdout | EventKind::Stderr => {
                let text = e.text().unwrap_or_default();
                tracing::info!(
                    target: "procvisor::events",
                    process,
                    line = %text.trim_end(),
                    "{}",
                    e.kind
                );
            }
            EventKind::Error => {
                tracing::warn!(
                    target: "procvisor::events",
                    process,
                    reason = e.reason.as_deref().unwrap_or("unknown"),
                    "error"
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ExitInfo;

    #[tokio::test]
    async fn handles_every_kind() {
        let w = LogWriter::new();
        for kind in EventKind::ALL {
            let ev = Event::new("web", kind)
                .with_pid(Some(7))
                .with_data(bytes::Bytes::from_static(b"hi\n"))
                .with_exit(ExitInfo::code(0));
            w.on_event(&ev).await;
        }
    }
}
