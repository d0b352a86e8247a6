#![cfg(unix)]

mod common;

use std::time::Duration;

use common::{eventually, record};
use procvisor::{EventKind, ExitInfo, Host, HostConfig, ProcessConfig, ProcessState, Topic};

fn sh(script: &str) -> ProcessConfig {
    ProcessConfig::new("sh").with_args(["-c", script])
}

#[tokio::test]
async fn captures_stdout_and_clean_exit() {
    let host = Host::new();
    let stdout = record(&host, ("echo", EventKind::Stdout));
    let stopped = record(&host, ("echo", EventKind::Stopped));

    let info = host
        .start("echo", Some(sh("echo hello; echo world")))
        .unwrap()
        .await
        .unwrap();
    assert!(info.pid.is_some());

    eventually(|| stopped.lock().unwrap().len() == 1).await;
    assert_eq!(stopped.lock().unwrap()[0].exit, Some(ExitInfo::code(0)));

    eventually(|| {
        let text: String = stdout
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| e.text())
            .collect();
        text == "hello\nworld\n"
    })
    .await;
    assert_eq!(host.process("echo").unwrap().state, ProcessState::Stopped);
}

#[tokio::test]
async fn stderr_and_env_are_wired() {
    let host = Host::new();
    let stderr = record(&host, ("env", EventKind::Stderr));

    host.start(
        "env",
        Some(sh("echo \"$GREETING\" >&2").with_env("GREETING", "hi there")),
    )
    .unwrap()
    .await
    .unwrap();

    eventually(|| {
        stderr
            .lock()
            .unwrap()
            .iter()
            .any(|e| e.text().as_deref() == Some("hi there\n"))
    })
    .await;
}

#[tokio::test]
async fn failing_command_reports_error_with_exit_code() {
    let host = Host::new();
    let errors = record(&host, Topic::any(EventKind::Error));

    host.start("bad", Some(sh("exit 7"))).unwrap().await.unwrap();

    eventually(|| errors.lock().unwrap().len() == 1).await;
    assert_eq!(errors.lock().unwrap()[0].exit, Some(ExitInfo::code(7)));
}

#[tokio::test]
async fn missing_binary_fails_to_spawn() {
    let host = Host::new();
    let err = host
        .start(
            "ghost",
            Some(ProcessConfig::new("/definitely/not/a/binary")),
        )
        .unwrap()
        .await
        .unwrap_err();
    assert_eq!(err.as_label(), "process_spawn_failed");
}

#[tokio::test]
async fn stop_terminates_a_long_running_child() {
    let host = Host::new();
    let stopped = record(&host, ("sleeper", EventKind::Stopped));

    host.start("sleeper", Some(ProcessConfig::new("sleep").with_args(["30"])))
        .unwrap()
        .await
        .unwrap();
    host.stop(Some("sleeper")).unwrap().await.unwrap();

    eventually(|| stopped.lock().unwrap().len() == 1).await;
    assert_eq!(stopped.lock().unwrap()[0].exit, Some(ExitInfo::signal(15)));
}

#[tokio::test]
async fn stop_kills_a_child_that_ignores_sigterm() {
    let host = Host::builder(HostConfig {
        stop_timeout: Duration::from_millis(200),
        ..HostConfig::default()
    })
    .build();
    let stopped = record(&host, ("stubborn", EventKind::Stopped));
    let stdout = record(&host, ("stubborn", EventKind::Stdout));

    host.start(
        "stubborn",
        Some(sh("trap '' TERM; echo ready; while true; do sleep 0.05; done")),
    )
    .unwrap()
    .await
    .unwrap();
    // The trap must be installed before the stop is sent.
    eventually(|| !stdout.lock().unwrap().is_empty()).await;

    host.stop(Some("stubborn")).unwrap().await.unwrap();
    eventually(|| stopped.lock().unwrap().len() == 1).await;
    assert_eq!(stopped.lock().unwrap()[0].exit, Some(ExitInfo::signal(9)));
}
