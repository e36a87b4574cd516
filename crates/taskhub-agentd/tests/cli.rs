//! The `taskhub-agentd` binary driven over its process interface.

use std::{
    io::{BufRead, BufReader, Write},
    path::PathBuf,
    process::{Child, Command, ExitStatus, Stdio},
    time::{Duration, Instant},
};

use serde_json::json;

use taskhub_exec::{TASK_ID_ENV, TASK_SPEC_ENV};
use taskhub_model::Message;

const BIN: &str = env!("CARGO_BIN_EXE_taskhub-agentd");

fn worker(spec: &str) -> Command {
    let mut cmd = Command::new(BIN);
    cmd.args(["--log-level", "warn", "task", "--sleep-ms", "5"])
        .env(TASK_ID_ENV, "w1")
        .env(TASK_SPEC_ENV, spec)
        .stderr(Stdio::null());
    cmd
}

fn wait_timeout(child: &mut Child, timeout: Duration) -> ExitStatus {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait().unwrap() {
            return status;
        }
        if Instant::now() > deadline {
            let _ = child.kill();
            panic!("process did not exit within {timeout:?}");
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}

fn scratch(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("taskhub-{}-{name}", std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}

#[test]
fn worker_answers_over_stdio_and_exits_cleanly() {
    let mut child = worker(r#"{"kind":"echo"}"#)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();

    let mut stdin = child.stdin.take().unwrap();
    stdin.write_all(b"{\"q\":1}\n{\"c\":\"exit\"}\n").unwrap();
    stdin.flush().unwrap();

    let lines: Vec<Message> = BufReader::new(child.stdout.take().unwrap())
        .lines()
        .map(|l| Message::decode(l.unwrap().as_bytes()).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], Message::new().with("q", 1).with("a", 2));
    assert_eq!(lines[1].reply(), Some(&json!("exiting")));

    let status = wait_timeout(&mut child, Duration::from_secs(10));
    assert!(status.success());
    drop(stdin);
}

#[test]
fn orphaned_worker_exits_nonzero() {
    let mut child = worker(r#"{"kind":"echo"}"#)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .spawn()
        .unwrap();

    let status = wait_timeout(&mut child, Duration::from_secs(10));
    assert_eq!(status.code(), Some(1));
}

#[test]
fn worker_without_environment_fails() {
    let status = Command::new(BIN)
        .args(["--log-level", "off", "task"])
        .env_remove(TASK_ID_ENV)
        .env_remove(TASK_SPEC_ENV)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .unwrap();
    assert!(!status.success());
}

#[cfg(unix)]
#[test]
fn hub_runs_autolaunch_and_stops_on_sigterm() {
    let config = scratch("hub.json");
    let trace = scratch("trace.jsonl");
    std::fs::write(
        &config,
        r#"{"runner":{"sleep_ms":10},"tasks":[{"id":"e1","kind":"echo"},{"id":"b1","kind":"burst"}]}"#,
    )
    .unwrap();

    let mut child = Command::new(BIN)
        .arg("--log-level")
        .arg("warn")
        .arg("--trace-file")
        .arg(&trace)
        .arg("hub")
        .arg("--config")
        .arg(&config)
        .arg("--task-sleep-ms")
        .arg("10")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    std::thread::sleep(Duration::from_millis(1500));
    // SAFETY: signalling a child we spawned.
    let rc = unsafe { libc::kill(child.id() as libc::pid_t, libc::SIGTERM) };
    assert_eq!(rc, 0);

    let status = wait_timeout(&mut child, Duration::from_secs(15));
    assert!(status.success(), "hub exited with {status:?}");

    let records = std::fs::read_to_string(&trace).unwrap();
    let actions: Vec<String> = records
        .lines()
        .filter_map(|l| serde_json::from_str::<serde_json::Value>(l).ok())
        .filter_map(|v| v["fields"]["action"].as_str().map(str::to_string))
        .collect();
    for expected in ["open", "tasklaunch", "run", "stop", "taskexit", "close"] {
        assert!(
            actions.iter().any(|a| a == expected),
            "missing '{expected}' record in {actions:?}"
        );
    }
    assert_eq!(actions.iter().filter(|a| *a == "tasklaunch").count(), 2);

    let _ = std::fs::remove_file(&config);
    let _ = std::fs::remove_file(&trace);
}
