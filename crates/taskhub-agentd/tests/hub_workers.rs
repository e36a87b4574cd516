//! Hub driving real worker processes of the `taskhub-agentd` binary.

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use serde_json::json;

use taskhub_core::{Hub, HubConfig, Launcher, Runner, RunnerConfig, TaskRecord, hub::EXIT_POLLS, hub::EXIT_POLL_INTERVAL};
use taskhub_exec::{ProcConfig, ProcessLauncher};
use taskhub_model::{ERROR_UNHANDLED, Message, TaskSpec};

type Seen = Arc<Mutex<Vec<(String, Message)>>>;

fn worker_launcher() -> Arc<dyn Launcher> {
    let proc = ProcConfig::new(env!("CARGO_BIN_EXE_taskhub-agentd"))
        .with_arg("--log-level")
        .with_arg("warn")
        .with_arg("task")
        .with_arg("--sleep-ms")
        .with_arg("5");
    Arc::new(ProcessLauncher::new(proc))
}

fn hub_with(launcher: Arc<dyn Launcher>) -> (Hub, Seen) {
    let cfg = HubConfig {
        runner: RunnerConfig {
            sleep_ms: 5,
            ..RunnerConfig::default()
        },
        ..HubConfig::default()
    };
    let seen: Seen = Arc::default();
    let sink = Arc::clone(&seen);
    let hub = Hub::new(cfg, launcher).with_handler(move |rec: &TaskRecord, msg: Message| {
        sink.lock().unwrap().push((rec.id().to_string(), msg));
    });
    (hub, seen)
}

/// Cycle the hub until `n` messages arrived or ten seconds passed.
async fn collect(hub: &mut Hub, seen: &Seen, n: usize) -> Vec<Message> {
    let deadline = Instant::now() + Duration::from_secs(10);
    while seen.lock().unwrap().len() < n && Instant::now() < deadline {
        hub.io().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    seen.lock().unwrap().iter().map(|(_, m)| m.clone()).collect()
}

#[tokio::test]
async fn echo_round_trip_through_worker() {
    let (mut hub, seen) = hub_with(worker_launcher());
    hub.open().await.unwrap();
    hub.tasklaunch("e1", TaskSpec::new("echo")).unwrap();
    assert!(hub.task("e1").unwrap().pid().is_some());

    hub.put("e1", Message::new().with("q", 5)).unwrap();
    let got = collect(&mut hub, &seen, 1).await;
    assert_eq!(got, vec![Message::new().with("q", 5).with("a", 6)]);

    hub.exit().await;
    assert!(hub.tasks().is_empty());
}

#[tokio::test]
async fn worker_status_reports_its_pid() {
    let (mut hub, seen) = hub_with(worker_launcher());
    hub.tasklaunch("e1", TaskSpec::new("echo")).unwrap();
    let pid = hub.task("e1").unwrap().pid().unwrap();

    hub.put("e1", Message::request("status")).unwrap();
    let got = collect(&mut hub, &seen, 1).await;
    let status = got[0].reply().unwrap();
    assert_eq!(status["pid"], json!(pid));
    assert_eq!(status["name"], json!("e1"));
    assert_eq!(status["component"], json!("task"));
    assert_eq!(status["threaded"], json!(false));

    hub.exit().await;
}

#[tokio::test]
async fn burst_events_then_reply_in_order() {
    let (mut hub, seen) = hub_with(worker_launcher());
    hub.tasklaunch("b", TaskSpec::new("burst")).unwrap();

    hub.put("b", Message::request("burst").with("n", 40)).unwrap();
    let got = collect(&mut hub, &seen, 41).await;
    assert_eq!(got.len(), 41);
    for (seq, event) in got[..40].iter().enumerate() {
        assert_eq!(event.get("seq"), Some(&json!(seq)));
    }
    assert_eq!(got[40].reply(), Some(&json!(40)));

    hub.exit().await;
}

#[tokio::test]
async fn failures_and_unknown_commands_are_tagged() {
    let (mut hub, seen) = hub_with(worker_launcher());
    hub.tasklaunch("f", TaskSpec::new("fail").with_kwarg("tag", "bad-input"))
        .unwrap();
    hub.tasklaunch("e", TaskSpec::new("echo")).unwrap();

    hub.put("f", Message::new().with("q", 1)).unwrap();
    hub.put("e", Message::request("frobnicate").with("q", 5)).unwrap();
    collect(&mut hub, &seen, 2).await;

    let seen = seen.lock().unwrap().clone();
    let by_task = |id: &str| seen.iter().find(|(t, _)| t == id).map(|(_, m)| m.clone()).unwrap();
    assert_eq!(by_task("f").error(), Some("bad-input"));
    assert_eq!(by_task("e").error(), Some(ERROR_UNHANDLED));

    hub.exit().await;
}

#[tokio::test]
async fn cooperative_worker_is_removed_without_kill() {
    let (mut hub, _) = hub_with(worker_launcher());
    hub.tasklaunch("e1", TaskSpec::new("echo")).unwrap();

    // let the worker come up before asking it to leave
    hub.put("e1", Message::request("ping")).unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    hub.taskexit("e1").await.unwrap();
    assert!(!hub.contains("e1"));
}

#[cfg(unix)]
#[tokio::test]
async fn unresponsive_process_is_killed() {
    let stubborn = ProcConfig::new("sh")
        .with_arg("-c")
        .with_arg("trap '' TERM; while :; do sleep 1; done");
    let (mut hub, _) = hub_with(Arc::new(ProcessLauncher::new(stubborn)));
    hub.tasklaunch("stuck", TaskSpec::new("none")).unwrap();
    let pid = hub.task("stuck").unwrap().pid().unwrap();

    let started = Instant::now();
    hub.taskexit("stuck").await.unwrap();

    assert!(started.elapsed() >= EXIT_POLL_INTERVAL * EXIT_POLLS);
    assert!(!hub.contains("stuck"));
    // SAFETY: signal 0 only probes for existence.
    let rc = unsafe { libc::kill(pid as libc::pid_t, 0) };
    assert_eq!(rc, -1, "process {pid} should be gone");
}

#[tokio::test]
async fn worker_with_unknown_kind_dies() {
    let (mut hub, _) = hub_with(worker_launcher());
    hub.tasklaunch("ghost", TaskSpec::new("ghost")).unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    while hub.is_alive("ghost").unwrap() && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(!hub.is_alive("ghost").unwrap());
    hub.io().await.unwrap();

    let started = Instant::now();
    hub.taskexit("ghost").await.unwrap();
    assert!(started.elapsed() < EXIT_POLL_INTERVAL);
    assert!(hub.tasks().is_empty());
}
