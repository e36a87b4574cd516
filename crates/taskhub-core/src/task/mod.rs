mod behavior;
pub use behavior::Behavior;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use taskhub_model::{Command, Component, ERROR_UNHANDLED, Message, REPLY_EXITING, TaskId};

use crate::{
    config::RunnerConfig,
    error::{CoreError, QueueError},
    lifecycle::Lifecycle,
    queue::{Receiver, Sender},
    runner::Runner,
    trace::{TraceAction, record},
};

/// Runner hosting one [`Behavior`] at the far end of a queue pair.
///
/// Each `io()` cycle drains the whole inbound backlog without blocking and answers every
/// request on the outbound queue. A closed inbound queue (the hub is gone) or a failed push is
/// fatal and ends the run loop.
pub struct Task {
    id: TaskId,
    lc: Lifecycle,
    inbound: Option<Receiver>,
    outbound: Option<Sender>,
    behavior: Box<dyn Behavior>,
}

impl Task {
    pub fn new(
        id: impl Into<TaskId>,
        behavior: Box<dyn Behavior>,
        inbound: Receiver,
        outbound: Sender,
        cfg: &RunnerConfig,
    ) -> Self {
        let id = id.into();
        Self {
            lc: Lifecycle::new(id.clone(), Component::Task, cfg),
            id,
            inbound: Some(inbound),
            outbound: Some(outbound),
            behavior,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn reply(&self, msg: Message) -> Result<(), CoreError> {
        let outbound = self.outbound.as_ref().ok_or(QueueError::Closed)?;
        outbound.push(msg)?;
        Ok(())
    }

    async fn dispatch(&mut self, msg: Message) -> Result<(), CoreError> {
        if msg.is_response() {
            debug!(task = %self.id, "ignoring response sent to task");
            return Ok(());
        }

        match msg.command() {
            Some(Command::Exit) => {
                self.reply(msg.into_reply(REPLY_EXITING))?;
                self.shutdown().await;
            }
            Some(Command::Status) => {
                let status = self.status().to_value()?;
                self.reply(msg.into_reply(status))?;
            }
            Some(Command::Debug) => {
                let on = self.lc.toggle_debug();
                record(
                    Component::Task,
                    &self.id,
                    TraceAction::DebugToggled,
                    if on { "on" } else { "off" },
                );
                self.reply(msg.into_reply(json!({ "debug": on })))?;
            }
            _ => {
                let events = self.outbound.as_ref().ok_or(QueueError::Closed)?;
                let reply = match self.behavior.handle(&msg, events).await {
                    Ok(Some(fields)) => {
                        let mut reply = msg;
                        reply.merge(fields);
                        reply
                    }
                    Ok(None) => msg.into_error(ERROR_UNHANDLED),
                    Err(e) => {
                        debug!(task = %self.id, error = %e, "handler failed");
                        msg.into_error(e.to_string())
                    }
                };
                self.reply(reply)?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Runner for Task {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lc
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lc
    }

    async fn io(&mut self) -> Result<(), CoreError> {
        while self.lc.is_active() {
            let inbound = self.inbound.as_mut().ok_or(QueueError::Closed)?;
            let Some(msg) = inbound.try_pop()? else {
                break;
            };
            self.dispatch(msg).await?;
        }
        Ok(())
    }

    async fn on_open(&mut self) -> Result<(), CoreError> {
        self.behavior
            .on_open()
            .await
            .map_err(|e| CoreError::fail(format!("task '{}' failed to open: {e:#}", self.id)))
    }

    async fn on_close(&mut self) {
        self.behavior.on_close().await;
        self.inbound = None;
        self.outbound = None;
    }
}

#[cfg(test)]
mod tests {
    use anyhow::bail;
    use serde_json::json;
    use taskhub_model::{FIELD_COMMAND, State};

    use super::*;
    use crate::{queue::channel, runner::run_to_completion};

    /// `{q: n}` → `{a: n + 1}`; `{c: "boom"}` fails; `{c: "emit"}` pushes an event first.
    struct Echo;

    #[async_trait]
    impl Behavior for Echo {
        async fn handle(&mut self, msg: &Message, events: &Sender) -> anyhow::Result<Option<Message>> {
            match msg.command_name() {
                Some("boom") => bail!("boom"),
                Some("emit") => {
                    events.push(Message::new().with("event", "tick"))?;
                    Ok(Some(Message::new().into_reply("emitted")))
                }
                Some(_) => Ok(None),
                None => Ok(msg
                    .get("q")
                    .and_then(|v| v.as_i64())
                    .map(|q| Message::new().with("a", q + 1))),
            }
        }
    }

    struct Harness {
        task: Task,
        to_task: Sender,
        from_task: Receiver,
    }

    async fn harness() -> Harness {
        let (to_task, inbound) = channel();
        let (outbound, from_task) = channel();
        let mut task = Task::new("t1", Box::new(Echo), inbound, outbound, &RunnerConfig::default());
        task.open().await.unwrap();
        Harness {
            task,
            to_task,
            from_task,
        }
    }

    fn drain(rx: &mut Receiver) -> Vec<Message> {
        let mut out = Vec::new();
        while let Ok(Some(m)) = rx.try_pop() {
            out.push(m);
        }
        out
    }

    #[tokio::test]
    async fn echo_adds_one() {
        let mut h = harness().await;
        h.to_task.push(Message::new().with("q", 5)).unwrap();
        h.task.io().await.unwrap();

        let replies = drain(&mut h.from_task);
        assert_eq!(replies, vec![Message::new().with("q", 5).with("a", 6)]);
    }

    #[tokio::test]
    async fn unknown_command_is_tagged_unhandled() {
        let mut h = harness().await;
        h.to_task.push(Message::request("frobnicate").with("x", 1).with("q", 5)).unwrap();
        h.task.io().await.unwrap();

        let replies = drain(&mut h.from_task);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].error(), Some(ERROR_UNHANDLED));
        assert_eq!(replies[0].command_name(), Some("frobnicate"));
        assert_eq!(replies[0].get("x"), Some(&json!(1)));
        assert!(!replies[0].contains("a"));
        assert!(h.task.lifecycle().is_active());
    }

    #[tokio::test]
    async fn handler_error_becomes_tag() {
        let mut h = harness().await;
        h.to_task.push(Message::request("boom")).unwrap();
        h.task.io().await.unwrap();

        let replies = drain(&mut h.from_task);
        assert_eq!(replies[0].error(), Some("boom"));
        assert!(replies[0].reply().is_none());
    }

    #[tokio::test]
    async fn exit_replies_once_and_shuts_down() {
        let mut h = harness().await;
        h.to_task.push(Message::request("exit")).unwrap();
        h.to_task.push(Message::new().with("q", 1)).unwrap();
        h.task.io().await.unwrap();

        let replies = drain(&mut h.from_task);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].reply(), Some(&json!(REPLY_EXITING)));
        assert_eq!(replies[0].get(FIELD_COMMAND), Some(&json!("exit")));
        assert_eq!(h.task.lifecycle().state(), State::Closed);

        // the task released its queue ends on close
        assert!(h.to_task.is_closed());
        assert_eq!(h.from_task.try_pop(), Err(QueueError::Closed));
    }

    #[tokio::test]
    async fn status_reply_describes_task() {
        let mut h = harness().await;
        h.to_task.push(Message::request("status")).unwrap();
        h.task.io().await.unwrap();

        let replies = drain(&mut h.from_task);
        let status = replies[0].reply().unwrap();
        assert_eq!(status["name"], json!("t1"));
        assert_eq!(status["component"], json!("task"));
        assert_eq!(status["active"], json!(true));
        assert_eq!(status["pid"], json!(std::process::id()));
    }

    #[tokio::test]
    async fn debug_toggles_flag() {
        let mut h = harness().await;
        h.to_task.push(Message::request("debug")).unwrap();
        h.to_task.push(Message::request("debug")).unwrap();
        h.task.io().await.unwrap();

        let replies = drain(&mut h.from_task);
        assert_eq!(replies[0].reply(), Some(&json!({"debug": true})));
        assert_eq!(replies[1].reply(), Some(&json!({"debug": false})));
        assert!(!h.task.lifecycle().is_debug());
    }

    #[tokio::test]
    async fn responses_are_not_answered() {
        let mut h = harness().await;
        h.to_task.push(Message::request("exit").into_reply("exiting")).unwrap();
        h.to_task.push(Message::new().into_error("nope")).unwrap();
        h.task.io().await.unwrap();

        assert!(drain(&mut h.from_task).is_empty());
        assert!(h.task.lifecycle().is_active());
    }

    #[tokio::test]
    async fn events_precede_reply() {
        let mut h = harness().await;
        h.to_task.push(Message::request("emit")).unwrap();
        h.task.io().await.unwrap();

        let out = drain(&mut h.from_task);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].get("event"), Some(&json!("tick")));
        assert_eq!(out[1].reply(), Some(&json!("emitted")));
    }

    #[tokio::test]
    async fn backlog_is_drained_in_one_cycle() {
        let mut h = harness().await;
        for q in 0..50 {
            h.to_task.push(Message::new().with("q", q)).unwrap();
        }
        h.task.io().await.unwrap();

        let out = drain(&mut h.from_task);
        assert_eq!(out.len(), 50);
        for (q, m) in out.iter().enumerate() {
            assert_eq!(m.get("a"), Some(&json!(q as i64 + 1)));
        }
    }

    #[tokio::test]
    async fn orphaned_task_fails_fatally() {
        let mut h = harness().await;
        drop(h.to_task);
        let err = h.task.io().await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn run_loop_exits_cleanly_on_exit_request() {
        let (to_task, inbound) = channel();
        let (outbound, mut from_task) = channel();
        let cfg = RunnerConfig {
            sleep_ms: 1,
            ..RunnerConfig::default()
        };
        let mut task = Task::new("t2", Box::new(Echo), inbound, outbound, &cfg);

        let join = tokio::spawn(async move { run_to_completion(&mut task).await });
        to_task.push(Message::new().with("q", 41)).unwrap();
        to_task.push(Message::request("exit")).unwrap();

        assert_eq!(join.await.unwrap(), crate::runner::EXIT_OK);
        let first = from_task.pop().await.unwrap();
        assert_eq!(first.get("a"), Some(&json!(42)));
        let second = from_task.pop().await.unwrap();
        assert_eq!(second.reply(), Some(&json!(REPLY_EXITING)));
        assert_eq!(from_task.pop().await, Err(QueueError::Closed));
    }
}
