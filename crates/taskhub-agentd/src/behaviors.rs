//! Built-in task kinds.

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use serde_json::Value;

use taskhub_core::{Behavior, TaskRegistry, queue::Sender};
use taskhub_model::{Message, TaskSpec};

pub fn registry() -> TaskRegistry {
    TaskRegistry::new()
        .with("echo", |spec| Ok(Box::new(Echo::from_spec(spec)?) as Box<dyn Behavior>))
        .with("burst", |_| Ok(Box::new(Burst) as Box<dyn Behavior>))
        .with("fail", |spec| Ok(Box::new(Fail::from_spec(spec)) as Box<dyn Behavior>))
}

/// `{q: n}` → `{a: n + step}`; `{c: "ping"}` → `r = "pong"`. Any other command is unhandled.
#[derive(Debug)]
pub struct Echo {
    step: i64,
}

impl Echo {
    fn from_spec(spec: &TaskSpec) -> anyhow::Result<Self> {
        let step = match spec.kwarg("step") {
            None => 1,
            Some(v) => v.as_i64().context("kwarg 'step' must be an integer")?,
        };
        Ok(Self { step })
    }
}

#[async_trait]
impl Behavior for Echo {
    async fn handle(&mut self, msg: &Message, _: &Sender) -> anyhow::Result<Option<Message>> {
        match msg.command_name() {
            Some("ping") => return Ok(Some(Message::new().into_reply("pong"))),
            Some(_) => return Ok(None),
            None => {}
        }
        let answer = match msg.get("q") {
            Some(Value::Number(n)) if n.is_i64() => n
                .as_i64()
                .and_then(|q| q.checked_add(self.step))
                .map(Value::from),
            Some(Value::Number(n)) => n.as_f64().map(|q| Value::from(q + self.step as f64)),
            _ => None,
        };
        Ok(answer.map(|a| Message::new().with("a", a)))
    }
}

/// `{c: "burst", n}`: emits `n` events, then replies `r = n`.
#[derive(Debug)]
pub struct Burst;

#[async_trait]
impl Behavior for Burst {
    async fn handle(&mut self, msg: &Message, events: &Sender) -> anyhow::Result<Option<Message>> {
        if msg.command_name() != Some("burst") {
            return Ok(None);
        }
        let n = msg
            .get("n")
            .and_then(Value::as_u64)
            .ok_or_else(|| anyhow!("missing-count"))?;
        for seq in 0..n {
            events.push(Message::new().with("event", "burst").with("seq", seq))?;
        }
        Ok(Some(Message::new().into_reply(n)))
    }
}

/// Fails every message with the `tag` kwarg (default `"failed"`).
#[derive(Debug)]
pub struct Fail {
    tag: String,
}

impl Fail {
    fn from_spec(spec: &TaskSpec) -> Self {
        let tag = spec
            .kwarg("tag")
            .and_then(Value::as_str)
            .unwrap_or("failed")
            .to_string();
        Self { tag }
    }
}

#[async_trait]
impl Behavior for Fail {
    async fn handle(&mut self, _: &Message, _: &Sender) -> anyhow::Result<Option<Message>> {
        Err(anyhow!("{}", self.tag))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use taskhub_core::queue::channel;

    use super::*;

    async fn call(kind: &str, spec: TaskSpec, msg: Message) -> (anyhow::Result<Option<Message>>, Vec<Message>) {
        let mut behavior = registry().build(&TaskSpec { kind: kind.into(), ..spec }).unwrap();
        let (tx, mut rx) = channel();
        let res = behavior.handle(&msg, &tx).await;
        let mut events = Vec::new();
        while let Ok(Some(m)) = rx.try_pop() {
            events.push(m);
        }
        (res, events)
    }

    #[tokio::test]
    async fn echo_adds_step() {
        let (res, _) = call("echo", TaskSpec::default(), Message::new().with("q", 5)).await;
        assert_eq!(res.unwrap(), Some(Message::new().with("a", 6)));

        let spec = TaskSpec::default().with_kwarg("step", 10);
        let (res, _) = call("echo", spec, Message::new().with("q", 1.5)).await;
        assert_eq!(res.unwrap(), Some(Message::new().with("a", 11.5)));
    }

    #[tokio::test]
    async fn echo_ping_and_unknown() {
        let (res, _) = call("echo", TaskSpec::default(), Message::request("ping")).await;
        assert_eq!(res.unwrap().unwrap().reply(), Some(&json!("pong")));

        let (res, _) = call("echo", TaskSpec::default(), Message::new().with("x", 1)).await;
        assert!(res.unwrap().is_none());
    }

    #[tokio::test]
    async fn echo_leaves_unknown_commands_unhandled() {
        let msg = Message::request("bogus").with("q", 5);
        let (res, _) = call("echo", TaskSpec::default(), msg).await;
        assert!(res.unwrap().is_none());
    }

    #[test]
    fn echo_rejects_bad_step() {
        let spec = TaskSpec::new("echo").with_kwarg("step", "two");
        assert!(registry().build(&spec).is_err());
    }

    #[tokio::test]
    async fn burst_emits_then_replies() {
        let msg = Message::request("burst").with("n", 3);
        let (res, events) = call("burst", TaskSpec::default(), msg).await;
        assert_eq!(res.unwrap().unwrap().reply(), Some(&json!(3)));
        let seqs: Vec<_> = events.iter().map(|e| e.get("seq").cloned()).collect();
        assert_eq!(seqs, [Some(json!(0)), Some(json!(1)), Some(json!(2))]);

        let (res, _) = call("burst", TaskSpec::default(), Message::request("burst")).await;
        assert_eq!(res.unwrap_err().to_string(), "missing-count");
    }

    #[tokio::test]
    async fn fail_uses_tag() {
        let spec = TaskSpec::default().with_kwarg("tag", "nope");
        let (res, _) = call("fail", spec, Message::new().with("q", 1)).await;
        assert_eq!(res.unwrap_err().to_string(), "nope");
    }
}
