use tracing::info;

use taskhub_model::Message;

use crate::table::TaskRecord;

/// Receives every message a task sends to the hub, except the `exit`/`status`/`debug` requests
/// the hub answers itself.
///
/// Implemented for any `FnMut(&TaskRecord, Message) + Send` closure.
pub trait OnMessage: Send {
    fn on_message(&mut self, task: &TaskRecord, msg: Message);
}

impl<F> OnMessage for F
where
    F: FnMut(&TaskRecord, Message) + Send,
{
    fn on_message(&mut self, task: &TaskRecord, msg: Message) {
        self(task, msg)
    }
}

/// Default handler: logs each message.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMessages;

impl OnMessage for LogMessages {
    fn on_message(&mut self, task: &TaskRecord, msg: Message) {
        match serde_json::to_string(&msg) {
            Ok(body) => info!(task = task.id(), %body, "message from task"),
            Err(e) => info!(task = task.id(), error = %e, "message from task (unprintable)"),
        }
    }
}
