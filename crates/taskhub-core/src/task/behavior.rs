use async_trait::async_trait;

use taskhub_model::Message;

use crate::queue::Sender;

/// Application logic of a task.
///
/// The task runtime answers the reserved commands (`exit`, `status`, `debug`) itself; every
/// other message that is not already a response is offered to [`Behavior::handle`]:
///
/// - `Ok(Some(fields))`: the reply is the request with `fields` merged over it;
/// - `Ok(None)`: the message is not understood, the reply carries `e = "unhandled-message"`;
/// - `Err(e)`: the reply carries `e` set to the error's display string.
///
/// `events` is the task's outbound queue; behaviors may push unsolicited notifications on it.
#[async_trait]
pub trait Behavior: Send {
    async fn on_open(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn on_close(&mut self) {}

    async fn handle(&mut self, msg: &Message, events: &Sender) -> anyhow::Result<Option<Message>>;
}
