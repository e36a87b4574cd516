//! One-directional FIFO message queues between a hub and a task.
//!
//! A queue is an unbounded channel of [`Message`]s split into a [`Sender`] and a [`Receiver`].
//! Within one process both ends are plain tokio channel halves; across a process boundary the
//! exec layer bridges each end to a pipe, so the same types are used on either side.
//!
//! - `push` never blocks (the queue is unbounded).
//! - `try_pop` never blocks; it is what event loops use.
//! - `pop` / `pop_timeout` wait, and are meant for handshakes and bridges.
//!
//! Once the other end is dropped and the backlog is drained, every operation reports
//! [`QueueError::Closed`].

use std::time::Duration;

use tokio::sync::mpsc::{self, error::TryRecvError};

use taskhub_model::Message;

use crate::error::QueueError;

/// Create a new queue.
pub fn channel() -> (Sender, Receiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Sender { tx }, Receiver { rx })
}

/// Producing end of a queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Sender {
    tx: mpsc::UnboundedSender<Message>,
}

impl Sender {
    pub fn push(&self, msg: Message) -> Result<(), QueueError> {
        self.tx.send(msg).map_err(|_| QueueError::Closed)
    }

    /// Returns `true` once the receiving end is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consuming end of a queue.
#[derive(Debug)]
pub struct Receiver {
    rx: mpsc::UnboundedReceiver<Message>,
}

impl Receiver {
    /// Non-blocking pop: `Ok(None)` when nothing is ready.
    pub fn try_pop(&mut self) -> Result<Option<Message>, QueueError> {
        match self.rx.try_recv() {
            Ok(msg) => Ok(Some(msg)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(QueueError::Closed),
        }
    }

    /// Wait for the next message.
    pub async fn pop(&mut self) -> Result<Message, QueueError> {
        self.rx.recv().await.ok_or(QueueError::Closed)
    }

    /// Wait for the next message at most `timeout`.
    pub async fn pop_timeout(&mut self, timeout: Duration) -> Result<Message, QueueError> {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(Some(msg)) => Ok(msg),
            Ok(None) => Err(QueueError::Closed),
            Err(_elapsed) => Err(QueueError::Timeout),
        }
    }

    /// Pop and discard everything that is ready right now. Returns how many were dropped.
    pub fn discard_ready(&mut self) -> usize {
        let mut n = 0;
        while let Ok(Some(_)) = self.try_pop() {
            n += 1;
        }
        n
    }
}
