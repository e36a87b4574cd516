//! Bridges between in-memory queues and byte streams.
//!
//! Each message travels as one line of JSON. The writer ends when its queue closes and then
//! shuts the stream down, so the peer sees EOF. The reader ends on EOF and drops its sender, so
//! the local consumer sees the queue close.

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    task::JoinHandle,
};
use tracing::{debug, trace, warn};

use taskhub_core::queue::{Receiver, Sender};
use taskhub_model::Message;

/// Forward every message popped from `rx` to `writer`, one JSON line each.
pub fn spawn_line_writer<W>(mut writer: W, mut rx: Receiver, name: &str) -> JoinHandle<()>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let name = name.to_string();
    tokio::spawn(async move {
        while let Ok(msg) = rx.pop().await {
            let mut line = match msg.encode() {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(task = %name, error = %e, "dropping unencodable message");
                    continue;
                }
            };
            line.push(b'\n');
            if let Err(e) = write_line(&mut writer, &line).await {
                debug!(task = %name, error = %e, "pipe closed while writing");
                return;
            }
            trace!(task = %name, bytes = line.len(), "line written");
        }
        if let Err(e) = writer.shutdown().await {
            trace!(task = %name, error = %e, "pipe shutdown failed");
        }
    })
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &[u8]) -> std::io::Result<()> {
    writer.write_all(line).await?;
    writer.flush().await
}

/// Decode JSON lines from `reader` and push them to `tx` until EOF.
///
/// Malformed lines are logged and skipped.
pub fn spawn_line_reader<R>(reader: R, tx: Sender, name: &str) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let name = name.to_string();
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    debug!(task = %name, error = %e, "pipe read failed");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match Message::decode(line.as_bytes()) {
                Ok(msg) => {
                    if tx.push(msg).is_err() {
                        debug!(task = %name, "queue consumer gone; stop reading");
                        break;
                    }
                }
                Err(e) => warn!(task = %name, error = %e, "skipping malformed line"),
            }
        }
        trace!(task = %name, "reader finished");
    })
}
