//! Line-delimited JSON transport over a reader/writer pair.
//!
//! The reader side is one session: each line is a [`ClientMessage`],
//! every [`ServerMessage`] addressed to the session is written as one
//! line. At end of input, outstanding context grabs are awaited before
//! the session is closed.

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc::unbounded_channel;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};

use crate::platform::AccessibilityProvider;

use super::protocol::{ClientMessage, ServerMessage};
use super::service::Bridge;

/// Longest accepted input line, in bytes.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Serve one session until `reader` is exhausted. Returns the writer.
pub async fn serve<A, R, W>(bridge: &Bridge<A>, reader: R, writer: W) -> Result<W, JoinError>
where
    A: AccessibilityProvider + 'static,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = unbounded_channel::<ServerMessage>();
    let session = bridge.connect(tx);

    let writer_task = tokio::spawn(async move {
        let mut out = FramedWrite::new(writer, LinesCodec::new());
        while let Some(message) = rx.recv().await {
            let line = match serde_json::to_string(&message) {
                Ok(line) => line,
                Err(e) => {
                    tracing::error!(error = %e, "failed to encode message");
                    continue;
                }
            };
            if let Err(e) = out.send(line).await {
                tracing::error!(error = %e, "output closed");
                break;
            }
        }
        out.into_inner()
    });

    let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));
    let mut pending: Vec<JoinHandle<()>> = Vec::new();

    while let Some(line) = lines.next().await {
        let line = match line {
            Ok(line) => line,
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                tracing::warn!(%session, limit = MAX_LINE_LENGTH, "input line too long, closing session");
                bridge.deliver(
                    session,
                    ServerMessage::error(format!("Line exceeds {MAX_LINE_LENGTH} bytes"), "PAYLOAD_TOO_LARGE"),
                );
                break;
            }
            Err(e) => {
                tracing::error!(error = %e, "input read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<ClientMessage>(&line) {
            Ok(message) => {
                if let Some(grab) = bridge.handle(session, message).await {
                    pending.retain(|task| !task.is_finished());
                    pending.push(grab);
                }
            }
            Err(e) => {
                tracing::warn!(%session, error = %e, "bad payload");
                bridge.deliver(session, ServerMessage::error(format!("Invalid payload: {e}"), "BAD_PAYLOAD"));
            }
        }
    }

    for grab in pending {
        if let Err(e) = grab.await {
            tracing::error!(error = %e, "context grab task failed");
        }
    }

    // Dropping the registry's sender ends the writer task.
    bridge.disconnect(session);
    writer_task.await
}
