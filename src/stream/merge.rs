#[cfg(test)]
#[path = "merge_test.rs"]
mod tests;

use eyre::Result;

use crate::models::{ArcEventTx, Event, Message};
use crate::store::Store;

use super::{StreamStep, TextStream};

#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// The reply was written into the projection
    Merged(Message),
    Cancelled,
    /// The projection was replaced while streaming, the reply was dropped
    Discarded(Message),
}

/// Drains `stream` into a single assistant reply. Chunks are reported as
/// they arrive; the store is written once, after the body is fully read,
/// and only while the projection still carries `generation`.
pub async fn merge_stream(
    mut stream: TextStream,
    store: &Store,
    generation: u64,
    event_tx: &ArcEventTx,
) -> Result<MergeOutcome> {
    let mut content = String::new();

    loop {
        match stream.next().await {
            StreamStep::Chunk(text) => {
                log::trace!("streaming chunk: {:?}", text);
                content.push_str(&text);
                event_tx.send(Event::StreamChunk(text)).await?;
            }
            StreamStep::Done => break,
            StreamStep::Cancelled => {
                log::debug!("Stream cancelled after {} bytes", content.len());
                return Ok(MergeOutcome::Cancelled);
            }
            StreamStep::Failed(err) => return Err(err.wrap_err("reading completion stream")),
        }
    }

    let reply = Message::new_assistant(content);
    let merged = store.write().await.merge_reply(generation, reply.clone());
    if !merged {
        log::warn!("Active version changed while streaming, dropping reply {}", reply.id());
        return Ok(MergeOutcome::Discarded(reply));
    }
    Ok(MergeOutcome::Merged(reply))
}
