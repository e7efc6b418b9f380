pub mod decoder;
pub mod merge;

pub use decoder::Utf8Decoder;
pub use merge::{MergeOutcome, merge_stream};

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::api::ByteStream;

/// One step of a [`TextStream`].
#[derive(Debug)]
pub enum StreamStep {
    Chunk(String),
    Done,
    Cancelled,
    Failed(eyre::Report),
}

/// Completion body decoded to text chunks. Cancellation is observed between
/// chunks and ends the stream without an error.
pub struct TextStream {
    inner: ByteStream,
    decoder: Utf8Decoder,
    cancel_token: CancellationToken,
    finished: bool,
}

impl TextStream {
    pub fn new(inner: ByteStream, cancel_token: CancellationToken) -> Self {
        Self {
            inner,
            decoder: Utf8Decoder::new(),
            cancel_token,
            finished: false,
        }
    }

    pub async fn next(&mut self) -> StreamStep {
        if self.finished {
            return StreamStep::Done;
        }

        loop {
            let item = tokio::select! {
                biased;
                _ = self.cancel_token.cancelled() => {
                    self.finished = true;
                    return StreamStep::Cancelled;
                }
                item = self.inner.next() => item,
            };

            match item {
                Some(Ok(bytes)) => {
                    let text = self.decoder.decode(&bytes);
                    if text.is_empty() {
                        continue;
                    }
                    return StreamStep::Chunk(text);
                }
                Some(Err(err)) => {
                    self.finished = true;
                    return StreamStep::Failed(err);
                }
                None => {
                    self.finished = true;
                    let tail = self.decoder.finish();
                    if tail.is_empty() {
                        return StreamStep::Done;
                    }
                    return StreamStep::Chunk(tail);
                }
            }
        }
    }
}
