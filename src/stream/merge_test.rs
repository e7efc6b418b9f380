use std::sync::Arc;

use futures::stream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::api::ByteStream;
use crate::models::Role;
use crate::store::AppState;

fn byte_stream(chunks: &[&[u8]]) -> ByteStream {
    let items: Vec<eyre::Result<Vec<u8>>> = chunks.iter().map(|c| Ok(c.to_vec())).collect();
    Box::pin(stream::iter(items))
}

fn channel() -> (ArcEventTx, mpsc::UnboundedReceiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(tx), rx)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<Event>) -> Vec<Event> {
    let mut events = vec![];
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_merge_stream_joins_chunks() {
    let store = Store::default();
    store
        .write()
        .await
        .current
        .add_message(Message::new_user("Say hello"));
    let generation = store.read().await.current.generation();
    let (event_tx, mut rx) = channel();

    let text = TextStream::new(
        byte_stream(&[b"Hel".as_slice(), b"lo, ".as_slice(), b"world".as_slice()]),
        CancellationToken::new(),
    );
    let outcome = merge_stream(text, &store, generation, &event_tx)
        .await
        .expect("failed to merge stream");

    let MergeOutcome::Merged(reply) = outcome else {
        panic!("expected a merged reply, got {outcome:?}");
    };
    assert_eq!(reply.content(), "Hello, world");

    let state = store.read().await;
    let messages = state.current.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role(), Role::Assistant);
    assert_eq!(messages[1].content(), "Hello, world");

    assert_eq!(
        drain(&mut rx),
        vec![
            Event::StreamChunk("Hel".to_string()),
            Event::StreamChunk("lo, ".to_string()),
            Event::StreamChunk("world".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_merge_stream_split_multibyte() {
    let store = Store::default();
    let (event_tx, _rx) = channel();
    let bytes = "Chào".as_bytes();
    let chunks: [&[u8]; 3] = [&bytes[..2], &bytes[2..3], &bytes[3..]];

    let text = TextStream::new(byte_stream(&chunks), CancellationToken::new());
    let outcome = merge_stream(text, &store, 0, &event_tx)
        .await
        .expect("failed to merge stream");

    assert!(matches!(outcome, MergeOutcome::Merged(ref m) if m.content() == "Chào"));
}

#[tokio::test]
async fn test_merge_stream_cancelled() {
    let store = Store::default();
    let (event_tx, _rx) = channel();
    let cancel_token = CancellationToken::new();
    cancel_token.cancel();

    let pending: ByteStream = Box::pin(stream::pending::<eyre::Result<Vec<u8>>>());
    let outcome = merge_stream(TextStream::new(pending, cancel_token), &store, 0, &event_tx)
        .await
        .expect("cancellation is not an error");

    assert_eq!(outcome, MergeOutcome::Cancelled);
    assert!(store.read().await.current.messages().is_empty());
}

#[tokio::test]
async fn test_merge_stream_discards_stale_generation() {
    let store = Store::new(AppState::default());
    let generation = store.read().await.current.generation();
    store.write().await.current.start_new();
    let (event_tx, _rx) = channel();

    let text = TextStream::new(byte_stream(&[b"late".as_slice()]), CancellationToken::new());
    let outcome = merge_stream(text, &store, generation, &event_tx)
        .await
        .expect("failed to merge stream");

    assert!(matches!(outcome, MergeOutcome::Discarded(_)));
    assert!(store.read().await.current.messages().is_empty());
}

#[tokio::test]
async fn test_merge_stream_read_failure() {
    let store = Store::default();
    let (event_tx, _rx) = channel();
    let failing: ByteStream = Box::pin(stream::iter(vec![
        Ok(b"partial".to_vec()),
        Err(eyre::eyre!("connection reset")),
    ]));

    let err = merge_stream(
        TextStream::new(failing, CancellationToken::new()),
        &store,
        0,
        &event_tx,
    )
    .await
    .unwrap_err();

    assert!(format!("{err:?}").contains("connection reset"));
    assert!(store.read().await.current.messages().is_empty());
}
