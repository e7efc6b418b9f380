use std::sync::Arc;

use tokio::sync::mpsc;

use super::{Message, NoticeMessage};

/// Progress reported by the chat service while it works. Consumers render
/// these, the store stays the source of truth.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Notice(NoticeMessage),

    StreamStarted,
    StreamChunk(String),
    StreamFinished(Message),
    StreamAborted,
    /// The stream finished after the projection was replaced
    StreamDiscarded,

    ConversationsLoaded(usize),
    ConversationCreated(String),
    ConversationUpdated(String),
    ConversationDeleted(String),
    VersionSwitched {
        conversation_id: String,
        version_id: String,
    },
    TitleGenerated(String),
}

#[async_trait::async_trait]
pub trait EventTx {
    async fn send(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>>;
}

#[async_trait::async_trait]
impl EventTx for mpsc::Sender<Event> {
    async fn send(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>> {
        self.send(event).await
    }
}

#[async_trait::async_trait]
impl EventTx for mpsc::UnboundedSender<Event> {
    async fn send(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>> {
        self.send(event)
    }
}

pub type ArcEventTx = Arc<dyn EventTx + Send + Sync>;
