pub mod conversation;
pub mod event;
pub mod message;
pub mod notice;

pub use conversation::{Conversation, ConversationSummary, SummaryPage, Version, VersionPatch};
pub use event::{ArcEventTx, Event, EventTx};
pub use message::{Message, Role};
pub use notice::*;
