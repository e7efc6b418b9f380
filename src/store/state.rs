#[cfg(test)]
#[path = "state_test.rs"]
mod tests;

use crate::api::AddedMessage;
use crate::config::constants::GPT35;
use crate::models::{Conversation, Message, Version};

use super::{ActiveVersion, ConversationStore};

/// Everything the client knows. Fields are public for reading; the
/// `apply_*` methods are the only updates that touch more than one slice.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub conversations: ConversationStore,
    pub current: ActiveVersion,
    pub streaming: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub model: String,
}

impl AppState {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn apply_fetched(&mut self, conversations: Vec<Conversation>) {
        self.conversations.replace_all(conversations);
    }

    pub fn apply_created(&mut self, conversation: Conversation) {
        self.current.on_conversation_loaded(&conversation);
        self.conversations.insert_created(conversation);
    }

    /// Applies a creation requested while the projection was at
    /// `generation`. When the projection moved on, the conversation is only
    /// listed and the selection is left alone.
    pub fn apply_created_since(&mut self, generation: u64, conversation: Conversation) -> bool {
        if self.current.generation() != generation {
            self.conversations.insert(conversation);
            return false;
        }
        self.apply_created(conversation);
        true
    }

    pub fn apply_title_changed(&mut self, id: &str, title: &str) -> bool {
        if self.current.conversation_id() == id {
            self.current.change_title(title);
        }
        self.conversations.change_title(id, title)
    }

    pub fn apply_deleted(&mut self, id: &str) -> bool {
        if self.current.conversation_id() == id {
            self.current.start_new();
        }
        self.conversations.remove(id)
    }

    pub fn apply_message_added(&mut self, added: &AddedMessage) {
        self.conversations.add_message(added);
        self.current.on_message_confirmed(added);
    }

    pub fn apply_version_added(&mut self, version: Version) -> bool {
        self.conversations.add_version(version)
    }

    pub fn apply_branched(&mut self, conversation: Conversation) {
        self.current.on_conversation_loaded(&conversation);
        self.conversations.replace_branched(conversation);
    }

    /// Moves the active pointer and shows the target version under the
    /// conversation's title. Returns `false` when the conversation or the
    /// version is unknown locally.
    pub fn apply_version_switched(&mut self, conversation_id: &str, version_id: &str) -> bool {
        if !self.conversations.switch_version(conversation_id, version_id) {
            return false;
        }
        let Some(convo) = self.conversations.get(conversation_id) else {
            return false;
        };
        let Some(version) = convo.version(version_id) else {
            return false;
        };
        self.current.show_version(convo.title(), version);
        true
    }

    pub fn start_streaming(&mut self) {
        self.streaming = true;
        self.error = None;
        self.conversations.touch_active(chrono::Utc::now());
    }

    /// Final write of a stream. Dropped when the projection was replaced
    /// after the stream started.
    pub fn merge_reply(&mut self, generation: u64, message: Message) -> bool {
        if self.current.generation() != generation {
            return false;
        }
        self.current.add_message(message);
        true
    }

    pub fn reset(&mut self) {
        self.conversations.clear();
        self.current.start_new();
        self.streaming = false;
        self.loading = false;
        self.error = None;
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            conversations: ConversationStore::default(),
            current: ActiveVersion::default(),
            streaming: false,
            loading: false,
            error: None,
            model: GPT35.to_string(),
        }
    }
}
