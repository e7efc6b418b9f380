#[cfg(test)]
#[path = "current_test.rs"]
mod tests;

use crate::api::AddedMessage;
use crate::config::constants::{MOCK_ID, MOCK_PARENT_VERSION, MOCK_ROOT_MESSAGE, MOCK_TITLE};
use crate::models::{Conversation, Message, Role, Version, VersionPatch};

/// Working copy of the version on screen. Starts as the mock sentinel and is
/// replaced wholesale whenever another version is shown. Every wholesale
/// replacement bumps `generation` so late writers can tell they are stale.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveVersion {
    id: String,
    title: String,
    conversation_id: String,
    root_message: Option<String>,
    parent_version: Option<String>,
    messages: Vec<Message>,
    active: bool,
    generation: u64,
}

impl ActiveVersion {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn root_message(&self) -> Option<&str> {
        self.root_message.as_deref()
    }

    pub fn parent_version(&self) -> Option<&str> {
        self.parent_version.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn is_sentinel(&self) -> bool {
        self.conversation_id == MOCK_ID
    }

    pub fn has_placeholder_title(&self) -> bool {
        self.title == MOCK_TITLE
    }

    /// Whether server calls that need a real conversation id may be issued.
    pub fn is_persisted(&self) -> bool {
        !self.conversation_id.is_empty() && !self.is_sentinel() && !self.has_placeholder_title()
    }

    /// Appends `message`, except that an assistant message following an
    /// assistant message replaces it.
    pub fn add_message(&mut self, message: Message) {
        self.push_or_replace(message, |last, next| {
            last == Role::Assistant && next == Role::Assistant
        });
    }

    pub fn change_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn start_new(&mut self) {
        let generation = self.generation + 1;
        *self = Self {
            generation,
            ..Self::default()
        };
    }

    /// Applies a partial snapshot field by field. `messages` is only touched
    /// when the patch carries them.
    pub fn set_conversation(&mut self, patch: VersionPatch) {
        if let Some(id) = patch.id {
            if id != self.id {
                self.generation += 1;
            }
            self.id = id;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(conversation_id) = patch.conversation_id {
            self.conversation_id = conversation_id;
        }
        if let Some(root_message) = patch.root_message {
            self.root_message = root_message;
        }
        if let Some(parent_version) = patch.parent_version {
            self.parent_version = parent_version;
        }
        if let Some(messages) = patch.messages {
            self.messages = messages;
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
    }

    /// Shows `version` under the conversation title `title`.
    pub fn show_version(&mut self, title: &str, version: &Version) {
        let generation = self.generation + 1;
        *self = Self {
            id: version.id().to_string(),
            title: title.to_string(),
            conversation_id: version.conversation_id().to_string(),
            root_message: version.root_message().map(str::to_string),
            parent_version: version.parent_version().map(str::to_string),
            messages: version.messages().to_vec(),
            active: true,
            generation,
        };
    }

    /// Reaction to a created or fetched conversation: the version the server
    /// flags active becomes the projection. Without one the projection falls
    /// back to the sentinel.
    pub fn on_conversation_loaded(&mut self, conversation: &Conversation) {
        match conversation.active_version() {
            Some(version) => self.show_version(conversation.title(), version),
            None => {
                log::warn!(
                    "Conversation {} has no active version, showing an empty chat",
                    conversation.id()
                );
                self.start_new();
            }
        }
    }

    /// Reaction to a confirmed message. Hidden messages and confirmations for
    /// another conversation leave the transcript alone. Returns whether the
    /// transcript changed.
    pub fn on_message_confirmed(&mut self, added: &AddedMessage) -> bool {
        if added.hidden || added.conversation_id != self.conversation_id {
            return false;
        }
        let Some(message) = added.message.as_ref() else {
            return false;
        };
        self.push_or_replace(message.clone(), |last, next| last == next);
        true
    }

    /// The (question, answer) pair that names a fresh conversation, available
    /// only while the projection holds exactly one exchange under the
    /// placeholder title.
    pub fn title_seed(&self) -> Option<(String, String)> {
        if self.messages.len() != 2 || !self.has_placeholder_title() {
            return None;
        }
        let question = self.messages.iter().find(|m| m.is_user())?;
        let answer = self.messages.iter().find(|m| m.is_assistant())?;
        Some((question.content().to_string(), answer.content().to_string()))
    }

    fn push_or_replace(&mut self, message: Message, replace: impl Fn(Role, Role) -> bool) {
        match self.messages.last_mut() {
            Some(last) if replace(last.role(), message.role()) => *last = message,
            _ => self.messages.push(message),
        }
    }
}

impl Default for ActiveVersion {
    fn default() -> Self {
        Self {
            id: MOCK_ID.to_string(),
            title: MOCK_TITLE.to_string(),
            conversation_id: MOCK_ID.to_string(),
            root_message: Some(MOCK_ROOT_MESSAGE.to_string()),
            parent_version: Some(MOCK_PARENT_VERSION.to_string()),
            messages: vec![],
            active: true,
            generation: 0,
        }
    }
}
