#[cfg(test)]
#[path = "conversations_test.rs"]
mod tests;

use crate::api::AddedMessage;
use crate::models::{Conversation, Version};

/// Server-confirmed conversations in display order. Reducers never fail:
/// a missing conversation or version turns the update into a no-op and the
/// method reports `false`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationStore {
    conversations: Vec<Conversation>,
}

impl ConversationStore {
    pub fn new(conversations: Vec<Conversation>) -> Self {
        Self { conversations }
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id() == id)
    }

    pub fn active(&self) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.active())
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    pub fn replace_all(&mut self, conversations: Vec<Conversation>) {
        self.conversations = conversations
            .into_iter()
            .map(|c| c.with_active(false))
            .collect();
    }

    /// Appends a freshly created conversation as the only active one.
    pub fn insert_created(&mut self, conversation: Conversation) {
        self.conversations.iter_mut().for_each(|c| c.set_active(false));
        self.conversations.push(conversation.with_active(true));
    }

    pub fn insert(&mut self, conversation: Conversation) {
        self.conversations.push(conversation.with_active(false));
    }

    pub fn set_active_conversation(&mut self, id: &str) {
        self.conversations
            .iter_mut()
            .for_each(|c| c.set_active(c.id() == id));
    }

    pub fn change_title(&mut self, id: &str, title: &str) -> bool {
        match self.get_mut(id) {
            Some(convo) => {
                convo.set_title(title);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.conversations.len();
        self.conversations.retain(|c| c.id() != id);
        before != self.conversations.len()
    }

    /// Appends a confirmed message to the conversation's current version.
    pub fn add_message(&mut self, added: &AddedMessage) -> bool {
        let Some(message) = added.message.as_ref() else {
            return false;
        };
        let Some(convo) = self.get_mut(&added.conversation_id) else {
            return false;
        };
        if convo.versions().is_empty() {
            return false;
        }
        match convo.target_version_mut() {
            Some(version) => {
                version.push_message(message.clone());
                true
            }
            None => false,
        }
    }

    pub fn add_version(&mut self, version: Version) -> bool {
        match self.get_mut(version.conversation_id()) {
            Some(convo) => {
                convo.push_active_version(version);
                true
            }
            None => false,
        }
    }

    /// Swaps in the full server copy of a conversation already in the list,
    /// keeping its local selection flag.
    pub fn replace_branched(&mut self, conversation: Conversation) -> bool {
        match self
            .conversations
            .iter()
            .position(|c| c.id() == conversation.id())
        {
            Some(idx) => {
                let active = self.conversations[idx].active();
                self.conversations[idx] = conversation.with_active(active);
                true
            }
            None => false,
        }
    }

    pub fn switch_version(&mut self, conversation_id: &str, version_id: &str) -> bool {
        match self.get_mut(conversation_id) {
            Some(convo) => convo.activate_version(version_id),
            None => false,
        }
    }

    pub fn touch_active(&mut self, timestamp: chrono::DateTime<chrono::Utc>) {
        if let Some(convo) = self.conversations.iter_mut().find(|c| c.active()) {
            convo.touch(timestamp);
        }
    }

    pub fn clear(&mut self) {
        self.conversations.clear();
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id() == id)
    }
}
