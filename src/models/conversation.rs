#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;

use serde::{Deserialize, Serialize};

use crate::models::Message;

/// One branch of a conversation's message history.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Version {
    id: String,
    conversation_id: String,
    #[serde(default)]
    root_message: Option<String>,
    #[serde(default)]
    parent_version: Option<String>,
    #[serde(default)]
    messages: Vec<Message>,
    #[serde(default)]
    active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Partial version snapshot. Any field left as `None` keeps the value the
/// receiver already holds.
#[derive(Debug, Clone, Default)]
pub struct VersionPatch {
    pub id: Option<String>,
    pub title: Option<String>,
    pub conversation_id: Option<String>,
    pub root_message: Option<Option<String>>,
    pub parent_version: Option<Option<String>>,
    pub messages: Option<Vec<Message>>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Conversation {
    id: String,
    title: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    active_version: Option<String>,
    #[serde(default)]
    versions: Vec<Version>,
    #[serde(default)]
    modified_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Client-side selection flag, never sent by the server
    #[serde(default, skip_serializing)]
    active: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub modified_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SummaryPage {
    #[serde(default, alias = "results")]
    pub summaries: Vec<ConversationSummary>,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub pages: usize,
}

impl Version {
    pub fn new(id: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            conversation_id: conversation_id.into(),
            root_message: None,
            parent_version: None,
            messages: vec![],
            active: false,
            created_at: None,
        }
    }

    pub fn with_root_message(mut self, root_message: impl Into<String>) -> Self {
        self.root_message = Some(root_message.into());
        self
    }

    pub fn with_parent_version(mut self, parent_version: impl Into<String>) -> Self {
        self.parent_version = Some(parent_version.into());
        self
    }

    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
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

    pub fn created_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.created_at
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub(crate) fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }
}

impl VersionPatch {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = Some(messages);
        self
    }
}

impl From<&Version> for VersionPatch {
    fn from(value: &Version) -> Self {
        Self {
            id: Some(value.id.clone()),
            title: None,
            conversation_id: Some(value.conversation_id.clone()),
            root_message: Some(value.root_message.clone()),
            parent_version: Some(value.parent_version.clone()),
            messages: Some(value.messages.clone()),
            active: Some(value.active),
        }
    }
}

impl Conversation {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            summary: None,
            active_version: None,
            versions: vec![],
            modified_at: None,
            active: false,
        }
    }

    pub fn with_versions(mut self, versions: Vec<Version>) -> Self {
        self.versions = versions;
        self
    }

    pub fn with_active_version(mut self, version_id: impl Into<String>) -> Self {
        self.active_version = Some(version_id.into());
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn active_version_id(&self) -> Option<&str> {
        self.active_version.as_deref()
    }

    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    pub fn modified_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.modified_at
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn version(&self, version_id: &str) -> Option<&Version> {
        self.versions.iter().find(|v| v.id == version_id)
    }

    /// The version flagged active by the server, if any.
    pub fn active_version(&self) -> Option<&Version> {
        self.versions.iter().find(|v| v.active)
    }

    /// Resolves the version new messages belong to: the `active_version`
    /// pointer first, then the `active` flag.
    pub fn target_version_mut(&mut self) -> Option<&mut Version> {
        let pointer = self
            .active_version
            .as_deref()
            .and_then(|id| self.versions.iter().position(|v| v.id == id));
        let idx = pointer.or_else(|| self.versions.iter().position(|v| v.active))?;
        self.versions.get_mut(idx)
    }

    pub(crate) fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub(crate) fn touch(&mut self, timestamp: chrono::DateTime<chrono::Utc>) {
        self.modified_at = Some(timestamp);
    }

    /// Deactivates every version, then activates `version_id` when present.
    /// Returns whether the target version exists.
    pub(crate) fn activate_version(&mut self, version_id: &str) -> bool {
        let mut found = false;
        for version in self.versions.iter_mut() {
            let hit = version.id == version_id;
            version.set_active(hit);
            found |= hit;
        }
        self.active_version = found.then(|| version_id.to_string());
        found
    }

    pub(crate) fn push_active_version(&mut self, version: Version) {
        self.versions.iter_mut().for_each(|v| v.set_active(false));
        self.active_version = Some(version.id.clone());
        self.versions.push(version.with_active(true));
    }
}
