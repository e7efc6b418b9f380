#[cfg(test)]
#[path = "render_test.rs"]
mod tests;

use std::fmt::Write;

use crate::models::{Conversation, Event, SummaryPage};
use crate::store::ActiveVersion;

pub fn conversation_list(conversations: &[Conversation]) -> String {
    if conversations.is_empty() {
        return "No conversations yet.".to_string();
    }

    let mut out = String::new();
    for convo in conversations {
        let marker = if convo.active() { "*" } else { " " };
        let _ = writeln!(
            out,
            "{} {}  {}  ({} versions)",
            marker,
            convo.id(),
            convo.title(),
            convo.versions().len()
        );
    }
    out
}

pub fn summaries(page: &SummaryPage) -> String {
    let mut out = String::new();
    for summary in &page.summaries {
        let _ = write!(out, "{}  {}", summary.id, summary.title);
        if let Some(modified_at) = summary.modified_at {
            let _ = write!(out, "  [{}]", modified_at.format("%Y-%m-%d %H:%M"));
        }
        out.push('\n');
        if let Some(text) = summary.summary.as_deref().filter(|s| !s.is_empty()) {
            let _ = writeln!(out, "    {}", text);
        }
    }
    let _ = writeln!(out, "{} conversations, {} pages", page.total, page.pages);
    out
}

pub fn versions(conversation: &Conversation, current_version: &str) -> String {
    let mut out = String::new();
    for version in conversation.versions() {
        let marker = if version.id() == current_version { "*" } else { " " };
        let _ = write!(
            out,
            "{} {}  {} messages",
            marker,
            version.id(),
            version.messages().len()
        );
        if let Some(root) = version.root_message() {
            let _ = write!(out, "  from message {}", root);
        }
        if let Some(parent) = version.parent_version() {
            let _ = write!(out, "  of {}", parent);
        }
        out.push('\n');
    }
    out
}

pub fn transcript(current: &ActiveVersion) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}", current.title());
    if !current.is_sentinel() {
        let _ = writeln!(
            out,
            "  conversation {}, version {}",
            current.conversation_id(),
            current.id()
        );
    }
    for message in current.messages() {
        let _ = writeln!(
            out,
            "[{}] {}: {}",
            message.id(),
            message.role(),
            message.content()
        );
    }
    out
}

/// Text printed for an event, `None` when the event is not shown.
pub fn event_text(event: &Event) -> Option<String> {
    match event {
        Event::Notice(notice) => Some(format!("[{}] {}\n", notice.kind(), notice.message())),
        Event::StreamStarted => Some("assistant: ".to_string()),
        Event::StreamChunk(text) => Some(text.clone()),
        Event::StreamFinished(_) => Some("\n".to_string()),
        Event::StreamAborted => Some("\n[stopped]\n".to_string()),
        Event::StreamDiscarded => {
            Some("\n[reply dropped, another version is shown now]\n".to_string())
        }
        Event::TitleGenerated(title) => Some(format!("Saved as \"{}\"\n", title)),
        Event::VersionSwitched { version_id, .. } => {
            Some(format!("Showing version {}\n", version_id))
        }
        Event::ConversationDeleted(id) => Some(format!("Deleted conversation {}\n", id)),
        Event::ConversationsLoaded(_)
        | Event::ConversationCreated(_)
        | Event::ConversationUpdated(_) => None,
    }
}
