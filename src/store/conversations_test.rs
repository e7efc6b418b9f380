use super::*;
use crate::models::Message;

fn version(id: &str, active: bool) -> Version {
    Version::new(id, "c1")
        .with_messages(vec![Message::new_user("hello").with_id("m1")])
        .with_active(active)
}

fn build_store() -> ConversationStore {
    let mut store = ConversationStore::default();
    store.replace_all(vec![
        Conversation::new("c1", "First").with_versions(vec![version("v1", false), version("v2", true)]),
        Conversation::new("c2", "Second"),
    ]);
    store
}

fn added(conversation_id: &str, content: &str) -> AddedMessage {
    AddedMessage {
        conversation_id: conversation_id.to_string(),
        message: Some(Message::new_assistant(content).with_id("m2")),
        hidden: false,
    }
}

#[test]
fn test_replace_all_deactivates() {
    let mut store = ConversationStore::default();
    store.replace_all(vec![Conversation::new("c1", "First").with_active(true)]);
    assert_eq!(store.len(), 1);
    assert!(store.active().is_none());
}

#[test]
fn test_insert_created_is_only_active() {
    let mut store = build_store();
    store.set_active_conversation("c2");
    store.insert_created(Conversation::new("c3", "Third"));

    assert_eq!(store.len(), 3);
    assert_eq!(store.conversations()[2].id(), "c3");
    let active = store
        .conversations()
        .iter()
        .filter(|c| c.active())
        .map(|c| c.id())
        .collect::<Vec<_>>();
    assert_eq!(active, vec!["c3"]);
}

#[test]
fn test_change_title_and_remove() {
    let mut store = build_store();
    assert!(store.change_title("c1", "Renamed"));
    assert_eq!(store.get("c1").unwrap().title(), "Renamed");

    let before = store.clone();
    assert!(!store.change_title("missing", "Nope"));
    assert_eq!(store, before);

    assert!(store.remove("c1"));
    assert!(store.get("c1").is_none());
    assert!(!store.remove("c1"));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_add_message_to_active_version() {
    let mut store = build_store();
    assert!(store.add_message(&added("c1", "hi there")));

    let convo = store.get("c1").unwrap();
    assert_eq!(convo.version("v1").unwrap().messages().len(), 1);
    let active = convo.version("v2").unwrap();
    assert_eq!(active.messages().len(), 2);
    assert_eq!(active.messages()[1].content(), "hi there");
}

#[test]
fn test_add_message_follows_active_pointer() {
    let mut store = ConversationStore::new(vec![
        Conversation::new("c1", "First")
            .with_versions(vec![version("v1", false), version("v2", true)])
            .with_active_version("v1"),
    ]);
    assert!(store.add_message(&added("c1", "hi there")));
    let convo = store.get("c1").unwrap();
    assert_eq!(convo.version("v1").unwrap().messages().len(), 2);
    assert_eq!(convo.version("v2").unwrap().messages().len(), 1);
}

#[test]
fn test_add_message_no_op_cases() {
    let mut store = ConversationStore::new(vec![
        Conversation::new("c1", "No versions"),
        Conversation::new("c2", "No active").with_versions(vec![version("v1", false)]),
    ]);
    let before = store.clone();

    assert!(!store.add_message(&added("c1", "lost")));
    assert!(!store.add_message(&added("c2", "lost")));
    assert!(!store.add_message(&added("missing", "lost")));
    assert!(!store.add_message(&AddedMessage {
        conversation_id: "c2".to_string(),
        message: None,
        hidden: false,
    }));

    assert_eq!(store, before);
}

#[test]
fn test_add_version_activates_new_branch() {
    let mut store = build_store();
    assert!(store.add_version(
        Version::new("v3", "c1")
            .with_root_message("m1")
            .with_parent_version("v2")
    ));

    let convo = store.get("c1").unwrap();
    assert_eq!(convo.versions().len(), 3);
    assert_eq!(convo.active_version().unwrap().id(), "v3");
    assert_eq!(convo.versions().iter().filter(|v| v.active()).count(), 1);

    assert!(!store.add_version(Version::new("v1", "missing")));
}

#[test]
fn test_replace_branched_never_inserts() {
    let mut store = build_store();
    let fresh = Conversation::new("c2", "Second")
        .with_versions(vec![Version::new("v7", "c2").with_active(true)]);
    assert!(store.replace_branched(fresh.clone()));
    assert_eq!(store.get("c2"), Some(&fresh));

    assert!(!store.replace_branched(Conversation::new("c9", "Unknown")));
    assert_eq!(store.len(), 2);
}

#[test]
fn test_switch_version() {
    let mut store = build_store();
    assert!(store.switch_version("c1", "v1"));
    let convo = store.get("c1").unwrap();
    assert!(convo.version("v1").unwrap().active());
    assert!(!convo.version("v2").unwrap().active());

    let before = store.clone();
    assert!(!store.switch_version("missing", "v1"));
    assert_eq!(store, before);
}

#[test]
fn test_touch_active() {
    let mut store = build_store();
    let now = chrono::Utc::now();
    store.touch_active(now);
    assert!(store.conversations().iter().all(|c| c.modified_at().is_none()));

    store.set_active_conversation("c2");
    store.touch_active(now);
    assert_eq!(store.get("c2").unwrap().modified_at(), Some(now));
    assert_eq!(store.get("c1").unwrap().modified_at(), None);
}
