use std::sync::Arc;

use super::*;
use crate::api::MockChatApi;
use crate::models::{Conversation, Message, Version};
use crate::store::{AppState, Store};

fn setup(api: MockChatApi, state: AppState) -> Repl {
    let (tx, _rx) = mpsc::unbounded_channel();
    let service = ChatService::new(Arc::new(api), Store::new(state), Arc::new(tx));
    Repl::new(
        service,
        vec!["gpt-3.5-turbo".to_string(), "gpt-4".to_string()],
        CancellationToken::new(),
    )
}

#[tokio::test]
async fn test_quit_and_empty() {
    let mut repl = setup(MockChatApi::new(), AppState::default());
    assert!(repl.handle(Input::Empty).await);
    assert!(!repl.handle(Input::Command(SlashCommand::Quit)).await);
}

#[tokio::test]
async fn test_model_must_be_configured() {
    let mut repl = setup(MockChatApi::new(), AppState::default());

    repl.handle(Input::Command(SlashCommand::Model(Some("llama".to_string()))))
        .await;
    assert_eq!(repl.service.store().read().await.model, "gpt-3.5-turbo");

    repl.handle(Input::Command(SlashCommand::Model(Some("gpt-4".to_string()))))
        .await;
    assert_eq!(repl.service.store().read().await.model, "gpt-4");
}

#[tokio::test]
async fn test_open_then_switch() {
    let convo = Conversation::new("c1", "Trip planning")
        .with_versions(vec![
            Version::new("v1", "c1").with_messages(vec![Message::new_user("one").with_id("m1")]),
            Version::new("v2", "c1")
                .with_messages(vec![Message::new_user("two").with_id("m2")])
                .with_active(true),
        ])
        .with_active_version("v2");

    let mut api = MockChatApi::new();
    let fetched = convo.clone();
    api.expect_get_conversation()
        .withf(|id| id == "c1")
        .times(1)
        .returning(move |_| Ok(fetched.clone()));
    api.expect_switch_version()
        .withf(|cid, vid| cid == "c1" && vid == "v1")
        .times(1)
        .returning(|_, _| Ok(()));

    let mut state = AppState::default();
    state.apply_fetched(vec![convo]);
    let mut repl = setup(api, state);

    assert!(
        repl.handle(Input::Command(SlashCommand::Open("c1".to_string())))
            .await
    );
    assert_eq!(repl.service.store().read().await.current.id(), "v2");

    assert!(
        repl.handle(Input::Command(SlashCommand::Switch("v1".to_string())))
            .await
    );
    let state = repl.service.store().snapshot().await;
    assert_eq!(state.current.id(), "v1");
    assert_eq!(state.current.messages()[0].content(), "one");
}

#[tokio::test]
async fn test_switch_needs_saved_conversation() {
    let mut repl = setup(MockChatApi::new(), AppState::default());
    assert!(
        repl.handle(Input::Command(SlashCommand::Switch("v1".to_string())))
            .await
    );
    assert!(repl.service.store().read().await.current.is_sentinel());
}
