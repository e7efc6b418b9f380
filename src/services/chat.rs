#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;

use std::sync::Arc;

use eyre::{Context, Result};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::api::{AddedMessage, ArcChatApi};
use crate::config::constants::{FALLBACK_TITLE, MOCK_ID, PAGE_SIZE};
use crate::models::{
    ArcEventTx, Conversation, Event, Message, NoticeMessage, SummaryPage, Version,
};
use crate::store::Store;
use crate::stream::{MergeOutcome, TextStream, merge_stream};
use crate::{error_notice, warn_notice};

/// Asynchronous operations over the chat backend. Each one calls the API,
/// applies the confirmed result to the store and catches its own failures:
/// errors are logged, written to the error slot and reported as a notice.
#[derive(Clone)]
pub struct ChatService {
    api: ArcChatApi,
    store: Store,
    event_tx: ArcEventTx,
    cancel_token: Arc<Mutex<CancellationToken>>,
    // Held across request and apply so confirmations land in issue order
    mutation_gate: Arc<Mutex<()>>,
    fallback_title: String,
    page_size: usize,
}

impl ChatService {
    pub fn new(api: ArcChatApi, store: Store, event_tx: ArcEventTx) -> Self {
        Self {
            api,
            store,
            event_tx,
            cancel_token: Arc::new(Mutex::new(CancellationToken::new())),
            mutation_gate: Arc::new(Mutex::new(())),
            fallback_title: FALLBACK_TITLE.to_string(),
            page_size: PAGE_SIZE,
        }
    }

    pub fn with_fallback_title(mut self, title: impl Into<String>) -> Self {
        self.fallback_title = title.into();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Replaces the store with one page of conversations. On failure the
    /// store keeps its content and an empty list is returned.
    pub async fn fetch_conversations(&self, page: usize, page_size: usize) -> Vec<Conversation> {
        self.store.write().await.loading = true;
        let result = self.api.list_conversations(page, page_size).await;
        self.store.write().await.loading = false;

        match result {
            Ok(conversations) => {
                self.store.write().await.apply_fetched(conversations.clone());
                self.emit(Event::ConversationsLoaded(conversations.len()))
                    .await;
                conversations
            }
            Err(err) => {
                self.report("Failed to load conversations", err).await;
                vec![]
            }
        }
    }

    pub async fn conversation_summaries(
        &self,
        page: usize,
        page_size: usize,
        search: &str,
    ) -> Option<SummaryPage> {
        match self
            .api
            .conversation_summaries(page, page_size, search.to_string())
            .await
        {
            Ok(summaries) => Some(summaries),
            Err(err) => {
                self.report("Failed to load conversation summaries", err)
                    .await;
                None
            }
        }
    }

    pub async fn create_conversation(
        &self,
        title: &str,
        messages: Vec<Message>,
    ) -> Option<Conversation> {
        self.create(title, messages, None).await
    }

    /// With a `generation`, the created conversation only replaces the
    /// projection when nothing replaced it while the request was in flight.
    async fn create(
        &self,
        title: &str,
        messages: Vec<Message>,
        generation: Option<u64>,
    ) -> Option<Conversation> {
        match self
            .api
            .create_conversation(title.to_string(), messages)
            .await
        {
            Ok(conversation) => {
                log::debug!("Created conversation {}", conversation.id());
                let shown = {
                    let mut state = self.store.write().await;
                    match generation {
                        Some(generation) => {
                            state.apply_created_since(generation, conversation.clone())
                        }
                        None => {
                            state.apply_created(conversation.clone());
                            true
                        }
                    }
                };
                if !shown {
                    log::warn!(
                        "Chat moved on while conversation {} was created, keeping the current view",
                        conversation.id()
                    );
                }
                self.emit(Event::ConversationCreated(conversation.id().to_string()))
                    .await;
                Some(conversation)
            }
            Err(err) => {
                self.report("Failed to create conversation", err).await;
                None
            }
        }
    }

    pub async fn change_title(&self, id: &str, title: &str) -> bool {
        if let Err(err) = self
            .api
            .change_title(id.to_string(), title.to_string())
            .await
        {
            self.report("Failed to change title", err).await;
            return false;
        }
        self.store.write().await.apply_title_changed(id, title);
        self.emit(Event::ConversationUpdated(id.to_string())).await;
        true
    }

    pub async fn delete_conversation(&self, id: &str) -> bool {
        if let Err(err) = self.api.delete_conversation(id.to_string()).await {
            self.report("Failed to delete conversation", err).await;
            return false;
        }
        self.store.write().await.apply_deleted(id);
        self.emit(Event::ConversationDeleted(id.to_string())).await;
        true
    }

    /// Persists `message` and applies the echo to both the store and the
    /// projection. `hidden` confirmations reach the store but never the
    /// transcript. Unsaved conversations are skipped.
    pub async fn add_message(
        &self,
        conversation_id: &str,
        message: &Message,
        hidden: bool,
    ) -> Option<AddedMessage> {
        if conversation_id.is_empty() || conversation_id == MOCK_ID {
            log::debug!("Skip persisting message {}, conversation is not saved", message.id());
            return None;
        }

        let _gate = self.mutation_gate.lock().await;
        let result = self
            .api
            .add_message(
                conversation_id.to_string(),
                message.role(),
                message.content().to_string(),
            )
            .await;

        match result {
            Ok(mut added) => {
                added.hidden = hidden;
                self.store.write().await.apply_message_added(&added);
                Some(added)
            }
            Err(err) => {
                self.report("Failed to save message", err).await;
                None
            }
        }
    }

    pub async fn add_version(&self, conversation_id: &str, root_message_id: &str) -> Option<Version> {
        let _gate = self.mutation_gate.lock().await;
        let result = self
            .api
            .add_version(conversation_id.to_string(), root_message_id.to_string())
            .await;

        match result {
            Ok(version) => {
                log::debug!(
                    "Added version {} to conversation {}",
                    version.id(),
                    conversation_id
                );
                self.store.write().await.apply_version_added(version.clone());
                Some(version)
            }
            Err(err) => {
                self.report("Failed to add version", err).await;
                None
            }
        }
    }

    pub async fn fetch_branched(&self, conversation_id: &str) -> Option<Conversation> {
        match self.api.get_conversation(conversation_id.to_string()).await {
            Ok(conversation) => {
                self.store
                    .write()
                    .await
                    .apply_branched(conversation.clone());
                self.emit(Event::ConversationUpdated(conversation_id.to_string()))
                    .await;
                Some(conversation)
            }
            Err(err) => {
                self.report("Failed to load conversation", err).await;
                None
            }
        }
    }

    pub async fn open_conversation(&self, conversation_id: &str) -> bool {
        self.store
            .write()
            .await
            .conversations
            .set_active_conversation(conversation_id);
        self.fetch_branched(conversation_id).await.is_some()
    }

    /// Confirms the switch with the backend, then moves the active pointer
    /// and shows the target version. A rejected switch changes nothing.
    pub async fn switch_version(&self, conversation_id: &str, version_id: &str) -> bool {
        if let Err(err) = self
            .api
            .switch_version(conversation_id.to_string(), version_id.to_string())
            .await
        {
            self.report("Failed to switch version", err).await;
            return false;
        }

        let applied = self
            .store
            .write()
            .await
            .apply_version_switched(conversation_id, version_id);
        if !applied {
            log::warn!(
                "Version {} of conversation {} is not known locally, reloading",
                version_id,
                conversation_id
            );
            if self.fetch_branched(conversation_id).await.is_none() {
                return false;
            }
        }

        self.emit(Event::VersionSwitched {
            conversation_id: conversation_id.to_string(),
            version_id: version_id.to_string(),
        })
        .await;
        true
    }

    /// Starts a new version of the current conversation rooted at
    /// `root_message_id` and shows it.
    pub async fn branch(&self, root_message_id: &str) -> bool {
        let conversation_id = {
            let state = self.store.read().await;
            if state.streaming {
                drop(state);
                self.notify(warn_notice!("Wait for the response to finish before branching"))
                    .await;
                return false;
            }
            if !state.current.is_persisted() {
                drop(state);
                self.notify(warn_notice!("Only saved conversations can be branched"))
                    .await;
                return false;
            }
            state.current.conversation_id().to_string()
        };

        let Some(version) = self.add_version(&conversation_id, root_message_id).await else {
            return false;
        };
        self.store
            .write()
            .await
            .apply_version_switched(&conversation_id, version.id());
        self.emit(Event::VersionSwitched {
            conversation_id,
            version_id: version.id().to_string(),
        })
        .await;
        true
    }

    /// Appends `content` as a user message and streams the reply into the
    /// projection. Refused while another response is streaming.
    pub async fn send_prompt(&self, content: &str) -> bool {
        let content = content.trim();
        if content.is_empty() {
            return false;
        }

        let prompt = Message::new_user(content);
        let (conversation_id, cancel_token) = {
            let mut state = self.store.write().await;
            if state.streaming {
                drop(state);
                self.notify(warn_notice!("A response is still streaming"))
                    .await;
                return false;
            }
            state.start_streaming();
            let cancel_token = self.renew_cancel_token().await;
            state.current.add_message(prompt.clone());
            let conversation_id = state
                .current
                .is_persisted()
                .then(|| state.current.conversation_id().to_string());
            (conversation_id, cancel_token)
        };

        if let Some(conversation_id) = conversation_id {
            if self
                .add_message(&conversation_id, &prompt, false)
                .await
                .is_none()
            {
                self.store.write().await.streaming = false;
                return false;
            }
        }

        self.generate(cancel_token).await
    }

    /// Streams a fresh reply for the last prompt. In a saved conversation the
    /// reply goes to a new version rooted at the old reply, which keeps the
    /// history before it; otherwise it replaces the trailing assistant
    /// message.
    pub async fn regenerate(&self) -> bool {
        let (branch_from, cancel_token) = {
            let mut state = self.store.write().await;
            if state.streaming {
                drop(state);
                self.notify(warn_notice!("A response is still streaming"))
                    .await;
                return false;
            }
            let Some(last) = state.current.last_message().filter(|m| m.is_assistant()) else {
                drop(state);
                self.notify(warn_notice!("Nothing to regenerate")).await;
                return false;
            };
            let branch_from = if state.current.is_persisted() {
                if last.id().is_empty() {
                    drop(state);
                    self.notify(warn_notice!("The last reply is not saved yet"))
                        .await;
                    return false;
                }
                Some((
                    state.current.conversation_id().to_string(),
                    last.id().to_string(),
                ))
            } else {
                None
            };
            state.start_streaming();
            (branch_from, self.renew_cancel_token().await)
        };

        if let Some((conversation_id, root_message_id)) = branch_from {
            let Some(version) = self.add_version(&conversation_id, &root_message_id).await else {
                self.store.write().await.streaming = false;
                return false;
            };
            self.store
                .write()
                .await
                .apply_version_switched(&conversation_id, version.id());
            self.emit(Event::VersionSwitched {
                conversation_id,
                version_id: version.id().to_string(),
            })
            .await;
        }

        self.generate(cancel_token).await
    }

    /// Cancels the running stream, if any.
    pub async fn stop(&self) {
        self.cancel_token.lock().await.cancel();
    }

    pub async fn is_streaming(&self) -> bool {
        self.store.is_streaming().await
    }

    pub async fn start_new_conversation(&self) {
        let mut state = self.store.write().await;
        state.current.start_new();
        state.conversations.set_active_conversation("");
    }

    /// Renames the conversation on screen. An unsaved transcript is saved
    /// under the new title.
    pub async fn rename_current(&self, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() {
            return false;
        }

        let (persisted, conversation_id, messages, generation) = {
            let state = self.store.read().await;
            (
                state.current.is_persisted(),
                state.current.conversation_id().to_string(),
                state.current.messages().to_vec(),
                state.current.generation(),
            )
        };

        if persisted {
            return self.change_title(&conversation_id, title).await;
        }
        if messages.is_empty() {
            self.notify(warn_notice!("Nothing to rename yet")).await;
            return false;
        }
        self.create(title, messages, Some(generation))
            .await
            .is_some()
    }

    pub async fn set_model(&self, model: &str) -> bool {
        let mut state = self.store.write().await;
        if state.streaming {
            drop(state);
            self.notify(warn_notice!("Cannot change model while streaming"))
                .await;
            return false;
        }
        log::debug!("Switching model to {}", model);
        state.model = model.to_string();
        true
    }

    pub async fn reset(&self) {
        self.stop().await;
        self.store.write().await.reset();
    }

    /// Promotes the first exchange of an unsaved conversation into a saved
    /// one. A failing title service falls back to the configured title.
    pub async fn maybe_bootstrap_title(&self) -> Option<Conversation> {
        let (question, answer, messages, generation) = {
            let state = self.store.read().await;
            if state.streaming {
                return None;
            }
            let (question, answer) = state.current.title_seed()?;
            (
                question,
                answer,
                state.current.messages().to_vec(),
                state.current.generation(),
            )
        };

        let title = match self.api.generate_title(question, answer).await {
            Ok(title) if !title.trim().is_empty() => title.trim().to_string(),
            Ok(_) => {
                log::warn!("Title service returned an empty title, using fallback");
                self.fallback_title.clone()
            }
            Err(err) => {
                log::warn!("Failed to generate title, using fallback: {:#}", err);
                self.fallback_title.clone()
            }
        };
        self.emit(Event::TitleGenerated(title.clone())).await;

        self.create(&title, messages, Some(generation)).await
    }

    /// Runs one completion against the projection. The caller has already
    /// raised the streaming flag and renewed the token under the same lock;
    /// the flag is lowered here on every outcome.
    async fn generate(&self, cancel_token: CancellationToken) -> bool {
        let (messages, model, generation) = {
            let state = self.store.read().await;
            let mut messages = state.current.messages().to_vec();
            if messages.last().is_some_and(|m| m.is_assistant()) {
                messages.pop();
            }
            (messages, state.model.clone(), state.current.generation())
        };

        self.emit(Event::StreamStarted).await;
        let result = self
            .stream_reply(messages, model, generation, cancel_token)
            .await;
        self.store.write().await.streaming = false;

        match result {
            Ok(MergeOutcome::Merged(reply)) => {
                self.emit(Event::StreamFinished(reply.clone())).await;
                self.after_reply(reply).await;
                true
            }
            Ok(MergeOutcome::Cancelled) => {
                self.emit(Event::StreamAborted).await;
                false
            }
            Ok(MergeOutcome::Discarded(_)) => {
                self.emit(Event::StreamDiscarded).await;
                false
            }
            Err(err) => {
                self.report("Failed to generate a response", err).await;
                false
            }
        }
    }

    async fn stream_reply(
        &self,
        messages: Vec<Message>,
        model: String,
        generation: u64,
        cancel_token: CancellationToken,
    ) -> Result<MergeOutcome> {
        log::debug!("Requesting completion with {} messages", messages.len());
        let body = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => return Ok(MergeOutcome::Cancelled),
            body = self.api.chat_completion(messages, model) => {
                body.wrap_err("requesting chat completion")?
            }
        };
        merge_stream(
            TextStream::new(body, cancel_token),
            &self.store,
            generation,
            &self.event_tx,
        )
        .await
    }

    async fn after_reply(&self, reply: Message) {
        let conversation_id = {
            let state = self.store.read().await;
            state
                .current
                .is_persisted()
                .then(|| state.current.conversation_id().to_string())
        };

        match conversation_id {
            Some(conversation_id) => {
                self.add_message(&conversation_id, &reply, false).await;
            }
            None => {
                self.maybe_bootstrap_title().await;
            }
        }
    }

    async fn renew_cancel_token(&self) -> CancellationToken {
        let mut token = self.cancel_token.lock().await;
        *token = CancellationToken::new();
        token.clone()
    }

    async fn report(&self, context: &str, err: eyre::Report) {
        log::error!("{}: {:?}", context, err);
        let message = format!("{}: {:#}", context, err);
        self.store.write().await.error = Some(message.clone());
        self.notify(error_notice!(message)).await;
    }

    async fn notify(&self, notice: NoticeMessage) {
        self.emit(Event::Notice(notice)).await;
    }

    async fn emit(&self, event: Event) {
        self.event_tx.send(event).await.unwrap_or_else(|err| {
            log::error!("Failed to send event: {}", err);
        });
    }
}
