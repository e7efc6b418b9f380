pub mod http;

pub use http::{ApiError, HttpApi};

#[cfg(test)]
use mockall::automock;

use crate::{
    config::ServerConfig,
    models::{Conversation, Message, Role, SummaryPage, Version},
};
use async_trait::async_trait;
use eyre::Result;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::{pin::Pin, sync::Arc};

/// Raw body of a streamed completion.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

/// Server echo of an appended message.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AddedMessage {
    pub conversation_id: String,
    pub message: Option<Message>,
    /// Client-side pass-through, never sent to the server
    #[serde(skip)]
    pub hidden: bool,
}

/// The backend chat surface. Every mutating call is authoritative: callers
/// only touch local state after it returns `Ok`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChatApi {
    async fn list_conversations(&self, page: usize, page_size: usize) -> Result<Vec<Conversation>>;
    async fn conversation_summaries(
        &self,
        page: usize,
        page_size: usize,
        search: String,
    ) -> Result<SummaryPage>;
    async fn create_conversation(
        &self,
        title: String,
        messages: Vec<Message>,
    ) -> Result<Conversation>;
    async fn change_title(&self, id: String, title: String) -> Result<()>;
    async fn delete_conversation(&self, id: String) -> Result<()>;
    async fn add_message(
        &self,
        conversation_id: String,
        role: Role,
        content: String,
    ) -> Result<AddedMessage>;
    async fn add_version(&self, conversation_id: String, root_message_id: String)
    -> Result<Version>;
    async fn get_conversation(&self, conversation_id: String) -> Result<Conversation>;
    async fn switch_version(&self, conversation_id: String, version_id: String) -> Result<()>;
    async fn chat_completion(&self, messages: Vec<Message>, model: String) -> Result<ByteStream>;
    async fn generate_title(&self, user_question: String, chatbot_response: String)
    -> Result<String>;
}

pub type ArcChatApi = Arc<dyn ChatApi + Send + Sync>;

pub fn new_api(config: &ServerConfig) -> Result<ArcChatApi> {
    let api = HttpApi::try_from(config)?;
    log::debug!("Using chat backend at {}", api.endpoint());
    Ok(Arc::new(api))
}
