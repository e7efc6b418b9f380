#[cfg(test)]
#[path = "http_test.rs"]
mod tests;

use crate::api::{AddedMessage, ByteStream, ChatApi};
use crate::config::{ServerConfig, user_agent};
use crate::models::{Conversation, Message, Role, SummaryPage, Version};
use async_trait::async_trait;
use eyre::{Context, Result};
use futures::TryStreamExt;
use reqwest::{Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::time;
use thiserror::Error;

pub struct HttpApi {
    endpoint: String,
    timeout: Option<time::Duration>,
    csrf_token: Option<String>,
    session_id: Option<String>,
    completion_path: String,
    title_path: String,
    client: reqwest::Client,
}

#[async_trait]
impl ChatApi for HttpApi {
    async fn list_conversations(&self, page: usize, page_size: usize) -> Result<Vec<Conversation>> {
        let req = self
            .request(Method::GET, "/chat/conversations_branched/")
            .query(&[("page", page), ("page_size", page_size)]);
        let res = send(req, "listing conversations").await?;
        let conversations = res
            .json::<Vec<Conversation>>()
            .await
            .wrap_err("parsing conversation list response")?
            .into_iter()
            .map(|c| c.with_active(false))
            .collect();
        Ok(conversations)
    }

    async fn conversation_summaries(
        &self,
        page: usize,
        page_size: usize,
        search: String,
    ) -> Result<SummaryPage> {
        let req = self
            .request(Method::GET, "/chat/conversations/summaries/")
            .query(&[
                ("page", page.to_string()),
                ("page_size", page_size.to_string()),
                ("search", search),
            ]);
        let res = send(req, "listing conversation summaries").await?;
        res.json::<SummaryPage>()
            .await
            .wrap_err("parsing conversation summaries response")
    }

    async fn create_conversation(
        &self,
        title: String,
        messages: Vec<Message>,
    ) -> Result<Conversation> {
        let body = CreateConversationRequest {
            title,
            messages: messages.iter().map(MessageRequest::from).collect(),
        };
        let req = self
            .request(Method::POST, "/chat/conversations/add/")
            .json(&body);
        let res = send(req, "creating conversation").await?;
        let conversation = res
            .json::<Conversation>()
            .await
            .wrap_err("parsing created conversation")?;
        Ok(conversation.with_active(true))
    }

    async fn change_title(&self, id: String, title: String) -> Result<()> {
        let req = self
            .request(Method::PUT, &format!("/chat/conversations/{}/change_title/", id))
            .json(&TitleRequest { title });
        send(req, "changing conversation title").await?;
        Ok(())
    }

    async fn delete_conversation(&self, id: String) -> Result<()> {
        let req = self
            .request(Method::PUT, &format!("/chat/conversations/{}/delete/", id))
            .json(&serde_json::json!({}));
        send(req, "deleting conversation").await?;
        Ok(())
    }

    async fn add_message(
        &self,
        conversation_id: String,
        role: Role,
        content: String,
    ) -> Result<AddedMessage> {
        let req = self
            .request(
                Method::POST,
                &format!("/chat/conversations/{}/add_message/", conversation_id),
            )
            .json(&MessageRequest { role, content });
        let res = send(req, "adding message").await?;
        res.json::<AddedMessage>()
            .await
            .wrap_err("parsing added message response")
    }

    async fn add_version(
        &self,
        conversation_id: String,
        root_message_id: String,
    ) -> Result<Version> {
        let req = self
            .request(
                Method::POST,
                &format!("/chat/conversations/{}/add_version/", conversation_id),
            )
            .json(&AddVersionRequest { root_message_id });
        let res = send(req, "adding version").await?;
        res.json::<Version>()
            .await
            .wrap_err("parsing added version response")
    }

    async fn get_conversation(&self, conversation_id: String) -> Result<Conversation> {
        let req = self.request(
            Method::GET,
            &format!("/chat/conversation_branched/{}/", conversation_id),
        );
        let res = send(req, "fetching conversation").await?;
        let conversation = res
            .json::<Conversation>()
            .await
            .wrap_err("parsing conversation response")?;
        Ok(conversation.with_active(true))
    }

    async fn switch_version(&self, conversation_id: String, version_id: String) -> Result<()> {
        let req = self
            .request(
                Method::PUT,
                &format!(
                    "/chat/conversations/{}/switch_version/{}/",
                    conversation_id, version_id
                ),
            )
            .json(&serde_json::json!({}));
        send(req, "switching version").await?;
        Ok(())
    }

    async fn chat_completion(&self, messages: Vec<Message>, model: String) -> Result<ByteStream> {
        let body = CompletionRequest {
            messages: messages.iter().map(MessageRequest::from).collect(),
            model,
        };
        log::trace!("Sending completion request: {:?}", body);

        let req = self
            .streaming_request(Method::POST, &self.completion_path)
            .json(&body);
        let res = send(req, "requesting completion").await?;

        let stream = res
            .bytes_stream()
            .map_ok(|chunk| chunk.to_vec())
            .map_err(|e| eyre::Report::new(e).wrap_err("reading completion stream"));
        Ok(Box::pin(stream))
    }

    async fn generate_title(
        &self,
        user_question: String,
        chatbot_response: String,
    ) -> Result<String> {
        let req = self.request(Method::POST, &self.title_path).json(&TitleGenerationRequest {
            user_question,
            chatbot_response,
        });
        let res = send(req, "generating title").await?;
        let res = res
            .json::<TitleResponse>()
            .await
            .wrap_err("parsing title response")?;
        Ok(res.title)
    }
}

impl TryFrom<&ServerConfig> for HttpApi {
    type Error = eyre::Report;

    fn try_from(value: &ServerConfig) -> Result<Self> {
        let mut api = HttpApi::new()?
            .with_endpoint(&value.endpoint)
            .with_completion_path(&value.completion_path)
            .with_title_path(&value.title_path);

        if let Some(timeout) = value.timeout() {
            api = api.with_timeout(timeout);
        }

        if let Some(token) = value.csrf_token.as_deref() {
            api = api.with_csrf_token(token);
        }

        if let Some(session_id) = value.session_id.as_deref() {
            api = api.with_session_id(session_id);
        }
        Ok(api)
    }
}

impl HttpApi {
    pub fn new() -> Result<Self> {
        let defaults = ServerConfig::default();
        let client = reqwest::Client::builder()
            .gzip(true)
            .build()
            .wrap_err("building http client")?;
        Ok(Self {
            endpoint: defaults.endpoint,
            timeout: None,
            csrf_token: None,
            session_id: None,
            completion_path: defaults.completion_path,
            title_path: defaults.title_path,
            client,
        })
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: time::Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_csrf_token(mut self, token: &str) -> Self {
        self.csrf_token = Some(token.to_string());
        self
    }

    pub fn with_session_id(mut self, session_id: &str) -> Self {
        self.session_id = Some(session_id.to_string());
        self
    }

    pub fn with_completion_path(mut self, path: &str) -> Self {
        self.completion_path = path.to_string();
        self
    }

    pub fn with_title_path(mut self, path: &str) -> Self {
        self.title_path = path.to_string();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Option<time::Duration> {
        self.timeout
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self.streaming_request(method, path);
        match self.timeout {
            Some(timeout) => req.timeout(timeout),
            None => req,
        }
    }

    /// A request without the overall timeout, the body may stream for longer.
    fn streaming_request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self
            .client
            .request(method, format!("{}{}", self.endpoint, path))
            .header("Content-Type", "application/json")
            .header("User-Agent", user_agent());

        if let Some(token) = &self.csrf_token {
            req = req.header("X-CSRFToken", token);
        }

        if let Some(session_id) = &self.session_id {
            req = req.header("Cookie", format!("sessionid={}", session_id));
        }
        req
    }
}

async fn send(req: RequestBuilder, action: &str) -> Result<Response> {
    let res = req.send().await.wrap_err(action.to_string())?;

    if !res.status().is_success() {
        let http_code = res.status().as_u16();
        let body = res.text().await.wrap_err("reading error response")?;
        log::error!("{} failed with {}: {}", action, http_code, body);
        return Err(ApiError::from_body(http_code, &body).into());
    }
    Ok(res)
}

#[derive(Debug, Serialize)]
struct MessageRequest {
    role: Role,
    content: String,
}

#[derive(Debug, Serialize)]
struct CreateConversationRequest {
    title: String,
    messages: Vec<MessageRequest>,
}

#[derive(Debug, Serialize)]
struct TitleRequest {
    title: String,
}

#[derive(Debug, Serialize)]
struct AddVersionRequest {
    root_message_id: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    messages: Vec<MessageRequest>,
    model: String,
}

#[derive(Debug, Serialize)]
struct TitleGenerationRequest {
    user_question: String,
    chatbot_response: String,
}

#[derive(Debug, Deserialize)]
struct TitleResponse {
    #[serde(alias = "content")]
    title: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    detail: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
#[error("backend error ({http_code}): {detail}")]
pub struct ApiError {
    pub http_code: u16,
    pub detail: String,
}

impl ApiError {
    fn from_body(http_code: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<ErrorResponse>(body)
            .ok()
            .and_then(|e| e.detail)
            .unwrap_or_else(|| body.trim().to_string());
        Self { http_code, detail }
    }
}

impl From<&Message> for MessageRequest {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role(),
            content: msg.content().to_string(),
        }
    }
}
