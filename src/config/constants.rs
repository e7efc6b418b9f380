/// Placeholder id carried by a conversation that has not been persisted yet
pub const MOCK_ID: &str = "mock id";

/// Placeholder title carried by a conversation that has not been persisted yet
pub const MOCK_TITLE: &str = "mock title";

pub const MOCK_ROOT_MESSAGE: &str = "mock message";

pub const MOCK_PARENT_VERSION: &str = "mock version";

/// Title used when the backend cannot generate one
pub const FALLBACK_TITLE: &str = "Conversation";

pub const GPT35: &str = "gpt-3.5-turbo";

pub const GPT4: &str = "gpt-4";

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000";

pub const COMPLETION_PATH: &str = "/gpt/conversation/";

pub const TITLE_PATH: &str = "/gpt/title/";

pub const PAGE_SIZE: usize = 5;

pub const LOG_FILE_PATH: &str = "/tmp/branchat.log";
