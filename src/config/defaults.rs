use super::constants::*;

pub(crate) fn log_level() -> Option<String> {
    Some("info".to_string())
}

pub(crate) fn log_file_path() -> String {
    LOG_FILE_PATH.to_string()
}

pub(crate) fn endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

pub(crate) fn completion_path() -> String {
    COMPLETION_PATH.to_string()
}

pub(crate) fn title_path() -> String {
    TITLE_PATH.to_string()
}

pub(crate) fn default_model() -> String {
    GPT35.to_string()
}

pub(crate) fn models() -> Vec<String> {
    vec![GPT35.to_string(), GPT4.to_string()]
}

pub(crate) fn fallback_title() -> String {
    FALLBACK_TITLE.to_string()
}

pub(crate) fn page_size() -> usize {
    PAGE_SIZE
}
