#[cfg(test)]
#[path = "decoder_test.rs"]
mod tests;

/// Incremental UTF-8 decoder. Bytes of a character split across two chunks
/// are held back until the rest arrives; invalid bytes decode to U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let bytes = std::mem::take(&mut self.pending);

        let mut text = String::with_capacity(bytes.len());
        let mut offset = 0;
        while offset < bytes.len() {
            match std::str::from_utf8(&bytes[offset..]) {
                Ok(valid) => {
                    text.push_str(valid);
                    break;
                }
                Err(err) => {
                    let valid_up_to = offset + err.valid_up_to();
                    text.push_str(&String::from_utf8_lossy(&bytes[offset..valid_up_to]));
                    match err.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            offset = valid_up_to + len;
                        }
                        None => {
                            self.pending = bytes[valid_up_to..].to_vec();
                            break;
                        }
                    }
                }
            }
        }
        text
    }

    /// Flushes whatever is still buffered. An incomplete trailing sequence
    /// becomes a single U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let bytes = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
