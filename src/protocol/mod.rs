pub mod command;
pub mod error;
pub mod reply;

pub const DEFAULT_DELIMITER: char = ':';
pub const DEFAULT_MAX_TOKENS: usize = 16;

/// Anything that answers one line of command text with one reply.
#[async_trait::async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, line: &str) -> String;
}

/// Splits `text` on `delimiter`, keeping at most `max_tokens` tokens.
///
/// Only text terminated by a delimiter forms a token; whatever follows
/// the last delimiter (or the token cap) is dropped.
pub fn tokenize(text: &str, delimiter: char, max_tokens: usize) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut rest = text;
    while tokens.len() < max_tokens {
        match rest.find(delimiter) {
            Some(index) => {
                tokens.push(rest[..index].to_string());
                rest = &rest[index + delimiter.len_utf8()..];
            }
            None => break,
        }
    }
    tokens
}
