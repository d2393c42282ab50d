use std::fmt;

use super::error::ProtocolError;

/// Outcome of one command batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Data(String),
    Error(ProtocolError),
}

impl Reply {
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Data(text) => f.write_str(text),
            Reply::Error(_) => f.write_str("Error"),
        }
    }
}

impl From<Result<String, ProtocolError>> for Reply {
    fn from(result: Result<String, ProtocolError>) -> Self {
        match result {
            Ok(text) => Reply::Data(text),
            Err(err) => Reply::Error(err),
        }
    }
}
