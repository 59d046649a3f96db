use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Body sent to the completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Channel A: decoded text chunk of the reply.
    CompletionDelta(String),
    CompletionFinished,
    CompletionFailed(CompletionError),
    /// Channel B: one event-stream payload.
    Fragment(String),
    FragmentStreamClosed { error: Option<StreamError> },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    #[error("invalid completion url: {0}")]
    InvalidUrl(String),
    #[error("could not encode request: {0}")]
    Encode(String),
    #[error("completion endpoint returned http status {0}")]
    HttpStatus(u16),
    #[error("completion request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("completion stream reported an error: {0}")]
    Reported(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("invalid stream url: {0}")]
    InvalidUrl(String),
    #[error("event stream returned http status {0}")]
    HttpStatus(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed event stream: {0}")]
    Decode(String),
}

/// Which wire format the completion endpoint streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamProtocol {
    /// Raw text; every chunk is part of the reply.
    #[default]
    Text,
    /// Line protocol with typed prefixes (`0:` text, `3:` error).
    Data,
}

impl fmt::Display for StreamProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamProtocol::Text => write!(f, "text"),
            StreamProtocol::Data => write!(f, "data"),
        }
    }
}
