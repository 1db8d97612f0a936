use std::fmt::Display;

use serde_json::Value;

use crate::transport::error::Error;

/// Payload of a window message. Only text payloads can carry envelopes.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageData {
    Text(String),
    Structured(Value),
}

impl MessageData {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageData::Text(text) => Some(text),
            MessageData::Structured(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageEvent {
    pub origin: String,
    pub data: MessageData,
}

impl MessageEvent {
    pub fn text(origin: &str, data: &str) -> Self {
        Self {
            origin: String::from(origin),
            data: MessageData::Text(String::from(data)),
        }
    }

    pub fn structured(origin: &str, data: Value) -> Self {
        Self {
            origin: String::from(origin),
            data: MessageData::Structured(data),
        }
    }
}

/// The page's own-origin messaging channel, shared with unrelated traffic.
pub trait Channel: Send + Sync + Display {
    /// Origin of the page the channel belongs to.
    fn origin(&self) -> &str;

    fn post_message(&self, data: &str, target_origin: &str) -> Result<(), Error>;
}
