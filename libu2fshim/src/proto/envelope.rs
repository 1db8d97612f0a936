use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{trace, warn};

use crate::transport::error::{Error, TransportError};

/// Marks page to host traffic.
pub const OUTBOUND_TAG: &str = "u2f_window2safari";
/// Marks host to page traffic.
pub const INBOUND_TAG: &str = "u2f_safari2window";
pub const INBOUND_NAME: &str = "U2FResponse";

/// Reason a message on the shared channel was not accepted as ours.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Noise {
    /// Cheap substring prefilter failed, the payload was never parsed.
    MissingTag,
    Unparseable,
    UnexpectedContract,
}

impl std::fmt::Display for Noise {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboundName {
    #[serde(rename = "U2FRegister")]
    Register,
    #[serde(rename = "U2FSign")]
    Sign,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    pub app_id: String,
    pub challenge: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_handle: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEnvelope {
    #[serde(rename = "_meta")]
    pub meta: String,
    pub name: OutboundName,
    pub message: OutboundMessage,
}

impl OutboundEnvelope {
    pub fn new(name: OutboundName, message: OutboundMessage) -> Self {
        Self {
            meta: String::from(OUTBOUND_TAG),
            name,
            message,
        }
    }

    pub fn encode(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(|err| {
            warn!(%err, "Failed to encode outbound envelope");
            Error::Transport(TransportError::InvalidEnvelope)
        })
    }

    /// Receiving side of the page to host direction.
    pub fn decode(data: &str) -> Result<Self, Noise> {
        if !data.contains(OUTBOUND_TAG) {
            return Err(Noise::MissingTag);
        }
        let envelope: Self = serde_json::from_str(data).or(Err(Noise::Unparseable))?;
        if envelope.meta != OUTBOUND_TAG {
            return Err(Noise::UnexpectedContract);
        }
        Ok(envelope)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub error: Value,
    /// JSON-encoded `RegisterResult` or `SignResult`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl InboundMessage {
    /// The reported error, if the host reported one.
    ///
    /// `null`, `false`, `0`, `""` and strings holding a zero number all mean success.
    /// Arrays compare through their joined text, so `[]` and `[0]` are success too.
    pub fn host_error(&self) -> Option<&Value> {
        let failed = match &self.error {
            Value::Null | Value::Bool(false) => false,
            Value::Bool(true) | Value::Object(_) => true,
            Value::Number(number) => number.as_f64().map_or(true, |n| n != 0.0),
            Value::String(text) => nonzero_text(text),
            Value::Array(items) => nonzero_text(&joined_text(items)),
        };
        if failed {
            Some(&self.error)
        } else {
            None
        }
    }
}

fn nonzero_text(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && trimmed.parse::<f64>().map_or(true, |n| n != 0.0)
}

fn joined_text(items: &[Value]) -> String {
    items
        .iter()
        .map(|item| match item {
            Value::Null => String::new(),
            Value::String(text) => text.clone(),
            Value::Array(inner) => joined_text(inner),
            Value::Object(_) => String::from("[object Object]"),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEnvelope {
    #[serde(rename = "_meta")]
    pub meta: String,
    pub name: String,
    pub message: InboundMessage,
}

impl InboundEnvelope {
    fn response(message: InboundMessage) -> Self {
        Self {
            meta: String::from(INBOUND_TAG),
            name: String::from(INBOUND_NAME),
            message,
        }
    }

    /// Successful reply carrying `result` JSON-encoded inside the message.
    pub fn success<T: Serialize>(result: &T) -> Result<Self, Error> {
        let result = serde_json::to_string(result)
            .or(Err(Error::Transport(TransportError::InvalidEnvelope)))?;
        Ok(Self::response(InboundMessage {
            error: Value::from(0),
            result: Some(result),
        }))
    }

    pub fn failure<E: Into<Value>>(error: E) -> Self {
        Self::response(InboundMessage {
            error: error.into(),
            result: None,
        })
    }

    pub fn encode(&self) -> Result<String, Error> {
        serde_json::to_string(self).or(Err(Error::Transport(TransportError::InvalidEnvelope)))
    }

    /// Two-stage gate: substring check for the inbound tag, then a structured decode.
    pub fn decode(data: &str) -> Result<Self, Noise> {
        if !data.contains(INBOUND_TAG) {
            return Err(Noise::MissingTag);
        }
        let envelope: Self = serde_json::from_str(data).map_err(|err| {
            trace!(%err, "Tagged message is not an envelope");
            Noise::Unparseable
        })?;
        if envelope.meta != INBOUND_TAG || envelope.name != INBOUND_NAME {
            return Err(Noise::UnexpectedContract);
        }
        Ok(envelope)
    }
}
