use serde_json::Value;
use tracing::{debug, warn};

use crate::pending::OperationKind;
use crate::proto::envelope::{InboundMessage, OutboundEnvelope, OutboundMessage, OutboundName};
use crate::proto::model::{RegisterRequest, RegisteredKey, RegisterResult, SignResult};
use crate::proto::model::{U2fError, U2fResponse};
use crate::transport::error::{Error, PlatformError};

/// Shape of a `register` call, decided once at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterCall {
    /// `register(appId, registerRequests, registeredKeys, callback, timeout?)`
    ExplicitAppId {
        app_id: String,
        register_requests: Vec<RegisterRequest>,
        registered_keys: Vec<RegisteredKey>,
    },
    /// Legacy `register(registerRequests, registeredKeys, callback, timeout?)`
    ImplicitAppId {
        register_requests: Vec<RegisterRequest>,
        registered_keys: Vec<RegisteredKey>,
    },
}

/// Shape of a `sign` call, decided once at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignCall {
    /// `sign(appId, challenge, registeredKeys, callback, timeout?)`
    ExplicitAppId {
        app_id: String,
        challenge: String,
        registered_keys: Vec<RegisteredKey>,
    },
    /// Legacy `sign(registeredKeys, callback, timeout?)`, app id and challenge live on the keys.
    ImplicitAppId { registered_keys: Vec<RegisteredKey> },
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

fn malformed(reason: &str) -> Error {
    debug!(%reason, "Rejecting malformed request");
    Error::Platform(PlatformError::MalformedRequest)
}

/// Only the list itself is checked here. Each entry is read on its own, so a
/// badly typed entry that is never selected cannot reject the call.
fn list_argument<T>(value: Option<&Value>, entry: fn(&Value) -> T) -> Result<Vec<T>, Error> {
    match value {
        None | Some(Value::Null) => Ok(vec![]),
        Some(Value::Array(entries)) => Ok(entries.iter().map(entry).collect()),
        Some(_) => Err(malformed("argument is not a list of entries")),
    }
}

impl RegisterCall {
    pub fn new(register_requests: Vec<RegisterRequest>) -> Self {
        RegisterCall::ImplicitAppId {
            register_requests,
            registered_keys: vec![],
        }
    }

    pub fn with_app_id(app_id: &str, register_requests: Vec<RegisterRequest>) -> Self {
        RegisterCall::ExplicitAppId {
            app_id: String::from(app_id),
            register_requests,
            registered_keys: vec![],
        }
    }

    /// Classifies loosely typed page arguments, callback and timeout excluded.
    /// A string in the first slot means the app id was given explicitly.
    pub fn from_arguments(args: &[Value]) -> Result<Self, Error> {
        match args.first() {
            Some(Value::String(app_id)) => Ok(RegisterCall::ExplicitAppId {
                app_id: app_id.clone(),
                register_requests: list_argument(args.get(1), RegisterRequest::from_entry)?,
                registered_keys: list_argument(args.get(2), RegisteredKey::from_entry)?,
            }),
            _ => Ok(RegisterCall::ImplicitAppId {
                register_requests: list_argument(args.first(), RegisterRequest::from_entry)?,
                registered_keys: list_argument(args.get(1), RegisteredKey::from_entry)?,
            }),
        }
    }

    pub fn explicit_app_id(&self) -> Option<&str> {
        match self {
            RegisterCall::ExplicitAppId { app_id, .. } => Some(app_id),
            RegisterCall::ImplicitAppId { .. } => None,
        }
    }

    fn register_requests(&self) -> &[RegisterRequest] {
        match self {
            RegisterCall::ExplicitAppId {
                register_requests, ..
            }
            | RegisterCall::ImplicitAppId {
                register_requests, ..
            } => register_requests,
        }
    }

    /// Selects the first `U2F_V2` request and resolves the outbound `U2FRegister` envelope.
    /// Registered keys are accepted but never forwarded.
    pub fn build_envelope(&self) -> Result<OutboundEnvelope, Error> {
        let selected = self
            .register_requests()
            .iter()
            .find(|request| request.is_supported())
            .ok_or_else(|| malformed("no U2F_V2 register request"))?;

        let challenge = non_empty(selected.challenge.as_deref())
            .ok_or_else(|| malformed("missing challenge"))?;
        let app_id = non_empty(self.explicit_app_id())
            .or_else(|| non_empty(selected.app_id.as_deref()))
            .ok_or_else(|| malformed("missing app id"))?;

        Ok(OutboundEnvelope::new(
            OutboundName::Register,
            OutboundMessage {
                app_id: String::from(app_id),
                challenge: String::from(challenge),
                key_handle: None,
            },
        ))
    }
}

impl SignCall {
    pub fn new(registered_keys: Vec<RegisteredKey>) -> Self {
        SignCall::ImplicitAppId { registered_keys }
    }

    pub fn with_app_id(app_id: &str, challenge: &str, registered_keys: Vec<RegisteredKey>) -> Self {
        SignCall::ExplicitAppId {
            app_id: String::from(app_id),
            challenge: String::from(challenge),
            registered_keys,
        }
    }

    /// Classifies loosely typed page arguments, callback and timeout excluded.
    /// A string in the first slot means app id and challenge occupy the first two slots.
    pub fn from_arguments(args: &[Value]) -> Result<Self, Error> {
        match args.first() {
            Some(Value::String(app_id)) => Ok(SignCall::ExplicitAppId {
                app_id: app_id.clone(),
                challenge: args
                    .get(1)
                    .and_then(Value::as_str)
                    .map(String::from)
                    .unwrap_or_default(),
                registered_keys: list_argument(args.get(2), RegisteredKey::from_entry)?,
            }),
            _ => Ok(SignCall::ImplicitAppId {
                registered_keys: list_argument(args.first(), RegisteredKey::from_entry)?,
            }),
        }
    }

    fn registered_keys(&self) -> &[RegisteredKey] {
        match self {
            SignCall::ExplicitAppId {
                registered_keys, ..
            }
            | SignCall::ImplicitAppId { registered_keys } => registered_keys,
        }
    }

    pub fn explicit_app_id(&self) -> Option<&str> {
        match self {
            SignCall::ExplicitAppId { app_id, .. } => Some(app_id),
            SignCall::ImplicitAppId { .. } => None,
        }
    }

    /// Selects the first `U2F_V2` key and resolves the outbound `U2FSign` envelope.
    ///
    /// App id and challenge are taken from the call only when both are present;
    /// otherwise both come from the selected key.
    pub fn build_envelope(&self) -> Result<OutboundEnvelope, Error> {
        let selected = self
            .registered_keys()
            .iter()
            .find(|key| key.is_supported())
            .ok_or_else(|| malformed("no U2F_V2 registered key"))?;

        let explicit = match self {
            SignCall::ExplicitAppId {
                app_id, challenge, ..
            } => non_empty(Some(app_id.as_str())).zip(non_empty(Some(challenge.as_str()))),
            SignCall::ImplicitAppId { .. } => None,
        };
        let (app_id, challenge) = match explicit {
            Some((app_id, challenge)) => (Some(app_id), Some(challenge)),
            None => (
                non_empty(selected.app_id.as_deref()),
                non_empty(selected.challenge.as_deref()),
            ),
        };

        let key_handle = non_empty(selected.key_handle.as_deref())
            .ok_or_else(|| malformed("missing key handle"))?;
        let app_id = app_id.ok_or_else(|| malformed("missing app id"))?;
        let challenge = challenge.ok_or_else(|| malformed("missing challenge"))?;

        Ok(OutboundEnvelope::new(
            OutboundName::Sign,
            OutboundMessage {
                app_id: String::from(app_id),
                challenge: String::from(challenge),
                key_handle: Some(String::from(key_handle)),
            },
        ))
    }
}

/// Shapes a host reply into the value handed to the callback of a `kind` operation.
///
/// The result shape is enforced: a result missing a field, or carrying a
/// non-string one, is reported as `{errorCode: 1, errorMessage}` rather than
/// passed through.
pub fn response_for(kind: OperationKind, message: &InboundMessage) -> U2fResponse {
    if let Some(error) = message.host_error() {
        return U2fResponse::from(U2fError::with_message(error.clone()));
    }

    let Some(result) = message.result.as_deref() else {
        warn!(?kind, "Host reply carries neither error nor result");
        return U2fResponse::from(U2fError::with_message("missing result"));
    };

    let shaped = match kind {
        OperationKind::Register => serde_json::from_str::<RegisterResult>(result)
            .map(|result| U2fResponse::Register(result.into())),
        OperationKind::Sign => {
            serde_json::from_str::<SignResult>(result).map(|result| U2fResponse::Sign(result.into()))
        }
    };
    shaped.unwrap_or_else(|err| {
        warn!(?kind, %err, "Failed to decode host result");
        U2fResponse::from(U2fError::with_message(format!("invalid result: {}", err)))
    })
}
