use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::proto::error::ErrorCode;
use crate::{JS_API_VERSION, U2F_V2};

/// A page-supplied request to create a credential.
///
/// Entries with any version other than [`U2F_V2`] are carried along but never selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
}

impl RegisterRequest {
    pub fn new_u2f_v2(app_id: &str, challenge: &str) -> RegisterRequest {
        RegisterRequest {
            version: String::from(U2F_V2),
            app_id: Some(String::from(app_id)),
            challenge: Some(String::from(challenge)),
        }
    }

    /// Reads a loosely typed page entry. Fields that are not strings read as absent,
    /// and a non-object entry has no version, so it is never selected.
    pub fn from_entry(entry: &Value) -> RegisterRequest {
        RegisterRequest {
            version: string_field(entry, "version").unwrap_or_default(),
            app_id: string_field(entry, "appId"),
            challenge: string_field(entry, "challenge"),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.version == U2F_V2
    }
}

fn string_field(entry: &Value, name: &str) -> Option<String> {
    entry.get(name).and_then(Value::as_str).map(String::from)
}

/// An already registered credential, as listed by the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredKey {
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_handle: Option<String>,
}

impl RegisteredKey {
    pub fn new_u2f_v2(key_handle: &str) -> RegisteredKey {
        RegisteredKey {
            version: String::from(U2F_V2),
            key_handle: Some(String::from(key_handle)),
            ..RegisteredKey::default()
        }
    }

    pub fn with_app_id(mut self, app_id: &str) -> Self {
        self.app_id = Some(String::from(app_id));
        self
    }

    pub fn with_challenge(mut self, challenge: &str) -> Self {
        self.challenge = Some(String::from(challenge));
        self
    }

    /// Same leniency as [`RegisterRequest::from_entry`].
    pub fn from_entry(entry: &Value) -> RegisteredKey {
        RegisteredKey {
            version: string_field(entry, "version").unwrap_or_default(),
            app_id: string_field(entry, "appId"),
            challenge: string_field(entry, "challenge"),
            key_handle: string_field(entry, "keyHandle"),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.version == U2F_V2
    }
}

/// Result object the host JSON-encodes into a reply to `U2FRegister`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResult {
    pub registration_data: String,
    pub client_data: String,
}

/// Result object the host JSON-encodes into a reply to `U2FSign`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignResult {
    pub key_handle: String,
    pub signature_data: String,
    pub client_data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub version: String,
    pub registration_data: String,
    pub client_data: String,
}

impl From<RegisterResult> for RegisterResponse {
    fn from(result: RegisterResult) -> Self {
        RegisterResponse {
            version: String::from(U2F_V2),
            registration_data: result.registration_data,
            client_data: result.client_data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignResponse {
    pub version: String,
    pub key_handle: String,
    pub signature_data: String,
    pub client_data: String,
}

impl From<SignResult> for SignResponse {
    fn from(result: SignResult) -> Self {
        SignResponse {
            version: String::from(U2F_V2),
            key_handle: result.key_handle,
            signature_data: result.signature_data,
            client_data: result.client_data,
        }
    }
}

/// Error object handed to page callbacks, `{errorCode, errorMessage?}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct U2fError {
    pub error_code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<Value>,
}

impl U2fError {
    pub fn other() -> Self {
        U2fError {
            error_code: ErrorCode::OtherError,
            error_message: None,
        }
    }

    pub fn with_message<M: Into<Value>>(message: M) -> Self {
        U2fError {
            error_code: ErrorCode::OtherError,
            error_message: Some(message.into()),
        }
    }
}

impl std::error::Error for U2fError {}

impl std::fmt::Display for U2fError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self.error_message {
            Some(message) => write!(f, "{}: {}", self.error_code, message),
            None => write!(f, "{}", self.error_code),
        }
    }
}

/// Value delivered to a page callback. Serializes to the exact shape the page expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum U2fResponse {
    Register(RegisterResponse),
    Sign(SignResponse),
    Error(U2fError),
}

impl U2fResponse {
    pub fn is_error(&self) -> bool {
        matches!(self, U2fResponse::Error(_))
    }
}

impl From<U2fError> for U2fResponse {
    fn from(error: U2fError) -> Self {
        U2fResponse::Error(error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ApiVersion {
    pub js_api_version: f64,
}

impl Default for ApiVersion {
    fn default() -> Self {
        ApiVersion {
            js_api_version: JS_API_VERSION,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ApiVersion, RegisteredKey, RegisterRequest, RegisterResult, SignResult};
    use super::{RegisterResponse, SignResponse, U2fError, U2fResponse};

    #[test]
    fn register_response_page_shape() {
        let result = RegisterResult {
            registration_data: String::from("BQQ"),
            client_data: String::from("eyJ0"),
        };
        let response = U2fResponse::Register(RegisterResponse::from(result));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"version": "U2F_V2", "registrationData": "BQQ", "clientData": "eyJ0"})
        );
    }

    #[test]
    fn sign_response_page_shape() {
        let result = SignResult {
            key_handle: String::from("kh"),
            signature_data: String::from("AQ"),
            client_data: String::from("cd"),
        };
        let response = U2fResponse::Sign(SignResponse::from(result));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"version": "U2F_V2", "keyHandle": "kh", "signatureData": "AQ", "clientData": "cd"})
        );
    }

    #[test]
    fn error_without_message_omits_field() {
        let response = U2fResponse::from(U2fError::other());
        assert!(response.is_error());
        assert_eq!(serde_json::to_value(&response).unwrap(), json!({"errorCode": 1}));
    }

    #[test]
    fn error_message_is_kept_verbatim() {
        let response = U2fResponse::from(U2fError::with_message(json!(4)));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"errorCode": 1, "errorMessage": 4})
        );
    }

    #[test]
    fn entries_tolerate_missing_and_unknown_fields() {
        let request: RegisterRequest =
            serde_json::from_value(json!({"version": "U2F_V1", "challenge": "c", "extra": true}))
                .unwrap();
        assert!(!request.is_supported());
        assert_eq!(request.app_id, None);

        let key: RegisteredKey =
            serde_json::from_value(json!({"version": "U2F_V2", "keyHandle": "kh"})).unwrap();
        assert!(key.is_supported());
        assert_eq!(key, RegisteredKey::new_u2f_v2("kh"));
    }

    #[test]
    fn loose_entries_read_non_strings_as_absent() {
        let request = RegisterRequest::from_entry(&json!({"version": 2, "challenge": 5, "appId": "a"}));
        assert!(!request.is_supported());
        assert_eq!(request.challenge, None);
        assert_eq!(request.app_id.as_deref(), Some("a"));

        let key = RegisteredKey::from_entry(&json!({"version": "U2F_V2", "keyHandle": ["kh"]}));
        assert!(key.is_supported());
        assert_eq!(key.key_handle, None);

        assert_eq!(RegisteredKey::from_entry(&json!("U2F_V2")), RegisteredKey::default());
    }

    #[test]
    fn api_version_shape() {
        assert_eq!(
            serde_json::to_value(ApiVersion::default()).unwrap(),
            json!({"js_api_version": 1.1})
        );
    }
}
