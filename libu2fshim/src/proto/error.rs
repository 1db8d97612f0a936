use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde_repr::{Deserialize_repr, Serialize_repr};

// https://fidoalliance.org/specs/fido-u2f-v1.2-ps-20170411/fido-u2f-javascript-api-v1.2-ps-20170411.html#error-codes

#[derive(
    Debug, IntoPrimitive, TryFromPrimitive, Serialize_repr, Deserialize_repr, Copy, Clone, PartialEq, Eq,
)]
#[repr(u8)]
pub enum ErrorCode {
    Ok = 0,                       // OK
    OtherError = 1,               // OTHER_ERROR
    BadRequest = 2,               // BAD_REQUEST
    ConfigurationUnsupported = 3, // CONFIGURATION_UNSUPPORTED
    DeviceIneligible = 4,         // DEVICE_INELIGIBLE
    Timeout = 5,                  // TIMEOUT
}

impl std::error::Error for ErrorCode {}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?} ({})", self, u8::from(*self))
    }
}

#[cfg(test)]
mod tests {
    use std::convert::TryFrom;

    use super::ErrorCode;

    #[test]
    fn error_code_serializes_as_number() {
        assert_eq!(serde_json::to_string(&ErrorCode::OtherError).unwrap(), "1");
        assert_eq!(
            serde_json::from_str::<ErrorCode>("4").unwrap(),
            ErrorCode::DeviceIneligible
        );
    }

    #[test]
    fn error_code_from_unknown_primitive() {
        assert_eq!(ErrorCode::try_from(5u8).unwrap(), ErrorCode::Timeout);
        assert!(ErrorCode::try_from(6u8).is_err());
    }
}
