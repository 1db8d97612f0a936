pub mod envelope;
pub mod error;
pub mod model;

pub use self::envelope::{InboundEnvelope, InboundMessage, Noise};
pub use self::envelope::{OutboundEnvelope, OutboundMessage, OutboundName};
pub use self::envelope::{INBOUND_NAME, INBOUND_TAG, OUTBOUND_TAG};
pub use self::error::ErrorCode;
pub use self::model::{ApiVersion, RegisterRequest, RegisteredKey};
pub use self::model::{RegisterResponse, SignResponse, U2fError, U2fResponse};
pub use self::model::{RegisterResult, SignResult};
