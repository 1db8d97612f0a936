pub mod config;
pub mod dispatch;
pub mod install;
pub mod ops;
pub mod pending;
pub mod proto;
pub mod transport;
pub mod u2f;

#[cfg(test)]
mod test_util;

/// Version tag that request and key entries must carry to be considered.
pub const U2F_V2: &str = "U2F_V2";

/// Version reported by the capability probe.
pub const JS_API_VERSION: f64 = 1.1;

pub use config::ShimConfig;
pub use dispatch::DispatchOutcome;
pub use install::Namespace;
pub use u2f::{U2fApi, U2F};
