use serde::Deserialize;

/// Informational build identity exposed to pages as `extensionVersion`/`extensionBuild`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShimConfig {
    pub extension_version: String,
    pub extension_build: String,
}

impl ShimConfig {
    pub fn new(extension_version: &str, extension_build: &str) -> Self {
        Self {
            extension_version: String::from(extension_version),
            extension_build: String::from(extension_build),
        }
    }
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_VERSION"), "dev")
    }
}
