//! Transcoder options
//!
//! Everything about the encoded layout that a deployment may want to change:
//! where the log server mounts the blobs, which backend it talks to, and how
//! hard the key encryption is.

use crate::error::{Error, Result};
use ctlog_crypto::DEFAULT_PBKDF2_ITERATIONS;
use serde::{Deserialize, Serialize};

/// Directory the log server mounts the blob map under
pub const DEFAULT_MOUNT_DIR: &str = "/ctfe-keys";

/// Backend name written into the protocol configuration
pub const DEFAULT_BACKEND_NAME: &str = "trillian";

/// Extended key usage accepted by a Fulcio-backed log
pub const DEFAULT_EXT_KEY_USAGE: &str = "CodeSigning";

/// Options controlling how a trust configuration is encoded
///
/// Every field has a default, so an empty JSON object is valid:
///
/// ```
/// use ctlog_config::TranscoderOptions;
///
/// let options = TranscoderOptions::from_json(r#"{"mountDir": "/etc/ctfe"}"#).unwrap();
/// assert_eq!(options.private_key_path(), "/etc/ctfe/private");
/// assert_eq!(options.backend_name, "trillian");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscoderOptions {
    /// Mount directory of the blob map in the log server
    #[serde(default = "default_mount_dir")]
    pub mount_dir: String,

    /// Name of the single backend entry
    #[serde(default = "default_backend_name")]
    pub backend_name: String,

    /// Extended key usages the log accepts
    #[serde(default = "default_ext_key_usages")]
    pub ext_key_usages: Vec<String>,

    /// PBKDF2 iterations used when re-encrypting the private key
    #[serde(default = "default_pbkdf2_iterations")]
    pub pbkdf2_iterations: u32,
}

fn default_mount_dir() -> String {
    DEFAULT_MOUNT_DIR.to_string()
}

fn default_backend_name() -> String {
    DEFAULT_BACKEND_NAME.to_string()
}

fn default_ext_key_usages() -> Vec<String> {
    vec![DEFAULT_EXT_KEY_USAGE.to_string()]
}

fn default_pbkdf2_iterations() -> u32 {
    DEFAULT_PBKDF2_ITERATIONS
}

impl Default for TranscoderOptions {
    fn default() -> Self {
        Self {
            mount_dir: default_mount_dir(),
            backend_name: default_backend_name(),
            ext_key_usages: default_ext_key_usages(),
            pbkdf2_iterations: default_pbkdf2_iterations(),
        }
    }
}

impl TranscoderOptions {
    /// Parse options from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a JSON file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<()> {
        if self.pbkdf2_iterations == 0 {
            return Err(Error::Schema(
                "pbkdf2Iterations must be greater than zero".to_string(),
            ));
        }
        if self.backend_name.is_empty() {
            return Err(Error::Schema("backendName must not be empty".to_string()));
        }
        Ok(())
    }

    /// Mounted path of a blob
    pub fn mounted_path(&self, key: &str) -> String {
        format!("{}/{}", self.mount_dir.trim_end_matches('/'), key)
    }

    /// Mounted path of the encrypted private key
    pub fn private_key_path(&self) -> String {
        self.mounted_path(crate::transcoder::PRIVATE_KEY)
    }
}
