//! CT front end `LogMultiConfig` schema
//!
//! Prost messages for the text-format configuration that the log server reads
//! at startup, plus the checks this crate relies on: exactly one log, exactly
//! one backend and a `keyspb.PEMKeyFile` behind the private key `Any`.
//!
//! Text parsing and printing go through `prost-reflect`, using the
//! descriptors in [`crate::descriptor`].

use crate::descriptor::{message_descriptor, LOG_MULTI_CONFIG};
use crate::error::{Error, Result};
use prost::Message;
use prost_reflect::text_format::FormatOptions;
use prost_reflect::DynamicMessage;
use prost_types::Any;
use zeroize::Zeroize;

/// Any type URL of the private key reference
pub const PEM_KEY_FILE_TYPE_URL: &str = "type.googleapis.com/keyspb.PEMKeyFile";

/// Deepest `{`/`<` nesting accepted in configuration text
pub const MAX_NESTING_DEPTH: usize = 64;

/// Top level configuration: the backends and the logs served from them
#[derive(Clone, PartialEq, Message)]
pub struct LogMultiConfig {
    #[prost(message, optional, tag = "1")]
    pub backends: Option<LogBackendSet>,
    #[prost(message, optional, tag = "2")]
    pub log_configs: Option<LogConfigSet>,
}

#[derive(Clone, PartialEq, Message)]
pub struct LogBackendSet {
    #[prost(message, repeated, tag = "1")]
    pub backend: Vec<LogBackend>,
}

#[derive(Clone, PartialEq, Message)]
pub struct LogConfigSet {
    #[prost(message, repeated, tag = "1")]
    pub config: Vec<LogConfig>,
}

/// A storage backend
#[derive(Clone, PartialEq, Message)]
pub struct LogBackend {
    #[prost(string, tag = "1")]
    pub name: String,
    /// Address of the backend, `host:port`
    #[prost(string, tag = "2")]
    pub backend_spec: String,
}

/// One log served by the front end
#[derive(Clone, PartialEq, Message)]
pub struct LogConfig {
    #[prost(int64, tag = "1")]
    pub log_id: i64,
    #[prost(string, tag = "2")]
    pub prefix: String,
    /// Paths of the trusted root PEM files, as mounted
    #[prost(string, repeated, tag = "3")]
    pub roots_pem_file: Vec<String>,
    /// Packed [`PemKeyFile`]
    #[prost(message, optional, tag = "4")]
    pub private_key: Option<Any>,
    #[prost(message, optional, tag = "5")]
    pub public_key: Option<PublicKey>,
    #[prost(bool, tag = "6")]
    pub reject_expired: bool,
    #[prost(string, repeated, tag = "7")]
    pub ext_key_usages: Vec<String>,
    #[prost(bool, tag = "10")]
    pub accept_only_ca: bool,
    #[prost(string, tag = "11")]
    pub log_backend_name: String,
    #[prost(bool, tag = "12")]
    pub is_mirror: bool,
    #[prost(int32, tag = "13")]
    pub max_merge_delay_sec: i32,
    #[prost(int32, tag = "14")]
    pub expected_merge_delay_sec: i32,
    #[prost(string, repeated, tag = "15")]
    pub reject_extensions: Vec<String>,
    #[prost(bool, tag = "16")]
    pub is_readonly: bool,
    #[prost(bool, tag = "17")]
    pub reject_unexpired: bool,
}

/// SubjectPublicKeyInfo DER of the log's key
#[derive(Clone, PartialEq, Message)]
pub struct PublicKey {
    #[prost(bytes = "vec", tag = "1")]
    pub der: Vec<u8>,
}

/// Reference to a password protected PEM key file
#[derive(Clone, PartialEq, Message)]
#[prost(skip_debug)]
pub struct PemKeyFile {
    #[prost(string, tag = "1")]
    pub path: String,
    #[prost(string, tag = "2")]
    pub password: String,
}

impl std::fmt::Debug for PemKeyFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PemKeyFile")
            .field("path", &self.path)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Drop for PemKeyFile {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

impl LogMultiConfig {
    /// A configuration with a single log served from a single backend
    pub fn single(log: LogConfig, backend: LogBackend) -> Self {
        Self {
            backends: Some(LogBackendSet {
                backend: vec![backend],
            }),
            log_configs: Some(LogConfigSet { config: vec![log] }),
        }
    }

    /// Parse protobuf text format
    pub fn from_text(text: &str) -> Result<Self> {
        check_nesting(text)?;
        let message =
            DynamicMessage::parse_text_format(message_descriptor(LOG_MULTI_CONFIG)?, text)?;
        Ok(message.transcode_to()?)
    }

    /// Render as protobuf text format
    pub fn to_text(&self) -> Result<String> {
        let mut message = DynamicMessage::new(message_descriptor(LOG_MULTI_CONFIG)?);
        message.transcode_from(self)?;
        let options = FormatOptions::new().pretty(true).expand_any(true);
        Ok(message.to_text_format_with_options(&options))
    }

    /// The single log entry
    pub fn single_log(&self) -> Result<&LogConfig> {
        let logs = self.log_configs.as_ref().map(|set| set.config.as_slice());
        single("config", logs.unwrap_or_default())
    }

    /// The single backend entry
    pub fn single_backend(&self) -> Result<&LogBackend> {
        let backends = self.backends.as_ref().map(|set| set.backend.as_slice());
        single("backend", backends.unwrap_or_default())
    }
}

fn single<'a, T>(field: &'static str, entries: &'a [T]) -> Result<&'a T> {
    match entries {
        [only] => Ok(only),
        _ => Err(Error::SchemaCardinality {
            field,
            expected: 1,
            found: entries.len(),
        }),
    }
}

impl LogConfig {
    /// Unpack the private key reference
    pub fn pem_key_file(&self) -> Result<PemKeyFile> {
        let any = self
            .private_key
            .as_ref()
            .ok_or_else(|| Error::MissingField("config.private_key".to_string()))?;
        if any.type_url != PEM_KEY_FILE_TYPE_URL {
            return Err(Error::Schema(format!(
                "config.private_key has type {}, expected {}",
                any.type_url, PEM_KEY_FILE_TYPE_URL
            )));
        }
        let key = PemKeyFile::decode(any.value.as_slice())?;
        if key.path.is_empty() {
            return Err(Error::MissingField("config.private_key.path".to_string()));
        }
        Ok(key)
    }

    /// Pack `key` as the private key reference
    pub fn set_pem_key_file(&mut self, key: &PemKeyFile) {
        self.private_key = Some(Any {
            type_url: PEM_KEY_FILE_TYPE_URL.to_string(),
            value: key.encode_to_vec(),
        });
    }

    /// SubjectPublicKeyInfo DER of the log's key, if recorded
    pub fn public_key_der(&self) -> Option<&[u8]> {
        self.public_key
            .as_ref()
            .map(|key| key.der.as_slice())
            .filter(|der| !der.is_empty())
    }
}

/// Reject text nested deeper than [`MAX_NESTING_DEPTH`] before parsing it
fn check_nesting(text: &str) -> Result<()> {
    let mut depth = 0usize;
    let mut line = 1;
    let mut quote = None;
    let mut escaped = false;
    let mut comment = false;

    for c in text.chars() {
        if c == '\n' {
            line += 1;
            comment = false;
        }
        if comment {
            continue;
        }
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '#' => comment = true,
            '{' | '<' => {
                depth += 1;
                if depth > MAX_NESTING_DEPTH {
                    return Err(Error::NestingTooDeep {
                        limit: MAX_NESTING_DEPTH,
                        line,
                    });
                }
            }
            '}' | '>' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}
