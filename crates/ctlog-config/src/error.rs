//! Error types for ctlog-config

use thiserror::Error;

/// Errors that can occur while decoding, mutating or encoding a trust configuration
#[derive(Error, Debug)]
pub enum Error {
    /// A required blob or schema field is absent
    #[error("missing required field: {0}")]
    MissingField(String),

    /// The protocol configuration has the wrong number of entries
    #[error("expected exactly {expected} {field} entry in protocol configuration, found {found}")]
    SchemaCardinality {
        /// Repeated field that was counted
        field: &'static str,
        /// Required count
        expected: usize,
        /// Actual count
        found: usize,
    },

    /// The protocol configuration is well-formed text but violates the schema
    #[error("invalid protocol configuration: {0}")]
    Schema(String),

    /// The protocol configuration is not valid text format for the schema
    #[error("failed to parse protocol configuration: {0}")]
    TextFormat(#[from] prost_reflect::text_format::ParseError),

    /// The protocol configuration nests messages too deeply to parse
    #[error("protocol configuration nests deeper than {limit} levels at line {line}")]
    NestingTooDeep {
        /// Deepest nesting accepted
        limit: usize,
        /// Line where the limit was exceeded
        line: usize,
    },

    /// Binary protobuf decoding error
    #[error("protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    /// The protocol configuration schema failed to load
    #[error("invalid protobuf descriptor: {0}")]
    Descriptor(#[from] prost_reflect::DescriptorError),

    /// A stored public key disagrees with the one derived from the private key
    #[error("public key in {0} does not match the private key")]
    PublicKeyMismatch(String),

    /// A stored blob failed to decode
    #[error("failed to decode blob {key}: {source}")]
    Blob {
        /// Blob map key name
        key: String,
        /// Underlying failure
        #[source]
        source: ctlog_crypto::Error,
    },

    /// Crypto error
    #[error("Crypto error: {0}")]
    Crypto(#[from] ctlog_crypto::Error),

    /// A blob key name that cannot be stored as a file
    #[error("invalid blob key name: {0:?}")]
    InvalidKeyName(String),

    /// A named blob map does not exist in the store
    #[error("blob map not found: {0}")]
    NotFound(String),

    /// Blob store failure
    #[error("blob store error: {0}")]
    Store(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Attach the blob key name to a crypto failure
    pub(crate) fn blob(key: impl Into<String>) -> impl FnOnce(ctlog_crypto::Error) -> Error {
        let key = key.into();
        move |source| Error::Blob { key, source }
    }
}

/// Result type for trust configuration operations
pub type Result<T> = std::result::Result<T, Error>;
