//! Error types for ctlog-crypto

use thiserror::Error;

/// Errors that can occur while handling key material and certificates
#[derive(Error, Debug)]
pub enum Error {
    /// Wrong password, or the encrypted container is corrupted
    #[error("Decryption error: {0}")]
    Decryption(String),

    /// Encrypting the private key failed
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// None of the known private key encodings matched
    #[error("Unrecognized private key encoding: {0}")]
    KeyFormat(String),

    /// Key material is well-formed but cannot produce signatures
    #[error("Key algorithm {0} is not a supported signing algorithm")]
    NotASigner(String),

    /// A presented chain contained no certificates
    #[error("No certificates found in PEM chain")]
    EmptyChain,

    /// Input is not valid PEM
    #[error("Malformed PEM: {0}")]
    MalformedPem(String),

    /// Certificate parsing error
    #[error("Certificate error: {0}")]
    Certificate(String),

    /// DER encoding/decoding error
    #[error("DER error: {0}")]
    Der(String),

    /// Key generation error
    #[error("Key generation error: {0}")]
    KeyGeneration(String),

    /// Signing error
    #[error("Signing error: {0}")]
    Signing(String),

    /// AWS-LC-RS error
    #[error("Crypto error: {0}")]
    AwsLc(String),
}

impl From<aws_lc_rs::error::Unspecified> for Error {
    fn from(_: aws_lc_rs::error::Unspecified) -> Self {
        Error::AwsLc("unspecified error".to_string())
    }
}

impl From<aws_lc_rs::error::KeyRejected> for Error {
    fn from(e: aws_lc_rs::error::KeyRejected) -> Self {
        Error::KeyFormat(e.to_string())
    }
}

impl From<der::Error> for Error {
    fn from(e: der::Error) -> Self {
        Error::Der(e.to_string())
    }
}

/// Result type for key and certificate operations
pub type Result<T> = std::result::Result<T, Error>;
