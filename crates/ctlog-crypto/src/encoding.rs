//! Type-safe wrappers for PEM-encoded material
//!
//! Trusted roots and public keys travel as PEM blobs. These newtypes make it
//! clear which kind of PEM a byte buffer holds, and keep the exact bytes that
//! were stored so that byte-equality comparisons stay meaningful.

use crate::error::{Error, Result};
use pem::{EncodeConfig, LineEnding, Pem};
use x509_cert::der::Decode;
use x509_cert::Certificate;

/// PEM label for X.509 certificates
pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// PEM label for SubjectPublicKeyInfo public keys
pub const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";

/// PEM label for PKCS#8 EncryptedPrivateKeyInfo
pub const ENCRYPTED_PRIVATE_KEY_LABEL: &str = "ENCRYPTED PRIVATE KEY";

/// Encode DER bytes as PEM with LF line endings and 64-column wrapping.
///
/// This is the canonical form written by this crate; the same input always
/// produces the same bytes.
pub fn encode_pem(label: &str, der: &[u8]) -> String {
    let block = Pem::new(label, der.to_vec());
    pem::encode_config(&block, EncodeConfig::new().set_line_ending(LineEnding::LF))
}

/// Parse a single PEM block from raw bytes, requiring the given label
fn parse_labeled(bytes: &[u8], label: &str) -> Result<Pem> {
    let parsed = pem::parse(bytes).map_err(|e| Error::MalformedPem(e.to_string()))?;
    if parsed.tag() != label {
        return Err(Error::MalformedPem(format!(
            "expected {} PEM block, got {}",
            label,
            parsed.tag()
        )));
    }
    Ok(parsed)
}

/// A single X.509 certificate in PEM form
///
/// Equality is byte equality of the PEM text, which is how trusted roots are
/// deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CertificatePem(Vec<u8>);

impl CertificatePem {
    /// Canonically PEM-encode a DER certificate
    pub fn from_der(der: &[u8]) -> Self {
        Self(encode_pem(CERTIFICATE_LABEL, der).into_bytes())
    }

    /// Validate stored PEM bytes, keeping them verbatim
    ///
    /// The bytes must start with a `CERTIFICATE` block whose contents parse as
    /// an X.509 certificate.
    pub fn parse(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        let block = parse_labeled(&bytes, CERTIFICATE_LABEL)?;
        Certificate::from_der(block.contents())
            .map_err(|e| Error::Certificate(format!("failed to parse certificate: {}", e)))?;
        Ok(Self(bytes))
    }

    /// Get the PEM bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume and return the PEM bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Decode to DER
    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(parse_labeled(&self.0, CERTIFICATE_LABEL)?.into_contents())
    }

    /// SHA-256 fingerprint of the DER certificate, hex encoded
    pub fn fingerprint(&self) -> Result<String> {
        Ok(crate::hash::fingerprint(&self.to_der()?))
    }
}

impl AsRef<[u8]> for CertificatePem {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A PEM-encoded public key
///
/// This type wraps a SubjectPublicKeyInfo in PEM format (with BEGIN/END headers).
/// It can be created from a `SigningKey` using `public_key_pem()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyPem(String);

impl PublicKeyPem {
    /// Canonically PEM-encode a DER SubjectPublicKeyInfo
    pub fn from_der(spki_der: &[u8]) -> Self {
        Self(encode_pem(PUBLIC_KEY_LABEL, spki_der))
    }

    /// Parse stored PEM bytes, checking that they hold a SubjectPublicKeyInfo
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::MalformedPem(format!("public key is not UTF-8: {}", e)))?;
        let block = parse_labeled(bytes, PUBLIC_KEY_LABEL)?;
        spki::SubjectPublicKeyInfoRef::try_from(block.contents())
            .map_err(|e| Error::Der(format!("failed to parse SPKI: {}", e)))?;
        Ok(Self(text.to_string()))
    }

    /// Get the PEM string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner PEM string
    pub fn into_string(self) -> String {
        self.0
    }

    /// Decode to DER SubjectPublicKeyInfo
    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(parse_labeled(self.0.as_bytes(), PUBLIC_KEY_LABEL)?.into_contents())
    }
}

impl std::fmt::Display for PublicKeyPem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PublicKeyPem {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A password-protected private key (`ENCRYPTED PRIVATE KEY` PEM block)
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedKeyPem(String);

impl EncryptedKeyPem {
    pub(crate) fn from_der(der: &[u8]) -> Self {
        Self(encode_pem(ENCRYPTED_PRIVATE_KEY_LABEL, der))
    }

    /// Get the PEM string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner PEM string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Debug for EncryptedKeyPem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EncryptedKeyPem").field(&"..").finish()
    }
}

impl AsRef<[u8]> for EncryptedKeyPem {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}
