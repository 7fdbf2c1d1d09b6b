//! The structured trust configuration of one CT log

use crate::error::Result;
use ctlog_crypto::{extract_root, CertificatePem, PublicKeyPem, SigningKey};
use zeroize::Zeroizing;

/// Identity, backend, signing key and trusted roots of a CT log
///
/// Trusted roots are an ordered list with no two entries byte-equal. Roots
/// only enter it through [`TrustConfig::add_root`], which keeps just the last
/// certificate of a presented chain, or through decoding.
pub struct TrustConfig {
    log_id: i64,
    log_prefix: String,
    backend_address: String,
    private_key: SigningKey,
    private_key_password: Zeroizing<String>,
    trusted_roots: Vec<CertificatePem>,
}

impl TrustConfig {
    /// Create a configuration with no trusted roots
    pub fn new(
        log_id: i64,
        log_prefix: impl Into<String>,
        backend_address: impl Into<String>,
        private_key: SigningKey,
        private_key_password: impl Into<String>,
    ) -> Self {
        Self {
            log_id,
            log_prefix: log_prefix.into(),
            backend_address: backend_address.into(),
            private_key,
            private_key_password: Zeroizing::new(private_key_password.into()),
            trusted_roots: Vec::new(),
        }
    }

    /// Assemble a decoded configuration; `trusted_roots` must already be deduplicated
    pub(crate) fn from_parts(
        log_id: i64,
        log_prefix: String,
        backend_address: String,
        private_key: SigningKey,
        private_key_password: Zeroizing<String>,
        trusted_roots: Vec<CertificatePem>,
    ) -> Self {
        Self {
            log_id,
            log_prefix,
            backend_address,
            private_key,
            private_key_password,
            trusted_roots,
        }
    }

    pub fn log_id(&self) -> i64 {
        self.log_id
    }

    pub fn log_prefix(&self) -> &str {
        &self.log_prefix
    }

    /// Address (`host:port`) of the storage backend
    pub fn backend_address(&self) -> &str {
        &self.backend_address
    }

    pub fn private_key(&self) -> &SigningKey {
        &self.private_key
    }

    pub fn private_key_password(&self) -> &str {
        &self.private_key_password
    }

    /// Public key, derived from the private key on every call
    pub fn public_key(&self) -> Result<PublicKeyPem> {
        Ok(self.private_key.public_key_pem()?)
    }

    /// Trusted roots in insertion order
    pub fn trusted_roots(&self) -> &[CertificatePem] {
        &self.trusted_roots
    }

    /// Whether a root with identical bytes is trusted
    pub fn contains_root(&self, root: &CertificatePem) -> bool {
        self.trusted_roots.iter().any(|r| r == root)
    }

    /// Trust the root of a PEM chain
    ///
    /// Returns `false` when the root was already trusted. A chain whose root
    /// cannot be extracted leaves the configuration untouched.
    pub fn add_root(&mut self, chain_pem: &[u8]) -> Result<bool> {
        let root = extract_root(chain_pem)?;
        Ok(self.insert_root(root))
    }

    /// Stop trusting the root of a PEM chain
    ///
    /// Returns `false` when the root was not trusted.
    pub fn remove_root(&mut self, chain_pem: &[u8]) -> Result<bool> {
        let root = extract_root(chain_pem)?;
        Ok(self.delete_root(&root))
    }

    /// Trust an already extracted root
    pub fn insert_root(&mut self, root: CertificatePem) -> bool {
        if self.contains_root(&root) {
            tracing::debug!("Root already trusted, not adding");
            return false;
        }
        self.trusted_roots.push(root);
        true
    }

    /// Remove every entry byte-equal to `root`
    pub fn delete_root(&mut self, root: &CertificatePem) -> bool {
        let before = self.trusted_roots.len();
        self.trusted_roots.retain(|r| r != root);
        before != self.trusted_roots.len()
    }
}

impl std::fmt::Debug for TrustConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustConfig")
            .field("log_id", &self.log_id)
            .field("log_prefix", &self.log_prefix)
            .field("backend_address", &self.backend_address)
            .field("private_key", &self.private_key)
            .field("trusted_roots", &self.trusted_roots.len())
            .finish_non_exhaustive()
    }
}
