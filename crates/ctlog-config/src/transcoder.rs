//! Mapping between a [`TrustConfig`] and its flat blob map
//!
//! The blob map is what gets stored (a Kubernetes secret in practice) and
//! mounted into the log server as one file per key:
//!
//! ```text
//! config      LogMultiConfig in protobuf text format
//! private     ENCRYPTED PRIVATE KEY PEM
//! public      PUBLIC KEY PEM
//! fulcio-0    CERTIFICATE PEM, one key per trusted root
//! fulcio-1
//! ...
//! rootca      legacy single root, read but never written
//! ```
//!
//! The protocol configuration refers to the key and roots by their mounted
//! paths, so root file paths are always `<mount dir>/<blob key>`.

use crate::ctfe::{LogBackend, LogConfig, LogMultiConfig, PemKeyFile, PublicKey};
use crate::error::{Error, Result};
use crate::options::TranscoderOptions;
use crate::trust_config::TrustConfig;
use ctlog_crypto::{CertificatePem, KeyCodec, PublicKeyPem};
use std::collections::BTreeMap;
use zeroize::Zeroizing;

/// Blob key of the protocol configuration
pub const CONFIG_KEY: &str = "config";

/// Blob key of the encrypted private key
pub const PRIVATE_KEY: &str = "private";

/// Blob key of the public key
pub const PUBLIC_KEY: &str = "public";

/// Blob key of the legacy single trusted root
pub const LEGACY_ROOT_KEY: &str = "rootca";

/// Prefix of indexed trusted root keys
pub const ROOT_KEY_PREFIX: &str = "fulcio-";

/// Flat key/value representation of a trust configuration
pub type BlobMap = BTreeMap<String, Vec<u8>>;

/// Blob key of the trusted root at `index`
pub fn root_key_name(index: usize) -> String {
    format!("{}{}", ROOT_KEY_PREFIX, index)
}

/// Decodes and encodes trust configurations
#[derive(Debug, Clone, Default)]
pub struct ConfigTranscoder {
    options: TranscoderOptions,
}

impl ConfigTranscoder {
    pub fn new(options: TranscoderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TranscoderOptions {
        &self.options
    }

    fn codec(&self) -> KeyCodec {
        KeyCodec::with_iterations(self.options.pbkdf2_iterations)
    }

    /// Decode a blob map
    ///
    /// Fails as a whole on the first problem; nothing partial is returned.
    pub fn decode(&self, blobs: &BlobMap) -> Result<TrustConfig> {
        let config_blob = required(blobs, CONFIG_KEY)?;
        let private_blob = required(blobs, PRIVATE_KEY)?;
        let public_blob = required(blobs, PUBLIC_KEY)?;

        let text = std::str::from_utf8(config_blob)
            .map_err(|e| Error::Schema(format!("{} blob is not UTF-8: {}", CONFIG_KEY, e)))?;
        let multi = LogMultiConfig::from_text(text)?;
        let log = multi.single_log()?;
        let backend = multi.single_backend()?;
        let mut key_ref = log.pem_key_file()?;

        let (private_key, derived) = self
            .codec()
            .decrypt(private_blob, &key_ref.password)
            .map_err(Error::blob(PRIVATE_KEY))?;
        let derived_der = derived.to_der()?;

        let stored = PublicKeyPem::parse(public_blob).map_err(Error::blob(PUBLIC_KEY))?;
        if stored.to_der().map_err(Error::blob(PUBLIC_KEY))? != derived_der {
            return Err(Error::PublicKeyMismatch(PUBLIC_KEY.to_string()));
        }
        if let Some(der) = log.public_key_der() {
            if der != derived_der.as_slice() {
                return Err(Error::PublicKeyMismatch("config.public_key".to_string()));
            }
        }

        let roots = collect_roots(blobs)?;
        check_root_paths(&log.roots_pem_file, blobs);

        tracing::debug!(
            "Decoded log {} ({}) with a {} key and {} trusted roots",
            log.log_id,
            log.prefix,
            private_key.algorithm().name(),
            roots.len()
        );

        Ok(TrustConfig::from_parts(
            log.log_id,
            log.prefix.clone(),
            backend.backend_spec.clone(),
            private_key,
            Zeroizing::new(std::mem::take(&mut key_ref.password)),
            roots,
        ))
    }

    /// Encode to a blob map
    ///
    /// The public key is derived from the private key, and the private key is
    /// re-encrypted with the configuration's password under a fresh salt.
    pub fn encode(&self, config: &TrustConfig) -> Result<BlobMap> {
        let public = config.public_key()?;
        let public_der = public.to_der()?;
        let encrypted = self
            .codec()
            .encrypt(config.private_key(), config.private_key_password())?;

        let mut blobs = BlobMap::new();
        let mut root_paths = Vec::with_capacity(config.trusted_roots().len());
        for (index, root) in config.trusted_roots().iter().enumerate() {
            let key = root_key_name(index);
            root_paths.push(self.options.mounted_path(&key));
            blobs.insert(key, root.as_bytes().to_vec());
        }

        let mut log = LogConfig {
            log_id: config.log_id(),
            prefix: config.log_prefix().to_string(),
            roots_pem_file: root_paths,
            public_key: Some(PublicKey { der: public_der }),
            ext_key_usages: self.options.ext_key_usages.clone(),
            log_backend_name: self.options.backend_name.clone(),
            ..Default::default()
        };
        log.set_pem_key_file(&PemKeyFile {
            path: self.options.private_key_path(),
            password: config.private_key_password().to_string(),
        });
        let multi = LogMultiConfig::single(
            log,
            LogBackend {
                name: self.options.backend_name.clone(),
                backend_spec: config.backend_address().to_string(),
            },
        );

        blobs.insert(CONFIG_KEY.to_string(), multi.to_text()?.into_bytes());
        blobs.insert(PRIVATE_KEY.to_string(), encrypted.into_string().into_bytes());
        blobs.insert(PUBLIC_KEY.to_string(), public.into_string().into_bytes());
        Ok(blobs)
    }
}

fn required<'a>(blobs: &'a BlobMap, key: &str) -> Result<&'a [u8]> {
    blobs
        .get(key)
        .map(Vec::as_slice)
        .ok_or_else(|| Error::MissingField(key.to_string()))
}

/// Order in which root keys are read: numeric indexes ascending, then the rest
fn root_order(key: &str) -> (bool, Option<u64>, &str) {
    let index = key
        .strip_prefix(ROOT_KEY_PREFIX)
        .and_then(|suffix| suffix.parse::<u64>().ok());
    (index.is_none(), index, key)
}

/// Union of the legacy slot and the indexed slots, deduplicated by content
fn collect_roots(blobs: &BlobMap) -> Result<Vec<CertificatePem>> {
    let mut indexed: Vec<(&str, &Vec<u8>)> = blobs
        .iter()
        .filter(|(key, _)| key.starts_with(ROOT_KEY_PREFIX))
        .map(|(key, value)| (key.as_str(), value))
        .collect();
    indexed.sort_by_key(|&(key, _)| root_order(key));

    let legacy = blobs
        .get_key_value(LEGACY_ROOT_KEY)
        .map(|(key, value)| (key.as_str(), value));

    let mut kept: Vec<(&str, CertificatePem)> = Vec::new();
    for (key, value) in legacy.into_iter().chain(indexed) {
        if value.is_empty() {
            tracing::warn!("Skipping empty root blob {}", key);
            continue;
        }
        let root = CertificatePem::parse(value.clone()).map_err(Error::blob(key))?;
        match kept.iter().find(|(_, existing)| *existing == root) {
            Some((kept_key, _)) => {
                tracing::warn!("Dropping root {}: same content as {}", key, kept_key);
            }
            None => kept.push((key, root)),
        }
    }
    Ok(kept.into_iter().map(|(_, root)| root).collect())
}

/// Warn about root paths in the protocol configuration that no blob backs
fn check_root_paths(paths: &[String], blobs: &BlobMap) {
    for path in paths {
        let name = path.rsplit('/').next().unwrap_or(path);
        if !blobs.contains_key(name) {
            tracing::warn!("Protocol configuration references {} but no such blob exists", path);
        }
    }
}
