//! Trust configuration codec for Fulcio-backed CT logs
//!
//! A CT log that accepts Fulcio certificates needs its signing key, its
//! identity and the set of Fulcio roots it trusts. This crate keeps that
//! configuration in a flat blob map that the log server mounts as files:
//!
//! - [`TrustConfig`]: the structured configuration, with idempotent
//!   [`add_root`](TrustConfig::add_root) and
//!   [`remove_root`](TrustConfig::remove_root)
//! - [`ConfigTranscoder`]: decodes and encodes the blob map, including the
//!   text-format [`LogMultiConfig`] the log server reads
//! - [`Reconciler`]: one load, mutate, store pass against a [`BlobStore`]
//!
//! # Example
//!
//! ```no_run
//! use ctlog_config::{ConfigTranscoder, TrustConfig};
//! use ctlog_crypto::SigningKey;
//!
//! # fn example(fulcio_chain: &[u8]) -> ctlog_config::Result<()> {
//! let key = SigningKey::generate_ecdsa_p256()?;
//! let mut config = TrustConfig::new(2022, "2022-ctlog", "trillian-logserver:8091", key, "password");
//! config.add_root(fulcio_chain)?;
//!
//! let transcoder = ConfigTranscoder::default();
//! let blobs = transcoder.encode(&config)?;
//! let decoded = transcoder.decode(&blobs)?;
//! assert_eq!(decoded.trusted_roots(), config.trusted_roots());
//! # Ok(())
//! # }
//! ```

pub mod ctfe;
pub mod descriptor;
pub mod error;
pub mod options;
pub mod reconcile;
pub mod store;
pub mod transcoder;
pub mod trust_config;

pub use ctfe::{
    LogBackend, LogBackendSet, LogConfig, LogConfigSet, LogMultiConfig, PemKeyFile, PublicKey,
    MAX_NESTING_DEPTH, PEM_KEY_FILE_TYPE_URL,
};
pub use error::{Error, Result};
pub use options::TranscoderOptions;
pub use reconcile::{ReconcileOutcome, Reconciler};
pub use store::{BlobStore, DirectoryStore, MemoryStore};
pub use transcoder::{
    root_key_name, BlobMap, ConfigTranscoder, CONFIG_KEY, LEGACY_ROOT_KEY, PRIVATE_KEY,
    PUBLIC_KEY, ROOT_KEY_PREFIX,
};
pub use trust_config::TrustConfig;
