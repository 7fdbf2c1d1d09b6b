//! Key material and certificate handling for CT log trust configuration
//!
//! This crate provides the leaf pieces of the trust configuration engine,
//! using aws-lc-rs as the cryptographic backend:
//!
//! - [`SigningKey`]: the log's signing key, a closed set of algorithms that
//!   can all derive a public key and sign
//! - [`KeyCodec`]: password-protected PEM encoding of signing keys, reading
//!   PKCS#8, PKCS#1 and SEC1 payloads
//! - [`extract_root`]: pulls the root certificate out of a PEM chain
//!
//! # Example
//!
//! ```no_run
//! use ctlog_crypto::{extract_root, KeyCodec, SigningKey};
//!
//! # fn example(chain: &[u8]) -> ctlog_crypto::Result<()> {
//! let key = SigningKey::generate_ecdsa_p256()?;
//! let codec = KeyCodec::new();
//! let encrypted = codec.encrypt(&key, "password")?;
//! let (decrypted, _public) = codec.decrypt(encrypted.as_ref(), "password")?;
//! assert_eq!(decrypted, key);
//!
//! let root = extract_root(chain)?;
//! println!("root fingerprint: {}", root.fingerprint()?);
//! # Ok(())
//! # }
//! ```

pub mod encoding;
pub mod error;
pub mod hash;
pub mod key_codec;
pub mod signing;
pub mod x509;

pub use encoding::{encode_pem, CertificatePem, EncryptedKeyPem, PublicKeyPem};
pub use error::{Error, Result};
pub use hash::{fingerprint, sha256};
pub use key_codec::{decode_private_key, KeyCodec, PrivateKeyFormat, DEFAULT_PBKDF2_ITERATIONS};
pub use signing::{KeyAlgorithm, KeyPair, SigningKey};
pub use x509::{extract_root, parse_chain, subject_name};
