//! Signing keys backed by aws-lc-rs
//!
//! A CT log signs with one key, which may be ECDSA, Ed25519 or RSA. Rather
//! than carrying an untyped key around, [`KeyPair`] is a closed set of
//! variants, each able to derive its public key and produce signatures.
//! [`SigningKey`] pairs the parsed key with its canonical PKCS#8 encoding so
//! it can be re-encrypted later without a separate serialization step.

use crate::encoding::PublicKeyPem;
use crate::error::{Error, Result};
use aws_lc_rs::{
    rand::SystemRandom,
    signature::{
        EcdsaKeyPair, Ed25519KeyPair, KeyPair as AwsKeyPair, RsaKeyPair,
        ECDSA_P256_SHA256_ASN1_SIGNING, ECDSA_P384_SHA384_ASN1_SIGNING,
    },
};
use const_oid::db::rfc5912::{ID_EC_PUBLIC_KEY, RSA_ENCRYPTION, SECP_256_R_1, SECP_384_R_1};
use const_oid::db::rfc8410::ID_ED_25519;
use const_oid::ObjectIdentifier;
use der::asn1::BitString;
use der::Encode;
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use zeroize::Zeroizing;

/// Supported signing key algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    /// ECDSA over NIST P-256
    EcdsaP256,
    /// ECDSA over NIST P-384
    EcdsaP384,
    /// Ed25519
    Ed25519,
    /// RSA (any modulus size aws-lc-rs accepts)
    Rsa,
}

impl KeyAlgorithm {
    /// Get the name of this algorithm
    pub fn name(&self) -> &'static str {
        match self {
            KeyAlgorithm::EcdsaP256 => "ECDSA_P256",
            KeyAlgorithm::EcdsaP384 => "ECDSA_P384",
            KeyAlgorithm::Ed25519 => "ED25519",
            KeyAlgorithm::Rsa => "RSA",
        }
    }
}

/// A key pair for signing
pub enum KeyPair {
    /// ECDSA P-256 key pair
    EcdsaP256(EcdsaKeyPair),
    /// ECDSA P-384 key pair
    EcdsaP384(EcdsaKeyPair),
    /// Ed25519 key pair
    Ed25519(Ed25519KeyPair),
    /// RSA key pair
    Rsa(RsaKeyPair),
}

impl KeyPair {
    /// Get the algorithm of this key pair
    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            KeyPair::EcdsaP256(_) => KeyAlgorithm::EcdsaP256,
            KeyPair::EcdsaP384(_) => KeyAlgorithm::EcdsaP384,
            KeyPair::Ed25519(_) => KeyAlgorithm::Ed25519,
            KeyPair::Rsa(_) => KeyAlgorithm::Rsa,
        }
    }

    /// Get the raw public key bytes
    ///
    /// Uncompressed point for ECDSA, 32 bytes for Ed25519, DER `RSAPublicKey`
    /// for RSA.
    pub fn public_key_bytes(&self) -> &[u8] {
        match self {
            KeyPair::EcdsaP256(kp) => kp.public_key().as_ref(),
            KeyPair::EcdsaP384(kp) => kp.public_key().as_ref(),
            KeyPair::Ed25519(kp) => kp.public_key().as_ref(),
            KeyPair::Rsa(kp) => kp.public_key().as_ref(),
        }
    }

    /// Sign data with this key pair
    ///
    /// ECDSA signatures are ASN.1 DER, RSA uses PKCS#1 v1.5 with SHA-256.
    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        let rng = SystemRandom::new();
        match self {
            KeyPair::EcdsaP256(kp) | KeyPair::EcdsaP384(kp) => {
                let sig = kp.sign(&rng, data)?;
                Ok(sig.as_ref().to_vec())
            }
            KeyPair::Ed25519(kp) => Ok(kp.sign(data).as_ref().to_vec()),
            KeyPair::Rsa(kp) => {
                let mut sig = vec![0u8; kp.public_modulus_len()];
                kp.sign(
                    &aws_lc_rs::signature::RSA_PKCS1_SHA256,
                    &rng,
                    data,
                    &mut sig,
                )
                .map_err(|_| Error::Signing("RSA signing failed".to_string()))?;
                Ok(sig)
            }
        }
    }

    /// Get the public key in DER-encoded SubjectPublicKeyInfo format
    pub fn public_key_to_der(&self) -> Result<Vec<u8>> {
        let algorithm = match self {
            KeyPair::EcdsaP256(_) => AlgorithmIdentifierOwned {
                oid: ID_EC_PUBLIC_KEY,
                parameters: Some(der::Any::encode_from(&SECP_256_R_1)?),
            },
            KeyPair::EcdsaP384(_) => AlgorithmIdentifierOwned {
                oid: ID_EC_PUBLIC_KEY,
                parameters: Some(der::Any::encode_from(&SECP_384_R_1)?),
            },
            KeyPair::Ed25519(_) => AlgorithmIdentifierOwned {
                oid: ID_ED_25519,
                parameters: None,
            },
            KeyPair::Rsa(_) => AlgorithmIdentifierOwned {
                oid: RSA_ENCRYPTION,
                parameters: Some(der::Any::encode_from(&der::asn1::Null)?),
            },
        };

        let spki = SubjectPublicKeyInfoOwned {
            algorithm,
            subject_public_key: BitString::from_bytes(self.public_key_bytes())?,
        };

        Ok(spki.to_der()?)
    }
}

/// A signing key together with its canonical PKCS#8 encoding
pub struct SigningKey {
    pair: KeyPair,
    pkcs8: Zeroizing<Vec<u8>>,
}

impl SigningKey {
    /// Generate a new ECDSA P-256 key
    pub fn generate_ecdsa_p256() -> Result<Self> {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &rng)
            .map_err(|_| Error::KeyGeneration("failed to generate ECDSA P-256 key".to_string()))?;
        Self::from_pkcs8(pkcs8.as_ref())
    }

    /// Generate a new ECDSA P-384 key
    pub fn generate_ecdsa_p384() -> Result<Self> {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P384_SHA384_ASN1_SIGNING, &rng)
            .map_err(|_| Error::KeyGeneration("failed to generate ECDSA P-384 key".to_string()))?;
        Self::from_pkcs8(pkcs8.as_ref())
    }

    /// Generate a new Ed25519 key
    pub fn generate_ed25519() -> Result<Self> {
        let rng = SystemRandom::new();
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng)
            .map_err(|_| Error::KeyGeneration("failed to generate Ed25519 key".to_string()))?;
        Self::from_pkcs8(pkcs8.as_ref())
    }

    /// Load a key from an unencrypted PKCS#8 `PrivateKeyInfo`
    ///
    /// The algorithm identifier selects the variant. Algorithms outside the
    /// supported set fail with [`Error::NotASigner`].
    pub fn from_pkcs8(der: &[u8]) -> Result<Self> {
        let info = pkcs8::PrivateKeyInfo::try_from(der)
            .map_err(|e| Error::KeyFormat(format!("invalid PKCS#8: {}", e)))?;

        let oid = info.algorithm.oid;
        let pair = if oid == ID_EC_PUBLIC_KEY {
            let curve = info
                .algorithm
                .parameters_oid()
                .map_err(|e| Error::KeyFormat(format!("EC key without named curve: {}", e)))?;
            ecdsa_pair_for_curve(curve, der)?
        } else if oid == ID_ED_25519 {
            KeyPair::Ed25519(Ed25519KeyPair::from_pkcs8_maybe_unchecked(der)?)
        } else if oid == RSA_ENCRYPTION {
            KeyPair::Rsa(RsaKeyPair::from_pkcs8(der)?)
        } else {
            return Err(Error::NotASigner(oid.to_string()));
        };

        Ok(Self {
            pair,
            pkcs8: Zeroizing::new(der.to_vec()),
        })
    }

    /// Get the underlying key pair
    pub fn key_pair(&self) -> &KeyPair {
        &self.pair
    }

    /// Get the algorithm of this key
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.pair.algorithm()
    }

    /// Canonical PKCS#8 `PrivateKeyInfo` DER
    pub fn pkcs8_der(&self) -> &[u8] {
        &self.pkcs8
    }

    /// Sign data with this key
    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.pair.sign(data)
    }

    /// Get the public key in DER-encoded SubjectPublicKeyInfo format
    pub fn public_key_der(&self) -> Result<Vec<u8>> {
        self.pair.public_key_to_der()
    }

    /// Get the public key in PEM-encoded SubjectPublicKeyInfo format
    pub fn public_key_pem(&self) -> Result<PublicKeyPem> {
        Ok(PublicKeyPem::from_der(&self.public_key_der()?))
    }
}

/// Keys are equal when their public halves are equal, regardless of how the
/// private key happened to be encoded.
impl PartialEq for SigningKey {
    fn eq(&self, other: &Self) -> bool {
        self.algorithm() == other.algorithm()
            && self.pair.public_key_bytes() == other.pair.public_key_bytes()
    }
}

impl Eq for SigningKey {}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &self.algorithm())
            .finish_non_exhaustive()
    }
}

fn ecdsa_pair_for_curve(curve: ObjectIdentifier, pkcs8: &[u8]) -> Result<KeyPair> {
    if curve == SECP_256_R_1 {
        Ok(KeyPair::EcdsaP256(EcdsaKeyPair::from_pkcs8(
            &ECDSA_P256_SHA256_ASN1_SIGNING,
            pkcs8,
        )?))
    } else if curve == SECP_384_R_1 {
        Ok(KeyPair::EcdsaP384(EcdsaKeyPair::from_pkcs8(
            &ECDSA_P384_SHA384_ASN1_SIGNING,
            pkcs8,
        )?))
    } else {
        Err(Error::NotASigner(format!("ecPublicKey on curve {}", curve)))
    }
}
