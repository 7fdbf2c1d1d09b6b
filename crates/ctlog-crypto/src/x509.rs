//! Certificate chain utilities
//!
//! Fulcio hands out its trust bundle as a PEM chain ordered leaf first, root
//! last. Only the root is trusted by the log, so everything in front of it is
//! dropped.

use crate::encoding::{CertificatePem, CERTIFICATE_LABEL};
use crate::error::{Error, Result};
use x509_cert::der::{Decode, Encode};
use x509_cert::Certificate;

/// Parse every `CERTIFICATE` block of a PEM chain, in order
///
/// Blocks with other labels are skipped. Each certificate block must hold a
/// valid X.509 certificate. Non-blank input without a single PEM block is
/// malformed.
pub fn parse_chain(pem_chain: &[u8]) -> Result<Vec<Certificate>> {
    let blocks = pem::parse_many(pem_chain).map_err(|e| Error::MalformedPem(e.to_string()))?;
    if blocks.is_empty() && !pem_chain.iter().all(u8::is_ascii_whitespace) {
        return Err(Error::MalformedPem("no PEM blocks found".to_string()));
    }

    let mut certs = Vec::with_capacity(blocks.len());
    for (index, block) in blocks.iter().enumerate() {
        if block.tag() != CERTIFICATE_LABEL {
            tracing::debug!("Skipping {} block at position {}", block.tag(), index);
            continue;
        }
        let cert = Certificate::from_der(block.contents()).map_err(|e| {
            Error::Certificate(format!("failed to parse certificate {}: {}", index, e))
        })?;
        certs.push(cert);
    }
    Ok(certs)
}

/// Extract the trailing (root) certificate of a PEM chain as standalone PEM
///
/// The result is canonically re-encoded, so the same root presented inside
/// different chains yields identical bytes.
pub fn extract_root(pem_chain: &[u8]) -> Result<CertificatePem> {
    let mut certs = parse_chain(pem_chain)?;
    let root = certs.pop().ok_or(Error::EmptyChain)?;

    if root.tbs_certificate.issuer != root.tbs_certificate.subject {
        tracing::warn!(
            "Last certificate in chain is not self-issued: subject={}, issuer={}",
            root.tbs_certificate.subject,
            root.tbs_certificate.issuer
        );
    }

    let der = root
        .to_der()
        .map_err(|e| Error::Certificate(format!("failed to encode certificate: {}", e)))?;
    Ok(CertificatePem::from_der(&der))
}

/// Subject distinguished name of a PEM certificate, for diagnostics
pub fn subject_name(cert: &CertificatePem) -> Result<String> {
    let der = cert.to_der()?;
    let cert = Certificate::from_der(&der)
        .map_err(|e| Error::Certificate(format!("failed to parse certificate: {}", e)))?;
    Ok(cert.tbs_certificate.subject.to_string())
}
