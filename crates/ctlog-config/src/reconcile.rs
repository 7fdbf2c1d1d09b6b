//! One reconciliation pass against a blob store
//!
//! Load the named blob map, decode it, remove and add trusted roots, and
//! write the result back if the root set changed.

use crate::error::{Error, Result};
use crate::store::BlobStore;
use crate::transcoder::ConfigTranscoder;
use crate::trust_config::TrustConfig;
use ctlog_crypto::{extract_root, CertificatePem};

/// What a reconciliation pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Roots that were not trusted before and now are
    pub added: Vec<CertificatePem>,
    /// Roots that were trusted before and no longer are
    pub removed: Vec<CertificatePem>,
    /// Whether the blob map was written back
    pub written: bool,
}

impl ReconcileOutcome {
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Keeps the trusted roots of a stored trust configuration up to date
#[derive(Debug, Clone)]
pub struct Reconciler<S> {
    store: S,
    transcoder: ConfigTranscoder,
}

impl<S: BlobStore> Reconciler<S> {
    pub fn new(store: S, transcoder: ConfigTranscoder) -> Self {
        Self { store, transcoder }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn transcoder(&self) -> &ConfigTranscoder {
        &self.transcoder
    }

    /// Store a freshly built configuration unless one already exists
    ///
    /// Returns `true` when the configuration was written.
    pub fn provision(&self, name: &str, config: &TrustConfig) -> Result<bool> {
        if self.store.get(name)?.is_some() {
            tracing::info!("Trust configuration {} already exists", name);
            return Ok(false);
        }
        let blobs = self.transcoder.encode(config)?;
        self.store.put(name, &blobs)?;
        tracing::info!(
            "Provisioned trust configuration {} for log {}",
            name,
            config.log_id()
        );
        Ok(true)
    }

    /// Load the named configuration
    pub fn load(&self, name: &str) -> Result<TrustConfig> {
        let blobs = self
            .store
            .get(name)?
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        self.transcoder.decode(&blobs)
    }

    /// Remove the roots of `remove`, then add the roots of `add`
    ///
    /// Every chain is checked before anything changes, so a bad chain
    /// leaves the stored configuration untouched. A root named in both
    /// lists ends up trusted and is only reported if it was not before.
    pub fn reconcile(
        &self,
        name: &str,
        add: &[&[u8]],
        remove: &[&[u8]],
    ) -> Result<ReconcileOutcome> {
        let to_add = extract_all(add)?;
        let to_remove: Vec<CertificatePem> = extract_all(remove)?
            .into_iter()
            .filter(|root| !to_add.contains(root))
            .collect();
        let mut config = self.load(name)?;

        let mut outcome = ReconcileOutcome::default();
        for root in to_remove {
            if config.delete_root(&root) {
                outcome.removed.push(root);
            }
        }
        for root in to_add {
            if config.insert_root(root.clone()) {
                outcome.added.push(root);
            }
        }

        if outcome.is_unchanged() {
            tracing::debug!("Trusted roots of {} already up to date", name);
            return Ok(outcome);
        }

        let blobs = self.transcoder.encode(&config)?;
        self.store.put(name, &blobs)?;
        outcome.written = true;
        tracing::info!(
            "Updated trusted roots of {}: {} added, {} removed, {} total",
            name,
            outcome.added.len(),
            outcome.removed.len(),
            config.trusted_roots().len()
        );
        Ok(outcome)
    }
}

fn extract_all(chains: &[&[u8]]) -> Result<Vec<CertificatePem>> {
    chains
        .iter()
        .map(|chain| extract_root(chain).map_err(Error::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TranscoderOptions;
    use crate::store::MemoryStore;
    use ctlog_crypto::SigningKey;

    const CHAIN_A: &[u8] = include_bytes!("../../../test-data/chains/chain-a.pem");
    const CHAIN_B: &[u8] = include_bytes!("../../../test-data/chains/chain-b.pem");

    fn reconciler() -> Reconciler<MemoryStore> {
        let transcoder = ConfigTranscoder::new(TranscoderOptions {
            pbkdf2_iterations: 1_000,
            ..Default::default()
        });
        let reconciler = Reconciler::new(MemoryStore::new(), transcoder);
        let key = SigningKey::generate_ecdsa_p256().unwrap();
        let config = TrustConfig::new(2022, "2022-ctlog", "trillian:8091", key, "pw");
        assert!(reconciler.provision("ctlog", &config).unwrap());
        reconciler
    }

    #[test]
    fn test_provision_does_not_overwrite() {
        let reconciler = reconciler();
        let key = SigningKey::generate_ed25519().unwrap();
        let other = TrustConfig::new(1, "other", "x:1", key, "pw");
        assert!(!reconciler.provision("ctlog", &other).unwrap());
        assert_eq!(reconciler.load("ctlog").unwrap().log_id(), 2022);
    }

    #[test]
    fn test_reconcile_adds_then_is_stable() {
        let reconciler = reconciler();
        let first = reconciler.reconcile("ctlog", &[CHAIN_A], &[]).unwrap();
        assert_eq!(first.added.len(), 1);
        assert!(first.written);

        let before = reconciler.store().get("ctlog").unwrap().unwrap();
        let second = reconciler.reconcile("ctlog", &[CHAIN_A], &[]).unwrap();
        assert!(second.is_unchanged());
        assert!(!second.written);
        // Nothing rewritten, so the salted key blob is untouched
        assert_eq!(
            reconciler.store().get("ctlog").unwrap().unwrap(),
            before
        );
    }

    #[test]
    fn test_reconcile_swaps_roots() {
        let reconciler = reconciler();
        reconciler.reconcile("ctlog", &[CHAIN_A], &[]).unwrap();
        let outcome = reconciler
            .reconcile("ctlog", &[CHAIN_B], &[CHAIN_A])
            .unwrap();
        assert_eq!(outcome.added.len(), 1);
        assert_eq!(outcome.removed.len(), 1);

        let config = reconciler.load("ctlog").unwrap();
        assert_eq!(config.trusted_roots(), &outcome.added[..]);
    }

    #[test]
    fn test_root_in_both_lists_is_kept() {
        let reconciler = reconciler();
        reconciler.reconcile("ctlog", &[CHAIN_A], &[]).unwrap();

        let outcome = reconciler
            .reconcile("ctlog", &[CHAIN_A], &[CHAIN_A])
            .unwrap();
        assert!(outcome.is_unchanged());
        assert!(!outcome.written);

        let outcome = reconciler
            .reconcile("ctlog", &[CHAIN_B], &[CHAIN_B])
            .unwrap();
        assert_eq!(outcome.added.len(), 1);
        assert!(outcome.removed.is_empty());
        assert_eq!(reconciler.load("ctlog").unwrap().trusted_roots().len(), 2);
    }

    #[test]
    fn test_bad_chain_changes_nothing() {
        let reconciler = reconciler();
        let before = reconciler.store().get("ctlog").unwrap();
        assert!(reconciler
            .reconcile("ctlog", &[CHAIN_A, &b"garbage"[..]], &[])
            .is_err());
        assert_eq!(reconciler.store().get("ctlog").unwrap(), before);
    }

    #[test]
    fn test_missing_config() {
        let reconciler = reconciler();
        assert!(matches!(
            reconciler.reconcile("absent", &[CHAIN_A], &[]),
            Err(Error::NotFound(ref name)) if name == "absent"
        ));
    }
}
