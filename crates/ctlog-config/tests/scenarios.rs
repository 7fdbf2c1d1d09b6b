//! End-to-end trust configuration scenarios
//!
//! Fixtures live in `test-data/` at the workspace root.

use ctlog_config::{
    BlobMap, ConfigTranscoder, Error, LogMultiConfig, TranscoderOptions, TrustConfig,
    LEGACY_ROOT_KEY, PUBLIC_KEY, ROOT_KEY_PREFIX,
};
use ctlog_crypto::{extract_root, CertificatePem, SigningKey};
use rstest::{fixture, rstest};
use std::collections::BTreeSet;
use std::path::PathBuf;

fn test_data(relative: &str) -> Vec<u8> {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.pop();
    path.pop();
    path.push("test-data");
    path.push(relative);
    std::fs::read(&path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
}

#[fixture]
fn transcoder() -> ConfigTranscoder {
    ConfigTranscoder::new(TranscoderOptions {
        pbkdf2_iterations: 1_000,
        ..Default::default()
    })
}

fn root_set(config: &TrustConfig) -> BTreeSet<Vec<u8>> {
    config
        .trusted_roots()
        .iter()
        .map(|r| r.as_bytes().to_vec())
        .collect()
}

fn assert_no_duplicates(config: &TrustConfig) {
    assert_eq!(root_set(config).len(), config.trusted_roots().len());
}

fn assert_same_state(a: &TrustConfig, b: &TrustConfig) {
    assert_eq!(a.log_id(), b.log_id());
    assert_eq!(a.log_prefix(), b.log_prefix());
    assert_eq!(a.backend_address(), b.backend_address());
    assert_eq!(a.private_key_password(), b.private_key_password());
    assert_eq!(a.private_key(), b.private_key());
    assert_eq!(a.public_key().unwrap(), b.public_key().unwrap());
    assert_eq!(root_set(a), root_set(b));
}

#[rstest]
fn test_fulcio_root_lifecycle(transcoder: ConfigTranscoder) {
    let chain_a = test_data("chains/chain-a.pem");
    let chain_b = test_data("chains/chain-b.pem");
    let root_a = extract_root(&test_data("chains/root-a.pem")).unwrap();
    let root_b = extract_root(&test_data("chains/root-b.pem")).unwrap();

    let key = SigningKey::generate_ecdsa_p256().unwrap();
    let mut config = TrustConfig::new(
        2022,
        "2022-ctlog",
        "log-server.trillian-system:8091",
        key,
        "changeme",
    );
    assert!(config.trusted_roots().is_empty());

    config.add_root(&chain_a).unwrap();
    assert_eq!(config.trusted_roots(), &[root_a.clone()]);

    config.add_root(&chain_a).unwrap();
    assert_eq!(config.trusted_roots(), &[root_a.clone()]);

    config.add_root(&chain_b).unwrap();
    assert_eq!(config.trusted_roots().len(), 2);
    assert_no_duplicates(&config);

    config.remove_root(&chain_a).unwrap();
    assert_eq!(config.trusted_roots(), &[root_b]);

    let decoded = transcoder
        .decode(&transcoder.encode(&config).unwrap())
        .unwrap();
    assert_same_state(&config, &decoded);
}

#[rstest]
#[case::ecdsa_p256(SigningKey::generate_ecdsa_p256().unwrap())]
#[case::ecdsa_p384(SigningKey::generate_ecdsa_p384().unwrap())]
#[case::ed25519(SigningKey::generate_ed25519().unwrap())]
fn test_roundtrip_per_algorithm(transcoder: ConfigTranscoder, #[case] key: SigningKey) {
    let mut config = TrustConfig::new(7, "prefix", "backend:1", key, "pw with \"quotes\"\n");
    config.add_root(&test_data("chains/chain-b.pem")).unwrap();

    let decoded = transcoder
        .decode(&transcoder.encode(&config).unwrap())
        .unwrap();
    assert_same_state(&config, &decoded);
}

#[rstest]
fn test_legacy_rsa_key_roundtrip(transcoder: ConfigTranscoder) {
    let der = pem::parse(test_data("keys/rsa-pkcs1.pem")).unwrap().into_contents();
    let (key, _) = ctlog_crypto::decode_private_key(&der).unwrap();
    let config = TrustConfig::new(1, "rsa", "b:1", key, "pw");

    let decoded = transcoder
        .decode(&transcoder.encode(&config).unwrap())
        .unwrap();
    assert_same_state(&config, &decoded);
}

#[rstest]
fn test_encode_is_deterministic_except_key(transcoder: ConfigTranscoder) {
    let key = SigningKey::generate_ecdsa_p256().unwrap();
    let mut config = TrustConfig::new(1, "p", "b:1", key, "pw");
    config.add_root(&test_data("chains/chain-a.pem")).unwrap();

    let first = transcoder.encode(&config).unwrap();
    let second = transcoder.encode(&config).unwrap();
    for (key, value) in &first {
        if key == ctlog_config::PRIVATE_KEY {
            // Fresh salt and IV every time
            assert_ne!(value, &second[key]);
        } else {
            assert_eq!(value, &second[key], "blob {} differs", key);
        }
    }
}

#[rstest]
fn test_dedup_on_decode(transcoder: ConfigTranscoder) {
    let key = SigningKey::generate_ecdsa_p256().unwrap();
    let mut config = TrustConfig::new(1, "p", "b:1", key, "pw");
    config.add_root(&test_data("chains/chain-a.pem")).unwrap();

    let mut blobs = transcoder.encode(&config).unwrap();
    let indexed = blobs[&format!("{}0", ROOT_KEY_PREFIX)].clone();
    blobs.insert(LEGACY_ROOT_KEY.to_string(), indexed);

    let decoded = transcoder.decode(&blobs).unwrap();
    assert_eq!(decoded.trusted_roots().len(), 1);

    // Re-encoding drops the legacy slot
    let reencoded = transcoder.encode(&decoded).unwrap();
    assert!(!reencoded.contains_key(LEGACY_ROOT_KEY));
    assert_eq!(
        reencoded.keys().filter(|k| k.starts_with(ROOT_KEY_PREFIX)).count(),
        1
    );
}

#[rstest]
fn test_legacy_slot_only(transcoder: ConfigTranscoder) {
    let key = SigningKey::generate_ecdsa_p256().unwrap();
    let config = TrustConfig::new(1, "p", "b:1", key, "pw");
    let mut blobs = transcoder.encode(&config).unwrap();
    blobs.insert(LEGACY_ROOT_KEY.to_string(), test_data("chains/root-b.pem"));

    let decoded = transcoder.decode(&blobs).unwrap();
    let expected = CertificatePem::parse(test_data("chains/root-b.pem")).unwrap();
    assert_eq!(decoded.trusted_roots(), &[expected]);
}

#[rstest]
fn test_sparse_indexes_are_read(transcoder: ConfigTranscoder) {
    let key = SigningKey::generate_ecdsa_p256().unwrap();
    let config = TrustConfig::new(1, "p", "b:1", key, "pw");
    let mut blobs = transcoder.encode(&config).unwrap();
    blobs.insert("fulcio-3".to_string(), test_data("chains/root-b.pem"));
    blobs.insert("fulcio-250".to_string(), test_data("chains/root-a.pem"));

    let decoded = transcoder.decode(&blobs).unwrap();
    let subjects: Vec<String> = decoded
        .trusted_roots()
        .iter()
        .map(|r| ctlog_crypto::subject_name(r).unwrap())
        .collect();
    assert_eq!(subjects.len(), 2);
    assert!(subjects[0].contains("sigstore-b"));
    assert!(subjects[1].contains("sigstore-a"));
}

#[rstest]
fn test_decode_without_public_key_fails(transcoder: ConfigTranscoder) {
    let key = SigningKey::generate_ecdsa_p256().unwrap();
    let config = TrustConfig::new(1, "p", "b:1", key, "pw");
    let mut blobs: BlobMap = transcoder.encode(&config).unwrap();
    blobs.remove(PUBLIC_KEY);

    let result = transcoder.decode(&blobs);
    assert!(
        matches!(result, Err(Error::MissingField(ref field)) if field == "public"),
        "unexpected result: {:?}",
        result
    );
}

#[rstest]
fn test_remove_absent_root_is_noop(transcoder: ConfigTranscoder) {
    let key = SigningKey::generate_ecdsa_p256().unwrap();
    let mut config = TrustConfig::new(1, "p", "b:1", key, "pw");
    config.add_root(&test_data("chains/chain-a.pem")).unwrap();
    let before = transcoder.encode(&config).unwrap();

    assert!(!config.remove_root(&test_data("chains/chain-b.pem")).unwrap());
    let after = transcoder.encode(&config).unwrap();
    assert_eq!(before.keys().collect::<Vec<_>>(), after.keys().collect::<Vec<_>>());
    assert_eq!(before["fulcio-0"], after["fulcio-0"]);
}

#[rstest]
fn test_custom_mount_dir(#[values("/etc/ctfe", "/etc/ctfe/")] mount_dir: &str) {
    let transcoder = ConfigTranscoder::new(TranscoderOptions {
        mount_dir: mount_dir.to_string(),
        pbkdf2_iterations: 1_000,
        ..Default::default()
    });
    let key = SigningKey::generate_ecdsa_p256().unwrap();
    let mut config = TrustConfig::new(1, "p", "b:1", key, "pw");
    config.add_root(&test_data("chains/chain-a.pem")).unwrap();

    let blobs = transcoder.encode(&config).unwrap();
    let text = std::str::from_utf8(&blobs["config"]).unwrap();
    let multi = LogMultiConfig::from_text(text).unwrap();
    let log = multi.single_log().unwrap();
    assert_eq!(log.roots_pem_file, vec!["/etc/ctfe/fulcio-0"]);
    assert_eq!(log.pem_key_file().unwrap().path, "/etc/ctfe/private");
}
