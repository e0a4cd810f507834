//! Integration tests for the retrieval pipeline against stub gateways

mod common;

use ::common::crypto::encrypt;
use ::common::payload::encode_data_url;
use ::common::prelude::*;

use crate::common::{address, network, report, session, GatewayMode, GatewayStub, PinningStub};

#[tokio::test]
async fn test_owner_views_own_file() {
    let network = network();
    let pinning = PinningStub::spawn(&network, "Qm123").await;
    let gateway = GatewayStub::spawn(&network, GatewayMode::Serve).await;
    let mut owner = session(
        MemoryLedger::new(address(common::OWNER)),
        &pinning,
        &[&gateway],
    );
    owner.set_custom_key("k1").unwrap();
    let uploaded = owner.upload(report()).await.unwrap();

    let key = EncryptionKey::custom("k1").unwrap();
    let file = owner
        .retrieve(uploaded.encrypted_identifier.as_str(), Some(&key))
        .await
        .unwrap();

    assert_eq!(file.bytes, report().bytes);
    assert_eq!(file.mime.as_deref(), Some("application/pdf"));
    assert_eq!(file.category, ContentCategory::Document);
    assert_eq!(gateway.hits(), 1);
}

#[tokio::test]
async fn test_raw_cid_is_accepted() {
    let network = network();
    let pinning = PinningStub::spawn(&network, "Qm123").await;
    let gateway = GatewayStub::spawn(&network, GatewayMode::Serve).await;
    let mut owner = session(
        MemoryLedger::new(address(common::OWNER)),
        &pinning,
        &[&gateway],
    );
    owner.set_custom_key("k1").unwrap();
    owner.upload(report()).await.unwrap();

    let key = EncryptionKey::custom("k1").unwrap();
    let file = owner.retrieve("Qm123", Some(&key)).await.unwrap();
    assert_eq!(file.bytes, report().bytes);
}

#[tokio::test]
async fn test_missing_key_is_reported_after_fetch() {
    let network = network();
    let pinning = PinningStub::spawn(&network, "Qm123").await;
    let gateway = GatewayStub::spawn(&network, GatewayMode::Serve).await;
    let mut owner = session(
        MemoryLedger::new(address(common::OWNER)),
        &pinning,
        &[&gateway],
    );
    owner.set_custom_key("k1").unwrap();
    let uploaded = owner.upload(report()).await.unwrap();

    // the key store holds the key, but it is never used implicitly
    assert!(owner.key_store().lookup(&uploaded.cid).is_some());
    let err = owner
        .retrieve(uploaded.encrypted_identifier.as_str(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, RetrievalError::MissingDecryptionKey));
    assert!(err.needs_key_prompt());
    assert_eq!(gateway.hits(), 1);
}

#[tokio::test]
async fn test_wrong_key_prompts_for_another() {
    let network = network();
    let pinning = PinningStub::spawn(&network, "Qm123").await;
    let gateway = GatewayStub::spawn(&network, GatewayMode::Serve).await;
    let mut owner = session(
        MemoryLedger::new(address(common::OWNER)),
        &pinning,
        &[&gateway],
    );
    owner.set_custom_key("k1").unwrap();
    owner.upload(report()).await.unwrap();

    let wrong = EncryptionKey::custom("k2").unwrap();
    let err = owner.retrieve("Qm123", Some(&wrong)).await.unwrap_err();
    assert!(matches!(
        err,
        RetrievalError::Decryption(CryptoError::WrongKey)
    ));
    assert!(err.needs_key_prompt());
}

#[tokio::test]
async fn test_non_ciphertext_payload_is_malformed() {
    let network = network();
    network
        .lock()
        .insert("QmPlain".to_string(), b"just some file".to_vec());
    let pinning = PinningStub::spawn(&network, "Qm123").await;
    let gateway = GatewayStub::spawn(&network, GatewayMode::Serve).await;
    let owner = session(
        MemoryLedger::new(address(common::OWNER)),
        &pinning,
        &[&gateway],
    );

    let key = EncryptionKey::custom("k1").unwrap();
    let err = owner.retrieve("QmPlain", Some(&key)).await.unwrap_err();
    assert!(matches!(
        err,
        RetrievalError::Decryption(CryptoError::Malformed(_))
    ));
    // another key would not help
    assert!(!err.needs_key_prompt());
}

#[tokio::test]
async fn test_empty_payload() {
    let network = network();
    network.lock().insert("QmEmpty".to_string(), Vec::new());
    let pinning = PinningStub::spawn(&network, "Qm123").await;
    let gateway = GatewayStub::spawn(&network, GatewayMode::Serve).await;
    let owner = session(
        MemoryLedger::new(address(common::OWNER)),
        &pinning,
        &[&gateway],
    );

    let key = EncryptionKey::custom("k1").unwrap();
    let err = owner.retrieve("QmEmpty", Some(&key)).await.unwrap_err();
    assert!(matches!(err, RetrievalError::EmptyPayload { .. }));
}

#[tokio::test]
async fn test_text_payloads_are_classified() {
    let network = network();
    let key = EncryptionKey::custom("k1").unwrap();
    let json = encrypt(
        &encode_data_url("application/json", br#"{"files":[1,2]}"#),
        key.as_str(),
    )
    .unwrap();
    network.lock().insert("QmJson".to_string(), json.into_bytes());

    let pinning = PinningStub::spawn(&network, "Qm123").await;
    let gateway = GatewayStub::spawn(&network, GatewayMode::Serve).await;
    let owner = session(
        MemoryLedger::new(address(common::OWNER)),
        &pinning,
        &[&gateway],
    );

    let file = owner.retrieve("QmJson", Some(&key)).await.unwrap();
    assert_eq!(file.category, ContentCategory::Text);
    assert_eq!(
        file.pretty_text().as_deref(),
        Some("{\n  \"files\": [\n    1,\n    2\n  ]\n}")
    );
}

#[tokio::test]
async fn test_unopenable_identifier_is_requested_literally() {
    let network = network();
    let pinning = PinningStub::spawn(&network, "Qm123").await;
    let gateway = GatewayStub::spawn(&network, GatewayMode::Serve).await;
    let mut owner = session(
        MemoryLedger::new(address(common::OWNER)),
        &pinning,
        &[&gateway],
    );
    owner.set_custom_key("k1").unwrap();
    let uploaded = owner.upload(report()).await.unwrap();

    // someone else cannot open E1, so E1 itself goes to the gateway
    let stranger = session(
        owner.ledger().connect(address(common::RECIPIENT)),
        &pinning,
        &[&gateway],
    );
    let key = EncryptionKey::custom("k1").unwrap();
    let err = stranger
        .retrieve(uploaded.encrypted_identifier.as_str(), Some(&key))
        .await
        .unwrap_err();

    let attempts = match err {
        RetrievalError::Gateway(GatewayError::Unavailable { attempts }) => attempts,
        other => panic!("unexpected error: {other:?}"),
    };
    assert_eq!(attempts.len(), 1);
    assert!(attempts[0].reason.contains("404"), "{}", attempts[0].reason);
    assert_eq!(attempts[0].url.path_segments().unwrap().count(), 2);
    assert_eq!(gateway.hits(), 1);
}

#[tokio::test]
async fn test_unopenable_identifier_keeps_decryption_error() {
    let network = network();
    let pinning = PinningStub::spawn(&network, "Qm123").await;
    let gateway = GatewayStub::spawn(&network, GatewayMode::Serve).await;
    let mut owner = session(
        MemoryLedger::new(address(common::OWNER)),
        &pinning,
        &[&gateway],
    );
    owner.set_custom_key("k1").unwrap();
    let uploaded = owner.upload(report()).await.unwrap();

    let stranger = session(
        owner.ledger().connect(address(common::RECIPIENT)),
        &pinning,
        &[&gateway],
    );
    let err = stranger
        .resolve_identifier(uploaded.encrypted_identifier.as_str())
        .unwrap_err();
    match err {
        IdentifierError::Decryption { address: tried, .. } => {
            assert_eq!(tried, address(common::RECIPIENT));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
