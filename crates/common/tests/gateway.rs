//! Integration tests for sequential gateway fallback

mod common;

use ::common::prelude::*;
use axum::http::StatusCode;
use url::Url;

use crate::common::{fetcher, network, GatewayMode, GatewayStub};

fn qm123() -> ContentId {
    ContentId::parse("Qm123").unwrap()
}

#[tokio::test]
async fn test_first_success_wins() {
    let network = network();
    network.lock().insert("Qm123".to_string(), b"payload".to_vec());

    let a = GatewayStub::spawn(&network, GatewayMode::Fail(StatusCode::BAD_GATEWAY)).await;
    let b = GatewayStub::spawn(&network, GatewayMode::Serve).await;
    let c = GatewayStub::spawn(&network, GatewayMode::Serve).await;
    let gateways = fetcher(&[&a, &b, &c]);

    let body = gateways.fetch(&qm123()).await.unwrap();
    assert_eq!(&body[..], b"payload");
    assert_eq!((a.hits(), b.hits(), c.hits()), (1, 1, 0));

    // every call starts over from the first gateway
    gateways.fetch(&qm123()).await.unwrap();
    assert_eq!((a.hits(), b.hits(), c.hits()), (2, 2, 0));
}

#[tokio::test]
async fn test_every_failure_is_reported_in_order() {
    let network = network();
    let a = GatewayStub::spawn(&network, GatewayMode::Fail(StatusCode::INTERNAL_SERVER_ERROR)).await;
    // serves, but has nothing pinned under the CID
    let b = GatewayStub::spawn(&network, GatewayMode::Serve).await;
    let unreachable = Url::parse("http://127.0.0.1:1").unwrap();

    let gateways =
        GatewayFetcher::new(vec![a.url.clone(), b.url.clone(), unreachable]).unwrap();
    let err = gateways.fetch(&qm123()).await.unwrap_err();

    let attempts = match err {
        GatewayError::Unavailable { attempts } => attempts,
        other => panic!("unexpected error: {other:?}"),
    };
    assert_eq!(attempts.len(), 3);
    assert_eq!(attempts[0].url.as_str(), format!("{}ipfs/Qm123", a.url));
    assert!(attempts[0].reason.contains("500"), "{}", attempts[0].reason);
    assert!(attempts[1].reason.contains("404"), "{}", attempts[1].reason);
    assert_eq!(attempts[2].url.port(), Some(1));
    assert_eq!((a.hits(), b.hits()), (1, 1));
}

#[tokio::test]
async fn test_single_gateway() {
    let network = network();
    network.lock().insert("Qm123".to_string(), b"x".to_vec());
    let only = GatewayStub::spawn(&network, GatewayMode::Serve).await;

    let body = fetcher(&[&only]).fetch(&qm123()).await.unwrap();
    assert_eq!(&body[..], b"x");
}
