//! Contract tests for `PinningClient` against a simulated pinning service.

use docseal_core::DocsealError;
use docseal_ledger::{PinMetadata, PinningClient, PinningError};
use wiremock::matchers::{header, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zeroize::Zeroizing;

fn client(server: &MockServer) -> PinningClient {
    PinningClient::new(
        reqwest::Client::new(),
        server.uri().parse().unwrap(),
        Zeroizing::new("test-jwt".into()),
    )
}

#[tokio::test]
async fn pin_document_posts_multipart_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/pinning/pinFileToIPFS"))
        .and(header("authorization", "Bearer test-jwt"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "IpfsHash": "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG",
            "PinSize": 18234,
            "Timestamp": "2026-03-01T12:00:00.000Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let pinned = client(&server)
        .pin_document(
            "diploma.pdf",
            b"%PDF-1.5 fake".to_vec(),
            &PinMetadata::named("diploma.pdf").with("digest", "ab".repeat(32)),
        )
        .await
        .unwrap();
    assert_eq!(
        pinned.pointer.as_str(),
        "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG"
    );
    assert_eq!(pinned.size, 18234);
    assert!(pinned.pinned_at.is_some());

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"file\"; filename=\"diploma.pdf\""));
    assert!(body.contains("name=\"pinataMetadata\""));
    assert!(body.contains("%PDF-1.5 fake"));
}

#[tokio::test]
async fn pin_document_surfaces_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/pinning/pinFileToIPFS"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid JWT"))
        .mount(&server)
        .await;

    let err = client(&server)
        .pin_document("a.pdf", vec![1, 2, 3], &PinMetadata::named("a.pdf"))
        .await
        .unwrap_err();
    match &err {
        PinningError::Api { status, body, .. } => {
            assert_eq!(*status, 401);
            assert_eq!(body, "invalid JWT");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert!(matches!(DocsealError::from(err), DocsealError::RemoteCall { .. }));
}

#[tokio::test]
async fn empty_content_identifier_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "IpfsHash": "",
            "PinSize": 0
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .pin_document("a.pdf", vec![1], &PinMetadata::named("a.pdf"))
        .await
        .unwrap_err();
    assert!(matches!(err, PinningError::EmptyPointer));
}
