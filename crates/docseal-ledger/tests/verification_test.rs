//! Verification resolver behavior: verdicts, ordering, and partial failure.

use std::sync::Arc;
use std::time::Duration;

use docseal_core::{Address, ContentPointer, DocsealError, DocumentDigest};
use docseal_ledger::{
    Connection, MockLedger, RecordStoreLedger, RegistryLedger, Timeouts, Verdict,
};

fn addr(byte: u8) -> Address {
    Address::from_bytes([byte; 20])
}

fn digest(byte: u8) -> DocumentDigest {
    DocumentDigest::from_bytes([byte; 32])
}

/// Register organizations `ids` in order and return their store addresses.
async fn register_all(ledger: &MockLedger, ids: &[u8]) -> Vec<Address> {
    for id in ids {
        ledger
            .register_organization(&addr(*id), &format!("Issuer {id}"), "data")
            .await
            .unwrap();
    }
    ledger
        .organizations()
        .await
        .unwrap()
        .into_iter()
        .map(|o| o.store)
        .collect()
}

fn connection(ledger: &Arc<MockLedger>) -> Connection {
    Connection::with_ledger(ledger.clone(), Timeouts::default())
}

#[tokio::test]
async fn unknown_digest_is_invalid() {
    let ledger = Arc::new(MockLedger::new(addr(0xad)));
    register_all(&ledger, &[1, 2, 3]).await;
    let v = connection(&ledger).resolver().verify(&digest(9)).await.unwrap();
    assert_eq!(v.verdict, Verdict::Invalid);
    assert!(v.skipped.is_empty());
}

#[tokio::test]
async fn empty_registry_is_invalid() {
    let ledger = Arc::new(MockLedger::new(addr(0xad)));
    let v = connection(&ledger).resolver().verify(&digest(9)).await.unwrap();
    assert_eq!(v.verdict, Verdict::Invalid);
}

#[tokio::test]
async fn valid_verdict_carries_issuer_details() {
    let ledger = Arc::new(MockLedger::new(addr(0xad)));
    let stores = register_all(&ledger, &[1, 2]).await;
    ledger.set_verified(&addr(0xad), &addr(2)).await.unwrap();
    ledger
        .issue(&addr(2), &stores[1], &digest(5), ContentPointer::new("QmFive").as_ref())
        .await
        .unwrap();

    let v = connection(&ledger).resolver().verify(&digest(5)).await.unwrap();
    match v.verdict {
        Verdict::Valid { issuer, pointer } => {
            assert_eq!(issuer.identity, addr(2));
            assert_eq!(issuer.name, "Issuer 2");
            assert!(issuer.verified);
            assert_eq!(issuer.store, stores[1]);
            assert_eq!(pointer.unwrap().as_str(), "QmFive");
        }
        other => panic!("expected Valid, got {other:?}"),
    }
}

#[tokio::test]
async fn revoked_verdict() {
    let ledger = Arc::new(MockLedger::new(addr(0xad)));
    let stores = register_all(&ledger, &[1]).await;
    ledger.issue(&addr(1), &stores[0], &digest(5), None).await.unwrap();
    ledger.revoke(&addr(1), &stores[0], &digest(5)).await.unwrap();

    let v = connection(&ledger).resolver().verify(&digest(5)).await.unwrap();
    match v.verdict {
        Verdict::Revoked { issuer, pointer } => {
            assert_eq!(issuer.identity, addr(1));
            assert!(pointer.is_none());
        }
        other => panic!("expected Revoked, got {other:?}"),
    }
}

#[tokio::test]
async fn earliest_registered_issuer_wins() {
    let ledger = Arc::new(MockLedger::new(addr(0xad)));
    let stores = register_all(&ledger, &[3, 1, 2]).await;
    // Issued by the later registrant first, then by the earliest.
    ledger.issue(&addr(2), &stores[2], &digest(7), None).await.unwrap();
    ledger.issue(&addr(3), &stores[0], &digest(7), None).await.unwrap();
    ledger.revoke(&addr(2), &stores[2], &digest(7)).await.unwrap();

    let v = connection(&ledger).resolver().verify(&digest(7)).await.unwrap();
    assert!(v.verdict.is_valid());
    assert_eq!(v.verdict.issuer().unwrap().identity, addr(3));
}

#[tokio::test]
async fn unreachable_store_is_skipped() {
    let ledger = Arc::new(MockLedger::new(addr(0xad)));
    let stores = register_all(&ledger, &[1, 2]).await;
    ledger.issue(&addr(2), &stores[1], &digest(4), None).await.unwrap();
    ledger.make_store_unreachable(stores[0]);

    let v = connection(&ledger).resolver().verify(&digest(4)).await.unwrap();
    assert_eq!(v.verdict.issuer().unwrap().identity, addr(2));
    assert_eq!(v.skipped, vec![stores[0]]);

    let v = connection(&ledger).resolver().verify(&digest(6)).await.unwrap();
    assert_eq!(v.verdict, Verdict::Invalid);
    assert_eq!(v.skipped, vec![stores[0]]);
}

#[tokio::test]
async fn registry_failure_aborts_verification() {
    let ledger = Arc::new(MockLedger::new(addr(0xad)));
    register_all(&ledger, &[1]).await;
    ledger.make_registry_unreachable();
    let err = connection(&ledger).resolver().verify(&digest(1)).await.unwrap_err();
    assert!(matches!(err, DocsealError::RemoteCall { .. }));
}

#[tokio::test]
async fn verification_needs_no_identity_provider() {
    let ledger = Arc::new(MockLedger::new(addr(0xad)));
    let stores = register_all(&ledger, &[1]).await;
    ledger.issue(&addr(1), &stores[0], &digest(2), None).await.unwrap();
    ledger.remove_provider();
    let v = connection(&ledger).resolver().verify(&digest(2)).await.unwrap();
    assert!(v.verdict.is_valid());
}

#[tokio::test]
async fn malformed_upload_is_rejected_before_any_lookup() {
    let ledger = Arc::new(MockLedger::new(addr(0xad)));
    ledger.make_registry_unreachable();
    let err = connection(&ledger)
        .resolver()
        .verify_document(b"not a pdf at all")
        .await
        .unwrap_err();
    assert!(matches!(err, DocsealError::MalformedInput(_)));
}

#[tokio::test(start_paused = true)]
async fn stalled_registry_times_out() {
    let ledger = Arc::new(MockLedger::new(addr(0xad)));
    ledger.stall();
    let timeouts = Timeouts {
        call: Duration::from_secs(3),
        ..Timeouts::default()
    };
    let resolver = Connection::with_ledger(ledger, timeouts).resolver();
    assert!(matches!(
        resolver.verify(&digest(1)).await,
        Err(DocsealError::Timeout { .. })
    ));
}
