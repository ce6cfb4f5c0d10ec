//! Subcommand handlers driven against the in-memory ledger.

use std::path::PathBuf;
use std::sync::Arc;

use docseal_cli::account::{run_account, AccountArgs};
use docseal_cli::admin::{run_admin, AdminArgs, AdminCommand};
use docseal_cli::issuer::{run_issuer, IssuerArgs, IssuerCommand};
use docseal_cli::verify::{run_verify, VerifyArgs};
use docseal_cli::{Context, EXIT_FAILURE, EXIT_OK, EXIT_REVOKED};
use docseal_core::canonical::fixtures::SamplePdf;
use docseal_core::{hash_document, Address, DocsealError};
use docseal_ledger::{Connection, LedgerConfig, MockLedger, Timeouts};

const ADMIN: u8 = 0xad;
const ISSUER: u8 = 0xa1;

fn addr(byte: u8) -> Address {
    Address::from_bytes([byte; 20])
}

fn setup() -> (Arc<MockLedger>, Context) {
    let ledger = Arc::new(MockLedger::new(addr(ADMIN)));
    let config = LedgerConfig::local("http://127.0.0.1:1", Address::ZERO).unwrap();
    let conn = Connection::with_ledger(ledger.clone(), Timeouts::default());
    (ledger, Context::new(config, conn))
}

fn write_pdf(dir: &tempfile::TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, SamplePdf::new(text).build()).unwrap();
    path
}

fn issuer(command: IssuerCommand) -> IssuerArgs {
    IssuerArgs { command }
}

fn verify_file(file: PathBuf) -> VerifyArgs {
    VerifyArgs {
        file: Some(file),
        digest: None,
        json: false,
    }
}

async fn signup(ledger: &MockLedger, ctx: &Context) {
    ledger.set_account(addr(ISSUER));
    let code = run_issuer(
        &issuer(IssuerCommand::Signup {
            name: "Acme University".into(),
            data: "registrar@acme.example".into(),
        }),
        ctx,
    )
    .await
    .unwrap();
    assert_eq!(code, EXIT_OK);
}

#[tokio::test]
async fn issue_verify_revoke_exit_codes() {
    let (ledger, ctx) = setup();
    let dir = tempfile::tempdir().unwrap();
    let cert = write_pdf(&dir, "cert.pdf", "Certificate of Completion");

    assert_eq!(run_verify(&verify_file(cert.clone()), &ctx).await.unwrap(), EXIT_FAILURE);

    signup(&ledger, &ctx).await;
    let code = run_issuer(
        &issuer(IssuerCommand::Issue {
            file: cert.clone(),
            pointer: Some("QmCert".into()),
            pin: false,
        }),
        &ctx,
    )
    .await
    .unwrap();
    assert_eq!(code, EXIT_OK);
    assert_eq!(run_verify(&verify_file(cert.clone()), &ctx).await.unwrap(), EXIT_OK);

    let digest = hash_document(&std::fs::read(&cert).unwrap()).unwrap();
    let code = run_issuer(&issuer(IssuerCommand::Revoke { digest }), &ctx)
        .await
        .unwrap();
    assert_eq!(code, EXIT_OK);

    let by_digest = VerifyArgs {
        file: None,
        digest: Some(digest),
        json: true,
    };
    assert_eq!(run_verify(&by_digest, &ctx).await.unwrap(), EXIT_REVOKED);
}

#[tokio::test]
async fn verify_works_without_identity_provider() {
    let (ledger, ctx) = setup();
    let dir = tempfile::tempdir().unwrap();
    let cert = write_pdf(&dir, "cert.pdf", "Diploma");
    signup(&ledger, &ctx).await;
    run_issuer(
        &issuer(IssuerCommand::Issue {
            file: cert.clone(),
            pointer: None,
            pin: false,
        }),
        &ctx,
    )
    .await
    .unwrap();

    ledger.remove_provider();
    assert_eq!(run_verify(&verify_file(cert), &ctx).await.unwrap(), EXIT_OK);
}

#[tokio::test]
async fn verify_malformed_document_is_an_error() {
    let (_ledger, ctx) = setup();
    let dir = tempfile::tempdir().unwrap();
    let bogus = dir.path().join("bogus.pdf");
    std::fs::write(&bogus, b"plain text, not a pdf").unwrap();

    let err = run_verify(&verify_file(bogus), &ctx).await.unwrap_err();
    assert!(err.to_string().contains("cannot hash"));
}

#[tokio::test]
async fn admin_verifies_pending_organization() {
    let (ledger, ctx) = setup();
    signup(&ledger, &ctx).await;

    ledger.set_account(addr(ADMIN));
    let list = AdminArgs {
        command: AdminCommand::List { json: true },
    };
    assert_eq!(run_admin(&list, &ctx).await.unwrap(), EXIT_OK);

    let verify = AdminArgs {
        command: AdminCommand::Verify {
            organization: addr(ISSUER),
        },
    };
    assert_eq!(run_admin(&verify, &ctx).await.unwrap(), EXIT_OK);

    let org = ctx
        .connection
        .registry()
        .organization_of(&addr(ISSUER))
        .await
        .unwrap()
        .unwrap();
    assert!(org.verified);
}

#[tokio::test]
async fn admin_commands_refuse_other_identities() {
    let (ledger, ctx) = setup();
    signup(&ledger, &ctx).await;
    let writes = ledger.write_count();

    let verify = AdminArgs {
        command: AdminCommand::Verify {
            organization: addr(ISSUER),
        },
    };
    let err = run_admin(&verify, &ctx).await.unwrap_err();
    assert!(err.to_string().contains("not the registry administrator"));
    assert_eq!(ledger.write_count(), writes);
}

#[tokio::test]
async fn issuer_commands_need_registration() {
    let (ledger, ctx) = setup();
    ledger.set_account(addr(0x77));
    let err = run_issuer(&issuer(IssuerCommand::List { all: true, json: false }), &ctx)
        .await
        .unwrap_err();
    let root = err.root_cause().downcast_ref::<DocsealError>();
    assert!(matches!(root, Some(DocsealError::NotFound(_))));
}

#[tokio::test]
async fn duplicate_issue_is_reported() {
    let (ledger, ctx) = setup();
    let dir = tempfile::tempdir().unwrap();
    let cert = write_pdf(&dir, "cert.pdf", "Transcript");
    signup(&ledger, &ctx).await;

    let issue = issuer(IssuerCommand::Issue {
        file: cert,
        pointer: None,
        pin: false,
    });
    run_issuer(&issue, &ctx).await.unwrap();
    let err = run_issuer(&issue, &ctx).await.unwrap_err();
    let root = err.root_cause().downcast_ref::<DocsealError>();
    assert!(matches!(root, Some(DocsealError::DuplicateDigest { .. })));
}

#[tokio::test]
async fn issued_document_is_rejected_before_pinning() {
    let (ledger, ctx) = setup();
    let dir = tempfile::tempdir().unwrap();
    let cert = write_pdf(&dir, "cert.pdf", "Certificate");
    signup(&ledger, &ctx).await;
    run_issuer(
        &issuer(IssuerCommand::Issue {
            file: cert.clone(),
            pointer: None,
            pin: false,
        }),
        &ctx,
    )
    .await
    .unwrap();
    let writes = ledger.write_count();

    // No pinning token is configured, so reaching the upload would fail
    // with a different error.
    let err = run_issuer(
        &issuer(IssuerCommand::Issue {
            file: cert,
            pointer: None,
            pin: true,
        }),
        &ctx,
    )
    .await
    .unwrap_err();
    let root = err.root_cause().downcast_ref::<DocsealError>();
    assert!(matches!(root, Some(DocsealError::DuplicateDigest { .. })), "got {err:#}");
    assert_eq!(ledger.write_count(), writes);
}

#[tokio::test]
async fn pin_without_token_fails_before_writing() {
    let (ledger, ctx) = setup();
    let dir = tempfile::tempdir().unwrap();
    let cert = write_pdf(&dir, "cert.pdf", "Award");
    signup(&ledger, &ctx).await;
    let writes = ledger.write_count();

    let result = run_issuer(
        &issuer(IssuerCommand::Issue {
            file: cert,
            pointer: None,
            pin: true,
        }),
        &ctx,
    )
    .await;
    assert!(result.is_err());
    assert_eq!(ledger.write_count(), writes);
}

#[tokio::test]
async fn account_reports_without_organization() {
    let (ledger, ctx) = setup();
    ledger.set_account(addr(0x42));
    assert_eq!(
        run_account(&AccountArgs { json: true }, &ctx).await.unwrap(),
        EXIT_OK
    );

    ledger.remove_provider();
    assert!(run_account(&AccountArgs { json: false }, &ctx).await.is_err());
}
