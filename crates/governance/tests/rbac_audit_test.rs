//! Integration tests for RBAC and Audit modules.

use recordops_governance::{
    AuditEntry, AuditFilter, AuditOutcome, AuditStore, FileAuditStore, InMemoryAuditStore,
    NoOpRbacConnector, RbacConnector, StaticTokenRbacConnector,
};
use secrecy::Secret;
use serde_json::json;

#[tokio::test]
async fn test_rbac_noop_connector() {
    let connector = NoOpRbacConnector;

    let roles = connector.validate("admin").await.unwrap();
    assert!(roles.is_admin);
    assert!(roles.credential().is_admin);

    let roles = connector.validate("alice").await.unwrap();
    assert_eq!(roles.user_id, "alice");
    assert!(!roles.is_admin);
    let credential = roles.credential();
    assert_eq!(credential.require_authenticated().unwrap(), "alice");
    assert!(!credential.is_admin);

    assert!(connector.validate("").await.is_err());
}

#[tokio::test]
async fn test_rbac_static_token_connector() {
    let connector = StaticTokenRbacConnector::new(Secret::new("s3cret".to_string()));

    let roles = connector.validate("s3cret").await.unwrap();
    assert!(roles.is_admin);
    assert_eq!(roles.roles, vec!["admin"]);

    for wrong in ["s3cre", "s3cret!", "S3CRET", ""] {
        let err = connector.validate(wrong).await.unwrap_err();
        assert!(matches!(err, recordops_core::Error::Unauthenticated(_)), "{wrong}");
    }
}

#[tokio::test]
async fn test_audit_store_log_and_query() {
    let store = InMemoryAuditStore::new();

    store
        .log(AuditEntry::new("admin", "deleteAll", "DataStore", AuditOutcome::Success))
        .await
        .unwrap();
    store
        .log(
            AuditEntry::new("user1", "deleteFileStoreBeforeDate", "FileStore", AuditOutcome::Denied)
                .with_metadata(json!({"beforeDate": "2024-01-01"})),
        )
        .await
        .unwrap();
    store
        .log(AuditEntry::new(
            "admin",
            "import",
            "DataStore",
            AuditOutcome::Error("row 3".into()),
        ))
        .await
        .unwrap();

    let all = store.query(AuditFilter::default()).await.unwrap();
    assert_eq!(all.len(), 3);

    let admin = store
        .query(AuditFilter {
            user_id: Some("admin".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(admin.len(), 2);

    let data_store = store
        .query(AuditFilter {
            resource: Some("DataStore".into()),
            limit: Some(1),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(data_store.len(), 1);
    assert_eq!(data_store[0].action, "deleteAll");

    let denied = store
        .query(AuditFilter {
            action: Some("deleteFileStoreBeforeDate".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(denied[0].outcome, AuditOutcome::Denied);
    assert_eq!(denied[0].metadata, Some(json!({"beforeDate": "2024-01-01"})));
}

#[tokio::test]
async fn test_file_audit_store_appends_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs/audit.jsonl");
    let store = FileAuditStore::new(&path);

    assert!(store.query(AuditFilter::default()).await.unwrap().is_empty());

    // Every entry is readable as soon as `log` returns.
    for (i, action) in ["deleteAll", "import"].into_iter().enumerate() {
        store
            .log(AuditEntry::new("admin", action, "DataStore", AuditOutcome::Success))
            .await
            .unwrap();
        let entries = store.query(AuditFilter::default()).await.unwrap();
        assert_eq!(entries.len(), i + 1);
        assert_eq!(entries[i].action, action);
    }

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 2);

    // A fresh handle reads what an earlier one wrote.
    let reopened = FileAuditStore::new(&path);
    let imports = reopened
        .query(AuditFilter {
            action: Some("import".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].user_id, "admin");
}
