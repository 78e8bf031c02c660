#![cfg(feature = "sqlite")]

mod common;

use sql_portable::prelude::*;

use common::{RecordingScope, init_tracing, sqlite_config};

#[tokio::test]
async fn test4_failed_connect_goes_through_scope() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let scope = RecordingScope::default();
    let mut db = Database::with_scope(
        sqlite_config(&dir.path().join("does-not-exist")),
        scope.clone(),
    );

    assert!(!db.connect().await);
    assert!(!db.is_connected());
    assert_eq!(
        scope.events(),
        [
            "invalidate_identity",
            "service_unavailable: Failed to connect to database",
            "terminate",
        ]
    );

    // Terminal: later calls never retry and never reach the scope again.
    assert!(!db.connect().await);
    let err = db.execute_audited("SELECT 1", &[]).await.unwrap_err();
    assert!(matches!(err, SqlPortableError::Unavailable(_)));
    assert!(matches!(
        db.begin_transaction().await,
        Err(SqlPortableError::Unavailable(_))
    ));
    assert_eq!(scope.events().len(), 3);
    assert!(db.disconnect().await);
    Ok(())
}

#[tokio::test]
async fn test4_unsupported_type_is_not_fatal() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let scope = RecordingScope::default();
    let config = DbConfig {
        dbtype: "firebird".into(),
        ..sqlite_config(dir.path())
    };
    let mut db = Database::with_scope(config, scope.clone());

    assert!(!db.connect().await);
    assert!(scope.events().is_empty());
    assert!(matches!(
        db.execute_audited("SELECT 1", &[]).await,
        Err(SqlPortableError::Unsupported(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test4_connect_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config = DbConfig::from_json_str(&format!(
        r#"{{"dbtype":"sqlite3","dbname":"j","datadirectory":{}}}"#,
        serde_json::to_string(dir.path())?
    ))?;
    let mut db = Database::new(config);
    assert!(db.connect().await);
    assert!(db.connect().await);
    assert_eq!(db.dialect(), Some(Dialect::Sqlite));
    assert!(dir.path().join("j.db").exists());
    assert!(db.disconnect().await);
    assert!(db.disconnect().await);
    Ok(())
}
